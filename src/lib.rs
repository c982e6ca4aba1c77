//! Broadcast-schedule notifier: polls the Annict "my programs" API on a cron
//! schedule and posts one Discord-webhook message per unwatched occurrence
//! that starts today in the configured offset.

pub mod annict;
pub mod config;
pub mod discord;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod scheduler;
