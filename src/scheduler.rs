use crate::annict::ProgramSource;
use crate::discord::Notifier;
use crate::pipeline;
use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression `{expression}`: {source}")]
    InvalidCron {
        expression: String,
        source: cron::error::Error,
    },
}

/// Recurring trigger: fires one pipeline run per cron tick, in the
/// configured offset. Runs indefinitely; there is no stop state short of
/// process termination.
#[derive(Debug)]
pub struct Scheduler {
    expression: String,
    schedule: Schedule,
    offset: FixedOffset,
}

/// The `cron` crate wants a seconds field; standard 5-field expressions get
/// `0` prepended. 6-field input passes through untouched.
pub fn normalize_cron(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

impl Scheduler {
    pub fn new(expression: &str, offset: FixedOffset) -> Result<Self, ScheduleError> {
        let normalized = normalize_cron(expression);
        let schedule = Schedule::from_str(&normalized).map_err(|source| {
            ScheduleError::InvalidCron {
                expression: expression.to_string(),
                source,
            }
        })?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
            offset,
        })
    }

    /// Next fire instant strictly after `after`, in the configured offset.
    pub fn next_fire(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        self.schedule.after(&after).next()
    }

    /// Sleep-until-tick loop. Each tick spawns one independent pipeline run;
    /// the timer never waits on a run, and a run's failure is contained at
    /// the run boundary, so the schedule always survives.
    pub async fn run(&self, source: Arc<dyn ProgramSource>, notifier: Arc<dyn Notifier>) {
        info!(cron = %self.expression, offset = %self.offset, "schedule armed");
        loop {
            let now = Utc::now().with_timezone(&self.offset);
            let next = match self.next_fire(now) {
                Some(next) => next,
                None => {
                    // e.g. an exhausted one-shot expression like "0 0 1 1 * 2020".
                    error!(cron = %self.expression, "cron expression has no future fire times");
                    return;
                }
            };

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, "sleeping until next tick");
            tokio::time::sleep(wait).await;

            let source = Arc::clone(&source);
            let notifier = Arc::clone(&notifier);
            let offset = self.offset;
            tokio::spawn(async move {
                pipeline::execute_run(source.as_ref(), notifier.as_ref(), offset).await;
            });
        }
    }
}
