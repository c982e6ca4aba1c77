use annict_notify::annict::{AnnictClient, ProgramSource};
use annict_notify::config;
use annict_notify::discord::{Notifier, WebhookClient};
use annict_notify::scheduler::Scheduler;
use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let offset = cfg.schedule.offset()?;

    let source: Arc<dyn ProgramSource> = Arc::new(AnnictClient::new(
        cfg.annict.token.clone(),
        cfg.annict.per_page,
        cfg.annict.fetch_all_pages,
    ));
    let webhook_url =
        Url::parse(&cfg.discord.webhook_url).context("invalid discord.webhook_url")?;
    let notifier: Arc<dyn Notifier> = Arc::new(WebhookClient::new(webhook_url, offset));

    let scheduler = Scheduler::new(&cfg.schedule.cron, offset)?;
    info!("starting broadcast-schedule notifier");
    scheduler.run(source, notifier).await;

    Ok(())
}
