use crate::annict::{ProgramSource, SourceError};
use crate::discord::{self, Notifier};
use crate::filter;
use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Counters for one completed run, for the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub matched: usize,
    pub delivered: usize,
}

/// One full fetch → filter → dispatch cycle, evaluated at `now`.
///
/// Dispatch failures are contained per item inside `dispatch_all` and only
/// reduce the delivered count; the run itself fails only when the fetch does.
#[instrument(skip_all)]
pub async fn run_once(
    source: &dyn ProgramSource,
    notifier: &dyn Notifier,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<RunSummary, RunError> {
    let today = now.with_timezone(&offset).date_naive();

    let candidates = source.fetch(today).await?;
    let fetched = candidates.len();

    let matched = filter::select_due(candidates, today, offset);
    if matched.is_empty() {
        return Ok(RunSummary {
            fetched,
            matched: 0,
            delivered: 0,
        });
    }

    let delivered = discord::dispatch_all(notifier, &matched).await;
    Ok(RunSummary {
        fetched,
        matched: matched.len(),
        delivered,
    })
}

/// The run boundary: whatever happens inside a run is logged here and goes
/// no further, so the schedule keeps firing.
pub async fn execute_run(source: &dyn ProgramSource, notifier: &dyn Notifier, offset: FixedOffset) {
    match run_once(source, notifier, offset, Utc::now()).await {
        Ok(summary) => info!(
            fetched = summary.fetched,
            matched = summary.matched,
            delivered = summary.delivered,
            "run complete"
        ),
        Err(err) => error!(%err, "run failed; the next tick will retry"),
    }
}
