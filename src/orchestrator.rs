use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{MAX_FETCH_ATTEMPTS, RETRY_DELAY_SECS};
use crate::db::TimeSeriesSink;
use crate::error::FetchError;
use crate::fetcher::{FetchFailure, PublishReport, SpotFetcher};
use crate::surfline::ForecastClient;
use crate::types::Spot;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_FETCH_ATTEMPTS,
            delay: Duration::from_secs(RETRY_DELAY_SECS),
        }
    }
}

/// Terminal result for one spot.
#[derive(Debug)]
pub struct SpotOutcome {
    pub spot: Spot,
    /// Attempts made. 0 if the task died before reporting.
    pub attempts: u32,
    /// Retries were abandoned because shutdown was requested.
    pub cancelled: bool,
    /// Writes made across every attempt, failed ones included.
    pub published: PublishReport,
    /// Error of the last attempt if no attempt succeeded.
    pub result: Result<(), FetchError>,
}

impl SpotOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs every spot concurrently, each with its own bounded retry loop.
pub struct FetchOrchestrator<C, S> {
    fetcher: SpotFetcher<C, S>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<C, S> FetchOrchestrator<C, S>
where
    C: ForecastClient + 'static,
    S: TimeSeriesSink + 'static,
{
    pub fn new(fetcher: SpotFetcher<C, S>, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            policy,
            cancel,
        }
    }

    /// Fetch and publish every spot; returns once each spot has a terminal outcome.
    /// Spots are keyed by id, so a spot listed twice is polled once.
    pub async fn run(
        &self,
        spots: &[Spot],
        days: u32,
        interval_hours: u32,
    ) -> BTreeMap<String, SpotOutcome> {
        let unique: BTreeMap<&str, &Spot> = spots.iter().map(|s| (s.id.as_str(), s)).collect();

        let handles: Vec<_> = unique
            .into_values()
            .map(|spot| {
                let spot = spot.clone();
                let fetcher = self.fetcher.clone();
                let policy = self.policy;
                let cancel = self.cancel.clone();
                let task_spot = spot.clone();
                let handle = tokio::spawn(async move {
                    fetch_with_retry(&fetcher, &task_spot, days, interval_hours, policy, &cancel).await
                });
                (spot, handle)
            })
            .collect();

        let outcomes = join_all(handles.into_iter().map(|(spot, handle)| async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(spot_id = %spot.id, "fetch task for spot {} ({}) died: {e}", spot.id, spot.name);
                    SpotOutcome {
                        spot,
                        attempts: 0,
                        cancelled: false,
                        published: PublishReport::default(),
                        result: Err(FetchError::Panicked(e.to_string())),
                    }
                }
            }
        }))
        .await;

        outcomes
            .into_iter()
            .map(|outcome| (outcome.spot.id.clone(), outcome))
            .collect()
    }
}

async fn fetch_with_retry<C, S>(
    fetcher: &SpotFetcher<C, S>,
    spot: &Spot,
    days: u32,
    interval_hours: u32,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> SpotOutcome
where
    C: ForecastClient,
    S: TimeSeriesSink,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    let mut published = PublishReport::default();

    loop {
        attempts += 1;
        let failure = match fetcher.fetch_and_publish(spot, days, interval_hours).await {
            Ok(report) => {
                info!(
                    spot_id = %spot.id,
                    attempt = attempts,
                    points = report.points_written,
                    write_failures = report.write_failures.len(),
                    "Spot {} ({}) published {} points on attempt {attempts}",
                    spot.id, spot.name, report.points_written,
                );
                published.absorb(report);
                return SpotOutcome {
                    spot: spot.clone(),
                    attempts,
                    cancelled: false,
                    published,
                    result: Ok(()),
                };
            }
            Err(failure) => failure,
        };

        let kind = failure
            .error
            .kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        warn!(
            spot_id = %spot.id,
            kind = %kind,
            attempt = attempts,
            "Error on attempt {attempts}/{max_attempts} for spot {} ({}): {failure}",
            spot.id, spot.name,
        );
        let FetchFailure { error, report } = failure;
        published.absorb(report);

        if attempts >= max_attempts {
            return SpotOutcome {
                spot: spot.clone(),
                attempts,
                cancelled: false,
                published,
                result: Err(error),
            };
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(spot_id = %spot.id, "Retries for spot {} abandoned: shutdown requested", spot.id);
                return SpotOutcome {
                    spot: spot.clone(),
                    attempts,
                    cancelled: true,
                    published,
                    result: Err(error),
                };
            }
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}
