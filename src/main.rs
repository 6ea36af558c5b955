mod builder;
mod config;
mod db;
mod error;
mod fetcher;
mod orchestrator;
mod spots;
mod surfline;
mod types;

#[cfg(test)]
mod testing;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::InfluxWriter;
use crate::error::Result;
use crate::fetcher::{SpotFetcher, SystemClock};
use crate::orchestrator::{FetchOrchestrator, RetryPolicy, SpotOutcome};
use crate::surfline::SurflineClient;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let client = Arc::new(SurflineClient::new(&cfg.surfline_api_url)?);
    let sink = Arc::new(InfluxWriter::new(&cfg.influxdb, &cfg.influx_token)?);
    let fetcher = SpotFetcher::new(client, sink, Arc::new(SystemClock));

    // Ctrl-C stops pending retry delays; the run still waits for every spot.
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, abandoning pending retries");
            shutdown.cancel();
        }
    });

    info!(
        "Polling {} spots ({} days @ {}h) into {}/{} at {}",
        cfg.spots.len(),
        cfg.forecast.days,
        cfg.forecast.interval_hours,
        cfg.influxdb.org,
        cfg.influxdb.bucket,
        cfg.influxdb.url,
    );
    for spot in &cfg.spots {
        info!(spot_id = %spot.id, "  {} ({})", spot.name, spot.id);
    }

    let orchestrator = FetchOrchestrator::new(fetcher, RetryPolicy::default(), cancel);
    let outcomes = orchestrator
        .run(&cfg.spots, cfg.forecast.days, cfg.forecast.interval_hours)
        .await;

    log_summary(&outcomes);
    Ok(())
}

/// One line per failed spot, then the run totals. Failures never change the exit code.
fn log_summary(outcomes: &BTreeMap<String, SpotOutcome>) {
    let mut points_written = 0usize;
    let mut write_failures = 0usize;

    for outcome in outcomes.values() {
        if let Err(failure) = &outcome.result {
            error!(
                spot_id = %outcome.spot.id,
                attempts = outcome.attempts,
                cancelled = outcome.cancelled,
                "Spot {} ({}) failed after {} attempt(s): {failure}",
                outcome.spot.id, outcome.spot.name, outcome.attempts,
            );
        }
        let report = &outcome.published;

        points_written += report.points_written;
        write_failures += report.write_failures.len();
        if let Some(first) = report.write_failures.first() {
            warn!(
                spot_id = %outcome.spot.id,
                "Spot {} had {} rejected writes; first: {} {} at {}: {}",
                outcome.spot.id,
                report.write_failures.len(),
                first.kind,
                first.measurement,
                first.timestamp,
                first.error,
            );
        }
    }

    let succeeded = outcomes.values().filter(|o| o.is_success()).count();
    info!(
        succeeded,
        failed = outcomes.len() - succeeded,
        points_written,
        write_failures,
        "Run complete: {succeeded}/{} spots published, {points_written} points written, {write_failures} write failures",
        outcomes.len(),
    );
}
