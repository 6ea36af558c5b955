use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::builder::build_points;
use crate::db::{Measurement, TimeSeriesSink};
use crate::error::{FetchError, ProviderError, SinkError};
use crate::surfline::ForecastClient;
use crate::types::{ForecastBatch, ForecastKind, ForecastRecord, Spot};

/// Reference clock for point ages. Injected so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Provider options passed through on every wind call.
#[derive(Debug, Clone, Copy)]
pub struct WindOptions {
    pub corrected: bool,
    pub cache_enabled: bool,
}

impl Default for WindOptions {
    fn default() -> Self {
        Self {
            corrected: true,
            cache_enabled: true,
        }
    }
}

#[derive(Debug)]
pub struct WriteFailure {
    pub kind: ForecastKind,
    pub measurement: Measurement,
    pub timestamp: i64,
    pub error: SinkError,
}

/// What one fetch-and-publish attempt managed to write.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub points_written: usize,
    pub write_failures: Vec<WriteFailure>,
}

impl PublishReport {
    /// Fold another attempt's writes into this one.
    pub fn absorb(&mut self, other: PublishReport) {
        self.points_written += other.points_written;
        self.write_failures.extend(other.write_failures);
    }
}

/// A failed attempt, with whatever was written before the failing call.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FetchFailure {
    pub error: FetchError,
    pub report: PublishReport,
}

/// Fetches all four forecast kinds for one spot and writes the resulting points.
pub struct SpotFetcher<C, S> {
    client: Arc<C>,
    sink: Arc<S>,
    clock: Arc<dyn Clock>,
    wind_options: WindOptions,
}

impl<C, S> Clone for SpotFetcher<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            sink: Arc::clone(&self.sink),
            clock: Arc::clone(&self.clock),
            wind_options: self.wind_options,
        }
    }
}

impl<C: ForecastClient, S: TimeSeriesSink> SpotFetcher<C, S> {
    pub fn new(client: Arc<C>, sink: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            sink,
            clock,
            wind_options: WindOptions::default(),
        }
    }

    #[cfg(test)]
    pub fn with_wind_options(mut self, wind_options: WindOptions) -> Self {
        self.wind_options = wind_options;
        self
    }

    /// One attempt: wind, wave, tide, rating in order, stopping at the first
    /// provider failure. Point write failures are collected, never fatal.
    pub async fn fetch_and_publish(
        &self,
        spot: &Spot,
        days: u32,
        interval_hours: u32,
    ) -> Result<PublishReport, FetchFailure> {
        let mut report = PublishReport::default();
        let WindOptions {
            corrected,
            cache_enabled,
        } = self.wind_options;

        let wind = self
            .client
            .wind(&spot.id, days, interval_hours, corrected, cache_enabled)
            .await;
        if let Err(error) = self.publish(spot, ForecastKind::Wind, wind, &mut report).await {
            return Err(fail(error, &mut report));
        }

        let wave = self.client.wave(&spot.id, days, interval_hours).await;
        if let Err(error) = self.publish(spot, ForecastKind::Wave, wave, &mut report).await {
            return Err(fail(error, &mut report));
        }

        let tides = self.client.tides(&spot.id, days, interval_hours).await;
        if let Err(error) = self.publish(spot, ForecastKind::Tide, tides, &mut report).await {
            return Err(fail(error, &mut report));
        }

        let rating = self.client.rating(&spot.id, days, interval_hours).await;
        if let Err(error) = self.publish(spot, ForecastKind::Rating, rating, &mut report).await {
            return Err(fail(error, &mut report));
        }

        Ok(report)
    }

    async fn publish<R: Into<ForecastRecord>>(
        &self,
        spot: &Spot,
        kind: ForecastKind,
        response: Result<ForecastBatch<R>, ProviderError>,
        report: &mut PublishReport,
    ) -> Result<(), FetchError> {
        let batch = response.map_err(|source| FetchError::Provider { kind, source })?;
        let now = self.clock.now();
        debug!(spot_id = %spot.id, kind = %kind, "{} {kind} records for {}", batch.records.len(), spot.name);

        for record in batch.records {
            let record: ForecastRecord = record.into();
            for point in build_points(&record, &batch.meta, spot, now) {
                let point = point.to_time_series();
                match self.sink.write_point(&point).await {
                    Ok(()) => report.points_written += 1,
                    Err(error) => {
                        warn!(
                            spot_id = %spot.id,
                            kind = %kind,
                            measurement = %point.measurement,
                            "Error writing {} point at {} for spot {} ({}): {error}",
                            point.measurement, point.timestamp, spot.id, spot.name,
                        );
                        report.write_failures.push(WriteFailure {
                            kind,
                            measurement: point.measurement,
                            timestamp: point.timestamp,
                            error,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn fail(error: FetchError, report: &mut PublishReport) -> FetchFailure {
    FetchFailure {
        error,
        report: std::mem::take(report),
    }
}
