//! Hand-rolled client, sink and clock doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;

use crate::db::{Measurement, TimeSeriesPoint, TimeSeriesSink};
use crate::error::{ProviderError, SinkError};
use crate::fetcher::Clock;
use crate::surfline::ForecastClient;
use crate::types::{
    BatchMeta, ForecastBatch, ForecastKind, Location, Rating, RatingSample, Surf, SurfRaw, Swell,
    TideSample, WaveSample, WindSample,
};

/// Timestamp of every canned record.
pub const T: i64 = 1_700_000_000;

pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// How a spot's calls behave. Default: every call succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpotPlan {
    /// Kind whose calls fail.
    pub failing_kind: Option<ForecastKind>,
    /// Number of leading calls of `failing_kind` that fail. `u32::MAX` = always.
    pub failures: u32,
    /// Panic on the wind call.
    pub panic: bool,
}

impl SpotPlan {
    pub fn failing(kind: ForecastKind, failures: u32) -> Self {
        Self {
            failing_kind: Some(kind),
            failures,
            panic: false,
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: ForecastKind,
    pub days: u32,
    pub interval_hours: u32,
    pub wind_flags: Option<(bool, bool)>,
    pub at: Instant,
}

#[derive(Default)]
pub struct MockClient {
    plans: HashMap<String, SpotPlan>,
    calls: Mutex<HashMap<String, Vec<Call>>>,
}

impl MockClient {
    pub fn with_plan(mut self, spot_id: &str, plan: SpotPlan) -> Self {
        self.plans.insert(spot_id.to_string(), plan);
        self
    }

    pub fn calls_for(&self, spot_id: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .get(spot_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Instants of every call of `kind` for the spot.
    pub fn call_times(&self, spot_id: &str, kind: ForecastKind) -> Vec<Instant> {
        self.calls_for(spot_id)
            .into_iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.at)
            .collect()
    }

    fn record(
        &self,
        spot_id: &str,
        kind: ForecastKind,
        days: u32,
        interval_hours: u32,
        wind_flags: Option<(bool, bool)>,
    ) -> Result<(), ProviderError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(spot_id.to_string()).or_default();
            entry.push(Call {
                kind,
                days,
                interval_hours,
                wind_flags,
                at: Instant::now(),
            });
            entry.iter().filter(|c| c.kind == kind).count() as u32
        };

        let plan = self.plans.get(spot_id).copied().unwrap_or_default();
        if plan.panic && kind == ForecastKind::Wind {
            panic!("client blew up for {spot_id}");
        }
        if plan.failing_kind == Some(kind) && n <= plan.failures {
            return Err(ProviderError::Status {
                status: 503,
                body: format!("{kind} unavailable for {spot_id} (call {n})"),
            });
        }
        Ok(())
    }
}

pub fn wind_batch() -> ForecastBatch<WindSample> {
    ForecastBatch {
        meta: BatchMeta {
            location: Some(Location {
                lat: 32.797,
                lon: -117.259,
            }),
            station_name: None,
        },
        records: vec![WindSample {
            timestamp: T,
            utc_offset: -8,
            speed: 12.5,
            direction: 270.0,
            direction_type: "Onshore".to_string(),
            gust: 15.0,
            optimal_score: 0,
        }],
    }
}

pub fn wave_batch() -> ForecastBatch<WaveSample> {
    let swell = |height: f64| Swell {
        height,
        period: 12.0,
        impact: 0.4,
        power: 100.0,
        direction: 280.0,
        direction_min: 275.0,
        optimal_score: 0,
    };
    ForecastBatch {
        meta: BatchMeta::default(),
        records: vec![WaveSample {
            timestamp: T,
            utc_offset: -8,
            probability: Some(80.0),
            surf: Surf {
                min: 2.0,
                max: 3.0,
                optimal_score: 1,
                human_relation: "Thigh to waist".to_string(),
                raw: SurfRaw { min: 2.2, max: 3.1 },
            },
            power: 150.0,
            swells: vec![swell(2.5), swell(1.1)],
        }],
    }
}

pub fn tide_batch() -> ForecastBatch<TideSample> {
    ForecastBatch {
        meta: BatchMeta {
            location: Some(Location {
                lat: 32.867,
                lon: -117.257,
            }),
            station_name: Some("Scripps Pier".to_string()),
        },
        records: vec![TideSample {
            timestamp: T,
            utc_offset: -8,
            tide_type: "LOW".to_string(),
            height: 0.4,
        }],
    }
}

pub fn rating_batch() -> ForecastBatch<RatingSample> {
    ForecastBatch {
        meta: BatchMeta::default(),
        records: vec![RatingSample {
            timestamp: T,
            utc_offset: -8,
            rating: Rating {
                key: "FAIR".to_string(),
                value: 2.0,
            },
        }],
    }
}

#[async_trait]
impl ForecastClient for MockClient {
    async fn wind(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
        corrected: bool,
        cache_enabled: bool,
    ) -> Result<ForecastBatch<WindSample>, ProviderError> {
        self.record(
            spot_id,
            ForecastKind::Wind,
            days,
            interval_hours,
            Some((corrected, cache_enabled)),
        )?;
        Ok(wind_batch())
    }

    async fn wave(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<WaveSample>, ProviderError> {
        self.record(spot_id, ForecastKind::Wave, days, interval_hours, None)?;
        Ok(wave_batch())
    }

    async fn tides(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<TideSample>, ProviderError> {
        self.record(spot_id, ForecastKind::Tide, days, interval_hours, None)?;
        Ok(tide_batch())
    }

    async fn rating(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<RatingSample>, ProviderError> {
        self.record(spot_id, ForecastKind::Rating, days, interval_hours, None)?;
        Ok(rating_batch())
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSink {
    reject: Option<Measurement>,
    written: Mutex<Vec<(Instant, TimeSeriesPoint)>>,
}

impl MockSink {
    pub fn rejecting(measurement: Measurement) -> Self {
        Self {
            reject: Some(measurement),
            ..Self::default()
        }
    }

    pub fn points(&self) -> Vec<TimeSeriesPoint> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Instant of the last accepted write carrying `spotId == spot_id`.
    pub fn last_write_for(&self, spot_id: &str) -> Option<Instant> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| p.tags.get("spotId").map(String::as_str) == Some(spot_id))
            .map(|(at, _)| *at)
            .last()
    }
}

#[async_trait]
impl TimeSeriesSink for MockSink {
    async fn write_point(&self, point: &TimeSeriesPoint) -> Result<(), SinkError> {
        if self.reject == Some(point.measurement) {
            return Err(SinkError::InvalidPoint(format!(
                "{} rejected by test sink",
                point.measurement
            )));
        }
        self.written
            .lock()
            .unwrap()
            .push((Instant::now(), point.clone()));
        Ok(())
    }
}
