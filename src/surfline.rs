use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::ProviderError;
use crate::types::{
    BatchMeta, ForecastBatch, Location, RatingSample, TideSample, WaveSample, WindSample,
};

/// Longest slice of an error body kept in a provider error.
const ERROR_BODY_LIMIT: usize = 200;

/// Source of decoded forecast batches.
///
/// `corrected` and `cache_enabled` on the wind call are provider options that
/// callers pass through untouched.
#[async_trait]
pub trait ForecastClient: Send + Sync {
    async fn wind(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
        corrected: bool,
        cache_enabled: bool,
    ) -> Result<ForecastBatch<WindSample>, ProviderError>;

    async fn wave(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<WaveSample>, ProviderError>;

    async fn tides(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<TideSample>, ProviderError>;

    async fn rating(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<RatingSample>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<A, D> {
    #[serde(default)]
    associated: A,
    data: D,
}

#[derive(Debug, Default, Deserialize)]
struct LocationAssociated {
    #[serde(default)]
    location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TideAssociated {
    #[serde(default)]
    tide_location: Option<TideStation>,
}

#[derive(Debug, Deserialize)]
struct TideStation {
    #[serde(default)]
    name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WindData {
    wind: Vec<WindSample>,
}

#[derive(Debug, Deserialize)]
struct WaveData {
    wave: Vec<WaveSample>,
}

#[derive(Debug, Deserialize)]
struct TideData {
    tides: Vec<TideSample>,
}

#[derive(Debug, Deserialize)]
struct RatingData {
    rating: Vec<RatingSample>,
}

fn decode_wind(body: &str) -> Result<ForecastBatch<WindSample>, ProviderError> {
    let env: Envelope<LocationAssociated, WindData> = serde_json::from_str(body)?;
    Ok(ForecastBatch {
        meta: BatchMeta {
            location: env.associated.location,
            station_name: None,
        },
        records: env.data.wind,
    })
}

fn decode_wave(body: &str) -> Result<ForecastBatch<WaveSample>, ProviderError> {
    let env: Envelope<LocationAssociated, WaveData> = serde_json::from_str(body)?;
    Ok(ForecastBatch {
        meta: BatchMeta {
            location: env.associated.location,
            station_name: None,
        },
        records: env.data.wave,
    })
}

fn decode_tides(body: &str) -> Result<ForecastBatch<TideSample>, ProviderError> {
    let env: Envelope<TideAssociated, TideData> = serde_json::from_str(body)?;
    let meta = match env.associated.tide_location {
        Some(station) => BatchMeta {
            location: Some(Location {
                lat: station.lat,
                lon: station.lon,
            }),
            station_name: Some(station.name),
        },
        None => BatchMeta::default(),
    };
    Ok(ForecastBatch {
        meta,
        records: env.data.tides,
    })
}

fn decode_rating(body: &str) -> Result<ForecastBatch<RatingSample>, ProviderError> {
    let env: Envelope<LocationAssociated, RatingData> = serde_json::from_str(body)?;
    Ok(ForecastBatch {
        meta: BatchMeta::default(),
        records: env.data.rating,
    })
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Surfline KBYG forecast endpoints over HTTPS.
#[derive(Debug, Clone)]
pub struct SurflineClient {
    client: reqwest::Client,
    base_url: String,
}

impl SurflineClient {
    pub fn new(base_url: &str) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let url = format!("{}/kbyg/spots/forecasts/{endpoint}", self.base_url);
        debug!("GET {url} {query:?}");

        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        Ok(body)
    }
}

fn base_query(spot_id: &str, days: u32, interval_hours: u32) -> Vec<(&'static str, String)> {
    vec![
        ("spotId", spot_id.to_string()),
        ("days", days.to_string()),
        ("intervalHours", interval_hours.to_string()),
    ]
}

#[async_trait]
impl ForecastClient for SurflineClient {
    async fn wind(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
        corrected: bool,
        cache_enabled: bool,
    ) -> Result<ForecastBatch<WindSample>, ProviderError> {
        let mut query = base_query(spot_id, days, interval_hours);
        query.push(("corrected", corrected.to_string()));
        query.push(("cacheEnabled", cache_enabled.to_string()));
        decode_wind(&self.get_text("wind", &query).await?)
    }

    async fn wave(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<WaveSample>, ProviderError> {
        let query = base_query(spot_id, days, interval_hours);
        decode_wave(&self.get_text("wave", &query).await?)
    }

    async fn tides(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<TideSample>, ProviderError> {
        let query = base_query(spot_id, days, interval_hours);
        decode_tides(&self.get_text("tides", &query).await?)
    }

    async fn rating(
        &self,
        spot_id: &str,
        days: u32,
        interval_hours: u32,
    ) -> Result<ForecastBatch<RatingSample>, ProviderError> {
        let query = base_query(spot_id, days, interval_hours);
        decode_rating(&self.get_text("rating", &query).await?)
    }
}
