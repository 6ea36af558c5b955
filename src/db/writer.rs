use async_trait::async_trait;
use futures_util::stream;
use influxdb2::api::write::TimestampPrecision;
use influxdb2::models::DataPoint;
use reqwest::Url;
use tracing::debug;

use crate::config::InfluxConfig;
use crate::db::models::{FieldValue, TimeSeriesPoint};
use crate::db::TimeSeriesSink;
use crate::error::{AppError, Result, SinkError};

/// Writes points to an InfluxDB v2 bucket, one request per point.
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct InfluxWriter {
    client: influxdb2::Client,
    bucket: String,
}

impl InfluxWriter {
    pub fn new(cfg: &InfluxConfig, token: &str) -> Result<Self> {
        let url = base_url(cfg)?;
        Ok(Self {
            client: influxdb2::Client::new(url, &cfg.org, token),
            bucket: cfg.bucket.clone(),
        })
    }
}

/// The client appends `/api/v2/...` itself, so the base must not end in a slash.
fn base_url(cfg: &InfluxConfig) -> Result<String> {
    Url::parse(&cfg.url)
        .map_err(|e| AppError::Config(format!("invalid influxdb.url '{}': {e}", cfg.url)))?;
    Ok(cfg.url.trim_end_matches('/').to_string())
}

fn to_data_point(point: &TimeSeriesPoint) -> std::result::Result<DataPoint, SinkError> {
    let mut builder = DataPoint::builder(point.measurement.as_str()).timestamp(point.timestamp);
    for (key, value) in &point.tags {
        builder = builder.tag(key.as_str(), value.as_str());
    }
    for (key, value) in &point.fields {
        builder = match value {
            FieldValue::Float(v) => builder.field(key.as_str(), *v),
            FieldValue::Integer(v) => builder.field(key.as_str(), *v),
            FieldValue::String(v) => builder.field(key.as_str(), v.clone()),
        };
    }
    builder.build().map_err(|e| {
        SinkError::InvalidPoint(format!("{} point at {}: {e}", point.measurement, point.timestamp))
    })
}

#[async_trait]
impl TimeSeriesSink for InfluxWriter {
    async fn write_point(&self, point: &TimeSeriesPoint) -> std::result::Result<(), SinkError> {
        let data_point = to_data_point(point)?;
        debug!(measurement = %point.measurement, timestamp = point.timestamp, "influx write");

        self.client
            .write_with_precision(
                &self.bucket,
                stream::iter([data_point]),
                TimestampPrecision::Seconds,
            )
            .await?;
        Ok(())
    }
}
