use thiserror::Error;

use crate::types::ForecastKind;

/// Startup failures. Any of these is fatal before the first spot is polled.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A forecast provider call that did not yield a decoded response.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single point write rejected by the time-series store.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write request failed: {0}")]
    Influx(#[from] influxdb2::RequestError),

    #[error("invalid point: {0}")]
    InvalidPoint(String),
}

/// Why one fetch attempt for a spot failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("error fetching {kind} forecast: {source}")]
    Provider {
        kind: ForecastKind,
        #[source]
        source: ProviderError,
    },

    #[error("fetch task panicked: {0}")]
    Panicked(String),
}

impl FetchError {
    /// The forecast kind that failed, if the failure came from the provider.
    pub fn kind(&self) -> Option<ForecastKind> {
        match self {
            FetchError::Provider { kind, .. } => Some(*kind),
            FetchError::Panicked(_) => None,
        }
    }
}
