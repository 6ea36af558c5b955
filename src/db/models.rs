//! Generic point shape accepted by the time-series store.
//! Typed forecast points are lowered into this only at the write boundary.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    WindForecast,
    WaveForecast,
    SwellForecast,
    TideForecast,
    SpotForecastRating,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::WindForecast => "windForecast",
            Measurement::WaveForecast => "waveForecast",
            Measurement::SwellForecast => "swellForecast",
            Measurement::TideForecast => "tideForecast",
            Measurement::SpotForecastRating => "spotForecastRating",
        }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub measurement: Measurement,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    /// Unix seconds, UTC.
    pub timestamp: i64,
}

impl TimeSeriesPoint {
    pub fn new(measurement: Measurement, timestamp: i64) -> Self {
        Self {
            measurement,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Empty values are skipped; the store rejects empty tags.
    pub fn tag(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.tags.insert(key.to_string(), value);
        }
        self
    }

    /// NaN and infinite floats are skipped; line protocol cannot carry them.
    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        match value.into() {
            FieldValue::Float(v) if !v.is_finite() => {}
            value => {
                self.fields.insert(key.to_string(), value);
            }
        }
        self
    }
}
