use serde::Deserialize;

// ---------------------------------------------------------------------------
// Spots
// ---------------------------------------------------------------------------

/// A surf spot as polled by the pipeline. The name is resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spot {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Forecast kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastKind {
    Wind,
    Wave,
    Tide,
    Rating,
}

impl std::fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ForecastKind::Wind => "wind",
            ForecastKind::Wave => "wave",
            ForecastKind::Tide => "tide",
            ForecastKind::Rating => "rating",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Batch metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Metadata shared by every record of one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMeta {
    /// Forecast grid point (wind) or tide station position (tide).
    pub location: Option<Location>,
    /// Tide station name. Only set for tide batches.
    pub station_name: Option<String>,
}

/// An ordered run of records of one kind, as returned by a single provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBatch<R> {
    pub meta: BatchMeta,
    pub records: Vec<R>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindSample {
    pub timestamp: i64,
    #[serde(default)]
    pub utc_offset: i64,
    pub speed: f64,
    pub direction: f64,
    #[serde(default)]
    pub direction_type: String,
    pub gust: f64,
    #[serde(default)]
    pub optimal_score: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSample {
    pub timestamp: i64,
    #[serde(default)]
    pub utc_offset: i64,
    /// Null when the provider has no confidence estimate for this hour.
    #[serde(default)]
    pub probability: Option<f64>,
    pub surf: Surf,
    pub power: f64,
    #[serde(default)]
    pub swells: Vec<Swell>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surf {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub optimal_score: i64,
    #[serde(default)]
    pub human_relation: String,
    pub raw: SurfRaw,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SurfRaw {
    pub min: f64,
    pub max: f64,
}

/// One swell train inside a wave record. Has no timestamp of its own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swell {
    pub height: f64,
    pub period: f64,
    #[serde(default)]
    pub impact: f64,
    #[serde(default)]
    pub power: f64,
    pub direction: f64,
    #[serde(default)]
    pub direction_min: f64,
    #[serde(default)]
    pub optimal_score: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideSample {
    pub timestamp: i64,
    #[serde(default)]
    pub utc_offset: i64,
    /// HIGH, LOW or NORMAL.
    #[serde(rename = "type")]
    pub tide_type: String,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSample {
    pub timestamp: i64,
    #[serde(default)]
    pub utc_offset: i64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rating {
    pub key: String,
    pub value: f64,
}

/// Any decoded forecast record.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastRecord {
    Wind(WindSample),
    Wave(WaveSample),
    Tide(TideSample),
    Rating(RatingSample),
}

impl ForecastRecord {
    pub fn timestamp(&self) -> i64 {
        match self {
            ForecastRecord::Wind(r) => r.timestamp,
            ForecastRecord::Wave(r) => r.timestamp,
            ForecastRecord::Tide(r) => r.timestamp,
            ForecastRecord::Rating(r) => r.timestamp,
        }
    }
}

impl From<WindSample> for ForecastRecord {
    fn from(r: WindSample) -> Self {
        ForecastRecord::Wind(r)
    }
}

impl From<WaveSample> for ForecastRecord {
    fn from(r: WaveSample) -> Self {
        ForecastRecord::Wave(r)
    }
}

impl From<TideSample> for ForecastRecord {
    fn from(r: TideSample) -> Self {
        ForecastRecord::Tide(r)
    }
}

impl From<RatingSample> for ForecastRecord {
    fn from(r: RatingSample) -> Self {
        ForecastRecord::Rating(r)
    }
}
