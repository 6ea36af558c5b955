//! Turns decoded forecast records into time-series points.
//!
//! Every record is written twice: once tagged with `age_h` (whole hours between
//! the record's timestamp and the fetch) and once without it. Older dashboards
//! query the untagged series; newer ones filter on freshness. Both variants
//! carry the same fields and timestamp.

use chrono::{DateTime, Utc};

use crate::db::{Measurement, TimeSeriesPoint};
use crate::types::{
    BatchMeta, ForecastRecord, Location, RatingSample, Spot, Swell, TideSample, WaveSample,
    WindSample,
};

// ---------------------------------------------------------------------------
// Typed points
// ---------------------------------------------------------------------------

/// Tags shared by every measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTags {
    pub spot_id: String,
    pub spot_name: String,
    /// None on the variant kept for queries that predate the age tag.
    pub age_h: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindPoint {
    pub tags: CommonTags,
    pub location: Option<String>,
    pub timestamp: i64,
    pub speed: f64,
    pub direction: f64,
    pub direction_type: String,
    pub gust: f64,
    pub optimal_score: i64,
    pub utc_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WavePoint {
    pub tags: CommonTags,
    pub timestamp: i64,
    pub probability: Option<f64>,
    pub min_surf: f64,
    pub max_surf: f64,
    pub optimal_score: i64,
    pub human_relation: String,
    pub raw_min_surf: f64,
    pub raw_max_surf: f64,
    pub power: f64,
    pub utc_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwellPoint {
    pub tags: CommonTags,
    /// Taken from the parent wave record.
    pub timestamp: i64,
    pub height: f64,
    pub period: f64,
    pub impact: f64,
    pub power: f64,
    pub direction: f64,
    pub direction_min: f64,
    pub optimal_score: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TidePoint {
    pub tags: CommonTags,
    pub location: Option<String>,
    pub station_name: Option<String>,
    pub timestamp: i64,
    pub tide_type: String,
    pub height: f64,
    pub utc_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingPoint {
    pub tags: CommonTags,
    pub rating_key: String,
    pub timestamp: i64,
    pub rating_value: f64,
    pub utc_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastPoint {
    Wind(WindPoint),
    Wave(WavePoint),
    Swell(SwellPoint),
    Tide(TidePoint),
    Rating(RatingPoint),
}

impl ForecastPoint {
    pub fn tags(&self) -> &CommonTags {
        match self {
            ForecastPoint::Wind(p) => &p.tags,
            ForecastPoint::Wave(p) => &p.tags,
            ForecastPoint::Swell(p) => &p.tags,
            ForecastPoint::Tide(p) => &p.tags,
            ForecastPoint::Rating(p) => &p.tags,
        }
    }

    fn tags_mut(&mut self) -> &mut CommonTags {
        match self {
            ForecastPoint::Wind(p) => &mut p.tags,
            ForecastPoint::Wave(p) => &mut p.tags,
            ForecastPoint::Swell(p) => &mut p.tags,
            ForecastPoint::Tide(p) => &mut p.tags,
            ForecastPoint::Rating(p) => &mut p.tags,
        }
    }

    /// Copy of this point with the age tag removed.
    fn without_age(&self) -> Self {
        let mut p = self.clone();
        p.tags_mut().age_h = None;
        p
    }

    /// Lower into the store's generic representation.
    pub fn to_time_series(&self) -> TimeSeriesPoint {
        let tags = self.tags();
        let base = |measurement: Measurement, timestamp: i64| {
            let p = TimeSeriesPoint::new(measurement, timestamp)
                .tag("spotId", tags.spot_id.as_str())
                .tag("spotName", tags.spot_name.as_str());
            match tags.age_h {
                Some(age) => p.tag("age_h", age.to_string()),
                None => p,
            }
        };

        match self {
            ForecastPoint::Wind(w) => {
                let mut p = base(Measurement::WindForecast, w.timestamp)
                    .field("speed", w.speed)
                    .field("direction", w.direction)
                    .field("directionType", w.direction_type.as_str())
                    .field("gust", w.gust)
                    .field("optimalScore", w.optimal_score)
                    .field("utcOffset", w.utc_offset);
                if let Some(loc) = &w.location {
                    p = p.tag("location", loc.as_str());
                }
                p
            }
            ForecastPoint::Wave(w) => {
                let mut p = base(Measurement::WaveForecast, w.timestamp)
                    .field("minSurf", w.min_surf)
                    .field("maxSurf", w.max_surf)
                    .field("optimalScore", w.optimal_score)
                    .field("humanRelation", w.human_relation.as_str())
                    .field("rawMinSurf", w.raw_min_surf)
                    .field("rawMaxSurf", w.raw_max_surf)
                    .field("power", w.power)
                    .field("utcOffset", w.utc_offset);
                if let Some(probability) = w.probability {
                    p = p.field("probability", probability);
                }
                p
            }
            ForecastPoint::Swell(s) => base(Measurement::SwellForecast, s.timestamp)
                .field("height", s.height)
                .field("period", s.period)
                .field("impact", s.impact)
                .field("power", s.power)
                .field("direction", s.direction)
                .field("directionMin", s.direction_min)
                .field("optimalScore", s.optimal_score),
            ForecastPoint::Tide(t) => {
                let mut p = base(Measurement::TideForecast, t.timestamp)
                    .field("type", t.tide_type.as_str())
                    .field("height", t.height)
                    .field("utcOffset", t.utc_offset);
                if let Some(loc) = &t.location {
                    p = p.tag("location", loc.as_str());
                }
                if let Some(name) = &t.station_name {
                    p = p.tag("name", name.as_str());
                }
                p
            }
            ForecastPoint::Rating(r) => base(Measurement::SpotForecastRating, r.timestamp)
                .tag("ratingKey", r.rating_key.as_str())
                .field("ratingValue", r.rating_value)
                .field("utcOffset", r.utc_offset),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Whole hours from `timestamp` to `now`, rounded toward negative infinity.
/// Records in the future get a negative age.
pub fn age_hours(now: DateTime<Utc>, timestamp: i64) -> i64 {
    now.timestamp().saturating_sub(timestamp).div_euclid(3600)
}

pub fn format_location(loc: &Location) -> String {
    format!("{:.6},{:.6}", loc.lat, loc.lon)
}

/// All points for one record: each base point followed by its untagged twin.
/// A wave record contributes its own pair plus one pair per swell.
pub fn build_points(
    record: &ForecastRecord,
    meta: &BatchMeta,
    spot: &Spot,
    now: DateTime<Utc>,
) -> Vec<ForecastPoint> {
    let tags = CommonTags {
        spot_id: spot.id.clone(),
        spot_name: spot.name.clone(),
        age_h: Some(age_hours(now, record.timestamp())),
    };

    let base = match record {
        ForecastRecord::Wind(w) => vec![wind_point(w, meta, tags)],
        ForecastRecord::Wave(w) => {
            let mut points = Vec::with_capacity(1 + w.swells.len());
            points.push(wave_point(w, tags.clone()));
            points.extend(
                w.swells
                    .iter()
                    .map(|s| swell_point(s, w.timestamp, tags.clone())),
            );
            points
        }
        ForecastRecord::Tide(t) => vec![tide_point(t, meta, tags)],
        ForecastRecord::Rating(r) => vec![rating_point(r, tags)],
    };

    base.into_iter()
        .flat_map(|p| {
            let untagged = p.without_age();
            [p, untagged]
        })
        .collect()
}

fn wind_point(w: &WindSample, meta: &BatchMeta, tags: CommonTags) -> ForecastPoint {
    ForecastPoint::Wind(WindPoint {
        tags,
        location: meta.location.as_ref().map(format_location),
        timestamp: w.timestamp,
        speed: w.speed,
        direction: w.direction,
        direction_type: w.direction_type.clone(),
        gust: w.gust,
        optimal_score: w.optimal_score,
        utc_offset: w.utc_offset,
    })
}

fn wave_point(w: &WaveSample, tags: CommonTags) -> ForecastPoint {
    ForecastPoint::Wave(WavePoint {
        tags,
        timestamp: w.timestamp,
        probability: w.probability,
        min_surf: w.surf.min,
        max_surf: w.surf.max,
        optimal_score: w.surf.optimal_score,
        human_relation: w.surf.human_relation.clone(),
        raw_min_surf: w.surf.raw.min,
        raw_max_surf: w.surf.raw.max,
        power: w.power,
        utc_offset: w.utc_offset,
    })
}

fn swell_point(s: &Swell, timestamp: i64, tags: CommonTags) -> ForecastPoint {
    ForecastPoint::Swell(SwellPoint {
        tags,
        timestamp,
        height: s.height,
        period: s.period,
        impact: s.impact,
        power: s.power,
        direction: s.direction,
        direction_min: s.direction_min,
        optimal_score: s.optimal_score,
    })
}

fn tide_point(t: &TideSample, meta: &BatchMeta, tags: CommonTags) -> ForecastPoint {
    ForecastPoint::Tide(TidePoint {
        tags,
        location: meta.location.as_ref().map(format_location),
        station_name: meta.station_name.clone(),
        timestamp: t.timestamp,
        tide_type: t.tide_type.clone(),
        height: t.height,
        utc_offset: t.utc_offset,
    })
}

fn rating_point(r: &RatingSample, tags: CommonTags) -> ForecastPoint {
    ForecastPoint::Rating(RatingPoint {
        tags,
        rating_key: r.rating.key.clone(),
        timestamp: r.timestamp,
        rating_value: r.rating.value,
        utc_offset: r.utc_offset,
    })
}
