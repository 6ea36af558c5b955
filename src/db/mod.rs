pub mod models;
pub mod writer;

use async_trait::async_trait;

use crate::error::SinkError;

pub use models::{Measurement, TimeSeriesPoint};
pub use writer::InfluxWriter;

/// Destination for forecast points.
///
/// One sink is shared by every spot task, so `write_point` is called
/// concurrently and implementations must tolerate that without extra locking
/// by the caller. A returned `Ok` means the store acknowledged the point.
#[async_trait]
pub trait TimeSeriesSink: Send + Sync {
    async fn write_point(&self, point: &TimeSeriesPoint) -> Result<(), SinkError>;
}
