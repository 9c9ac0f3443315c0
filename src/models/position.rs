// ABOUTME: Position record model: a single timestamped checkpoint crossing
// ABOUTME: Immutable once created; time-ascending order per rider is an adapter contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a timing line ("chalkline") on the course.
///
/// Human-readable line names are resolved to ids by the telemetry store;
/// the pipeline only ever compares ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(pub u32);

/// Direction of a line crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Crossing in the course's forward direction.
    Forward,
    /// Crossing against the course's forward direction.
    Reverse,
}

impl Direction {
    /// The opposite direction; used on courses where the expected finish
    /// direction alternates each crossing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// A single observed checkpoint crossing.
///
/// Records are created once by the telemetry store adapter and are
/// read-only thereafter; the only permitted mutation is truncation of a
/// trailing suffix by the integrity trimmer. Within a rider the sequence
/// is ascending by `time_ms`; the adapter enforces this, the pipeline
/// relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Observation time, epoch milliseconds.
    pub time_ms: i64,
    /// The line that was crossed.
    pub checkpoint: CheckpointId,
    /// Crossing direction.
    pub direction: Direction,
    /// Cumulative distance ridden, meters.
    pub meters: f64,
    /// Cumulative energy, milliwatt-hours.
    pub mwh: f64,
    /// Cumulative ride duration, milliseconds.
    pub duration_ms: i64,
    /// Elevation at the crossing, meters.
    pub elevation_m: f64,
    /// Instantaneous speed, meters per hour.
    pub speed_m_per_hr: f64,
    /// Heart rate at the crossing, BPM, when the sensor reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
}

impl PositionRecord {
    /// Wall-clock stamp of this crossing, `HH:MM:SS.mmm` UTC.
    #[must_use]
    pub fn stamp(&self) -> String {
        Utc.timestamp_millis_opt(self.time_ms).single().map_or_else(
            || format!("@{}ms", self.time_ms),
            |t| t.format("%H:%M:%S%.3f").to_string(),
        )
    }
}
