// ABOUTME: Shared builders for integration tests
// ABOUTME: Checkpoint constants, position record and profile construction, race scaffolding
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs, dead_code)]

use chalkline::models::{CheckpointId, Direction, PositionRecord, PowerSource, RiderProfile, Sex};
use chalkline::race::{CategoryGroup, RaceDefinitionBuilder};
use chalkline::RaceDefinition;
use chrono::{DateTime, TimeZone, Utc};

pub const START_LINE: CheckpointId = CheckpointId(1);
pub const FINISH_LINE: CheckpointId = CheckpointId(2);

pub fn race_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 3, 17, 0, 0).unwrap()
}

pub fn race_start_ms() -> i64 {
    race_start().timestamp_millis()
}

/// Builder preconfigured with the start and finish lines every test uses.
pub fn race_builder() -> RaceDefinitionBuilder {
    RaceDefinition::builder("tnw", "Tuesday Night Worlds")
        .start(race_start())
        .start_line(START_LINE, Direction::Forward)
        .finish_line(FINISH_LINE, Direction::Forward)
}

pub fn group(name: &str, distance_m: f64) -> CategoryGroup {
    CategoryGroup {
        name: name.to_owned(),
        distance_m,
        lead_rider: None,
        delay_ms: None,
    }
}

/// Forward crossing at `offset_ms` relative to the nominal start, with
/// energy and duration tracking distance so integrity checks stay happy.
pub fn crossing(offset_ms: i64, line: CheckpointId, meters: f64) -> PositionRecord {
    let time_ms = race_start_ms() + offset_ms;
    PositionRecord {
        time_ms,
        checkpoint: line,
        direction: Direction::Forward,
        meters,
        mwh: meters * 10.0,
        duration_ms: time_ms,
        elevation_m: 12.0,
        speed_m_per_hr: 32_000.0,
        heart_rate: Some(150),
    }
}

pub fn profile(first_name: &str, last_name: &str) -> RiderProfile {
    RiderProfile {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        declared_category: None,
        weight_grams: 70_000,
        height_mm: 1_780,
        sex: Sex::Male,
        power_source: PowerSource::Measured,
    }
}
