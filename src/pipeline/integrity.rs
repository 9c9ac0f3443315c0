// ABOUTME: Integrity trimmer: course-violation and crash/corruption truncation
// ABOUTME: Two independent passes; the earlier-timestamped disqualification wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::debug;

use crate::constants::reasons;
use crate::models::Rider;
use crate::race::RaceDefinition;

/// Trim the ride at the first finish-line crossing in the wrong expected
/// direction.
///
/// The expectation starts at the finish line's required direction and,
/// on alternating (out-and-back) courses, flips after every crossing.
/// The violating crossing is kept, since it carries the disqualification
/// timestamp, and everything after it is dropped.
pub fn trim_course(rider: &mut Rider, race: &RaceDefinition) {
    let mut expected = race.finish_line.direction;
    let mut violation: Option<(usize, i64)> = None;
    for (idx, p) in rider.records.iter().enumerate().skip(1) {
        if p.checkpoint != race.finish_line.checkpoint {
            continue;
        }
        if p.direction != expected {
            violation = Some((idx, p.time_ms));
            break;
        }
        if race.alternating {
            expected = expected.flipped();
        }
    }
    if let Some((idx, time_ms)) = violation {
        debug!(rider = rider.id, idx, "wrong-direction finish crossing");
        rider.set_dq(time_ms, reasons::WRONG_COURSE);
        rider.records.truncate(idx + 1);
    }
}

/// Trim the ride at the first physically impossible record.
///
/// Cumulative distance, energy, and ride duration can only grow; a
/// decrease relative to the immediate predecessor means the telemetry
/// crashed or was corrupted. The sequence is truncated at exactly that
/// index (the offending record is dropped, keeping the retained
/// sequence monotonic) and max distance is clamped to the maximum seen
/// before the truncation.
pub fn trim_crash(rider: &mut Rider) {
    let Some(start) = rider.records.first() else {
        return;
    };
    let start_meters = start.meters;

    let mut max_distance = 0.0_f64;
    let mut anomaly: Option<(usize, i64)> = None;
    for idx in 1..rider.records.len() {
        let prev = &rider.records[idx - 1];
        let p = &rider.records[idx];
        if p.meters < prev.meters || p.mwh < prev.mwh || p.duration_ms < prev.duration_ms {
            anomaly = Some((idx, p.time_ms));
            break;
        }
        max_distance = max_distance.max(p.meters - start_meters);
    }

    rider.max_distance_m = max_distance;
    if let Some((idx, time_ms)) = anomaly {
        debug!(rider = rider.id, idx, "telemetry rollback, ride truncated");
        rider.set_dq(time_ms, reasons::CRASHED);
        rider.records.truncate(idx);
    }
}
