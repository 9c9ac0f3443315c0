// ABOUTME: Start qualifier: resolves each rider's legitimate start record
// ABOUTME: Precedence rules for restarts, early-start flagging, and the corral pace check
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::debug;

use crate::constants::reasons;
use crate::models::Rider;
use crate::pipeline::assemble::MsecTime;
use crate::race::{RaceDefinition, RaceTuning};

/// Resolve the rider's legitimate start and trim everything before it.
///
/// Returns `false` when no start-line crossing in the correct direction
/// falls inside the start window; the rider is excluded from results
/// entirely, not even reported as a DNF.
///
/// Candidate precedence while scanning in time order:
/// 1. the first matching crossing;
/// 2. any later matching crossing before the gun (riders who re-cross
///    after a false start are judged from their final pre-start
///    position);
/// 3. any later matching crossing within the restart radius of the
///    current candidate's distance (a short back-and-forth near the
///    line is one start event, not a restart).
pub fn qualify_start(rider: &mut Rider, race: &RaceDefinition, tuning: &RaceTuning) -> bool {
    let start_ms = race.start_ms();
    let window_end_ms = start_ms + race.start_window_ms;

    let mut start_idx: Option<usize> = None;
    for (idx, p) in rider.records.iter().enumerate() {
        if p.time_ms > window_end_ms {
            break;
        }
        if p.checkpoint != race.start_line.checkpoint || p.direction != race.start_line.direction {
            continue;
        }
        let replaces = start_idx.is_none_or(|cur| {
            let candidate = &rider.records[cur];
            p.time_ms < start_ms || (p.meters - candidate.meters).abs() <= tuning.restart_radius_m
        });
        if replaces {
            start_idx = Some(idx);
        }
    }

    let Some(start_idx) = start_idx else {
        debug!(rider = rider.id, "no legitimate start, excluded");
        return false;
    };

    check_corral_pace(rider, start_idx, race, tuning);

    rider.records.drain(..start_idx);
    debug!(
        rider = rider.id,
        start = %rider.records[0].stamp(),
        "start resolved"
    );

    // Riders well ahead of the gun keep their ride but carry the
    // violation into the result.
    let resolved = &rider.records[0];
    if resolved.time_ms < start_ms - tuning.early_start_slack_ms {
        let t = MsecTime::new(start_ms - resolved.time_ms);
        let time_ms = resolved.time_ms;
        rider.set_dq(time_ms, format!("Early: -{:2}:{:02}", t.min, t.sec));
    }

    true
}

/// Disqualify riders who rode through the corral faster than the limit.
///
/// Only applies when the venue defines a corral line and the resolved
/// start is within the corral window of the gun. The pace is averaged
/// between the rider's last corral crossing at or before the start and
/// the start itself. Runs before the pre-start records are discarded.
fn check_corral_pace(rider: &mut Rider, start_idx: usize, race: &RaceDefinition, tuning: &RaceTuning) {
    let Some(corral) = race.corral_line else {
        return;
    };
    let start = &rider.records[start_idx];
    if (start.time_ms - race.start_ms()).abs() > tuning.corral_start_window_ms {
        return;
    }
    let Some(corral_idx) = rider.records[..=start_idx]
        .iter()
        .rposition(|p| p.checkpoint == corral)
    else {
        return;
    };
    let crossing = &rider.records[corral_idx];
    let dt_ms = start.time_ms - crossing.time_ms;
    if dt_ms <= 0 {
        return;
    }
    // m/ms * 3600 = km/h
    let pace_kmh = (start.meters - crossing.meters) / dt_ms as f64 * 3_600.0;
    if pace_kmh > tuning.corral_pace_limit_kmh {
        debug!(
            rider = rider.id,
            pace_kmh,
            limit = tuning.corral_pace_limit_kmh,
            "corral pace exceeded"
        );
        let time_ms = crossing.time_ms;
        rider.set_dq(time_ms, reasons::CORRAL_PACE);
    }
}
