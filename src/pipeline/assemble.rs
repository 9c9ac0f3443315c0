// ABOUTME: Results assembler: per-category rankings, behind-leader times, non-finisher lists
// ABOUTME: Owns the tenth-of-a-second display rounding used across the pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::time::{MSEC_PER_HOUR, MSEC_PER_MIN, MSEC_PER_SEC};
use crate::models::{Outcome, Rider, RideSummary, RiderId, Sex};
use crate::pipeline::scoring::CategorySprints;
use crate::race::{RaceDefinition, RaceTuning};

/// Display time rounded up to the next tenth of a second.
///
/// Round-up keeps behind-leader gaps honest: a rider 1 ms behind shows
/// a gap, never the leader's time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsecTime {
    pub hour: i64,
    pub min: i64,
    pub sec: i64,
    pub tenth: i64,
}

impl MsecTime {
    pub const fn new(ms: i64) -> Self {
        // `i64::div_ceil` is unstable (int_roundings); equivalent for a
        // positive divisor: round the quotient up when there is a remainder.
        let ms = (ms / 100 + if ms % 100 > 0 { 1 } else { 0 }) * 100;
        let hour = ms / MSEC_PER_HOUR;
        let ms = ms - hour * MSEC_PER_HOUR;
        let min = ms / MSEC_PER_MIN;
        let ms = ms - min * MSEC_PER_MIN;
        let sec = ms / MSEC_PER_SEC;
        let tenth = (ms - sec * MSEC_PER_SEC) / 100;
        Self {
            hour,
            min,
            sec,
            tenth,
        }
    }
}

/// Per-category cursor for behind-leader time formatting.
///
/// The first finisher's elapsed time is the base; every later time is an
/// offset from the winner's finish. Finishes within the tie gap of the
/// previous rider collapse to the same-time marker.
struct TimePosCursor {
    base_finish: i64,
    prev_finish: i64,
    tie_gap_ms: i64,
}

impl TimePosCursor {
    const fn new(tie_gap_ms: i64) -> Self {
        Self {
            base_finish: 0,
            prev_finish: 0,
            tie_gap_ms,
        }
    }

    fn format(&mut self, start_ms: i64, finish_ms: i64) -> String {
        let mut mark = ' ';
        let elapsed_ms = if self.prev_finish == 0 {
            self.base_finish = finish_ms;
            self.prev_finish = finish_ms;
            finish_ms - start_ms
        } else if finish_ms - self.prev_finish < self.tie_gap_ms {
            self.prev_finish = finish_ms;
            return "--- ST ---".to_owned();
        } else {
            mark = '+';
            self.prev_finish = finish_ms;
            finish_ms - self.base_finish
        };

        let t = MsecTime::new(elapsed_ms);
        if t.hour != 0 {
            format!("{:2}:{:02}:{:02}.{}", t.hour, t.min, t.sec, t.tenth)
        } else if t.min != 0 {
            format!("{mark}  {:2}:{:02}.{}", t.min, t.sec, t.tenth)
        } else if t.sec != 0 {
            format!("{mark}    :{:02}.{}", t.sec, t.tenth)
        } else if t.tenth != 0 {
            format!("{mark}    :00.{}", t.tenth)
        } else {
            // Same time is transitive: a zero offset ties the winner.
            "--- ST ---".to_owned()
        }
    }
}

/// Rider identity as it appears in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderReport {
    /// Platform identifier.
    pub id: RiderId,
    /// Full display name.
    pub name: String,
    /// Resolved category label.
    pub category: String,
    /// Height in centimeters; zero when unknown.
    pub height_cm: f64,
    /// Weight in kilograms; zero when unknown.
    pub weight_kg: f64,
    /// Power-source badge: `'?'` unknown, `'*'` estimated, blank measured.
    pub power_badge: char,
    /// Self-identified sex.
    pub sex: Sex,
}

impl RiderReport {
    fn new(rider: &Rider) -> Self {
        Self {
            id: rider.id,
            name: rider.profile.full_name(),
            category: rider.category.label().to_owned(),
            height_cm: rider.profile.height_cm(),
            weight_kg: rider.profile.weight_kg(),
            power_badge: rider.profile.power_source.badge(),
            sex: rider.profile.sex,
        }
    }
}

/// One ranked finisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinisherResult {
    /// Rank within the category, from 1.
    pub rank: u32,
    /// Formatted time or behind-leader offset.
    pub timepos: String,
    /// The rider.
    pub rider: RiderReport,
    /// Ride summary over the resolved start and finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RideSummary>,
    /// Accumulated sprint and placement points.
    pub points: u32,
    /// Per-segment paces in km/h, start to finish, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splits: Option<Vec<f64>>,
}

/// A rider listed under DQ or DNF.
///
/// Riders who never left the start (zero distance) are not listed at
/// all, so the distance is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonFinisher {
    /// Disqualification reason, for the DQ list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Distance completed, meters.
    pub distance_m: f64,
    /// The rider.
    pub rider: RiderReport,
}

impl NonFinisher {
    fn new(rider: &Rider) -> Self {
        Self {
            reason: rider.dq.as_ref().map(|dq| dq.reason.clone()),
            distance_m: rider.max_distance_m,
            rider: RiderReport::new(rider),
        }
    }
}

/// Results for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResults {
    /// Category label.
    pub category: String,
    /// Finishers, ranked by finish time.
    pub finishers: Vec<FinisherResult>,
    /// Disqualified riders who covered distance, descending.
    pub dq: Vec<NonFinisher>,
    /// Riders who covered distance but never finished, descending.
    pub dnf: Vec<NonFinisher>,
}

/// The complete resolved results of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResults {
    /// Short race identifier.
    pub race_id: String,
    /// Human-readable race name.
    pub race_name: String,
    /// Race date (UTC).
    pub date: NaiveDate,
    /// Nominal start, `HH:MM:SS` UTC.
    pub start_stamp: String,
    /// Query-window cutoff, `HH:MM:SS` UTC.
    pub cutoff_stamp: String,
    /// Per-category results, sorted by category label.
    pub categories: Vec<CategoryResults>,
    /// Per-category intermediate sprint standings.
    pub sprints: Vec<CategorySprints>,
}

/// Build the final report structure from resolved riders.
pub fn assemble(
    riders: &[Rider],
    race: &RaceDefinition,
    tuning: &RaceTuning,
    sprints: Vec<CategorySprints>,
    with_splits: bool,
) -> RaceResults {
    let labels: BTreeSet<&str> = riders.iter().map(|r| r.category.label()).collect();

    let categories = labels
        .into_iter()
        .map(|label| assemble_category(label, riders, tuning, with_splits))
        .collect();

    RaceResults {
        race_id: race.id.clone(),
        race_name: race.name.clone(),
        date: race.date(),
        start_stamp: RaceDefinition::stamp(race.start_ms()),
        cutoff_stamp: RaceDefinition::stamp(race.cutoff_ms),
        categories,
        sprints,
    }
}

fn assemble_category(
    label: &str,
    riders: &[Rider],
    tuning: &RaceTuning,
    with_splits: bool,
) -> CategoryResults {
    let members: Vec<&Rider> = riders
        .iter()
        .filter(|r| r.category.label() == label)
        .collect();

    let mut finishers: Vec<&Rider> = members
        .iter()
        .copied()
        .filter(|r| r.outcome == Outcome::Finisher)
        .collect();
    finishers.sort_by_key(|r| (r.finish_time_ms(), r.id));

    let mut cursor = TimePosCursor::new(tuning.tie_gap_ms);
    let finishers = finishers
        .into_iter()
        .enumerate()
        .map(|(idx, rider)| {
            let timepos = match (rider.start_time_ms(), rider.finish_time_ms()) {
                (Some(start_ms), Some(finish_ms)) => cursor.format(start_ms, finish_ms),
                _ => String::new(),
            };
            FinisherResult {
                rank: idx as u32 + 1,
                timepos,
                rider: RiderReport::new(rider),
                summary: rider.summary.clone(),
                points: rider.points,
                splits: with_splits.then(|| splits(rider)).flatten(),
            }
        })
        .collect();

    CategoryResults {
        category: label.to_owned(),
        finishers,
        dq: non_finishers(&members, Outcome::Dq),
        dnf: non_finishers(&members, Outcome::Dnf),
    }
}

fn non_finishers(members: &[&Rider], outcome: Outcome) -> Vec<NonFinisher> {
    let mut list: Vec<&Rider> = members
        .iter()
        .copied()
        .filter(|r| r.outcome == outcome && r.max_distance_m > 0.0)
        .collect();
    list.sort_by(|a, b| {
        b.max_distance_m
            .total_cmp(&a.max_distance_m)
            .then_with(|| a.id.cmp(&b.id))
    });
    list.into_iter().map(NonFinisher::new).collect()
}

/// Average pace over each recorded segment of the ride, km/h.
fn splits(rider: &Rider) -> Option<Vec<f64>> {
    let finish_idx = rider.finish_index?;
    let mut paces = Vec::with_capacity(finish_idx);
    for pair in rider.records[..=finish_idx].windows(2) {
        let dt_ms = pair[1].time_ms - pair[0].time_ms;
        if dt_ms <= 0 {
            continue;
        }
        // m/ms * 3600 = km/h
        paces.push((pair[1].meters - pair[0].meters) / dt_ms as f64 * 3_600.0);
    }
    Some(paces)
}
