// ABOUTME: Rider aggregate: profile, ordered crossings, disqualification state, outcome
// ABOUTME: Owns FinishCandidate evaluation results and the resolved ride summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::selection::{FINISH_BONUS, IMPLIED_DQ_PENALTY};
use crate::constants::time::MSEC_PER_SEC;
use crate::models::category::{self, Category};
use crate::models::position::PositionRecord;

/// Rider identifier, as assigned by the telemetry platform.
pub type RiderId = i64;

/// Self-identified sex, used only for the estimated-category tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Female-identified rider.
    Female,
    /// Male-identified rider.
    Male,
}

/// Trust class of the rider's power source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    /// Unknown power source.
    Unknown,
    /// Estimated (virtual) power.
    Estimated,
    /// Measured by a power meter.
    Measured,
    /// Measured by a certified trainer.
    Certified,
}

impl PowerSource {
    /// Single-character badge shown beside the rider's time in reports.
    #[must_use]
    pub const fn badge(self) -> char {
        match self {
            Self::Unknown => '?',
            Self::Estimated => '*',
            Self::Measured | Self::Certified => ' ',
        }
    }
}

/// Reference metadata for a rider, from the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderProfile {
    /// First name.
    pub first_name: String,
    /// Last name; may carry a category tag (see [`category::infer_from_name`]).
    pub last_name: String,
    /// Category on record, when the platform has one.
    pub declared_category: Option<Category>,
    /// Weight in grams; zero when unknown.
    pub weight_grams: u32,
    /// Height in millimeters; zero when unknown.
    pub height_mm: u32,
    /// Self-identified sex.
    pub sex: Sex,
    /// Power source class.
    pub power_source: PowerSource,
}

impl RiderProfile {
    /// Placeholder identity used when the profile lookup misses; the
    /// pipeline proceeds and reports the rider under this identity.
    #[must_use]
    pub fn placeholder(id: RiderId) -> Self {
        Self {
            first_name: "Rider".to_owned(),
            last_name: id.to_string(),
            declared_category: None,
            weight_grams: 0,
            height_mm: 0,
            sex: Sex::Female,
            power_source: PowerSource::Unknown,
        }
    }

    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Weight in kilograms.
    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight_grams) / 1_000.0
    }

    /// Height in centimeters.
    #[must_use]
    pub fn height_cm(&self) -> f64 {
        f64::from(self.height_mm) / 10.0
    }
}

/// A disqualification: timestamp plus human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disqualification {
    /// When the violation occurred, epoch milliseconds.
    pub time_ms: i64,
    /// Why the rider was disqualified.
    pub reason: String,
}

/// Terminal classification of a rider within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Not yet resolved by the finish-group resolver.
    Pending,
    /// Completed the selected group's distance.
    Finisher,
    /// Valid start but never reached the distance.
    Dnf,
    /// Disqualified before completing, or disqualified without a finish.
    Dq,
}

/// Summary metrics over the resolved ride, start record to finish record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSummary {
    /// Distance ridden, meters.
    pub meters: f64,
    /// Energy expended, milliwatt-hours.
    pub mwh: f64,
    /// Ride-clock duration, milliseconds.
    pub duration_ms: i64,
    /// Wall-clock elapsed time, milliseconds.
    pub elapsed_ms: i64,
    /// Average power, watts.
    pub average_watts: f64,
    /// Power-to-weight, watts per kilogram; zero when weight is unknown.
    pub watts_per_kg: f64,
    /// Category estimated from watts/kg.
    pub estimated_category: Category,
    /// Heart rate at the start record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_hr: Option<u32>,
    /// Heart rate at the finish record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_hr: Option<u32>,
}

/// Per-(rider, group) evaluation result from the finish-group resolver.
///
/// A candidate with no finish index means the group's distance was never
/// reached at the finish line; selecting it makes the rider a DNF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishCandidate {
    /// The evaluated group's name.
    pub group: String,
    /// The group's resolved effective start, epoch milliseconds.
    pub group_start_ms: i64,
    /// Index into the rider's records of the finish position, if any.
    pub finish_index: Option<usize>,
    /// Disqualification implied by starting too early for this group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_dq: Option<Disqualification>,
}

impl FinishCandidate {
    /// Selection weight, higher wins: the negated start-time mismatch in
    /// seconds, minus a penalty for an implied disqualification, plus a
    /// bonus for an actual finish.
    #[must_use]
    pub fn weight(&self, rider_start_ms: i64) -> i64 {
        let mut weight = -((self.group_start_ms - rider_start_ms).abs() / MSEC_PER_SEC);
        if self.implied_dq.is_some() {
            weight -= IMPLIED_DQ_PENALTY;
        }
        if self.finish_index.is_some() {
            weight += FINISH_BONUS;
        }
        weight
    }
}

/// A participant and everything the pipeline derives about them.
///
/// Created per pipeline run and discarded once results are emitted. The
/// rider exclusively owns its record sequence; the only mutation applied
/// to the records themselves is truncation of a trailing suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    /// Platform identifier.
    pub id: RiderId,
    /// Reference metadata (placeholder when the lookup missed).
    pub profile: RiderProfile,
    /// Working category: declared, name-inferred, or folded group name.
    pub category: Category,
    /// Ordered checkpoint crossings for the query window; after start
    /// qualification, index 0 is the start record.
    pub records: Vec<PositionRecord>,
    /// Earliest disqualification, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<Disqualification>,
    /// Maximum distance reached relative to the start record, meters.
    pub max_distance_m: f64,
    /// One candidate per evaluated category group.
    pub candidates: Vec<FinishCandidate>,
    /// Name of the selected group, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Index of the selected finish record; absence means DNF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_index: Option<usize>,
    /// Ride summary, computed when a finish record exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RideSummary>,
    /// Accumulated sprint and placement points.
    pub points: u32,
    /// Terminal classification.
    pub outcome: Outcome,
}

impl Rider {
    /// New rider with a placeholder identity and no derived state.
    #[must_use]
    pub fn new(id: RiderId) -> Self {
        Self {
            id,
            profile: RiderProfile::placeholder(id),
            category: Category::Unknown,
            records: Vec::new(),
            dq: None,
            max_distance_m: 0.0,
            candidates: Vec::new(),
            group: None,
            finish_index: None,
            summary: None,
            points: 0,
            outcome: Outcome::Pending,
        }
    }

    /// Attach reference metadata and resolve the working category. A
    /// valid category tag in the name wins over the category on record;
    /// riders keep their tags fresher than the platform does. In
    /// ignore-categories mode every rider starts unknown and is folded
    /// into a group name at selection time.
    pub fn apply_profile(&mut self, profile: RiderProfile, ignore_categories: bool) {
        self.category = if ignore_categories {
            Category::Unknown
        } else {
            let inferred = category::infer_from_name(&profile.last_name);
            if inferred.is_unknown() {
                profile.declared_category.clone().unwrap_or(Category::Unknown)
            } else {
                inferred
            }
        };
        self.profile = profile;
    }

    /// Record a disqualification; earliest wins. This is the only path
    /// that mutates disqualification state; later, worse offenses never
    /// displace an earlier one.
    pub fn set_dq(&mut self, time_ms: i64, reason: impl Into<String>) {
        if self.dq.as_ref().is_none_or(|dq| time_ms < dq.time_ms) {
            let reason = reason.into();
            debug!(rider = self.id, time_ms, %reason, "disqualified");
            self.dq = Some(Disqualification { time_ms, reason });
        }
    }

    /// The start record, once qualification has trimmed the sequence.
    #[must_use]
    pub fn start(&self) -> Option<&PositionRecord> {
        self.records.first()
    }

    /// Start time of the qualified ride, epoch milliseconds.
    #[must_use]
    pub fn start_time_ms(&self) -> Option<i64> {
        self.start().map(|p| p.time_ms)
    }

    /// The selected finish record.
    #[must_use]
    pub fn finish(&self) -> Option<&PositionRecord> {
        self.finish_index.and_then(|idx| self.records.get(idx))
    }

    /// Finish time, epoch milliseconds; absence means DNF.
    #[must_use]
    pub fn finish_time_ms(&self) -> Option<i64> {
        self.finish().map(|p| p.time_ms)
    }

    /// Whether the disqualification taints the result: it exists and
    /// either precedes the finish or the rider never finished.
    #[must_use]
    pub fn is_disqualified(&self) -> bool {
        self.dq.as_ref().is_some_and(|dq| {
            self.finish_time_ms()
                .is_none_or(|end_ms| dq.time_ms < end_ms)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn profile(last_name: &str, declared: Option<Category>) -> RiderProfile {
        RiderProfile {
            first_name: "Test".to_owned(),
            last_name: last_name.to_owned(),
            declared_category: declared,
            weight_grams: 70_000,
            height_mm: 1_780,
            sex: Sex::Male,
            power_source: PowerSource::Measured,
        }
    }

    #[test]
    fn name_tag_overrides_the_declared_category() {
        let mut rider = Rider::new(1);
        rider.apply_profile(profile("Smith (B)", Some(Category::A)), false);
        assert_eq!(rider.category, Category::B);
    }

    #[test]
    fn declared_category_covers_untagged_names() {
        let mut rider = Rider::new(1);
        rider.apply_profile(profile("Smith", Some(Category::A)), false);
        assert_eq!(rider.category, Category::A);

        let mut rider = Rider::new(2);
        rider.apply_profile(profile("Smith", None), false);
        assert_eq!(rider.category, Category::Unknown);
    }

    #[test]
    fn ignore_categories_discards_both_sources() {
        let mut rider = Rider::new(1);
        rider.apply_profile(profile("Smith (B)", Some(Category::A)), true);
        assert_eq!(rider.category, Category::Unknown);
    }

    #[test]
    fn earliest_disqualification_wins() {
        let mut rider = Rider::new(1);
        rider.set_dq(2_000, "crashed");
        rider.set_dq(1_000, "wrong course");
        rider.set_dq(3_000, "crashed");
        let dq = rider.dq.unwrap();
        assert_eq!(dq.time_ms, 1_000);
        assert_eq!(dq.reason, "wrong course");
    }
}
