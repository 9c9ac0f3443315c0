// ABOUTME: Finish-group resolver: evaluates every category group per rider
// ABOUTME: Weighted selection, implied early-start disqualification, terminal outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;
use tracing::debug;

use crate::models::{estimate_from_wkg, Disqualification, FinishCandidate, Outcome, Rider,
    RideSummary, RiderId};
use crate::pipeline::assemble::MsecTime;
use crate::race::RaceDefinition;

/// A category group with its effective start time resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedGroup {
    pub name: String,
    pub distance_m: f64,
    pub start_ms: i64,
    /// The lead rider whose observed start set `start_ms`, if any.
    pub starter: Option<RiderId>,
}

/// Resolve each group's effective start: the lead rider's observed
/// start when that rider qualified, else the fixed delay, else the
/// nominal start.
pub fn resolve_group_starts(race: &RaceDefinition, riders: &[Rider]) -> Vec<ResolvedGroup> {
    let nominal_ms = race.start_ms();
    race.groups
        .iter()
        .map(|group| {
            let lead = group.lead_rider.and_then(|id| {
                riders
                    .iter()
                    .find(|r| r.id == id)
                    .and_then(|r| r.start_time_ms().map(|ms| (id, ms)))
            });
            let (starter, start_ms) = match (lead, group.delay_ms) {
                (Some((id, ms)), _) => (Some(id), ms),
                (None, Some(delay)) => (None, nominal_ms + delay),
                (None, None) => (None, nominal_ms),
            };
            debug!(group = %group.name, start_ms, ?starter, "group start resolved");
            ResolvedGroup {
                name: group.name.clone(),
                distance_m: group.distance_m,
                start_ms,
                starter,
            }
        })
        .collect()
}

/// Evaluate one finish candidate per category group for this rider.
pub fn evaluate_candidates(
    rider: &mut Rider,
    groups: &[ResolvedGroup],
    race: &RaceDefinition,
) {
    rider.candidates = groups
        .iter()
        .map(|group| evaluate_one(rider, group, race))
        .collect();
}

fn evaluate_one(rider: &Rider, group: &ResolvedGroup, race: &RaceDefinition) -> FinishCandidate {
    let mut candidate = FinishCandidate {
        group: group.name.clone(),
        group_start_ms: group.start_ms,
        finish_index: None,
        implied_dq: None,
    };
    let Some(start) = rider.start() else {
        return candidate;
    };

    // First record (after the start) that reaches the group distance
    // while crossing the finish line in the expected direction. The
    // expectation mirrors the course trimmer so a retained violating
    // crossing can never become a finish.
    let mut expected = race.finish_line.direction;
    for (idx, p) in rider.records.iter().enumerate().skip(1) {
        if p.checkpoint != race.finish_line.checkpoint {
            continue;
        }
        if p.direction == expected && p.meters - start.meters >= group.distance_m {
            candidate.finish_index = Some(idx);
            break;
        }
        if race.alternating {
            expected = expected.flipped();
        }
    }

    // No finish means DNF for this group; an early start implies nothing.
    if candidate.finish_index.is_none() {
        return candidate;
    }

    // Started after this group went off: the group does not apply,
    // the candidate stays inert.
    if start.time_ms > group.start_ms {
        return candidate;
    }

    let early_ms = group.start_ms - start.time_ms;
    if early_ms <= race.grace_ms {
        return candidate;
    }

    let t = MsecTime::new(early_ms);
    candidate.implied_dq = Some(Disqualification {
        time_ms: group.start_ms,
        reason: format!("Early: {:2}:{:02}", t.min, t.sec),
    });
    candidate
}

/// Select the authoritative finish candidate and finalize the rider.
///
/// Known-category riders are restricted to groups whose name contains
/// their category letter, falling back to the unrestricted best; unknown
/// riders take the best-weighted candidate outright, and in
/// ignore-categories mode adopt the selected group's name as their
/// category. This is the terminal state transition: Pending becomes
/// Finisher, DNF, or DQ and never changes again within a run.
pub fn select_finish(rider: &mut Rider, ignore_categories: bool) {
    let Some(start_ms) = rider.start_time_ms() else {
        return;
    };

    let indices: Vec<usize> = (0..rider.candidates.len()).collect();
    let Some(best) = best_index(&rider.candidates, &indices, start_ms) else {
        return;
    };

    let selected = rider.category.letter().map_or(best, |letter| {
        let matching: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| rider.candidates[i].group.contains(letter))
            .collect();
        best_index(&rider.candidates, &matching, start_ms).unwrap_or(best)
    });

    let selected = rider.candidates[selected].clone();
    if rider.category.is_unknown() && ignore_categories {
        rider.category = crate::models::Category::Group(selected.group.clone());
    }
    if let Some(dq) = &selected.implied_dq {
        rider.set_dq(dq.time_ms, dq.reason.clone());
    }
    debug!(
        rider = rider.id,
        group = %selected.group,
        finish = ?selected.finish_index,
        "finish group selected"
    );
    rider.group = Some(selected.group);
    rider.finish_index = selected.finish_index;

    finalize(rider);
}

/// Highest-weighted candidate among `indices`; earlier-declared groups
/// win ties.
fn best_index(candidates: &[FinishCandidate], indices: &[usize], start_ms: i64) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for &i in indices {
        let weight = candidates[i].weight(start_ms);
        if best.is_none_or(|(_, top)| weight > top) {
            best = Some((i, weight));
        }
    }
    best.map(|(i, _)| i)
}

/// Compute the terminal outcome and, when a finish exists, the ride
/// summary.
fn finalize(rider: &mut Rider) {
    rider.outcome = if rider.is_disqualified() {
        Outcome::Dq
    } else if rider.finish_index.is_none() {
        Outcome::Dnf
    } else {
        Outcome::Finisher
    };

    let summary = match (rider.start(), rider.finish()) {
        (Some(start), Some(end)) => {
            let elapsed_ms = end.time_ms - start.time_ms;
            let mwh = end.mwh - start.mwh;
            let average_watts = if elapsed_ms > 0 {
                mwh * 3_600.0 / elapsed_ms as f64
            } else {
                0.0
            };
            let watts_per_kg = if rider.profile.weight_grams > 0 {
                average_watts * 1_000.0 / f64::from(rider.profile.weight_grams)
            } else {
                0.0
            };
            Some(RideSummary {
                meters: end.meters - start.meters,
                mwh,
                duration_ms: end.duration_ms - start.duration_ms,
                elapsed_ms,
                average_watts,
                watts_per_kg,
                estimated_category: estimate_from_wkg(watts_per_kg, rider.profile.sex),
                begin_hr: start.heart_rate,
                end_hr: end.heart_rate,
            })
        }
        _ => None,
    };
    rider.summary = summary;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::{Category, CheckpointId, Direction, PositionRecord};
    use crate::race::CategoryGroup;
    use chrono::{TimeZone, Utc};

    const START: CheckpointId = CheckpointId(1);
    const FINISH: CheckpointId = CheckpointId(2);

    fn race() -> RaceDefinition {
        RaceDefinition::builder("t", "test")
            .start(Utc.with_ymd_and_hms(2023, 10, 3, 17, 0, 0).unwrap())
            .start_line(START, Direction::Forward)
            .finish_line(FINISH, Direction::Forward)
            .group(CategoryGroup {
                name: "A".to_owned(),
                distance_m: 10_000.0,
                lead_rider: None,
                delay_ms: None,
            })
            .build()
            .unwrap()
    }

    fn rec(time_ms: i64, line: CheckpointId, meters: f64) -> PositionRecord {
        PositionRecord {
            time_ms,
            checkpoint: line,
            direction: Direction::Forward,
            meters,
            mwh: meters * 10.0,
            duration_ms: time_ms,
            elevation_m: 0.0,
            speed_m_per_hr: 30_000.0,
            heart_rate: Some(150),
        }
    }

    fn group(name: &str, distance_m: f64, start_ms: i64) -> ResolvedGroup {
        ResolvedGroup {
            name: name.to_owned(),
            distance_m,
            start_ms,
            starter: None,
        }
    }

    /// Rider whose trimmed ride starts at `start_ms` and reaches
    /// `meters` past the start at the finish line.
    fn finisher(start_ms: i64, meters: f64, finish_ms: i64) -> Rider {
        let mut rider = Rider::new(1);
        rider.records = vec![
            rec(start_ms, START, 1_000.0),
            rec(finish_ms, FINISH, 1_000.0 + meters),
        ];
        rider
    }

    #[test]
    fn lead_rider_start_defines_the_group_start() {
        let race = race();
        let nominal = race.start_ms();
        let mut lead = Rider::new(7);
        lead.records = vec![rec(nominal + 3_000, START, 1_000.0)];

        let mut race = race;
        race.groups = vec![
            CategoryGroup {
                name: "A".to_owned(),
                distance_m: 10_000.0,
                lead_rider: Some(7),
                delay_ms: None,
            },
            CategoryGroup {
                name: "B".to_owned(),
                distance_m: 10_000.0,
                lead_rider: None,
                delay_ms: Some(60_000),
            },
            CategoryGroup {
                name: "C".to_owned(),
                distance_m: 10_000.0,
                lead_rider: Some(99),
                delay_ms: None,
            },
        ];
        let groups = resolve_group_starts(&race, &[lead]);
        assert_eq!(groups[0].start_ms, nominal + 3_000);
        assert_eq!(groups[0].starter, Some(7));
        assert_eq!(groups[1].start_ms, nominal + 60_000);
        assert_eq!(groups[2].start_ms, nominal);
        assert_eq!(groups[2].starter, None);
    }

    #[test]
    fn finish_requires_distance_at_the_finish_line() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = Rider::new(1);
        rider.records = vec![
            rec(start_ms, START, 1_000.0),
            rec(start_ms + 600_000, FINISH, 6_000.0),
            rec(start_ms + 1_200_000, FINISH, 11_500.0),
        ];
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        assert_eq!(rider.candidates[0].finish_index, Some(2));
        assert!(rider.candidates[0].implied_dq.is_none());
    }

    #[test]
    fn unreached_distance_is_a_dnf_candidate() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 6_000.0, start_ms + 600_000);
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        assert_eq!(rider.candidates[0].finish_index, None);
    }

    #[test]
    fn early_start_beyond_grace_implies_disqualification() {
        let race = race();
        let group_start = race.start_ms();
        let mut rider = finisher(group_start - 10_000, 12_000.0, group_start + 600_000);
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, group_start)], &race);
        let dq = rider.candidates[0].implied_dq.clone().unwrap();
        assert_eq!(dq.time_ms, group_start);
        assert_eq!(dq.reason, "Early:  0:10");
    }

    #[test]
    fn early_start_within_grace_is_clean() {
        let race = race();
        let group_start = race.start_ms();
        let mut rider = finisher(group_start - 5_000, 12_000.0, group_start + 600_000);
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, group_start)], &race);
        assert!(rider.candidates[0].implied_dq.is_none());
    }

    #[test]
    fn start_after_the_group_never_implies_disqualification() {
        let race = race();
        let group_start = race.start_ms() - 120_000;
        let mut rider = finisher(race.start_ms(), 12_000.0, race.start_ms() + 600_000);
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, group_start)], &race);
        assert!(rider.candidates[0].finish_index.is_some());
        assert!(rider.candidates[0].implied_dq.is_none());
    }

    #[test]
    fn close_start_match_outweighs_a_distant_finish() {
        let race = race();
        let start_ms = race.start_ms();
        // Reaches 6 km: finishes the 5 km group, not the 10 km one.
        let mut rider = finisher(start_ms + 120_000, 6_000.0, start_ms + 720_000);
        evaluate_candidates(
            &mut rider,
            &[
                group("A", 10_000.0, start_ms + 115_000),
                group("B", 5_000.0, start_ms),
            ],
            &race,
        );
        // A: -5 with no finish; B: -120 + 10 for the finish.
        assert_eq!(rider.candidates[0].weight(rider.start_time_ms().unwrap()), -5);
        assert_eq!(
            rider.candidates[1].weight(rider.start_time_ms().unwrap()),
            -110
        );
        select_finish(&mut rider, false);
        assert_eq!(rider.group.as_deref(), Some("A"));
        assert_eq!(rider.outcome, Outcome::Dnf);
    }

    #[test]
    fn finish_bonus_outweighs_a_two_minute_start_mismatch() {
        let race = race();
        let start_ms = race.start_ms();
        // Reaches 6 km: finishes B's 5 km, not A's 10 km.
        let mut rider = finisher(start_ms, 6_000.0, start_ms + 600_000);
        evaluate_candidates(
            &mut rider,
            &[
                group("A", 10_000.0, start_ms - 120_000),
                group("B", 5_000.0, start_ms - 5_000),
            ],
            &race,
        );
        // A: -120 with no finish; B: -5 + 10 for the finish.
        assert_eq!(rider.candidates[0].weight(start_ms), -120);
        assert_eq!(rider.candidates[1].weight(start_ms), 5);
        select_finish(&mut rider, false);
        assert_eq!(rider.group.as_deref(), Some("B"));
        assert_eq!(rider.outcome, Outcome::Finisher);
    }

    #[test]
    fn at_equal_start_mismatch_a_finish_wins_despite_its_penalty() {
        let race = race();
        let start_ms = race.start_ms();
        let group_start = start_ms + 20_000;
        // 20 s early for both groups, beyond the grace period, so the
        // finishing candidate carries an implied disqualification.
        let mut rider = finisher(start_ms, 6_000.0, start_ms + 600_000);
        evaluate_candidates(
            &mut rider,
            &[
                group("A", 10_000.0, group_start),
                group("B", 5_000.0, group_start),
            ],
            &race,
        );
        assert_eq!(rider.candidates[0].weight(start_ms), -20);
        assert_eq!(rider.candidates[1].weight(start_ms), -13);
        select_finish(&mut rider, false);
        assert_eq!(rider.group.as_deref(), Some("B"));
        assert_eq!(rider.outcome, Outcome::Dq);
    }

    #[test]
    fn category_letter_restricts_group_choice() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 6_000.0, start_ms + 600_000);
        rider.category = Category::B;
        evaluate_candidates(
            &mut rider,
            &[group("A", 5_000.0, start_ms), group("B", 5_000.0, start_ms)],
            &race,
        );
        select_finish(&mut rider, false);
        assert_eq!(rider.group.as_deref(), Some("B"));
        assert_eq!(rider.outcome, Outcome::Finisher);
    }

    #[test]
    fn letter_with_no_matching_group_falls_back_to_best() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 6_000.0, start_ms + 600_000);
        rider.category = Category::W;
        evaluate_candidates(&mut rider, &[group("A", 5_000.0, start_ms)], &race);
        select_finish(&mut rider, false);
        assert_eq!(rider.group.as_deref(), Some("A"));
    }

    #[test]
    fn unknown_rider_folds_into_the_selected_group() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 12_000.0, start_ms + 600_000);
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        select_finish(&mut rider, true);
        assert_eq!(rider.category, Category::Group("A".to_owned()));
    }

    #[test]
    fn disqualification_before_the_finish_taints_the_result() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 12_000.0, start_ms + 600_000);
        rider.set_dq(start_ms + 60_000, "wrong course");
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        select_finish(&mut rider, false);
        assert_eq!(rider.outcome, Outcome::Dq);
    }

    #[test]
    fn disqualification_after_the_finish_does_not() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = finisher(start_ms, 12_000.0, start_ms + 600_000);
        rider.set_dq(start_ms + 700_000, "wrong course");
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        select_finish(&mut rider, false);
        assert_eq!(rider.outcome, Outcome::Finisher);
    }

    #[test]
    fn finisher_summary_reports_power_metrics() {
        let race = race();
        let start_ms = race.start_ms();
        let mut rider = Rider::new(1);
        rider.profile.weight_grams = 75_000;
        rider.records = vec![
            rec(start_ms, START, 1_000.0),
            rec(start_ms + 1_800_000, FINISH, 13_000.0),
        ];
        // mwh tracks meters at 10 mWh/m in rec(), so 120 000 mWh over
        // 30 minutes: 240 W, 3.2 W/kg.
        evaluate_candidates(&mut rider, &[group("A", 10_000.0, start_ms)], &race);
        select_finish(&mut rider, false);
        let summary = rider.summary.unwrap();
        assert!((summary.average_watts - 240.0).abs() < 1e-9);
        assert!((summary.watts_per_kg - 3.2).abs() < 1e-9);
        assert_eq!(summary.elapsed_ms, 1_800_000);
    }
}
