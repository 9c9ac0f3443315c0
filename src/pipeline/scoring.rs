// ABOUTME: Scoring engine: intermediate sprint points and final-placement points
// ABOUTME: Single chronological pass over all riders with one explicit cursor per category
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Rider;
use crate::race::RaceDefinition;

/// One rider's placing within a closed sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPlacing {
    /// Points earned; zero beyond the points table.
    pub points: u32,
    /// The rider.
    pub rider: i64,
}

/// A closed sprint: every same-category crossing of the sprint's line
/// while its definition was active, in crossing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintStanding {
    /// Sprint name from the definition.
    pub sprint: String,
    /// The definition's threshold distance, meters.
    pub distance_m: f64,
    /// Placings in crossing order.
    pub placings: Vec<SprintPlacing>,
}

/// All closed sprints for one category, in course order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySprints {
    /// Category label.
    pub category: String,
    /// Closed sprints, ordered by threshold distance.
    pub sprints: Vec<SprintStanding>,
}

/// Per-category scoring state: which sprint definition is active, the
/// open placings list, closed standings, and the finish count for
/// placement points. Explicit state passed through the loop, nothing
/// process-wide.
#[derive(Debug, Default)]
struct CategoryCursor {
    active: usize,
    open: Vec<SprintPlacing>,
    closed: Vec<SprintStanding>,
    finishers: u32,
}

impl CategoryCursor {
    fn close_active(&mut self, race: &RaceDefinition) {
        if let Some(def) = race.sprints.get(self.active) {
            self.closed.push(SprintStanding {
                sprint: def.name.clone(),
                distance_m: def.distance_m,
                placings: std::mem::take(&mut self.open),
            });
        }
    }
}

/// Award sprint and placement points across all riders.
///
/// Processes the shared stream of (record, rider) pairs once, in strict
/// timestamp order. Riders' accumulated points are updated in place; the
/// returned standings are the per-category closed sprint lists for
/// reporting. The stable event sort makes the pass deterministic for a
/// given rider set.
pub fn score(riders: &mut [Rider], race: &RaceDefinition) -> Vec<CategorySprints> {
    if race.sprints.is_empty() && race.final_points.is_empty() {
        return Vec::new();
    }

    // (time_ms, rider slot, record index); stable sort keeps each
    // rider's own records in sequence at equal timestamps.
    let mut events: Vec<(i64, usize, usize)> = Vec::new();
    for (slot, rider) in riders.iter().enumerate() {
        for (idx, p) in rider.records.iter().enumerate() {
            events.push((p.time_ms, slot, idx));
        }
    }
    events.sort_by_key(|&(time_ms, _, _)| time_ms);

    let labels: Vec<String> = riders
        .iter()
        .map(|r| r.category.label().to_owned())
        .collect();

    let mut cursors: BTreeMap<String, CategoryCursor> = BTreeMap::new();
    for (_, slot, idx) in events {
        let rider = &riders[slot];
        let Some(start) = rider.start() else {
            continue;
        };
        let record = &rider.records[idx];
        let distance = record.meters - start.meters;
        let is_finish = rider.finish_index == Some(idx);
        let before_finish = rider.finish_index.is_none_or(|fi| idx < fi);

        let cursor = cursors.entry(labels[slot].clone()).or_default();

        // Passing the next definition's threshold closes the open sprint
        // and activates the next one.
        while race
            .sprints
            .get(cursor.active + 1)
            .is_some_and(|next| distance >= next.distance_m)
        {
            cursor.close_active(race);
            cursor.active += 1;
        }

        let mut earned = 0_u32;
        if let Some(def) = race.sprints.get(cursor.active) {
            if before_finish
                && record.checkpoint == def.checkpoint
                && record.direction == def.direction
            {
                let rank = cursor.open.len();
                let points = def.points.get(rank).copied().unwrap_or(0);
                cursor.open.push(SprintPlacing {
                    points,
                    rider: rider.id,
                });
                earned += points;
                debug!(rider = rider.id, sprint = %def.name, rank = rank + 1, points, "sprint crossing");
            }
        }

        if is_finish {
            cursor.finishers += 1;
            let rank = (cursor.finishers - 1) as usize;
            let points = race.final_points.get(rank).copied().unwrap_or(0);
            earned += points;
            if points > 0 {
                debug!(rider = rider.id, rank = cursor.finishers, points, "placement points");
            }
        }

        if earned > 0 {
            riders[slot].points += earned;
        }
    }

    cursors
        .into_iter()
        .map(|(category, mut cursor)| {
            cursor.close_active(race);
            CategorySprints {
                category,
                sprints: cursor.closed,
            }
        })
        .collect()
}
