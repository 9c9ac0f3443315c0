// ABOUTME: Pipeline orchestrator: fixed stage order from telemetry window to results
// ABOUTME: Per-rider stages run in parallel; scoring is a strict chronological pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Results Pipeline
//!
//! One run resolves one event: load the telemetry window, qualify
//! starts, trim integrity violations, resolve finish groups, score, and
//! assemble the report. The stage order is fixed; each stage consumes
//! only what earlier stages produced, so per-rider stages parallelize
//! freely while scoring stays a single chronological pass.

mod assemble;
mod finish;
mod integrity;
mod scoring;
mod start;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::RaceResult;
use crate::models::{Outcome, Rider, RiderId, RiderProfile};
use crate::race::{RaceDefinition, RaceTuning};
use crate::store::TelemetryStore;

pub use assemble::{CategoryResults, FinisherResult, NonFinisher, RaceResults, RiderReport};
pub use scoring::{CategorySprints, SprintPlacing, SprintStanding};

/// Per-run options that change how riders are categorized and reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Ignore declared and name-inferred categories; riders adopt the
    /// name of the group that resolves their finish.
    pub ignore_categories: bool,
    /// Include per-segment paces for every finisher.
    pub with_splits: bool,
}

/// Resolve one event end to end.
///
/// Queries the store for the race's telemetry window and runs every
/// stage in order. Two runs over the same stored telemetry and the same
/// definition produce identical results.
///
/// # Errors
/// Returns a [`crate::RaceError`] when a store read fails. Rider-level
/// anomalies never abort the run; they surface as exclusions,
/// disqualifications, or placeholder identities in the results.
pub fn resolve_race(
    store: &dyn TelemetryStore,
    race: &RaceDefinition,
    tuning: &RaceTuning,
    options: &ResolveOptions,
) -> RaceResult<RaceResults> {
    let begin_ms = race.start_ms() - race.lookback_ms;
    let rows = store.positions_in_window(begin_ms, race.cutoff_ms)?;
    info!(race = %race.id, rows = rows.len(), "telemetry window loaded");

    // The store returns records time-ascending, so per-rider sequences
    // stay ordered under this grouping.
    let mut by_rider: BTreeMap<RiderId, Rider> = BTreeMap::new();
    for (id, record) in rows {
        by_rider
            .entry(id)
            .or_insert_with(|| Rider::new(id))
            .records
            .push(record);
    }
    let observed = by_rider.len();

    let mut riders: Vec<Rider> = by_rider
        .into_values()
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|mut rider| start::qualify_start(&mut rider, race, tuning).then_some(rider))
        .collect();
    info!(observed, qualified = riders.len(), "start qualification complete");

    // Profile reads go through the store seam, so they stay sequential.
    for rider in &mut riders {
        let profile = store.rider_profile(rider.id)?.unwrap_or_else(|| {
            warn!(rider = rider.id, "no profile on record, using placeholder");
            RiderProfile::placeholder(rider.id)
        });
        rider.apply_profile(profile, options.ignore_categories);
    }

    riders.par_iter_mut().for_each(|rider| {
        integrity::trim_course(rider, race);
        integrity::trim_crash(rider);
    });

    let groups = finish::resolve_group_starts(race, &riders);
    riders.par_iter_mut().for_each(|rider| {
        finish::evaluate_candidates(rider, &groups, race);
        finish::select_finish(rider, options.ignore_categories);
    });

    let standings = scoring::score(&mut riders, race);

    let finishers = riders
        .iter()
        .filter(|r| r.outcome == Outcome::Finisher)
        .count();
    let dq = riders.iter().filter(|r| r.outcome == Outcome::Dq).count();
    info!(
        race = %race.id,
        finishers,
        dq,
        dnf = riders.len() - finishers - dq,
        "race resolved"
    );

    Ok(assemble::assemble(
        &riders,
        race,
        tuning,
        standings,
        options.with_splits,
    ))
}
