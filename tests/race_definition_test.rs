// ABOUTME: Tests for race definition validation and cutoff derivation
// ABOUTME: Every malformed definition must be rejected before a run starts
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chalkline::models::Direction;
use chalkline::race::{Cutoff, SprintDefinition};
use chalkline::{RaceDefinition, RaceError};
use common::{group, race_builder, race_start, race_start_ms, FINISH_LINE, START_LINE};

fn sprint(name: &str, distance_m: f64) -> SprintDefinition {
    SprintDefinition {
        name: name.to_owned(),
        distance_m,
        checkpoint: FINISH_LINE,
        direction: Direction::Forward,
        points: vec![3, 2, 1],
    }
}

#[test]
fn a_minimal_definition_builds() {
    let race = race_builder().group(group("A", 10_000.0)).build().unwrap();
    assert_eq!(race.start_ms(), race_start_ms());
    assert_eq!(race.groups.len(), 1);
    assert!(!race.alternating);
}

#[test]
fn missing_start_time_is_rejected() {
    let err = RaceDefinition::builder("t", "test")
        .start_line(START_LINE, Direction::Forward)
        .finish_line(FINISH_LINE, Direction::Forward)
        .group(group("A", 10_000.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, RaceError::MissingStartTime));
}

#[test]
fn missing_lines_are_rejected() {
    let err = RaceDefinition::builder("t", "test")
        .start(race_start())
        .group(group("A", 10_000.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, RaceError::CheckpointNotFound(_)));
}

#[test]
fn at_least_one_group_is_required() {
    let err = race_builder().build().unwrap_err();
    assert!(matches!(err, RaceError::NoCategoryGroups));
}

#[test]
fn non_positive_group_distances_are_rejected() {
    let err = race_builder().group(group("A", 0.0)).build().unwrap_err();
    assert!(matches!(err, RaceError::InvalidGroup { .. }));
}

#[test]
fn sprint_distances_must_strictly_ascend() {
    let err = race_builder()
        .group(group("A", 10_000.0))
        .sprint(sprint("one", 3_000.0))
        .sprint(sprint("two", 3_000.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, RaceError::InvalidSprint { .. }));
}

#[test]
fn sprints_need_a_points_table() {
    let mut empty = sprint("one", 3_000.0);
    empty.points.clear();
    let err = race_builder()
        .group(group("A", 10_000.0))
        .sprint(empty)
        .build()
        .unwrap_err();
    assert!(matches!(err, RaceError::InvalidSprint { .. }));
}

#[test]
fn duration_cutoff_is_absolute_from_the_start() {
    let race = race_builder()
        .group(group("A", 10_000.0))
        .cutoff(Cutoff::Duration(90 * 60 * 1_000))
        .build()
        .unwrap();
    assert_eq!(race.cutoff_ms, race_start_ms() + 90 * 60 * 1_000);
}

#[test]
fn pace_cutoff_scales_with_the_longest_group() {
    let race = race_builder()
        .group(group("A", 10_000.0))
        .group(group("B", 20_000.0))
        .cutoff(Cutoff::Pace(20.0))
        .build()
        .unwrap();
    // 20 km at 20 km/h: one hour.
    assert_eq!(race.cutoff_ms, race_start_ms() + 3_600_000);
}

#[test]
fn default_cutoff_is_two_hours() {
    let race = race_builder().group(group("A", 10_000.0)).build().unwrap();
    assert_eq!(race.cutoff_ms, race_start_ms() + 2 * 3_600_000);
}
