// ABOUTME: Tests for category name inference and power-to-weight estimation
// ABOUTME: Exercises the ordered rule list and the physiological thresholds
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chalkline::models::{estimate_from_wkg, infer_from_name, Category, Sex};

#[test]
fn common_name_tags_resolve() {
    assert_eq!(infer_from_name("Smith (B)"), Category::B);
    assert_eq!(infer_from_name("Jones KISS-C"), Category::C);
    assert_eq!(infer_from_name("Lee RACE B"), Category::B);
    assert_eq!(infer_from_name("Park (TEAM A)"), Category::A);
    assert_eq!(infer_from_name("Diaz ZHR-D winter"), Category::D);
    assert_eq!(infer_from_name("Cho (W) climber"), Category::W);
}

#[test]
fn lowercase_tags_resolve_too() {
    assert_eq!(infer_from_name("Smith (b)"), Category::B);
}

#[test]
fn invalid_letters_do_not_fall_through_to_later_rules() {
    // Rule one matches and captures E; the invalid letter must not let a
    // later rule have a try.
    assert_eq!(infer_from_name("Smith (E)"), Category::Unknown);
    assert_eq!(infer_from_name("Jones TEAM-9"), Category::Unknown);
}

#[test]
fn untagged_names_stay_unknown() {
    assert_eq!(infer_from_name("Plainname"), Category::Unknown);
    assert_eq!(infer_from_name(""), Category::Unknown);
}

#[test]
fn estimation_uses_the_watt_per_kg_tiers() {
    assert_eq!(estimate_from_wkg(4.1, Sex::Male), Category::A);
    assert_eq!(estimate_from_wkg(4.0, Sex::Male), Category::B);
    assert_eq!(estimate_from_wkg(3.3, Sex::Male), Category::B);
    assert_eq!(estimate_from_wkg(2.6, Sex::Male), Category::C);
    assert_eq!(estimate_from_wkg(1.5, Sex::Male), Category::D);
}

#[test]
fn female_riders_estimate_into_the_womens_field() {
    assert_eq!(estimate_from_wkg(4.5, Sex::Female), Category::W);
    assert_eq!(estimate_from_wkg(1.0, Sex::Female), Category::W);
}

#[test]
fn no_power_data_estimates_nothing() {
    assert_eq!(estimate_from_wkg(0.0, Sex::Male), Category::Unknown);
    assert_eq!(estimate_from_wkg(0.0, Sex::Female), Category::Unknown);
}

#[test]
fn labels_round_trip_through_letters() {
    assert_eq!(Category::from_letter('a'), Some(Category::A));
    assert_eq!(Category::from_letter('W'), Some(Category::W));
    assert_eq!(Category::from_letter('E'), None);
    assert_eq!(Category::A.label(), "A");
    assert_eq!(Category::Unknown.label(), "X");
    assert_eq!(Category::Group("Ride 3".to_owned()).label(), "Ride 3");
}
