// ABOUTME: Core data models for the results engine
// ABOUTME: Re-exports position records, rider aggregates, and category types
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Data Models
//!
//! In-memory representation of participants and their telemetry:
//!
//! - [`PositionRecord`]: one timestamped checkpoint crossing
//! - [`Rider`]: a participant plus everything the pipeline derives
//! - [`Category`]: declared, name-inferred, or estimated categories
//! - [`FinishCandidate`]: one (rider, group) evaluation result
//!
//! All models serialize so external renderers and persistence writers
//! can consume results without re-deriving classification logic.

/// Category type and the pure inference/estimation functions.
pub mod category;
/// Position record and checkpoint types.
pub mod position;
/// Rider aggregate, profile, and outcome types.
pub mod rider;

pub use category::{estimate_from_wkg, infer_from_name, Category};
pub use position::{CheckpointId, Direction, PositionRecord};
pub use rider::{
    Disqualification, FinishCandidate, Outcome, PowerSource, Rider, RiderId, RiderProfile,
    RideSummary, Sex,
};
