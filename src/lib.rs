// ABOUTME: Library root for chalkline, a race-results resolution pipeline
// ABOUTME: Turns checkpoint telemetry into ranked per-category results
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # chalkline
//!
//! Resolves official results for timed mass-start cycling events from
//! raw checkpoint telemetry. Riders cross timing lines; the recording
//! platform stores one position record per crossing; this crate turns
//! that stream into ranked finishers, disqualifications, DNFs, and
//! sprint standings.
//!
//! The pipeline runs in a fixed order: start qualification, integrity
//! trimming, finish-group resolution, scoring, results assembly. Every
//! stage is deterministic for the same stored telemetry and race
//! definition.
//!
//! ```no_run
//! use chalkline::{resolve_race, InMemoryTelemetry, RaceDefinition, RaceTuning, ResolveOptions};
//! use chalkline::models::{CheckpointId, Direction};
//! use chalkline::race::CategoryGroup;
//! use chrono::Utc;
//!
//! # fn main() -> chalkline::RaceResult<()> {
//! let store = InMemoryTelemetry::new();
//! let race = RaceDefinition::builder("tt1", "Tuesday Night Worlds")
//!     .start(Utc::now())
//!     .start_line(CheckpointId(1), Direction::Forward)
//!     .finish_line(CheckpointId(2), Direction::Forward)
//!     .group(CategoryGroup {
//!         name: "A".to_owned(),
//!         distance_m: 40_000.0,
//!         lead_rider: None,
//!         delay_ms: None,
//!     })
//!     .build()?;
//! let results = resolve_race(&store, &race, &RaceTuning::default(), &ResolveOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&results).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod race;
pub mod store;

pub use errors::{RaceError, RaceResult};
pub use pipeline::{resolve_race, RaceResults, ResolveOptions};
pub use race::{RaceDefinition, RaceTuning};
pub use store::{InMemoryTelemetry, TelemetryStore};
