// ABOUTME: Unified error type for the results resolution engine
// ABOUTME: Only input-contract violations are errors; per-rider conditions are outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Error Handling
//!
//! The error taxonomy is purely structural: an unresolvable race
//! definition (unknown checkpoint, missing start time, malformed group or
//! points table) aborts a run before any rider is processed. Everything
//! that can go wrong for an individual rider (no legitimate start,
//! disqualification, DNF, missing reference metadata) is a first-class
//! outcome or a graceful degradation, never an error.

use thiserror::Error;

/// Errors that abort a pipeline run before any rider is processed.
#[derive(Debug, Error)]
pub enum RaceError {
    /// A checkpoint name in the race definition has no known id.
    #[error("checkpoint not found: {{ {0} }}")]
    CheckpointNotFound(String),

    /// The race definition carries no nominal start time.
    #[error("race definition is missing a start time")]
    MissingStartTime,

    /// The race definition declares no category groups; the resolver
    /// requires at least one so every rider can be assigned a group.
    #[error("race definition declares no category groups")]
    NoCategoryGroups,

    /// A category group definition failed validation.
    #[error("invalid category group {name}: {reason}")]
    InvalidGroup {
        /// Group name as declared.
        name: String,
        /// Why the group was rejected.
        reason: String,
    },

    /// An intermediate scoring point definition failed validation.
    #[error("invalid sprint definition {name}: {reason}")]
    InvalidSprint {
        /// Sprint name as declared.
        name: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// The telemetry store failed while reading records or reference data.
    #[error("telemetry store failure")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RaceError {
    /// Wrap an external store error.
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(source))
    }
}

/// Result type alias for pipeline entry points.
pub type RaceResult<T> = Result<T, RaceError>;
