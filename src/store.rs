// ABOUTME: Telemetry store seam: ordered position reads and reference lookups
// ABOUTME: Includes an in-memory implementation for tests and embedders
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Telemetry Store Adapter
//!
//! Read-only access to position records and rider reference metadata.
//! The store is an external collaborator, typically a database owned by
//! the recording side, so the core only defines the seam. The one
//! contract the pipeline relies on and does not re-derive: records come
//! back ascending by timestamp.

use std::collections::HashMap;

use crate::errors::RaceResult;
use crate::models::{CheckpointId, PositionRecord, RiderId, RiderProfile};

/// Read-only access to recorded telemetry and rider reference data.
pub trait TelemetryStore {
    /// All position records observed in `[begin_ms, end_ms]`, ascending
    /// by timestamp across riders.
    ///
    /// # Errors
    /// Returns a store error when the underlying read fails.
    fn positions_in_window(
        &self,
        begin_ms: i64,
        end_ms: i64,
    ) -> RaceResult<Vec<(RiderId, PositionRecord)>>;

    /// Resolve a human-readable line name to its id.
    ///
    /// # Errors
    /// Returns [`crate::RaceError::CheckpointNotFound`] when the name is
    /// unknown; an input-contract violation that aborts the run.
    fn checkpoint_id(&self, name: &str) -> RaceResult<CheckpointId>;

    /// Reference metadata for a rider; `None` when the platform has no
    /// profile on record (the pipeline degrades to a placeholder).
    ///
    /// # Errors
    /// Returns a store error when the underlying read fails.
    fn rider_profile(&self, id: RiderId) -> RaceResult<Option<RiderProfile>>;
}

/// In-memory telemetry store for tests and embedders that already hold
/// the records.
///
/// Insertion keeps the position list sorted by timestamp (stable for
/// equal timestamps), upholding the ordering contract.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTelemetry {
    checkpoints: HashMap<String, CheckpointId>,
    profiles: HashMap<RiderId, RiderProfile>,
    positions: Vec<(RiderId, PositionRecord)>,
}

impl InMemoryTelemetry {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a line name.
    pub fn add_checkpoint(&mut self, name: impl Into<String>, id: CheckpointId) {
        self.checkpoints.insert(name.into(), id);
    }

    /// Register a rider profile.
    pub fn add_profile(&mut self, id: RiderId, profile: RiderProfile) {
        self.profiles.insert(id, profile);
    }

    /// Insert a position record, keeping the list time-ascending.
    pub fn push_position(&mut self, rider: RiderId, record: PositionRecord) {
        let at = self
            .positions
            .partition_point(|(_, r)| r.time_ms <= record.time_ms);
        self.positions.insert(at, (rider, record));
    }
}

impl TelemetryStore for InMemoryTelemetry {
    fn positions_in_window(
        &self,
        begin_ms: i64,
        end_ms: i64,
    ) -> RaceResult<Vec<(RiderId, PositionRecord)>> {
        Ok(self
            .positions
            .iter()
            .filter(|(_, r)| r.time_ms >= begin_ms && r.time_ms <= end_ms)
            .cloned()
            .collect())
    }

    fn checkpoint_id(&self, name: &str) -> RaceResult<CheckpointId> {
        self.checkpoints
            .get(name)
            .copied()
            .ok_or_else(|| crate::errors::RaceError::CheckpointNotFound(name.to_owned()))
    }

    fn rider_profile(&self, id: RiderId) -> RaceResult<Option<RiderProfile>> {
        Ok(self.profiles.get(&id).cloned())
    }
}
