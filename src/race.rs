// ABOUTME: Parsed, immutable race definition: lines, windows, groups, scoring points
// ABOUTME: Validated at construction; the textual configuration encoding lives outside the core
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Race Definition
//!
//! The parsed description of an event. The line-oriented configuration
//! DSL is an external collaborator; the core only consumes this
//! validated structure. Validation happens at build time so every
//! input-contract violation aborts a run before any rider is processed.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::errors::{RaceError, RaceResult};
use crate::models::{CheckpointId, Direction, RiderId};

/// A timing line plus the direction riders are required to cross it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRule {
    /// The timing line.
    pub checkpoint: CheckpointId,
    /// Required crossing direction.
    pub direction: Direction,
}

/// A named cohort with its own target distance and effective start.
///
/// The effective start time resolves, in order of preference, from the
/// designated lead rider's observed start, a fixed delay after the gun,
/// or the race's nominal start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Group name; known-category riders are matched to groups whose
    /// name contains their category letter.
    pub name: String,
    /// Target distance, meters.
    pub distance_m: f64,
    /// Rider whose observed start defines the group's start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_rider: Option<RiderId>,
    /// Fixed delay after the nominal start, milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<i64>,
}

/// An intermediate scoring ("sprint") point definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintDefinition {
    /// Sprint name for reporting.
    pub name: String,
    /// Threshold distance from the rider's own start, meters. The
    /// definitions are ordered by this distance.
    pub distance_m: f64,
    /// The line whose crossings score while this definition is active.
    pub checkpoint: CheckpointId,
    /// Required crossing direction.
    pub direction: Direction,
    /// Points by crossing rank (first, second, …); crossings beyond the
    /// table earn zero.
    pub points: Vec<u32>,
}

/// Closed enumeration of report renderers an embedder may attach.
///
/// The core never dispatches on this; it is resolved when the race
/// configuration is parsed and handed to the external renderer verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Plain-text tables.
    #[default]
    Text,
    /// JSON document.
    Json,
    /// HTML page.
    Html,
}

/// Venue-specific heuristics, kept configurable rather than hardcoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceTuning {
    /// Restart radius for the start qualifier, meters.
    pub restart_radius_m: f64,
    /// Starting earlier than this before the gun is a violation.
    pub early_start_slack_ms: i64,
    /// Corral check applies only to starts within this window of the gun.
    pub corral_start_window_ms: i64,
    /// Average corral pace above this disqualifies, km/h.
    pub corral_pace_limit_kmh: f64,
    /// Finishes closer than this are reported as the same time.
    pub tie_gap_ms: i64,
}

impl Default for RaceTuning {
    fn default() -> Self {
        Self {
            restart_radius_m: defaults::RESTART_RADIUS_M,
            early_start_slack_ms: defaults::EARLY_START_SLACK_MS,
            corral_start_window_ms: defaults::CORRAL_START_WINDOW_MS,
            corral_pace_limit_kmh: defaults::CORRAL_PACE_LIMIT_KMH,
            tie_gap_ms: defaults::TIE_GAP_MS,
        }
    }
}

/// How the query-window cutoff is derived when not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Fixed duration after the nominal start, milliseconds.
    Duration(i64),
    /// Slowest accepted pace in km/h, applied to the longest group
    /// distance.
    Pace(f64),
}

/// Parsed, immutable description of the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDefinition {
    /// Short race identifier.
    pub id: String,
    /// Human-readable race name.
    pub name: String,
    /// Nominal race start.
    pub start: DateTime<Utc>,
    /// Start window length after the nominal start, milliseconds.
    pub start_window_ms: i64,
    /// Grace period for group-relative early starts, milliseconds.
    pub grace_ms: i64,
    /// Query lookback before the nominal start, milliseconds.
    pub lookback_ms: i64,
    /// Start line and required direction.
    pub start_line: LineRule,
    /// Finish line and required direction.
    pub finish_line: LineRule,
    /// Corral line, when the venue has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corral_line: Option<CheckpointId>,
    /// Whether the expected finish direction alternates per crossing
    /// (out-and-back courses).
    pub alternating: bool,
    /// Absolute cutoff of the query window, epoch milliseconds.
    pub cutoff_ms: i64,
    /// Category groups; at least one.
    pub groups: Vec<CategoryGroup>,
    /// Intermediate scoring points, ordered by ascending distance.
    pub sprints: Vec<SprintDefinition>,
    /// Final-placement points by finish rank; empty disables placement
    /// scoring.
    pub final_points: Vec<u32>,
    /// Renderer chosen at configuration-parse time.
    pub report: ReportFormat,
}

impl RaceDefinition {
    /// Start building a definition.
    #[must_use]
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> RaceDefinitionBuilder {
        RaceDefinitionBuilder::new(id, name)
    }

    /// Nominal start, epoch milliseconds.
    #[must_use]
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// Race date (UTC).
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Wall-clock stamp of an epoch-millisecond instant, `HH:MM:SS` UTC.
    #[must_use]
    pub fn stamp(ms: i64) -> String {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map_or_else(|| format!("@{ms}ms"), |t| t.format("%H:%M:%S").to_string())
    }
}

/// Builder for [`RaceDefinition`]; `build` performs all validation.
#[derive(Debug, Clone)]
pub struct RaceDefinitionBuilder {
    id: String,
    name: String,
    start: Option<DateTime<Utc>>,
    start_window_ms: i64,
    grace_ms: i64,
    lookback_ms: i64,
    start_line: Option<LineRule>,
    finish_line: Option<LineRule>,
    corral_line: Option<CheckpointId>,
    alternating: bool,
    cutoff: Option<Cutoff>,
    groups: Vec<CategoryGroup>,
    sprints: Vec<SprintDefinition>,
    final_points: Vec<u32>,
    report: ReportFormat,
}

impl RaceDefinitionBuilder {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start: None,
            start_window_ms: defaults::START_WINDOW_MS,
            grace_ms: defaults::GRACE_MS,
            lookback_ms: defaults::LOOKBACK_MS,
            start_line: None,
            finish_line: None,
            corral_line: None,
            alternating: false,
            cutoff: None,
            groups: Vec::new(),
            sprints: Vec::new(),
            final_points: Vec::new(),
            report: ReportFormat::default(),
        }
    }

    /// Nominal race start.
    #[must_use]
    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Start window length, milliseconds.
    #[must_use]
    pub const fn start_window_ms(mut self, ms: i64) -> Self {
        self.start_window_ms = ms;
        self
    }

    /// Grace period, milliseconds.
    #[must_use]
    pub const fn grace_ms(mut self, ms: i64) -> Self {
        self.grace_ms = ms;
        self
    }

    /// Query lookback, milliseconds.
    #[must_use]
    pub const fn lookback_ms(mut self, ms: i64) -> Self {
        self.lookback_ms = ms;
        self
    }

    /// Start line and required direction.
    #[must_use]
    pub const fn start_line(mut self, checkpoint: CheckpointId, direction: Direction) -> Self {
        self.start_line = Some(LineRule {
            checkpoint,
            direction,
        });
        self
    }

    /// Finish line and required direction.
    #[must_use]
    pub const fn finish_line(mut self, checkpoint: CheckpointId, direction: Direction) -> Self {
        self.finish_line = Some(LineRule {
            checkpoint,
            direction,
        });
        self
    }

    /// Corral line.
    #[must_use]
    pub const fn corral_line(mut self, checkpoint: CheckpointId) -> Self {
        self.corral_line = Some(checkpoint);
        self
    }

    /// Mark the course as alternating (out-and-back finish crossings).
    #[must_use]
    pub const fn alternating(mut self) -> Self {
        self.alternating = true;
        self
    }

    /// Cutoff rule.
    #[must_use]
    pub const fn cutoff(mut self, cutoff: Cutoff) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Add a category group.
    #[must_use]
    pub fn group(mut self, group: CategoryGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Add an intermediate scoring point.
    #[must_use]
    pub fn sprint(mut self, sprint: SprintDefinition) -> Self {
        self.sprints.push(sprint);
        self
    }

    /// Final-placement points table.
    #[must_use]
    pub fn final_points(mut self, points: Vec<u32>) -> Self {
        self.final_points = points;
        self
    }

    /// Renderer selection.
    #[must_use]
    pub const fn report(mut self, report: ReportFormat) -> Self {
        self.report = report;
        self
    }

    /// Validate and build the definition.
    ///
    /// # Errors
    /// Returns a [`RaceError`] when the start time or either line is
    /// missing, no groups are declared, a group or sprint definition is
    /// malformed, or sprint distances are not strictly ascending.
    pub fn build(self) -> RaceResult<RaceDefinition> {
        let start = self.start.ok_or(RaceError::MissingStartTime)?;
        let start_line = self
            .start_line
            .ok_or_else(|| RaceError::CheckpointNotFound("start".to_owned()))?;
        let finish_line = self
            .finish_line
            .ok_or_else(|| RaceError::CheckpointNotFound("finish".to_owned()))?;

        if self.groups.is_empty() {
            return Err(RaceError::NoCategoryGroups);
        }
        for group in &self.groups {
            if group.distance_m <= 0.0 {
                return Err(RaceError::InvalidGroup {
                    name: group.name.clone(),
                    reason: "non-positive target distance".to_owned(),
                });
            }
        }

        let mut last_distance = 0.0;
        for sprint in &self.sprints {
            if sprint.distance_m <= last_distance {
                return Err(RaceError::InvalidSprint {
                    name: sprint.name.clone(),
                    reason: "distances must be strictly ascending".to_owned(),
                });
            }
            if sprint.points.is_empty() {
                return Err(RaceError::InvalidSprint {
                    name: sprint.name.clone(),
                    reason: "empty points table".to_owned(),
                });
            }
            last_distance = sprint.distance_m;
        }

        let start_ms = start.timestamp_millis();
        let cutoff_ms = match self.cutoff {
            Some(Cutoff::Duration(ms)) => start_ms + ms,
            Some(Cutoff::Pace(kmh)) if kmh > 0.0 => {
                // Slowest pace bound over the longest group distance.
                let longest = self
                    .groups
                    .iter()
                    .map(|g| g.distance_m)
                    .fold(0.0_f64, f64::max);
                start_ms + (longest * 3.6 / kmh * 1_000.0) as i64
            }
            _ => start_ms + defaults::CUTOFF_MS,
        };

        Ok(RaceDefinition {
            id: self.id,
            name: self.name,
            start,
            start_window_ms: self.start_window_ms,
            grace_ms: self.grace_ms,
            lookback_ms: self.lookback_ms,
            start_line,
            finish_line,
            corral_line: self.corral_line,
            alternating: self.alternating,
            cutoff_ms,
            groups: self.groups,
            sprints: self.sprints,
            final_points: self.final_points,
            report: self.report,
        })
    }
}
