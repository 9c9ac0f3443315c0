// ABOUTME: Constants for the results pipeline, organized by domain
// ABOUTME: Time units, default tunables, selection weights, and physiological thresholds
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Constants module
//!
//! Pure data constants grouped by domain. Venue-specific heuristics
//! (corral pace, restart radius, tie gap) appear here only as defaults;
//! the live values come from [`crate::race::RaceTuning`].

/// Time unit conversions (milliseconds).
pub mod time {
    /// Milliseconds per second.
    pub const MSEC_PER_SEC: i64 = 1_000;
    /// Milliseconds per minute.
    pub const MSEC_PER_MIN: i64 = 60 * MSEC_PER_SEC;
    /// Milliseconds per hour.
    pub const MSEC_PER_HOUR: i64 = 60 * MSEC_PER_MIN;
}

/// Default values for race definitions and tuning parameters.
pub mod defaults {
    use super::time::{MSEC_PER_HOUR, MSEC_PER_MIN, MSEC_PER_SEC};

    /// Start window: how long after the nominal start a start-line
    /// crossing still counts as this rider's start.
    pub const START_WINDOW_MS: i64 = 10 * MSEC_PER_MIN;

    /// Grace period: allowed earliness of a rider's start relative to
    /// their resolved group's start before it is flagged.
    pub const GRACE_MS: i64 = 8 * MSEC_PER_SEC;

    /// Lookback before the nominal start when querying the telemetry
    /// store, so riders who roll over the line early are captured.
    pub const LOOKBACK_MS: i64 = 2 * MSEC_PER_MIN;

    /// Cutoff applied when the definition gives neither an explicit
    /// cutoff nor a slowest pace.
    pub const CUTOFF_MS: i64 = 2 * MSEC_PER_HOUR;

    /// A later start-line crossing within this distance of the current
    /// candidate is treated as part of the same start event, not a
    /// restart.
    pub const RESTART_RADIUS_M: f64 = 3_000.0;

    /// A resolved start earlier than this before the gun records an
    /// early-start disqualification.
    pub const EARLY_START_SLACK_MS: i64 = 30 * MSEC_PER_SEC;

    /// The corral pace check only applies to riders whose resolved
    /// start falls within this window of the nominal start.
    pub const CORRAL_START_WINDOW_MS: i64 = 20 * MSEC_PER_SEC;

    /// Average pace through the corral above which a rider is
    /// disqualified.
    pub const CORRAL_PACE_LIMIT_KMH: f64 = 18.0;

    /// Finishes closer together than this are reported as a tie rather
    /// than given a computed gap.
    pub const TIE_GAP_MS: i64 = 200;
}

/// Finish-group selection weights.
pub mod selection {
    /// Bonus for a candidate with an actual finish position; strongly
    /// prefers any finish over a DNF candidate.
    pub const FINISH_BONUS: i64 = 10;

    /// Penalty for a candidate carrying an implied disqualification.
    pub const IMPLIED_DQ_PENALTY: i64 = 3;
}

/// Power-to-weight thresholds for estimated rider categories.
pub mod physiology {
    /// Above this watts/kg a rider is estimated category A.
    pub const WKG_CAT_A: f64 = 4.0;
    /// Above this watts/kg a rider is estimated category B.
    pub const WKG_CAT_B: f64 = 3.2;
    /// Above this watts/kg a rider is estimated category C.
    pub const WKG_CAT_C: f64 = 2.5;
}

/// Disqualification reason strings shared across pipeline stages.
pub mod reasons {
    /// Finish-line crossing in the wrong expected direction.
    pub const WRONG_COURSE: &str = "wrong course";
    /// Physically impossible telemetry (distance, energy, or duration
    /// decreased).
    pub const CRASHED: &str = "crashed";
    /// Average pace through the corral exceeded the limit.
    pub const CORRAL_PACE: &str = "moving too fast through the corral";
}
