//! Scheduler mode: whether the weekly schedule drives the appliance.
//!
//! Three effective modes exist:
//!
//! | `enabled` | `semi_manual` | meaning |
//! |-----------|---------------|---------|
//! | `false`   | `false`       | manual: the schedule is ignored |
//! | `true`    | `false`       | automatic: the active slot decides |
//! | `true`    | `true`        | semi-manual: a temporary hold on top of automatic |
//!
//! `semi_manual` implies `enabled`. The hold expires lazily: readers compare
//! `return_to_auto_at` with the current time, no timer is involved.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Persisted scheduler mode record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerMode {
    pub enabled: bool,
    pub semi_manual: bool,
    pub semi_manual_activated_at: Option<Timestamp>,
    pub return_to_auto_at: Option<Timestamp>,
    pub last_updated: Option<Timestamp>,
    pub updated_by: Option<String>,
}

/// Mode as observed at a given instant, after lazy expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveMode {
    pub enabled: bool,
    pub semi_manual: bool,
    /// When the semi-manual hold ends, if one is in effect.
    pub effective_until: Option<Timestamp>,
}

impl EffectiveMode {
    /// Automatic scheduling is in control (enabled and not on hold).
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.enabled && !self.semi_manual
    }
}

impl SchedulerMode {
    /// Whether a stored semi-manual hold has run past its deadline.
    ///
    /// A hold without a deadline never expires.
    #[must_use]
    pub fn is_semi_manual_expired(&self, now: Timestamp) -> bool {
        self.semi_manual && self.return_to_auto_at.is_some_and(|deadline| now >= deadline)
    }

    /// Evaluate the mode at `now`.
    ///
    /// An expired hold reads as automatic. A record that violates
    /// `semi_manual ⇒ enabled` still reports `enabled: true` while the hold
    /// is in effect.
    #[must_use]
    pub fn effective(&self, now: Timestamp) -> EffectiveMode {
        let semi_manual = self.semi_manual && !self.is_semi_manual_expired(now);
        EffectiveMode {
            enabled: self.enabled || semi_manual,
            semi_manual,
            effective_until: if semi_manual {
                self.return_to_auto_at
            } else {
                None
            },
        }
    }
}

/// Check that a requested return-to-auto deadline is usable.
///
/// # Errors
///
/// Returns [`ValidationError::ReturnToAutoInPast`] unless `deadline > now`.
pub fn validate_return_to_auto(deadline: Timestamp, now: Timestamp) -> Result<(), ValidationError> {
    if deadline > now {
        Ok(())
    } else {
        Err(ValidationError::ReturnToAutoInPast)
    }
}
