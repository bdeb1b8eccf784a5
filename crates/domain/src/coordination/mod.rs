//! Coordination: keeping zone thermostats in step with the stove.
//!
//! While the stove is actively heating, the rooms listed in [`SyncConfig`]
//! get their thermostat setpoint boosted so the radiators do not fight the
//! stove. When heating stops, each room is put back the way it was. The
//! pre-boost settings live only in [`CoordinationState::boosted_rooms`].

mod event;
mod outcome;

pub use event::CoordinationEvent;
pub use outcome::{CoordinationOutcome, NoopReason, PauseReason};

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::RoomId;
use crate::time::Timestamp;
use crate::zone::{ZoneMode, ZoneState};

/// A room's thermostat settings captured before boosting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginalSetpoint {
    pub mode: ZoneMode,
    pub setpoint: Option<f64>,
    /// Setpoint the engine pushed; anything else in manual mode was set by a person.
    pub boosted_to: f64,
}

/// Orchestrator memory. Written only by the coordination cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationState {
    pub paused_until: Option<Timestamp>,
    pub pause_reason: Option<PauseReason>,
    pub last_action_at: Option<Timestamp>,
    pub boosted_rooms: BTreeMap<RoomId, OriginalSetpoint>,
}

impl CoordinationState {
    /// Time left on an active pause.
    #[must_use]
    pub fn pause_remaining(&self, now: Timestamp) -> Option<Duration> {
        self.paused_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    #[must_use]
    pub fn is_boost_active(&self) -> bool {
        !self.boosted_rooms.is_empty()
    }

    /// Time left before the last action may be repeated.
    #[must_use]
    pub fn debounce_remaining(&self, now: Timestamp, min_reapply: Duration) -> Option<Duration> {
        self.last_action_at
            .map(|last| last + min_reapply)
            .filter(|ready_at| *ready_at > now)
            .map(|ready_at| ready_at - now)
    }

    /// Boosted rooms whose thermostat now holds a manual setpoint the engine
    /// did not push.
    #[must_use]
    pub fn manual_overrides(&self, zones: &[ZoneState]) -> Vec<RoomId> {
        zones
            .iter()
            .filter(|zone| zone.mode == ZoneMode::Manual)
            .filter_map(|zone| {
                let original = self.boosted_rooms.get(&zone.room_id)?;
                let current = zone.setpoint?;
                ((current - original.boosted_to).abs() > SETPOINT_TOLERANCE)
                    .then(|| zone.room_id.clone())
            })
            .collect()
    }
}

/// Thermostats report setpoints in half-degree steps.
const SETPOINT_TOLERANCE: f64 = 0.05;

/// A room included in stove/thermostat synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedRoom {
    pub room_id: RoomId,
    pub name: String,
}

/// User-owned synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub rooms: Vec<SyncedRoom>,
    /// Degrees added to a room's setpoint while boosting.
    pub boost_delta: f64,
    /// Upper bound for any boosted setpoint.
    pub max_setpoint: f64,
    /// Base used when a room reports no setpoint.
    pub fallback_setpoint: f64,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rooms: Vec::new(),
            boost_delta: 2.0,
            max_setpoint: 28.0,
            fallback_setpoint: 20.0,
            updated_at: None,
            updated_by: None,
        }
    }
}

impl SyncConfig {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for non-finite or negative temperatures,
    /// empty room names, or a room listed twice.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("boost_delta", self.boost_delta),
            ("max_setpoint", self.max_setpoint),
            ("fallback_setpoint", self.fallback_setpoint),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { field });
            }
        }
        let mut seen = BTreeSet::new();
        for room in &self.rooms {
            if room.name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(&room.room_id) {
                return Err(ValidationError::DuplicateRoom(room.room_id.to_string()));
            }
        }
        Ok(())
    }

    /// `min(original + boost_delta, max_setpoint)`.
    #[must_use]
    pub fn boosted_setpoint(&self, original: Option<f64>) -> f64 {
        let base = original.unwrap_or(self.fallback_setpoint);
        (base + self.boost_delta).min(self.max_setpoint)
    }

    #[must_use]
    pub fn includes(&self, room: &RoomId) -> bool {
        self.rooms.iter().any(|synced| &synced.room_id == room)
    }
}
