//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`PanelError`]
//! via `#[from]`. Cycle runners never surface these directly; they fold them
//! into a structured outcome instead.

use std::fmt;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("configuration missing")]
    ConfigurationMissing(#[from] ConfigurationMissingError),

    #[error("upstream unavailable")]
    Upstream(#[from] UpstreamError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PanelError {
    /// Wrap any storage-layer error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Malformed input on a user-facing write. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTimeOfDay(String),

    #[error("slot start {start} must be before end {end}")]
    SlotNotOrdered { start: String, end: String },

    #[error("power level {0} out of range")]
    PowerOutOfRange(u8),

    #[error("fan level {0} out of range")]
    FanOutOfRange(u8),

    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("return-to-auto time must be in the future")]
    ReturnToAutoInPast,

    #[error("cannot delete the active schedule")]
    ActiveScheduleDeletion,

    #[error("schedule {0} already exists")]
    ScheduleExists(String),

    #[error("duplicate room {0}")]
    DuplicateRoom(String),
}

/// A referenced record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Required configuration is absent; the cycle cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing configuration: {what}")]
pub struct ConfigurationMissingError {
    pub what: String,
}

impl ConfigurationMissingError {
    pub fn new(what: impl Into<String>) -> Self {
        Self { what: what.into() }
    }
}

/// Which external collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
    Appliance,
    ZoneGateway,
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appliance => f.write_str("appliance"),
            Self::ZoneGateway => f.write_str("zone gateway"),
        }
    }
}

/// A device call timed out, failed, or was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin} unavailable: {reason}")]
pub struct UpstreamError {
    pub origin: UpstreamSource,
    pub reason: String,
}

impl UpstreamError {
    pub fn appliance(reason: impl Into<String>) -> Self {
        Self {
            origin: UpstreamSource::Appliance,
            reason: reason.into(),
        }
    }

    pub fn zone_gateway(reason: impl Into<String>) -> Self {
        Self {
            origin: UpstreamSource::ZoneGateway,
            reason: reason.into(),
        }
    }
}
