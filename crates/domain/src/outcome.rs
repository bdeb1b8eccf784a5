//! Cycle outcomes shared by the three engine cycles.
//!
//! Cycles never fail with an `Err`: every failure is folded into a
//! [`CycleFailure`] naming the stage that broke and a coarse error kind.

use serde::{Deserialize, Serialize};

use crate::appliance::{DesiredApplianceState, FanLevel, PowerLevel};
use crate::error::PanelError;
use crate::id::RoomId;
use crate::time::Timestamp;

/// External collaborator (or the engine itself) where a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStage {
    /// Appliance status source or controller.
    StoveApi,
    /// Zone setpoint gateway.
    ZoneApi,
    /// Persistent state store. Tag kept for dashboard compatibility.
    #[serde(rename = "firebase")]
    Store,
    /// The engine's own decision logic, configuration or time bound.
    Orchestrator,
}

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    UpstreamUnavailable,
    Validation,
    NotFound,
    Storage,
    Timeout,
}

impl From<&PanelError> for ErrorKind {
    fn from(err: &PanelError) -> Self {
        match err {
            PanelError::Validation(_) => Self::Validation,
            PanelError::NotFound(_) => Self::NotFound,
            PanelError::ConfigurationMissing(_) => Self::ConfigurationMissing,
            PanelError::Upstream(_) => Self::UpstreamUnavailable,
            PanelError::Storage(_) => Self::Storage,
        }
    }
}

/// Structured failure carried by an `error` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleFailure {
    pub stage: ErrorStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl CycleFailure {
    #[must_use]
    pub fn new(stage: ErrorStage, err: &PanelError) -> Self {
        Self {
            stage,
            kind: ErrorKind::from(err),
            message: error_chain(err),
        }
    }

    /// The cycle ran past its time bound.
    #[must_use]
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self {
            stage: ErrorStage::Orchestrator,
            kind: ErrorKind::Timeout,
            message: format!("cycle exceeded {}s", limit.as_secs()),
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Why the power cycle did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSkipReason {
    PidDisabled,
    NotAutomatic,
    NotHeating,
    NoReading,
}

/// Result of one power-control interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PowerCycleOutcome {
    Adjusted {
        zone: RoomId,
        setpoint: f64,
        measured: f64,
        previous: Option<u8>,
        level: PowerLevel,
    },
    Held {
        zone: RoomId,
        level: PowerLevel,
    },
    Skipped {
        reason: PowerSkipReason,
    },
    Error(CycleFailure),
}

/// Result of one schedule-enforcement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SchedulerCycleOutcome {
    /// Automation is disabled.
    Manual,
    SemiManual {
        until: Option<Timestamp>,
    },
    Ignited {
        power: PowerLevel,
        fan: FanLevel,
    },
    Adjusted {
        power: Option<PowerLevel>,
        fan: Option<FanLevel>,
    },
    ShutDown,
    Unchanged {
        desired: DesiredApplianceState,
    },
    Error(CycleFailure),
}
