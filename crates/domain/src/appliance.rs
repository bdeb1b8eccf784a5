//! Appliance: the space-heating stove the engine drives.
//!
//! The stove reports a numeric status code plus a human-readable
//! description. The engine only needs a coarse reading of that status
//! ([`ApplianceState`]), most importantly whether it is actively heating.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Discrete burner power accepted by the appliance, `1..=5`.
///
/// There is no level `0`: switching the appliance off is a separate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PowerLevel(u8);

impl PowerLevel {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);

    /// # Errors
    ///
    /// Returns [`ValidationError::PowerOutOfRange`] outside `1..=5`.
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::PowerOutOfRange(level))
        }
    }

    /// Clamp an arbitrary integer into the valid range.
    #[must_use]
    pub fn saturating(level: i64) -> Self {
        // clamp guarantees the value fits in u8
        Self(level.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0)) as u8)
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PowerLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PowerLevel> for u8 {
    fn from(value: PowerLevel) -> Self {
        value.0
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fan speed accepted by the appliance, `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FanLevel(u8);

impl FanLevel {
    pub const MIN: Self = Self(1);

    /// # Errors
    ///
    /// Returns [`ValidationError::FanOutOfRange`] outside `1..=6`.
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if crate::schedule::FAN_RANGE.contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::FanOutOfRange(level))
        }
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for FanLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FanLevel> for u8 {
    fn from(value: FanLevel) -> Self {
        value.0
    }
}

/// Coarse operating state derived from the appliance's status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceState {
    Off,
    Standby,
    Igniting,
    Working,
    Modulating,
    Cleaning,
    ShuttingDown,
    Alarm,
    Unknown,
}

impl ApplianceState {
    /// Classify a raw status report.
    ///
    /// The description is matched first (case-insensitive, English and
    /// Italian firmware strings); status code `0` is the only code with a
    /// fixed meaning across firmware versions.
    #[must_use]
    pub fn classify(status_code: i32, description: &str) -> Self {
        const RULES: &[(&[&str], ApplianceState)] = &[
            (&["ALARM", "ALLARME", "ERROR", "ERRORE", "BLOCK"], ApplianceState::Alarm),
            (&["MODUL"], ApplianceState::Modulating),
            (&["WORK", "LAVORO", "RUN"], ApplianceState::Working),
            (&["IGNIT", "ACCENS", "START", "PRERISC", "LOAD", "CARIC"], ApplianceState::Igniting),
            (&["CLEAN", "PULIZ"], ApplianceState::Cleaning),
            (&["SHUTDOWN", "SHUT", "SPEGNIM", "FINAL", "COOL"], ApplianceState::ShuttingDown),
            (&["STANDBY", "STAND-BY", "ATTESA"], ApplianceState::Standby),
            (&["OFF", "SPENT"], ApplianceState::Off),
        ];

        let upper = description.to_ascii_uppercase();
        for (needles, state) in RULES {
            if needles.iter().any(|needle| upper.contains(needle)) {
                return *state;
            }
        }
        if status_code == 0 {
            Self::Off
        } else {
            Self::Unknown
        }
    }

    /// Whether the burner is running and producing heat.
    #[must_use]
    pub fn is_heating(self) -> bool {
        matches!(self, Self::Working | Self::Modulating)
    }

    /// Whether an ignite command is appropriate.
    #[must_use]
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Off | Self::Standby)
    }
}

/// Status report returned by the appliance status source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceStatus {
    pub status_code: i32,
    pub description: String,
    #[serde(default)]
    pub power_level: Option<u8>,
    #[serde(default)]
    pub fan_level: Option<u8>,
}

impl ApplianceStatus {
    #[must_use]
    pub fn new(status_code: i32, description: impl Into<String>) -> Self {
        Self {
            status_code,
            description: description.into(),
            power_level: None,
            fan_level: None,
        }
    }

    #[must_use]
    pub fn with_levels(mut self, power: u8, fan: u8) -> Self {
        self.power_level = Some(power);
        self.fan_level = Some(fan);
        self
    }

    #[must_use]
    pub fn state(&self) -> ApplianceState {
        ApplianceState::classify(self.status_code, &self.description)
    }

    #[must_use]
    pub fn is_heating(&self) -> bool {
        self.state().is_heating()
    }
}

/// What the weekly schedule wants the appliance to be doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DesiredApplianceState {
    On { power: PowerLevel, fan: FanLevel },
    Off,
}
