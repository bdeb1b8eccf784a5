//! PID power controller.
//!
//! Converts the temperature error of one zone into a discrete appliance
//! [`PowerLevel`]. The controller memory ([`PidState`]) is persisted between
//! control intervals by the application layer; this module is pure math.
//!
//! Anti-windup clamps the *raw* integral accumulator (°C·min) before it is
//! multiplied by `ki`, so retuning `ki` never changes how much error history
//! the controller can build up.

use serde::{Deserialize, Serialize};

use crate::appliance::PowerLevel;
use crate::error::ValidationError;
use crate::id::RoomId;
use crate::time::Timestamp;

/// Bound applied to the raw integral accumulator unless configured otherwise.
pub const DEFAULT_INTEGRAL_LIMIT: f64 = 10.0;

/// Controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.5,
            ki: 0.1,
            kd: 0.05,
        }
    }
}

impl PidGains {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a gain is not finite or is negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { field });
            }
        }
        Ok(())
    }
}

/// Persisted controller memory for one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    #[serde(flatten)]
    pub gains: PidGains,
    /// Raw accumulator, always within the configured anti-windup bound.
    pub integral: f64,
    pub previous_error: Option<f64>,
    pub previous_timestamp: Option<Timestamp>,
}

/// Breakdown of one controller evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidStep {
    pub error: f64,
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    pub output: f64,
    pub level: PowerLevel,
}

impl PidState {
    /// Fresh controller with no history.
    #[must_use]
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            previous_error: None,
            previous_timestamp: None,
        }
    }

    /// Forget accumulated history, keeping the gains.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = None;
        self.previous_timestamp = None;
    }

    /// Whether the last evaluation is older than `max_age` (or never happened).
    #[must_use]
    pub fn is_stale(&self, now: Timestamp, max_age: chrono::Duration) -> bool {
        self.previous_timestamp
            .is_none_or(|previous| now - previous > max_age)
    }

    /// Evaluate the controller and advance its memory.
    ///
    /// A non-positive or non-finite `dt_minutes` adds nothing to the
    /// integral and yields a zero derivative.
    pub fn compute(
        &mut self,
        setpoint: f64,
        measured: f64,
        dt_minutes: f64,
        integral_limit: f64,
        now: Timestamp,
    ) -> PidStep {
        let limit = if integral_limit.is_finite() {
            integral_limit.abs()
        } else {
            DEFAULT_INTEGRAL_LIMIT
        };
        let usable_dt = dt_minutes.is_finite() && dt_minutes > 0.0;

        let error = setpoint - measured;
        let integral = if usable_dt {
            (self.integral + error * dt_minutes).clamp(-limit, limit)
        } else {
            self.integral.clamp(-limit, limit)
        };
        let derivative = match self.previous_error {
            Some(previous) if usable_dt => (error - previous) / dt_minutes,
            _ => 0.0,
        };

        let proportional = self.gains.kp * error;
        let output = proportional + self.gains.ki * integral + self.gains.kd * derivative;
        // `as` saturates for out-of-range floats and maps NaN to 0
        let level = PowerLevel::saturating(output.round() as i64);

        self.integral = integral;
        self.previous_error = Some(error);
        self.previous_timestamp = Some(now);

        PidStep {
            error,
            proportional,
            integral,
            derivative,
            output,
            level,
        }
    }
}

/// Evaluate a hypothetical interval from a cold start.
///
/// Never reads or writes persisted state: the derivative is always `0` and
/// the integral only reflects this single interval.
#[must_use]
pub fn preview(
    gains: PidGains,
    setpoint: f64,
    measured: f64,
    dt_minutes: f64,
    integral_limit: f64,
) -> PidStep {
    PidState::new(gains).compute(
        setpoint,
        measured,
        dt_minutes,
        integral_limit,
        crate::time::now(),
    )
}

/// User-owned power controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub enabled: bool,
    /// Zone whose temperature drives the appliance power.
    pub zone_id: Option<RoomId>,
    #[serde(flatten)]
    pub gains: PidGains,
    /// Fixed target; when absent the zone's own thermostat target is used.
    pub setpoint: Option<f64>,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<String>,
}

impl PidConfig {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for invalid gains or a non-finite setpoint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.gains.validate()?;
        if self.setpoint.is_some_and(|value| !value.is_finite()) {
            return Err(ValidationError::NotFinite { field: "setpoint" });
        }
        Ok(())
    }
}
