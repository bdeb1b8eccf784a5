//! Time slot: one heating window within a day.

use serde::{Deserialize, Serialize};

use super::TimeOfDay;
use crate::error::ValidationError;

/// Highest power a slot may request. `0` means "off for this window".
pub const MAX_SLOT_POWER: u8 = 5;
/// Fan speed bounds accepted by the appliance.
pub const FAN_RANGE: std::ops::RangeInclusive<u8> = 1..=6;

/// A half-open window `[start, end)` with the appliance settings to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub power: u8,
    pub fan: u8,
}

impl TimeSlot {
    /// Build and validate a slot.
    ///
    /// # Errors
    ///
    /// See [`TimeSlot::validate`].
    pub fn new(start: TimeOfDay, end: TimeOfDay, power: u8, fan: u8) -> Result<Self, ValidationError> {
        let slot = Self {
            start,
            end,
            power,
            fan,
        };
        slot.validate()?;
        Ok(slot)
    }

    /// Check slot invariants.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::SlotNotOrdered`] unless `start < end`
    /// - [`ValidationError::PowerOutOfRange`] when `power > 5`
    /// - [`ValidationError::FanOutOfRange`] when `fan` is outside `1..=6`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start >= self.end {
            return Err(ValidationError::SlotNotOrdered {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        if self.power > MAX_SLOT_POWER {
            return Err(ValidationError::PowerOutOfRange(self.power));
        }
        if !FAN_RANGE.contains(&self.fan) {
            return Err(ValidationError::FanOutOfRange(self.fan));
        }
        Ok(())
    }

    /// Whether `time` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && time < self.end
    }
}
