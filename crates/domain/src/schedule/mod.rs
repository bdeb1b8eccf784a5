//! Weekly schedule: named sets of per-day heating slots.
//!
//! Several schedules may exist (e.g. "winter", "holidays"); exactly one is
//! active at a time through a separate pointer owned by the application
//! layer. A schedule only answers pure questions about local wall-clock
//! time: which slot is active, what the appliance should be doing, and when
//! the next slot boundary occurs.

mod slot;
mod time_of_day;
mod weekday;

pub use slot::{FAN_RANGE, MAX_SLOT_POWER, TimeSlot};
pub use time_of_day::TimeOfDay;
pub use weekday::Weekday;

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::appliance::{DesiredApplianceState, FanLevel, PowerLevel};
use crate::error::{PanelError, ValidationError};
use crate::id::ScheduleId;
use crate::time::Timestamp;

/// A named weekly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub id: ScheduleId,
    pub name: String,
    #[serde(default)]
    pub slots: BTreeMap<Weekday, Vec<TimeSlot>>,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl WeeklySchedule {
    /// Create a builder for constructing a [`WeeklySchedule`].
    #[must_use]
    pub fn builder() -> WeeklyScheduleBuilder {
        WeeklyScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] when the name is empty or any slot
    /// is invalid.
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        for slot in self.slots.values().flatten() {
            slot.validate()?;
        }
        Ok(())
    }

    /// Slots for one day, in stored order.
    #[must_use]
    pub fn day(&self, day: Weekday) -> &[TimeSlot] {
        self.slots.get(&day).map_or(&[], Vec::as_slice)
    }

    /// The slot covering `local`, if any. The first matching slot in list
    /// order wins when slots overlap.
    #[must_use]
    pub fn active_slot(&self, local: NaiveDateTime) -> Option<&TimeSlot> {
        let day = Weekday::from(local.weekday());
        let time = TimeOfDay::from_naive(local.time());
        self.day(day).iter().find(|slot| slot.contains(time))
    }

    /// What the appliance should be doing at `local`.
    ///
    /// No covering slot, or a slot with power `0`, means off.
    #[must_use]
    pub fn desired_state(&self, local: NaiveDateTime) -> DesiredApplianceState {
        let Some(slot) = self.active_slot(local) else {
            return DesiredApplianceState::Off;
        };
        match (PowerLevel::new(slot.power), FanLevel::new(slot.fan)) {
            (Ok(power), Ok(fan)) => DesiredApplianceState::On { power, fan },
            _ => DesiredApplianceState::Off,
        }
    }

    /// The first slot boundary (start or end) strictly after `local`,
    /// searching at most one week ahead.
    #[must_use]
    pub fn next_transition(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = local.date();
        (0..=7).find_map(|offset| {
            let date = today + Duration::days(offset);
            let midnight = date.and_hms_opt(0, 0, 0)?;
            self.day(Weekday::from(date.weekday()))
                .iter()
                .flat_map(|slot| [slot.start, slot.end])
                .map(|boundary| midnight + Duration::minutes(i64::from(boundary.minutes())))
                .filter(|instant| *instant > local)
                .min()
        })
    }
}

/// Step-by-step builder for [`WeeklySchedule`].
#[derive(Debug, Default)]
pub struct WeeklyScheduleBuilder {
    id: Option<ScheduleId>,
    name: Option<String>,
    slots: BTreeMap<Weekday, Vec<TimeSlot>>,
    updated_at: Option<Timestamp>,
    updated_by: Option<String>,
}

impl WeeklyScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn day(mut self, day: Weekday, slots: Vec<TimeSlot>) -> Self {
        self.slots.insert(day, slots);
        self
    }

    #[must_use]
    pub fn updated_at(mut self, ts: Timestamp) -> Self {
        self.updated_at = Some(ts);
        self
    }

    #[must_use]
    pub fn updated_by(mut self, operator: impl Into<String>) -> Self {
        self.updated_by = Some(operator.into());
        self
    }

    /// Consume the builder, validate, and return a [`WeeklySchedule`].
    ///
    /// Without an explicit id, one is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] if the name is empty, the derived
    /// id is invalid, or any slot is invalid.
    pub fn build(self) -> Result<WeeklySchedule, PanelError> {
        let name = self.name.unwrap_or_default();
        let id = match self.id {
            Some(id) => id,
            None => ScheduleId::parse(slugify(&name))?,
        };
        let schedule = WeeklySchedule {
            id,
            name,
            slots: self.slots,
            updated_at: self.updated_at.unwrap_or_else(crate::time::now),
            updated_by: self.updated_by,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(raw: &str) -> TimeOfDay {
        raw.parse().unwrap()
    }

    fn slot(start: &str, end: &str, power: u8, fan: u8) -> TimeSlot {
        TimeSlot::new(t(start), t(end), power, fan).unwrap()
    }

    // 2025-01-06 is a Monday.
    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn winter() -> WeeklySchedule {
        WeeklySchedule::builder()
            .name("Winter")
            .day(
                Weekday::Monday,
                vec![slot("06:00", "08:30", 3, 2), slot("18:00", "22:00", 4, 3)],
            )
            .day(Weekday::Tuesday, vec![slot("07:00", "09:00", 2, 1)])
            .build()
            .unwrap()
    }

    #[test]
    fn should_derive_id_from_name() {
        let schedule = WeeklySchedule::builder()
            .name("Winter Evenings")
            .build()
            .unwrap();
        assert_eq!(schedule.id.as_str(), "winter-evenings");
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = WeeklySchedule::builder().name("  ").build();
        assert!(matches!(result, Err(PanelError::Validation(_))));
    }

    #[test]
    fn should_find_active_slot_for_local_time() {
        let schedule = winter();
        let active = schedule.active_slot(monday_at(7, 15)).unwrap();
        assert_eq!(active.power, 3);
        assert!(schedule.active_slot(monday_at(12, 0)).is_none());
    }

    #[test]
    fn should_prefer_first_slot_when_slots_overlap() {
        let schedule = WeeklySchedule::builder()
            .name("Overlap")
            .day(
                Weekday::Monday,
                vec![slot("06:00", "09:00", 2, 1), slot("08:00", "10:00", 5, 5)],
            )
            .build()
            .unwrap();
        assert_eq!(schedule.active_slot(monday_at(8, 30)).unwrap().power, 2);
    }

    #[test]
    fn should_desire_on_inside_slot_and_off_outside() {
        let schedule = winter();
        assert_eq!(
            schedule.desired_state(monday_at(19, 0)),
            DesiredApplianceState::On {
                power: PowerLevel::new(4).unwrap(),
                fan: FanLevel::new(3).unwrap(),
            }
        );
        assert_eq!(
            schedule.desired_state(monday_at(23, 0)),
            DesiredApplianceState::Off
        );
    }

    #[test]
    fn should_desire_off_for_zero_power_slot() {
        let schedule = WeeklySchedule::builder()
            .name("Quiet")
            .day(Weekday::Monday, vec![slot("00:00", "24:00", 0, 1)])
            .build()
            .unwrap();
        assert_eq!(
            schedule.desired_state(monday_at(10, 0)),
            DesiredApplianceState::Off
        );
    }

    #[test]
    fn should_find_next_transition_later_today() {
        let schedule = winter();
        assert_eq!(
            schedule.next_transition(monday_at(7, 0)),
            Some(monday_at(8, 30))
        );
        assert_eq!(
            schedule.next_transition(monday_at(8, 30)),
            Some(monday_at(18, 0))
        );
    }

    #[test]
    fn should_find_next_transition_on_following_day() {
        let schedule = winter();
        let tuesday_seven = monday_at(7, 0) + Duration::days(1);
        assert_eq!(schedule.next_transition(monday_at(22, 30)), Some(tuesday_seven));
    }

    #[test]
    fn should_return_none_when_schedule_is_empty() {
        let schedule = WeeklySchedule::builder().name("Empty").build().unwrap();
        assert!(schedule.next_transition(monday_at(7, 0)).is_none());
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let schedule = winter();
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["slots"]["monday"][0]["start"], "06:00");
        let parsed: WeeklySchedule = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, schedule);
    }
}
