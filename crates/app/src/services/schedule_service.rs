//! Schedule service: named weekly schedules and the active-schedule pointer.

use std::collections::BTreeMap;

use serde_json::json;

use stovepanel_domain::error::{ConfigurationMissingError, NotFoundError, PanelError, ValidationError};
use stovepanel_domain::id::ScheduleId;
use stovepanel_domain::schedule::{TimeSlot, Weekday, WeeklySchedule};

use crate::ports::{Clock, IdentityContext, StateStore};
use crate::records;

/// Load the schedule the active pointer refers to.
///
/// # Errors
///
/// - [`PanelError::ConfigurationMissing`] when no pointer is set
/// - [`PanelError::NotFound`] when the pointer refers to a deleted schedule
pub async fn load_active_schedule<S: StateStore>(store: &S) -> Result<WeeklySchedule, PanelError> {
    let id: ScheduleId = records::load(store, records::ACTIVE_SCHEDULE_ID)
        .await?
        .ok_or_else(|| ConfigurationMissingError::new("active schedule"))?;
    load_schedule(store, &id).await
}

async fn load_schedule<S: StateStore>(store: &S, id: &ScheduleId) -> Result<WeeklySchedule, PanelError> {
    records::load(store, &records::schedule_path(id))
        .await?
        .ok_or_else(|| {
            NotFoundError {
                entity: "Schedule",
                id: id.to_string(),
            }
            .into()
        })
}

/// Application service for weekly schedules.
pub struct ScheduleService<S, C> {
    store: S,
    clock: C,
}

impl<S, C> ScheduleService<S, C>
where
    S: StateStore,
    C: Clock,
{
    /// Create a new service backed by the given store.
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Create a schedule. The id is derived from the name unless given.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for invalid input or when a
    /// schedule with the same id exists, or a storage error.
    #[tracing::instrument(skip(self, identity, slots))]
    pub async fn create_schedule(
        &self,
        identity: &impl IdentityContext,
        id: Option<ScheduleId>,
        name: String,
        slots: BTreeMap<Weekday, Vec<TimeSlot>>,
    ) -> Result<WeeklySchedule, PanelError> {
        let mut builder = WeeklySchedule::builder()
            .name(name)
            .updated_at(self.clock.now())
            .updated_by(identity.operator().to_string());
        if let Some(id) = id {
            builder = builder.id(id);
        }
        for (day, day_slots) in slots {
            builder = builder.day(day, day_slots);
        }
        let schedule = builder.build()?;

        let path = records::schedule_path(&schedule.id);
        if self.store.get(&path).await?.is_some() {
            return Err(ValidationError::ScheduleExists(schedule.id.to_string()).into());
        }
        records::save(&self.store, &path, &schedule).await?;
        tracing::info!(schedule = %schedule.id, "schedule created");
        Ok(schedule)
    }

    /// Look up a schedule by id.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::NotFound`] when no schedule has this id.
    pub async fn get_schedule(&self, id: &ScheduleId) -> Result<WeeklySchedule, PanelError> {
        load_schedule(&self.store, id).await
    }

    /// List all schedules, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_schedules(&self) -> Result<Vec<WeeklySchedule>, PanelError> {
        let mut schedules: Vec<WeeklySchedule> =
            records::load_children(&self.store, records::SCHEDULES).await?;
        schedules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schedules)
    }

    /// Delete a schedule that is not the active one.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ActiveScheduleDeletion`] for the active schedule
    /// - [`PanelError::NotFound`] when no schedule has this id
    #[tracing::instrument(skip(self))]
    pub async fn delete_schedule(&self, id: &ScheduleId) -> Result<(), PanelError> {
        let active: Option<ScheduleId> = records::load(&self.store, records::ACTIVE_SCHEDULE_ID).await?;
        if active.as_ref() == Some(id) {
            return Err(ValidationError::ActiveScheduleDeletion.into());
        }
        load_schedule(&self.store, id).await?;
        self.store.remove(&records::schedule_path(id)).await
    }

    /// The schedule currently driving the appliance.
    ///
    /// # Errors
    ///
    /// See [`load_active_schedule`].
    pub async fn get_active_schedule(&self) -> Result<WeeklySchedule, PanelError> {
        load_active_schedule(&self.store).await
    }

    /// Point the engine at another schedule. A single write; the previous
    /// pointer stays in place when `id` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::NotFound`] when no schedule has this id.
    #[tracing::instrument(skip(self, identity), fields(operator = %identity.operator()))]
    pub async fn set_active_schedule(
        &self,
        identity: &impl IdentityContext,
        id: &ScheduleId,
    ) -> Result<WeeklySchedule, PanelError> {
        let schedule = load_schedule(&self.store, id).await?;
        self.store
            .set(records::ACTIVE_SCHEDULE_ID, json!(id.as_str()))
            .await?;
        tracing::info!(schedule = %id, "active schedule switched");
        Ok(schedule)
    }

    /// Replace one day of the active schedule.
    ///
    /// Every slot is validated before anything is written; other days are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for an invalid slot, or the errors
    /// of [`load_active_schedule`].
    #[tracing::instrument(skip(self, identity, slots), fields(slots = slots.len()))]
    pub async fn save_day_slots(
        &self,
        identity: &impl IdentityContext,
        day: Weekday,
        slots: Vec<TimeSlot>,
    ) -> Result<WeeklySchedule, PanelError> {
        for slot in &slots {
            slot.validate()?;
        }
        let schedule = load_active_schedule(&self.store).await?;
        let path = records::schedule_path(&schedule.id);
        let patch = json!({
            "slots": { day.as_str(): slots },
            "updated_at": self.clock.now(),
            "updated_by": identity.operator(),
        });
        self.store.update(&path, patch).await?;
        load_schedule(&self.store, &schedule.id).await
    }
}
