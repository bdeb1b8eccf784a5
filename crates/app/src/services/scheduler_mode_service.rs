//! Scheduler mode service: automation on/off and the semi-manual hold.

use chrono::Duration;
use serde_json::{Value, json};

use stovepanel_domain::error::PanelError;
use stovepanel_domain::operator::Operator;
use stovepanel_domain::scheduler_mode::{EffectiveMode, SchedulerMode, validate_return_to_auto};
use stovepanel_domain::time::Timestamp;

use super::schedule_service::load_active_schedule;
use crate::ports::{Clock, IdentityContext, StateStore};
use crate::records;

/// Hold length used when the active schedule has no upcoming boundary.
const FALLBACK_HOLD: i64 = 1;

/// Application service owning the `scheduler/mode` record.
pub struct SchedulerModeService<S, C> {
    store: S,
    clock: C,
}

impl<S, C> SchedulerModeService<S, C>
where
    S: StateStore,
    C: Clock,
{
    /// Create a new service backed by the given store.
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The mode as seen right now.
    ///
    /// An expired hold reads as automatic. When one is observed, the stored
    /// record is cleared on a best-effort basis; a failed write-back does
    /// not affect the answer.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the record cannot be read.
    pub async fn current_mode(&self) -> Result<EffectiveMode, PanelError> {
        let now = self.clock.now();
        let stored: SchedulerMode = records::load_or_default(&self.store, records::SCHEDULER_MODE).await?;
        if stored.is_semi_manual_expired(now) {
            match self.clear_expired_hold(&stored).await {
                Ok(true) => tracing::info!("semi-manual hold expired, back to automatic"),
                Ok(false) => tracing::debug!("semi-manual hold replaced before expiry write-back"),
                Err(err) => tracing::warn!(%err, "failed to clear expired semi-manual hold"),
            }
        }
        Ok(stored.effective(now))
    }

    /// Clear the hold that `observed` describes, unless another hold has been
    /// stored since it was read.
    async fn clear_expired_hold(&self, observed: &SchedulerMode) -> Result<bool, PanelError> {
        let latest: SchedulerMode = records::load_or_default(&self.store, records::SCHEDULER_MODE).await?;
        if !latest.semi_manual || latest.return_to_auto_at != observed.return_to_auto_at {
            return Ok(false);
        }
        self.write(&Operator::system(), exit_patch()).await?;
        Ok(true)
    }

    /// The raw stored record, without expiry.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn stored_mode(&self) -> Result<SchedulerMode, PanelError> {
        records::load_or_default(&self.store, records::SCHEDULER_MODE).await
    }

    /// Turn automation on or off. Turning it off also drops any hold.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[tracing::instrument(skip(self, identity), fields(operator = %identity.operator()))]
    pub async fn set_enabled(
        &self,
        identity: &impl IdentityContext,
        enabled: bool,
    ) -> Result<EffectiveMode, PanelError> {
        let patch = if enabled {
            json!({ "enabled": true })
        } else {
            let mut patch = exit_patch();
            patch["enabled"] = json!(false);
            patch
        };
        self.write(&identity.operator(), patch).await?;
        self.current_mode().await
    }

    /// Hold the current appliance state until `return_to_auto_at`.
    ///
    /// Always enables automation, so the hold ends in automatic mode.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] unless the deadline is in the
    /// future, or a storage error.
    #[tracing::instrument(skip(self, identity), fields(operator = %identity.operator()))]
    pub async fn enter_semi_manual(
        &self,
        identity: &impl IdentityContext,
        return_to_auto_at: Timestamp,
    ) -> Result<EffectiveMode, PanelError> {
        let now = self.clock.now();
        validate_return_to_auto(return_to_auto_at, now)?;
        self.write(
            &identity.operator(),
            json!({
                "enabled": true,
                "semi_manual": true,
                "semi_manual_activated_at": now,
                "return_to_auto_at": return_to_auto_at,
            }),
        )
        .await?;
        self.current_mode().await
    }

    /// Hold until the next slot boundary of the active schedule, or for one
    /// hour when the schedule has no boundary in the coming week.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_active_schedule`] or a storage error.
    pub async fn enter_semi_manual_until_next_slot(
        &self,
        identity: &impl IdentityContext,
    ) -> Result<EffectiveMode, PanelError> {
        let schedule = load_active_schedule(&self.store).await?;
        let now = self.clock.now();
        let local_now = self.clock.local_now();
        let deadline = schedule
            .next_transition(local_now)
            .map_or_else(|| now + Duration::hours(FALLBACK_HOLD), |next| now + (next - local_now));
        self.enter_semi_manual(identity, deadline).await
    }

    /// Drop the hold and go back to automatic mode.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[tracing::instrument(skip(self, identity), fields(operator = %identity.operator()))]
    pub async fn exit_semi_manual(
        &self,
        identity: &impl IdentityContext,
    ) -> Result<EffectiveMode, PanelError> {
        self.write(&identity.operator(), exit_patch()).await?;
        self.current_mode().await
    }

    async fn write(&self, operator: &Operator, mut patch: Value) -> Result<(), PanelError> {
        patch["last_updated"] = json!(self.clock.now());
        patch["updated_by"] = json!(operator);
        self.store.update(records::SCHEDULER_MODE, patch).await
    }
}

fn exit_patch() -> Value {
    json!({
        "semi_manual": false,
        "semi_manual_activated_at": null,
        "return_to_auto_at": null,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;
    use crate::services::schedule_service::ScheduleService;
    use crate::test_support::{FixedClock, MemoryStore};
    use stovepanel_domain::error::ValidationError;
    use stovepanel_domain::schedule::{TimeSlot, Weekday};

    fn make_service() -> (SchedulerModeService<MemoryStore, FixedClock>, MemoryStore, FixedClock) {
        let store = MemoryStore::default();
        let clock = FixedClock::monday_at(7, 0);
        (
            SchedulerModeService::new(store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    fn alice() -> Operator {
        Operator::new("alice")
    }

    #[tokio::test]
    async fn should_start_in_manual_mode() {
        let (svc, _, _) = make_service();
        let mode = svc.current_mode().await.unwrap();
        assert!(!mode.enabled);
        assert!(!mode.semi_manual);
    }

    #[tokio::test]
    async fn should_expire_semi_manual_hold_lazily() {
        let (svc, store, clock) = make_service();
        let deadline = clock.now() + Duration::hours(1);

        let mode = svc.enter_semi_manual(&alice(), deadline).await.unwrap();
        assert!(mode.enabled);
        assert!(mode.semi_manual);
        assert_eq!(mode.effective_until, Some(deadline));

        clock.advance(Duration::hours(1));
        let mode = svc.current_mode().await.unwrap();
        assert!(mode.enabled);
        assert!(!mode.semi_manual);

        let stored = store.snapshot(records::SCHEDULER_MODE).unwrap();
        assert_eq!(stored["semi_manual"], false);
        assert_eq!(stored["updated_by"], "system");
    }

    #[tokio::test]
    async fn should_answer_even_when_expiry_write_back_fails() {
        let (svc, store, clock) = make_service();
        svc.enter_semi_manual(&alice(), clock.now() + Duration::minutes(5))
            .await
            .unwrap();
        clock.advance(Duration::minutes(10));

        // reads succeed, writes fail
        let stored = svc.stored_mode().await.unwrap();
        assert!(stored.semi_manual);
        let flaky = FlakyWrites(store);
        let svc = SchedulerModeService::new(flaky, clock);
        let mode = svc.current_mode().await.unwrap();
        assert!(!mode.semi_manual);
    }

    #[tokio::test]
    async fn should_keep_hold_entered_while_expired_one_was_being_read() {
        let (svc, store, clock) = make_service();
        svc.enter_semi_manual(&alice(), clock.now() + Duration::minutes(5))
            .await
            .unwrap();
        let expired = store.snapshot(records::SCHEDULER_MODE).unwrap();
        clock.advance(Duration::minutes(10));
        let renewed_until = clock.now() + Duration::hours(1);
        svc.enter_semi_manual(&alice(), renewed_until).await.unwrap();
        let renewed = store.snapshot(records::SCHEDULER_MODE).unwrap();

        let svc = SchedulerModeService::new(
            StaleFirstRead {
                inner: store.clone(),
                stale: Mutex::new(Some(expired)),
            },
            clock,
        );
        let mode = svc.current_mode().await.unwrap();
        assert!(!mode.semi_manual);

        assert_eq!(store.snapshot(records::SCHEDULER_MODE).unwrap(), renewed);
        let stored = svc.stored_mode().await.unwrap();
        assert!(stored.semi_manual);
        assert_eq!(stored.return_to_auto_at, Some(renewed_until));
    }

    #[tokio::test]
    async fn should_reject_deadline_in_the_past() {
        let (svc, store, clock) = make_service();
        let result = svc.enter_semi_manual(&alice(), clock.now()).await;
        assert!(matches!(
            result,
            Err(PanelError::Validation(ValidationError::ReturnToAutoInPast))
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn should_clear_hold_when_disabling_automation() {
        let (svc, store, clock) = make_service();
        svc.enter_semi_manual(&alice(), clock.now() + Duration::hours(2))
            .await
            .unwrap();

        let mode = svc.set_enabled(&alice(), false).await.unwrap();
        assert!(!mode.enabled);
        assert!(!mode.semi_manual);
        let stored = store.snapshot(records::SCHEDULER_MODE).unwrap();
        assert!(stored.get("return_to_auto_at").is_none());
    }

    #[tokio::test]
    async fn should_exit_semi_manual_into_automatic() {
        let (svc, _, clock) = make_service();
        svc.enter_semi_manual(&alice(), clock.now() + Duration::hours(2))
            .await
            .unwrap();
        let mode = svc.exit_semi_manual(&alice()).await.unwrap();
        assert!(mode.is_automatic());
    }

    #[tokio::test]
    async fn should_hold_until_next_slot_boundary() {
        let (svc, store, clock) = make_service();
        let schedules = ScheduleService::new(store.clone(), clock.clone());
        let mut slots = BTreeMap::new();
        slots.insert(
            Weekday::Monday,
            vec![TimeSlot::new("06:00".parse().unwrap(), "08:30".parse().unwrap(), 3, 2).unwrap()],
        );
        let schedule = schedules
            .create_schedule(&alice(), None, "Winter".to_string(), slots)
            .await
            .unwrap();
        schedules.set_active_schedule(&alice(), &schedule.id).await.unwrap();

        let mode = svc.enter_semi_manual_until_next_slot(&alice()).await.unwrap();
        assert_eq!(
            mode.effective_until,
            Some(clock.now() + Duration::minutes(90))
        );
    }

    #[tokio::test]
    async fn should_hold_one_hour_when_schedule_is_empty() {
        let (svc, store, clock) = make_service();
        let schedules = ScheduleService::new(store.clone(), clock.clone());
        let schedule = schedules
            .create_schedule(&alice(), None, "Empty".to_string(), BTreeMap::new())
            .await
            .unwrap();
        schedules.set_active_schedule(&alice(), &schedule.id).await.unwrap();

        let mode = svc.enter_semi_manual_until_next_slot(&alice()).await.unwrap();
        assert_eq!(mode.effective_until, Some(clock.now() + Duration::hours(1)));
    }

    struct FlakyWrites(MemoryStore);

    impl StateStore for FlakyWrites {
        async fn get(&self, path: &str) -> Result<Option<Value>, PanelError> {
            self.0.get(path).await
        }

        async fn set(&self, _path: &str, _value: Value) -> Result<(), PanelError> {
            Err(PanelError::storage(std::io::Error::other("read-only")))
        }

        async fn update(&self, _path: &str, _patch: Value) -> Result<(), PanelError> {
            Err(PanelError::storage(std::io::Error::other("read-only")))
        }

        async fn remove(&self, _path: &str) -> Result<(), PanelError> {
            Err(PanelError::storage(std::io::Error::other("read-only")))
        }

        async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, PanelError> {
            self.0.children(parent).await
        }
    }

    /// Serves one outdated read before passing through, as if another writer
    /// landed right after it.
    struct StaleFirstRead {
        inner: MemoryStore,
        stale: Mutex<Option<Value>>,
    }

    impl StateStore for StaleFirstRead {
        async fn get(&self, path: &str) -> Result<Option<Value>, PanelError> {
            let stale = self.stale.lock().unwrap().take();
            match stale {
                Some(value) => Ok(Some(value)),
                None => self.inner.get(path).await,
            }
        }

        async fn set(&self, path: &str, value: Value) -> Result<(), PanelError> {
            self.inner.set(path, value).await
        }

        async fn update(&self, path: &str, patch: Value) -> Result<(), PanelError> {
            self.inner.update(path, patch).await
        }

        async fn remove(&self, path: &str) -> Result<(), PanelError> {
            self.inner.remove(path).await
        }

        async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, PanelError> {
            self.inner.children(parent).await
        }
    }
}
