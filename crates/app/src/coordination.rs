//! Coordination orchestrator: boosts zone thermostats while the stove heats.
//!
//! Each call to [`CoordinationOrchestrator::run_cycle`] is a self-contained
//! pass: read the persisted state, observe the devices, take at most one
//! transition, write back, and report a [`CoordinationOutcome`]. Transitions
//! are idempotent so overlapping invocations are harmless:
//! `boosted_rooms` guards boost and restore, `last_action_at` drives the
//! debounce.

use serde_json::{Map, Value, json};

use stovepanel_domain::appliance::ApplianceStatus;
use stovepanel_domain::coordination::{
    CoordinationEvent, CoordinationOutcome, CoordinationState, NoopReason, OriginalSetpoint,
    PauseReason, SyncConfig,
};
use stovepanel_domain::error::{PanelError, UpstreamError};
use stovepanel_domain::id::RoomId;
use stovepanel_domain::outcome::{CycleFailure, ErrorKind, ErrorStage};
use stovepanel_domain::scheduler_mode::{EffectiveMode, SchedulerMode};
use stovepanel_domain::time::Timestamp;
use stovepanel_domain::zone::{ZoneSetpointCommand, ZoneState};

use crate::cycle::AtStage;
use crate::ports::{ApplianceStatusSource, Clock, CoordinationEventSink, StateStore, ZoneGateway};
use crate::records;
use crate::settings::EngineSettings;

/// What the cycle observed, recorded alongside the outcome.
#[derive(Default)]
struct Observed {
    appliance_status: Option<ApplianceStatus>,
    scheduler_mode: Option<EffectiveMode>,
}

/// Rooms touched by a batch of zone writes, plus the first failure.
#[derive(Default)]
struct Batch {
    done: Vec<RoomId>,
    failure: Option<CycleFailure>,
}

impl Batch {
    fn fail(&mut self, room: &RoomId, result: Result<bool, PanelError>) {
        if self.failure.is_some() {
            return;
        }
        let err = match result {
            Ok(_) => PanelError::from(UpstreamError::zone_gateway(format!(
                "setpoint rejected for room {room}"
            ))),
            Err(err) => err,
        };
        self.failure = Some(CycleFailure::new(ErrorStage::ZoneApi, &err));
    }
}

/// Cross-device orchestrator.
pub struct CoordinationOrchestrator<S, A, Z, E, C> {
    store: S,
    appliance: A,
    zones: Z,
    events: E,
    clock: C,
    settings: EngineSettings,
}

impl<S, A, Z, E, C> CoordinationOrchestrator<S, A, Z, E, C>
where
    S: StateStore,
    A: ApplianceStatusSource,
    Z: ZoneGateway,
    E: CoordinationEventSink,
    C: Clock,
{
    pub fn new(store: S, appliance: A, zones: Z, events: E, clock: C, settings: EngineSettings) -> Self {
        Self {
            store,
            appliance,
            zones,
            events,
            clock,
            settings,
        }
    }

    /// Run one coordination cycle.
    ///
    /// Never fails: every problem is reported as
    /// [`CoordinationOutcome::Error`]. The whole pass is bounded by the
    /// configured cycle timeout. The outcome is appended to the event log;
    /// a failing log is only reported through tracing.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self) -> CoordinationOutcome {
        let mut observed = Observed::default();
        let limit = self.settings.cycle_timeout;
        let outcome = match tokio::time::timeout(limit, self.transition(&mut observed)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(failure)) => CoordinationOutcome::Error(failure),
            Err(_) => CoordinationOutcome::Error(CycleFailure::timeout(limit)),
        };

        match &outcome {
            CoordinationOutcome::Error(failure) => tracing::warn!(
                stage = ?failure.stage,
                kind = ?failure.kind,
                message = %failure.message,
                "coordination cycle failed"
            ),
            other => tracing::info!(outcome = other.label(), "coordination cycle finished"),
        }

        let event = CoordinationEvent::new(self.clock.now(), outcome.clone())
            .with_appliance_status(observed.appliance_status)
            .with_scheduler_mode(observed.scheduler_mode);
        if let Err(err) = self.events.append(event).await {
            tracing::warn!(%err, "failed to append coordination event");
        }
        outcome
    }

    async fn transition(&self, observed: &mut Observed) -> Result<CoordinationOutcome, CycleFailure> {
        let now = self.clock.now();
        let mut state: CoordinationState =
            records::load_or_default(&self.store, records::COORDINATION_STATE)
                .await
                .at_store()?;

        if let Some(remaining) = state.pause_remaining(now) {
            let reason = state.pause_reason.unwrap_or(PauseReason::ManualOverride);
            return Ok(CoordinationOutcome::paused(reason, remaining));
        }

        let config: SyncConfig = records::load_or_default(&self.store, records::SYNC_CONFIG)
            .await
            .at_store()?;
        let mode: SchedulerMode = records::load_or_default(&self.store, records::SCHEDULER_MODE)
            .await
            .at_store()?;
        let mode = mode.effective(now);
        observed.scheduler_mode = Some(mode);

        if !config.enabled {
            if state.is_boost_active() {
                return self.restore(&mut state, now).await;
            }
            return Ok(CoordinationOutcome::Noop {
                reason: NoopReason::SyncDisabled,
            });
        }
        if config.rooms.is_empty() {
            return Err(CycleFailure {
                stage: ErrorStage::Orchestrator,
                kind: ErrorKind::ConfigurationMissing,
                message: "no rooms configured for synchronization".to_string(),
            });
        }

        let status = self.appliance.status().await.at(ErrorStage::StoveApi)?;
        let heating = status.is_heating();
        observed.appliance_status = Some(status);

        match (heating, state.is_boost_active()) {
            (true, false) => self.boost(&config, &mut state, mode, now).await,
            (true, true) => {
                if let Some(remaining) =
                    state.debounce_remaining(now, self.settings.min_reapply_interval)
                {
                    return Ok(CoordinationOutcome::debouncing(remaining));
                }
                self.reapply(&config, &mut state, mode, now).await
            }
            (false, true) => self.restore(&mut state, now).await,
            (false, false) => Ok(CoordinationOutcome::Noop {
                reason: NoopReason::Idle,
            }),
        }
    }

    /// Boost every configured room that is not boosted yet.
    async fn boost(
        &self,
        config: &SyncConfig,
        state: &mut CoordinationState,
        mode: EffectiveMode,
        now: Timestamp,
    ) -> Result<CoordinationOutcome, CycleFailure> {
        let zones = self.zones.zone_states().await.at(ErrorStage::ZoneApi)?;
        let known = config
            .rooms
            .iter()
            .any(|synced| zones.iter().any(|zone| zone.room_id == synced.room_id));
        if !known {
            return Err(CycleFailure {
                stage: ErrorStage::Orchestrator,
                kind: ErrorKind::ConfigurationMissing,
                message: "no synchronized room is known to the zone gateway".to_string(),
            });
        }
        let mut batch = Batch::default();
        self.boost_new_rooms(config, state, &zones, self.boost_end(mode, now), &mut batch)
            .await?;
        self.finish(now, batch, |rooms| CoordinationOutcome::Applied { rooms })
            .await
    }

    /// Re-push boosted setpoints, unless someone overrode a room by hand.
    async fn reapply(
        &self,
        config: &SyncConfig,
        state: &mut CoordinationState,
        mode: EffectiveMode,
        now: Timestamp,
    ) -> Result<CoordinationOutcome, CycleFailure> {
        let zones = self.zones.zone_states().await.at(ErrorStage::ZoneApi)?;

        let overridden = state.manual_overrides(&zones);
        if !overridden.is_empty() {
            let mut dropped = Map::new();
            for room in &overridden {
                state.boosted_rooms.remove(room);
                dropped.insert(room.to_string(), Value::Null);
            }
            self.patch_state(json!({
                "boosted_rooms": dropped,
                "paused_until": now + self.settings.pause_duration,
                "pause_reason": PauseReason::ManualOverride,
            }))
            .await?;
            tracing::info!(rooms = ?overridden, "manual override detected, pausing coordination");
            return Ok(CoordinationOutcome::paused(
                PauseReason::ManualOverride,
                self.settings.pause_duration,
            ));
        }

        let end_time = self.boost_end(mode, now);
        let mut batch = Batch::default();
        let boosted: Vec<(RoomId, OriginalSetpoint)> = state
            .boosted_rooms
            .iter()
            .map(|(room, original)| (room.clone(), *original))
            .collect();
        for (room, mut original) in boosted {
            let target = config.boosted_setpoint(original.setpoint);
            let command = ZoneSetpointCommand::manual(room.clone(), target, Some(end_time));
            match self.zones.set_zone_setpoint(command).await {
                Ok(true) => {
                    if (original.boosted_to - target).abs() > f64::EPSILON {
                        original.boosted_to = target;
                        self.record_room(&room, Some(&original)).await?;
                    }
                    state.boosted_rooms.insert(room.clone(), original);
                    batch.done.push(room);
                }
                other => batch.fail(&room, other),
            }
        }
        self.boost_new_rooms(config, state, &zones, end_time, &mut batch)
            .await?;
        self.finish(now, batch, |rooms| CoordinationOutcome::Applied { rooms })
            .await
    }

    /// The original settings of a room are stored before its thermostat is
    /// touched, so an abandoned cycle never leaves a boost without a record.
    /// An explicit rejection drops the record again; a transport error keeps
    /// it, since the write may have landed.
    async fn boost_new_rooms(
        &self,
        config: &SyncConfig,
        state: &mut CoordinationState,
        zones: &[ZoneState],
        end_time: Timestamp,
        batch: &mut Batch,
    ) -> Result<(), CycleFailure> {
        for synced in &config.rooms {
            if state.boosted_rooms.contains_key(&synced.room_id) {
                continue;
            }
            let Some(zone) = zones.iter().find(|zone| zone.room_id == synced.room_id) else {
                tracing::warn!(room = %synced.room_id, "configured room unknown to zone gateway");
                continue;
            };
            // a concurrent cycle may have boosted the room since the state was loaded
            let stored: CoordinationState =
                records::load_or_default(&self.store, records::COORDINATION_STATE)
                    .await
                    .at_store()?;
            if stored.boosted_rooms.contains_key(&zone.room_id) {
                tracing::debug!(room = %zone.room_id, "room already boosted by another cycle");
                continue;
            }

            let target = config.boosted_setpoint(zone.setpoint);
            let original = OriginalSetpoint {
                mode: zone.mode,
                setpoint: zone.setpoint,
                boosted_to: target,
            };
            self.record_room(&zone.room_id, Some(&original)).await?;

            let command = ZoneSetpointCommand::manual(zone.room_id.clone(), target, Some(end_time));
            match self.zones.set_zone_setpoint(command).await {
                Ok(true) => {
                    state.boosted_rooms.insert(zone.room_id.clone(), original);
                    batch.done.push(zone.room_id.clone());
                }
                Ok(false) => {
                    self.record_room(&zone.room_id, None).await?;
                    batch.fail(&zone.room_id, Ok(false));
                }
                Err(err) => batch.fail(&zone.room_id, Err(err)),
            }
        }
        Ok(())
    }

    /// Put every boosted room back the way it was.
    async fn restore(
        &self,
        state: &mut CoordinationState,
        now: Timestamp,
    ) -> Result<CoordinationOutcome, CycleFailure> {
        let mut batch = Batch::default();
        let boosted: Vec<(RoomId, OriginalSetpoint)> = state
            .boosted_rooms
            .iter()
            .map(|(room, original)| (room.clone(), *original))
            .collect();
        for (room, original) in boosted {
            let command = ZoneSetpointCommand::restore(room.clone(), original.mode, original.setpoint);
            match self.zones.set_zone_setpoint(command).await {
                Ok(true) => {
                    self.record_room(&room, None).await?;
                    state.boosted_rooms.remove(&room);
                    batch.done.push(room);
                }
                other => batch.fail(&room, other),
            }
        }
        self.finish(now, batch, |rooms| CoordinationOutcome::Restored { rooms })
            .await
    }

    /// Stamp the action time when any room was written, then report.
    async fn finish(
        &self,
        now: Timestamp,
        batch: Batch,
        success: impl FnOnce(Vec<RoomId>) -> CoordinationOutcome,
    ) -> Result<CoordinationOutcome, CycleFailure> {
        if !batch.done.is_empty() {
            self.patch_state(json!({
                "last_action_at": now,
                "paused_until": null,
                "pause_reason": null,
            }))
            .await?;
        }
        match batch.failure {
            Some(failure) => Err(failure),
            None => Ok(success(batch.done)),
        }
    }

    /// Store or drop the pre-boost settings of one room.
    async fn record_room(
        &self,
        room: &RoomId,
        original: Option<&OriginalSetpoint>,
    ) -> Result<(), CycleFailure> {
        let entry = serde_json::to_value(original)
            .map_err(PanelError::storage)
            .at(ErrorStage::Store)?;
        let mut rooms = Map::new();
        rooms.insert(room.to_string(), entry);
        self.patch_state(json!({ "boosted_rooms": rooms })).await
    }

    async fn patch_state(&self, patch: Value) -> Result<(), CycleFailure> {
        self.store
            .update(records::COORDINATION_STATE, patch)
            .await
            .at(ErrorStage::Store)
    }

    /// Boosts end on their own after the maximum duration, or when an
    /// active semi-manual hold ends, whichever comes first.
    fn boost_end(&self, mode: EffectiveMode, now: Timestamp) -> Timestamp {
        let max = now + self.settings.boost_max_duration;
        match mode.effective_until {
            Some(until) if mode.semi_manual => max.min(until),
            _ => max,
        }
    }
}
