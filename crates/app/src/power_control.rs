//! Power control cycle: drives the stove's power level with the PID controller.

use stovepanel_domain::coordination::CoordinationState;
use stovepanel_domain::error::{ConfigurationMissingError, PanelError};
use stovepanel_domain::outcome::{CycleFailure, ErrorStage, PowerCycleOutcome, PowerSkipReason};
use stovepanel_domain::pid::{PidConfig, PidState};
use stovepanel_domain::scheduler_mode::SchedulerMode;
use stovepanel_domain::time::minutes_between;

use crate::cycle::AtStage;
use crate::ports::{ApplianceController, ApplianceStatusSource, Clock, StateStore, ZoneGateway};
use crate::records;
use crate::settings::EngineSettings;

/// Runs one PID interval per call.
pub struct PowerControlService<S, A, Z, C> {
    store: S,
    appliance: A,
    zones: Z,
    clock: C,
    settings: EngineSettings,
}

impl<S, A, Z, C> PowerControlService<S, A, Z, C>
where
    S: StateStore,
    A: ApplianceStatusSource + ApplianceController,
    Z: ZoneGateway,
    C: Clock,
{
    pub fn new(store: S, appliance: A, zones: Z, clock: C, settings: EngineSettings) -> Self {
        Self {
            store,
            appliance,
            zones,
            clock,
            settings,
        }
    }

    /// Evaluate the controller for the configured zone and push the level.
    ///
    /// Only runs while automation is in control and the stove is heating.
    /// The new controller memory is stored once the appliance accepted the
    /// level, so a failed write is retried from the same memory next time.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self) -> PowerCycleOutcome {
        let outcome = self.step().await.unwrap_or_else(PowerCycleOutcome::Error);
        match &outcome {
            PowerCycleOutcome::Error(failure) => tracing::warn!(
                stage = ?failure.stage,
                kind = ?failure.kind,
                message = %failure.message,
                "power cycle failed"
            ),
            PowerCycleOutcome::Adjusted { level, previous, .. } => {
                tracing::info!(%level, ?previous, "power level adjusted");
            }
            other => tracing::debug!(?other, "power cycle finished"),
        }
        outcome
    }

    async fn step(&self) -> Result<PowerCycleOutcome, CycleFailure> {
        let now = self.clock.now();
        let config: PidConfig = records::load_or_default(&self.store, records::PID_CONFIG)
            .await
            .at_store()?;
        if !config.enabled {
            return Ok(skipped(PowerSkipReason::PidDisabled));
        }

        let mode: SchedulerMode = records::load_or_default(&self.store, records::SCHEDULER_MODE)
            .await
            .at_store()?;
        if !mode.effective(now).is_automatic() {
            return Ok(skipped(PowerSkipReason::NotAutomatic));
        }

        let zone_id = config
            .zone_id
            .clone()
            .ok_or_else(|| missing("power control zone"))
            .at(ErrorStage::Orchestrator)?;

        let status = self.appliance.status().await.at(ErrorStage::StoveApi)?;
        if !status.is_heating() {
            return Ok(skipped(PowerSkipReason::NotHeating));
        }

        let zones = self.zones.zone_states().await.at(ErrorStage::ZoneApi)?;
        let zone = zones
            .into_iter()
            .find(|zone| zone.room_id == zone_id)
            .ok_or_else(|| missing(format!("zone {zone_id}")))
            .at(ErrorStage::Orchestrator)?;
        let Some(measured) = zone.measured else {
            return Ok(skipped(PowerSkipReason::NoReading));
        };

        let coordination: CoordinationState =
            records::load_or_default(&self.store, records::COORDINATION_STATE)
                .await
                .at_store()?;
        let boosted_original = coordination
            .boosted_rooms
            .get(&zone_id)
            .and_then(|original| original.setpoint);
        let setpoint = config
            .setpoint
            .or(boosted_original)
            .or(zone.setpoint)
            .ok_or_else(|| missing(format!("setpoint for zone {zone_id}")))
            .at(ErrorStage::Orchestrator)?;

        let path = records::pid_state_path(&zone_id);
        let mut state = records::load::<PidState, _>(&self.store, &path)
            .await
            .at_store()?
            .unwrap_or_else(|| PidState::new(config.gains));
        state.gains = config.gains;
        if state.is_stale(now, self.settings.pid_state_max_age()) {
            state.reset();
        }
        let nominal = minutes_between(now - self.settings.control_interval, now);
        let dt = state
            .previous_timestamp
            .map_or(nominal, |previous| minutes_between(previous, now));
        let step = state.compute(setpoint, measured, dt, self.settings.integral_limit, now);

        let previous = status.power_level;
        let outcome = if previous == Some(step.level.get()) {
            PowerCycleOutcome::Held {
                zone: zone_id,
                level: step.level,
            }
        } else {
            self.appliance
                .set_power(step.level)
                .await
                .at(ErrorStage::StoveApi)?;
            PowerCycleOutcome::Adjusted {
                zone: zone_id,
                setpoint,
                measured,
                previous,
                level: step.level,
            }
        };
        records::save(&self.store, &path, &state)
            .await
            .at(ErrorStage::Store)?;
        Ok(outcome)
    }
}

fn skipped(reason: PowerSkipReason) -> PowerCycleOutcome {
    PowerCycleOutcome::Skipped { reason }
}

fn missing(what: impl Into<String>) -> PanelError {
    ConfigurationMissingError::new(what).into()
}
