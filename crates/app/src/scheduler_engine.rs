//! Scheduler engine: enforces the active weekly schedule on the stove.

use stovepanel_domain::appliance::{ApplianceState, DesiredApplianceState};
use stovepanel_domain::outcome::{CycleFailure, ErrorStage, SchedulerCycleOutcome};
use stovepanel_domain::pid::PidConfig;
use stovepanel_domain::scheduler_mode::SchedulerMode;

use crate::cycle::AtStage;
use crate::ports::{ApplianceController, ApplianceStatusSource, Clock, StateStore};
use crate::records;
use crate::services::schedule_service::load_active_schedule;

/// Turns the active slot into appliance commands.
pub struct SchedulerEngine<S, A, C> {
    store: S,
    appliance: A,
    clock: C,
}

impl<S, A, C> SchedulerEngine<S, A, C>
where
    S: StateStore,
    A: ApplianceStatusSource + ApplianceController,
    C: Clock,
{
    pub fn new(store: S, appliance: A, clock: C) -> Self {
        Self {
            store,
            appliance,
            clock,
        }
    }

    /// Compare the desired state with the stove and issue what differs.
    ///
    /// Power is left to the PID controller while it is enabled, except on
    /// ignition.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self) -> SchedulerCycleOutcome {
        let outcome = self.step().await.unwrap_or_else(SchedulerCycleOutcome::Error);
        match &outcome {
            SchedulerCycleOutcome::Error(failure) => tracing::warn!(
                stage = ?failure.stage,
                kind = ?failure.kind,
                message = %failure.message,
                "scheduler cycle failed"
            ),
            SchedulerCycleOutcome::Unchanged { .. }
            | SchedulerCycleOutcome::Manual
            | SchedulerCycleOutcome::SemiManual { .. } => {
                tracing::debug!(?outcome, "scheduler cycle finished");
            }
            other => tracing::info!(?other, "scheduler cycle acted"),
        }
        outcome
    }

    async fn step(&self) -> Result<SchedulerCycleOutcome, CycleFailure> {
        let now = self.clock.now();
        let mode: SchedulerMode = records::load_or_default(&self.store, records::SCHEDULER_MODE)
            .await
            .at_store()?;
        let mode = mode.effective(now);
        if !mode.enabled {
            return Ok(SchedulerCycleOutcome::Manual);
        }
        if mode.semi_manual {
            return Ok(SchedulerCycleOutcome::SemiManual {
                until: mode.effective_until,
            });
        }

        let schedule = load_active_schedule(&self.store).await.at_store()?;
        let desired = schedule.desired_state(self.clock.local_now());
        let pid: PidConfig = records::load_or_default(&self.store, records::PID_CONFIG)
            .await
            .at_store()?;

        let status = self.appliance.status().await.at(ErrorStage::StoveApi)?;
        let state = status.state();

        match desired {
            DesiredApplianceState::On { power, fan } if state.is_idle() => {
                self.appliance.ignite().await.at(ErrorStage::StoveApi)?;
                self.appliance.set_fan(fan).await.at(ErrorStage::StoveApi)?;
                self.appliance
                    .set_power(power)
                    .await
                    .at(ErrorStage::StoveApi)?;
                Ok(SchedulerCycleOutcome::Ignited { power, fan })
            }
            DesiredApplianceState::On { power, fan } if state.is_heating() => {
                let fan_change = (status.fan_level != Some(fan.get())).then_some(fan);
                let power_change =
                    (!pid.enabled && status.power_level != Some(power.get())).then_some(power);
                if let Some(fan) = fan_change {
                    self.appliance.set_fan(fan).await.at(ErrorStage::StoveApi)?;
                }
                if let Some(power) = power_change {
                    self.appliance
                        .set_power(power)
                        .await
                        .at(ErrorStage::StoveApi)?;
                }
                if fan_change.is_none() && power_change.is_none() {
                    Ok(SchedulerCycleOutcome::Unchanged { desired })
                } else {
                    Ok(SchedulerCycleOutcome::Adjusted {
                        power: power_change,
                        fan: fan_change,
                    })
                }
            }
            DesiredApplianceState::Off if state.is_heating() || state == ApplianceState::Igniting => {
                self.appliance.shutdown().await.at(ErrorStage::StoveApi)?;
                Ok(SchedulerCycleOutcome::ShutDown)
            }
            _ => Ok(SchedulerCycleOutcome::Unchanged { desired }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::services::schedule_service::ScheduleService;
    use crate::test_support::{FakeStove, FixedClock, MemoryStore, room};
    use chrono::Duration;
    use serde_json::json;
    use stovepanel_domain::appliance::{ApplianceStatus, FanLevel, PowerLevel};
    use stovepanel_domain::operator::Operator;
    use stovepanel_domain::outcome::ErrorKind;
    use stovepanel_domain::schedule::{TimeSlot, Weekday};

    type Engine = SchedulerEngine<MemoryStore, FakeStove, FixedClock>;

    async fn engine(stove: FakeStove, hour: u32) -> (Engine, MemoryStore, FakeStove, FixedClock) {
        let store = MemoryStore::default();
        let clock = FixedClock::monday_at(hour, 0);
        let schedules = ScheduleService::new(store.clone(), clock.clone());
        let mut slots = BTreeMap::new();
        slots.insert(
            Weekday::Monday,
            vec![
                TimeSlot::new("06:00".parse().unwrap(), "09:00".parse().unwrap(), 3, 2).unwrap(),
                TimeSlot::new("12:00".parse().unwrap(), "13:00".parse().unwrap(), 0, 1).unwrap(),
            ],
        );
        let operator = Operator::new("alice");
        let schedule = schedules
            .create_schedule(&operator, None, "Winter".to_string(), slots)
            .await
            .unwrap();
        schedules.set_active_schedule(&operator, &schedule.id).await.unwrap();
        store
            .set(records::SCHEDULER_MODE, json!({"enabled": true}))
            .await
            .unwrap();
        let engine = SchedulerEngine::new(store.clone(), stove.clone(), clock.clone());
        (engine, store, stove, clock)
    }

    fn power(level: u8) -> PowerLevel {
        PowerLevel::new(level).unwrap()
    }

    fn fan(level: u8) -> FanLevel {
        FanLevel::new(level).unwrap()
    }

    #[tokio::test]
    async fn should_do_nothing_in_manual_mode() {
        let (engine, store, stove, _) = engine(FakeStove::off(), 7).await;
        store
            .set(records::SCHEDULER_MODE, json!({"enabled": false}))
            .await
            .unwrap();
        assert_eq!(engine.run_cycle().await, SchedulerCycleOutcome::Manual);
        assert!(stove.calls().is_empty());
    }

    #[tokio::test]
    async fn should_respect_semi_manual_hold() {
        let (engine, store, stove, clock) = engine(FakeStove::off(), 7).await;
        let until = clock.now() + Duration::hours(1);
        store
            .set(
                records::SCHEDULER_MODE,
                json!({"enabled": true, "semi_manual": true, "return_to_auto_at": until}),
            )
            .await
            .unwrap();
        assert_eq!(
            engine.run_cycle().await,
            SchedulerCycleOutcome::SemiManual { until: Some(until) }
        );
        assert!(stove.calls().is_empty());
    }

    #[tokio::test]
    async fn should_ignite_idle_stove_inside_slot() {
        let (engine, _, stove, _) = engine(FakeStove::off(), 7).await;
        assert_eq!(
            engine.run_cycle().await,
            SchedulerCycleOutcome::Ignited {
                power: power(3),
                fan: fan(2)
            }
        );
        assert_eq!(stove.calls(), vec!["ignite", "fan:2", "power:3"]);
    }

    #[tokio::test]
    async fn should_adjust_levels_of_heating_stove() {
        let stove = FakeStove::with_status(ApplianceStatus::new(6, "WORK").with_levels(5, 2));
        let (engine, _, stove, _) = engine(stove, 7).await;
        assert_eq!(
            engine.run_cycle().await,
            SchedulerCycleOutcome::Adjusted {
                power: Some(power(3)),
                fan: None
            }
        );
        assert_eq!(stove.calls(), vec!["power:3"]);
    }

    #[tokio::test]
    async fn should_leave_power_to_pid_when_enabled() {
        let stove = FakeStove::with_status(ApplianceStatus::new(6, "WORK").with_levels(5, 2));
        let (engine, store, stove, _) = engine(stove, 7).await;
        let pid = PidConfig {
            enabled: true,
            zone_id: Some(room("living")),
            ..PidConfig::default()
        };
        records::save(&store, records::PID_CONFIG, &pid).await.unwrap();

        let outcome = engine.run_cycle().await;

        assert!(matches!(outcome, SchedulerCycleOutcome::Unchanged { .. }));
        assert!(stove.calls().is_empty());
    }

    #[tokio::test]
    async fn should_shut_down_outside_slots() {
        let (engine, _, stove, _) = engine(FakeStove::heating(3), 10).await;
        assert_eq!(engine.run_cycle().await, SchedulerCycleOutcome::ShutDown);
        assert_eq!(stove.calls(), vec!["shutdown"]);
    }

    #[tokio::test]
    async fn should_treat_zero_power_slot_as_off() {
        let (engine, _, stove, _) = engine(FakeStove::heating(3), 12).await;
        assert_eq!(engine.run_cycle().await, SchedulerCycleOutcome::ShutDown);
        assert_eq!(stove.calls(), vec!["shutdown"]);
    }

    #[tokio::test]
    async fn should_leave_off_stove_alone_outside_slots() {
        let (engine, _, stove, _) = engine(FakeStove::off(), 10).await;
        assert_eq!(
            engine.run_cycle().await,
            SchedulerCycleOutcome::Unchanged {
                desired: DesiredApplianceState::Off
            }
        );
        assert!(stove.calls().is_empty());
    }

    #[tokio::test]
    async fn should_report_missing_active_schedule() {
        let (engine, store, _, _) = engine(FakeStove::off(), 7).await;
        store.remove(records::ACTIVE_SCHEDULE_ID).await.unwrap();
        match engine.run_cycle().await {
            SchedulerCycleOutcome::Error(failure) => {
                assert_eq!(failure.stage, ErrorStage::Orchestrator);
                assert_eq!(failure.kind, ErrorKind::ConfigurationMissing);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_report_stove_failure() {
        let (engine, _, stove, _) = engine(FakeStove::off(), 7).await;
        stove.set_failing(true);
        assert!(matches!(
            engine.run_cycle().await,
            SchedulerCycleOutcome::Error(CycleFailure {
                stage: ErrorStage::StoveApi,
                ..
            })
        ));
    }
}
