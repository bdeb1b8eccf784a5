//! Shared application state for axum handlers.

use std::sync::Arc;

use stovepanel_app::coordination::CoordinationOrchestrator;
use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_app::power_control::PowerControlService;
use stovepanel_app::scheduler_engine::SchedulerEngine;
use stovepanel_app::services::config_service::ConfigService;
use stovepanel_app::services::schedule_service::ScheduleService;
use stovepanel_app::services::scheduler_mode_service::SchedulerModeService;
use stovepanel_app::settings::EngineSettings;

/// Application state shared across all axum handlers.
///
/// Generic over the store, appliance, zone gateway, event log and clock to
/// avoid dynamic dispatch. `Clone` is implemented manually so the underlying
/// types themselves do not need to be `Clone`; only the `Arc` wrappers are
/// cloned.
pub struct AppState<S, A, Z, E, C> {
    /// Weekly schedules and the active pointer.
    pub schedule_service: Arc<ScheduleService<S, C>>,
    /// Automation toggle and semi-manual hold.
    pub scheduler_mode_service: Arc<SchedulerModeService<S, C>>,
    /// Synchronization and power-controller settings.
    pub config_service: Arc<ConfigService<S, C>>,
    pub coordination: Arc<CoordinationOrchestrator<S, A, Z, E, C>>,
    pub power_control: Arc<PowerControlService<S, A, Z, C>>,
    pub scheduler_engine: Arc<SchedulerEngine<S, A, C>>,
    /// Read side of the coordination event log.
    pub event_log: Arc<E>,
}

impl<S, A, Z, E, C> Clone for AppState<S, A, Z, E, C> {
    fn clone(&self) -> Self {
        Self {
            schedule_service: Arc::clone(&self.schedule_service),
            scheduler_mode_service: Arc::clone(&self.scheduler_mode_service),
            config_service: Arc::clone(&self.config_service),
            coordination: Arc::clone(&self.coordination),
            power_control: Arc::clone(&self.power_control),
            scheduler_engine: Arc::clone(&self.scheduler_engine),
            event_log: Arc::clone(&self.event_log),
        }
    }
}

impl<S, A, Z, E, C> AppState<S, A, Z, E, C>
where
    S: StateStore + Clone + 'static,
    A: ApplianceStatusSource + ApplianceController + Clone + 'static,
    Z: ZoneGateway + Clone + 'static,
    E: CoordinationEventSink + CoordinationEventReader + Clone + 'static,
    C: Clock + Clone + 'static,
{
    /// Wire every service and cycle on top of the same adapters.
    pub fn new(store: S, appliance: A, zones: Z, events: E, clock: C, settings: &EngineSettings) -> Self {
        Self {
            schedule_service: Arc::new(ScheduleService::new(store.clone(), clock.clone())),
            scheduler_mode_service: Arc::new(SchedulerModeService::new(
                store.clone(),
                clock.clone(),
            )),
            config_service: Arc::new(ConfigService::new(
                store.clone(),
                clock.clone(),
                settings.integral_limit,
            )),
            coordination: Arc::new(CoordinationOrchestrator::new(
                store.clone(),
                appliance.clone(),
                zones.clone(),
                events.clone(),
                clock.clone(),
                settings.clone(),
            )),
            power_control: Arc::new(PowerControlService::new(
                store.clone(),
                appliance.clone(),
                zones,
                clock.clone(),
                settings.clone(),
            )),
            scheduler_engine: Arc::new(SchedulerEngine::new(store, appliance, clock)),
            event_log: Arc::new(events),
        }
    }
}
