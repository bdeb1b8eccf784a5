//! Cycle triggers.
//!
//! Cycles never fail at the HTTP level: the outcome, including an `error`
//! outcome, is the response body.

use axum::Json;
use axum::extract::State;

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_domain::coordination::CoordinationOutcome;
use stovepanel_domain::outcome::{PowerCycleOutcome, SchedulerCycleOutcome};

use crate::state::AppState;

/// `POST /api/cycles/coordination`
pub async fn coordination<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Json<CoordinationOutcome>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Json(state.coordination.run_cycle().await)
}

/// `POST /api/cycles/power`
pub async fn power<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Json<PowerCycleOutcome>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Json(state.power_control.run_cycle().await)
}

/// `POST /api/cycles/scheduler`
pub async fn scheduler<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Json<SchedulerCycleOutcome>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Json(state.scheduler_engine.run_cycle().await)
}
