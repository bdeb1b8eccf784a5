//! JSON REST handlers for the scheduler mode and the semi-manual hold.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_domain::scheduler_mode::EffectiveMode;
use stovepanel_domain::time::Timestamp;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

/// Request body for `PUT /api/scheduler/mode`.
#[derive(Deserialize)]
pub struct SetModeRequest {
    pub enabled: bool,
}

/// Request body for `POST /api/scheduler/semi-manual`.
///
/// Without a deadline the hold lasts until the next slot boundary.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct EnterSemiManualRequest {
    pub return_to_auto_at: Option<Timestamp>,
}

/// `GET /api/scheduler/mode`: the mode with an expired hold already dropped.
pub async fn get_mode<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Result<Json<EffectiveMode>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Ok(Json(state.scheduler_mode_service.current_mode().await?))
}

/// `PUT /api/scheduler/mode`
pub async fn set_mode<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(req): Json<SetModeRequest>,
) -> Result<Json<EffectiveMode>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let mode = state
        .scheduler_mode_service
        .set_enabled(&caller, req.enabled)
        .await?;
    Ok(Json(mode))
}

/// `POST /api/scheduler/semi-manual`
pub async fn enter_semi_manual<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(req): Json<EnterSemiManualRequest>,
) -> Result<Json<EffectiveMode>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let service = &state.scheduler_mode_service;
    let mode = match req.return_to_auto_at {
        Some(deadline) => service.enter_semi_manual(&caller, deadline).await?,
        None => service.enter_semi_manual_until_next_slot(&caller).await?,
    };
    Ok(Json(mode))
}

/// `DELETE /api/scheduler/semi-manual`
pub async fn exit_semi_manual<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
) -> Result<Json<EffectiveMode>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Ok(Json(
        state.scheduler_mode_service.exit_semi_manual(&caller).await?,
    ))
}
