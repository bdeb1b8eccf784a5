//! JSON REST handlers for the power controller.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_domain::pid::{PidConfig, PidGains, PidStep};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

/// Interval assumed by the preview when none is given.
const DEFAULT_PREVIEW_MINUTES: f64 = 5.0;

/// Request body for `POST /api/pid/preview`.
#[derive(Deserialize)]
pub struct PreviewRequest {
    /// Stored gains are used when absent.
    #[serde(default)]
    pub gains: Option<PidGains>,
    pub setpoint: f64,
    pub measured: f64,
    #[serde(default)]
    pub dt_minutes: Option<f64>,
}

/// `GET /api/pid/config`
pub async fn get_config<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Result<Json<PidConfig>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Ok(Json(state.config_service.pid_config().await?))
}

/// `PUT /api/pid/config`
pub async fn save_config<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(config): Json<PidConfig>,
) -> Result<Json<PidConfig>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Ok(Json(
        state.config_service.save_pid_config(&caller, config).await?,
    ))
}

/// `POST /api/pid/preview`: one controller step from a cold start, nothing stored.
pub async fn preview<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PidStep>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let step = state
        .config_service
        .preview_pid(
            req.gains,
            req.setpoint,
            req.measured,
            req.dt_minutes.unwrap_or(DEFAULT_PREVIEW_MINUTES),
        )
        .await?;
    Ok(Json(step))
}
