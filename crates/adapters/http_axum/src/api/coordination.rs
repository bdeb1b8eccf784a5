//! JSON REST handlers for zone synchronization settings and the decision log.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_domain::coordination::{CoordinationEvent, SyncConfig};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

/// Query string of `GET /api/coordination/events`.
#[derive(Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/coordination/config`
pub async fn get_config<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Result<Json<SyncConfig>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Ok(Json(state.config_service.sync_config().await?))
}

/// `PUT /api/coordination/config`
pub async fn save_config<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(config): Json<SyncConfig>,
) -> Result<Json<SyncConfig>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let saved = state.config_service.save_sync_config(&caller, config).await?;
    Ok(Json(saved))
}

/// `GET /api/coordination/events?limit=N`: newest first.
pub async fn events<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<CoordinationEvent>>, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    Ok(Json(state.event_log.recent(limit).await?))
}
