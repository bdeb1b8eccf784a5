//! JSON REST handlers for weekly schedules.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};
use stovepanel_domain::id::ScheduleId;
use stovepanel_domain::schedule::{TimeSlot, Weekday, WeeklySchedule};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

/// Request body for creating a schedule.
#[derive(Deserialize)]
pub struct CreateScheduleRequest {
    /// Derived from the name when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slots: BTreeMap<Weekday, Vec<TimeSlot>>,
}

/// Request body for switching the active schedule.
#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<WeeklySchedule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the endpoints returning a single schedule.
pub enum GetResponse {
    Ok(Json<WeeklySchedule>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<WeeklySchedule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/schedules`
pub async fn list<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Result<ListResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let schedules = state.schedule_service.list_schedules().await?;
    Ok(ListResponse::Ok(Json(schedules)))
}

/// `POST /api/schedules`
pub async fn create<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let id = req.id.map(ScheduleId::parse).transpose()?;
    let schedule = state
        .schedule_service
        .create_schedule(&caller, id, req.name, req.slots)
        .await?;
    Ok(CreateResponse::Created(Json(schedule)))
}

/// `GET /api/schedules/{id}`
pub async fn get<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let id = ScheduleId::parse(id)?;
    let schedule = state.schedule_service.get_schedule(&id).await?;
    Ok(GetResponse::Ok(Json(schedule)))
}

/// `DELETE /api/schedules/{id}`
pub async fn delete<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let id = ScheduleId::parse(id)?;
    state.schedule_service.delete_schedule(&id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/schedules/active`
pub async fn get_active<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
) -> Result<GetResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let schedule = state.schedule_service.get_active_schedule().await?;
    Ok(GetResponse::Ok(Json(schedule)))
}

/// `PUT /api/schedules/active`
pub async fn set_active<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Json(req): Json<SetActiveRequest>,
) -> Result<GetResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let id = ScheduleId::parse(req.id)?;
    let schedule = state
        .schedule_service
        .set_active_schedule(&caller, &id)
        .await?;
    Ok(GetResponse::Ok(Json(schedule)))
}

/// `PUT /api/schedules/active/days/{day}`: replace one day's slots.
pub async fn save_day<S, A, Z, E, C>(
    State(state): State<AppState<S, A, Z, E, C>>,
    caller: Caller,
    Path(day): Path<String>,
    Json(slots): Json<Vec<TimeSlot>>,
) -> Result<GetResponse, ApiError>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    let day = Weekday::from_str(&day)?;
    let schedule = state
        .schedule_service
        .save_day_slots(&caller, day, slots)
        .await?;
    Ok(GetResponse::Ok(Json(schedule)))
}
