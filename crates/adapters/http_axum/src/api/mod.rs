//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod coordination;
pub mod cycles;
#[allow(clippy::missing_errors_doc)]
pub mod pid;
#[allow(clippy::missing_errors_doc)]
pub mod scheduler;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;

use axum::Router;
use axum::routing::{get, post, put};

use stovepanel_app::ports::{
    ApplianceController, ApplianceStatusSource, Clock, CoordinationEventReader,
    CoordinationEventSink, StateStore, ZoneGateway,
};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, A, Z, E, C>() -> Router<AppState<S, A, Z, E, C>>
where
    S: StateStore + 'static,
    A: ApplianceStatusSource + ApplianceController + 'static,
    Z: ZoneGateway + 'static,
    E: CoordinationEventSink + CoordinationEventReader + 'static,
    C: Clock + 'static,
{
    Router::new()
        // Schedules
        .route(
            "/schedules",
            get(schedules::list::<S, A, Z, E, C>).post(schedules::create::<S, A, Z, E, C>),
        )
        .route(
            "/schedules/active",
            get(schedules::get_active::<S, A, Z, E, C>)
                .put(schedules::set_active::<S, A, Z, E, C>),
        )
        .route(
            "/schedules/active/days/{day}",
            put(schedules::save_day::<S, A, Z, E, C>),
        )
        .route(
            "/schedules/{id}",
            get(schedules::get::<S, A, Z, E, C>).delete(schedules::delete::<S, A, Z, E, C>),
        )
        // Scheduler mode
        .route(
            "/scheduler/mode",
            get(scheduler::get_mode::<S, A, Z, E, C>).put(scheduler::set_mode::<S, A, Z, E, C>),
        )
        .route(
            "/scheduler/semi-manual",
            post(scheduler::enter_semi_manual::<S, A, Z, E, C>)
                .delete(scheduler::exit_semi_manual::<S, A, Z, E, C>),
        )
        // Coordination
        .route(
            "/coordination/config",
            get(coordination::get_config::<S, A, Z, E, C>)
                .put(coordination::save_config::<S, A, Z, E, C>),
        )
        .route(
            "/coordination/events",
            get(coordination::events::<S, A, Z, E, C>),
        )
        // Power controller
        .route(
            "/pid/config",
            get(pid::get_config::<S, A, Z, E, C>).put(pid::save_config::<S, A, Z, E, C>),
        )
        .route("/pid/preview", post(pid::preview::<S, A, Z, E, C>))
        // Cycle triggers
        .route(
            "/cycles/coordination",
            post(cycles::coordination::<S, A, Z, E, C>),
        )
        .route("/cycles/power", post(cycles::power::<S, A, Z, E, C>))
        .route("/cycles/scheduler", post(cycles::scheduler::<S, A, Z, E, C>))
}
