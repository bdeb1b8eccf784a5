//! # stovepaneld: stovepanel daemon
//!
//! Composition root that wires all adapters together.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialize logging from the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the device adapters and the application services
//! - `serve`: build the axum router, bind to a TCP port and serve until
//!   SIGINT, optionally running the cycles on a timer
//! - `run-cycle`: run one engine cycle, print the outcome, exit
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod cli;
mod config;

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use stovepanel_adapter_http_axum::state::AppState;
use stovepanel_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteCoordinationEventLog, SqliteStateStore,
};
use stovepanel_adapter_virtual::{VirtualPlant, VirtualStove, VirtualThermostats};
use stovepanel_app::ports::SystemClock;
use stovepanel_domain::coordination::CoordinationOutcome;
use stovepanel_domain::outcome::{PowerCycleOutcome, SchedulerCycleOutcome};

use crate::cli::{Cli, Command, Cycle};
use crate::config::Config;

type State = AppState<
    SqliteStateStore,
    VirtualStove,
    VirtualThermostats,
    SqliteCoordinationEventLog,
    SystemClock,
>;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let state = build_state(&config).await?;

    match cli.command {
        Command::Serve => {
            serve(&config, state).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::RunCycle { cycle } => run_cycle(&state, cycle).await,
    }
}

async fn build_state(config: &Config) -> Result<State, Box<dyn std::error::Error>> {
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    let plant = VirtualPlant::from_seed(&config.simulation);
    tracing::info!(
        rooms = config.simulation.rooms.len(),
        "using simulated stove and thermostats"
    );

    Ok(AppState::new(
        SqliteStateStore::new(pool.clone()),
        plant.stove,
        plant.thermostats,
        SqliteCoordinationEventLog::new(pool),
        SystemClock,
        &config.engine.settings(),
    ))
}

async fn serve(config: &Config, state: State) -> Result<(), Box<dyn std::error::Error>> {
    if config.engine.autorun {
        let interval = config.engine.settings().control_interval.to_std()?;
        tokio::spawn(autorun(state.clone(), interval));
    }

    let app = stovepanel_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "stovepaneld listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("stovepaneld stopped");
    Ok(())
}

/// Run every cycle once per interval: coordination, scheduler, then power.
async fn autorun(state: State, interval: std::time::Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        state.coordination.run_cycle().await;
        state.scheduler_engine.run_cycle().await;
        state.power_control.run_cycle().await;
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn run_cycle(state: &State, cycle: Cycle) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cycle {
        Cycle::Coordination => {
            let outcome = state.coordination.run_cycle().await;
            let failed = matches!(outcome, CoordinationOutcome::Error(_));
            report(&outcome, failed)
        }
        Cycle::Power => {
            let outcome = state.power_control.run_cycle().await;
            let failed = matches!(outcome, PowerCycleOutcome::Error(_));
            report(&outcome, failed)
        }
        Cycle::Scheduler => {
            let outcome = state.scheduler_engine.run_cycle().await;
            let failed = matches!(outcome, SchedulerCycleOutcome::Error(_));
            report(&outcome, failed)
        }
    }
}

/// Print the outcome on stdout. An `error` outcome exits non-zero.
fn report(outcome: &impl Serialize, failed: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(outcome)?);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
