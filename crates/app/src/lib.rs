//! # stovepanel-app
//!
//! Application layer: use-cases, engine cycles and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StateStore`: path-addressed JSON documents with merge-patch updates
//!   - `ApplianceStatusSource` / `ApplianceController`: the stove
//!   - `ZoneGateway`: per-room thermostats
//!   - `CoordinationEventSink` / `CoordinationEventReader`: the decision log
//!   - `IdentityContext`: operator for audit fields
//!   - `Clock`: current time, UTC and local
//! - Define **driving/inbound ports** as use-case structs:
//!   - `ScheduleService`: named schedules, active pointer, per-day slots
//!   - `SchedulerModeService`: automation toggle, semi-manual hold with lazy expiry
//!   - `ConfigService`: synchronization and power-controller settings
//! - Run the three **engine cycles**:
//!   - `CoordinationOrchestrator`: boost/restore thermostats around stove heating
//!   - `PowerControlService`: PID power level per control interval
//!   - `SchedulerEngine`: enforce the active schedule
//!
//! ## Dependency rule
//! Depends on `stovepanel-domain` only (plus `tokio::time` for the cycle bound).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod coordination;
mod cycle;
pub mod ports;
pub mod power_control;
pub mod records;
pub mod scheduler_engine;
pub mod services;
pub mod settings;

#[cfg(test)]
mod test_support;
