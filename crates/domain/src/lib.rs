//! # stovepanel-domain
//!
//! Pure domain model for the stovepanel heating automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **weekly schedule** (named schedules, per-day time slots)
//! - Define the **scheduler mode** (automatic, manual, semi-manual hold with lazy expiry)
//! - Define the **PID power controller** (pure math, persisted controller memory)
//! - Define **coordination** state, settings, outcomes and events (stove ↔ thermostat boost)
//! - Describe the **appliance** and **zones** as the engine sees them
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod appliance;
pub mod coordination;
pub mod operator;
pub mod outcome;
pub mod pid;
pub mod schedule;
pub mod scheduler_mode;
pub mod zone;
