//! # stovepanel-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for the user-facing intents: schedules, the
//!   scheduler mode and semi-manual hold, synchronization and power-controller
//!   settings (`/api/schedules`, `/api/scheduler/mode`, `/api/pid/config`, …)
//! - Expose the three engine cycles as `POST /api/cycles/*` so an external
//!   scheduler (cron, systemd timer) can drive them
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map [`PanelError`](stovepanel_domain::error::PanelError) into status codes
//!
//! ## Identity
//! The operator recorded in audit fields comes from the `x-operator` header,
//! which the authenticating reverse proxy sets. Requests without it are
//! recorded as `anonymous`.
//!
//! ## Dependency rule
//! Depends on `stovepanel-app` (for port traits and services) and
//! `stovepanel-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod identity;
pub mod router;
pub mod state;
