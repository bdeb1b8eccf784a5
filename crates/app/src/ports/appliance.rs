//! Appliance ports: the stove's status source and command surface.
//!
//! Failures are transient: implementations return
//! [`PanelError::Upstream`] and the next cycle simply tries again.

use std::future::Future;

use stovepanel_domain::appliance::{ApplianceStatus, FanLevel, PowerLevel};
use stovepanel_domain::error::PanelError;

/// Read-only status report of the appliance.
pub trait ApplianceStatusSource: Send + Sync {
    fn status(&self) -> impl Future<Output = Result<ApplianceStatus, PanelError>> + Send;
}

/// Commands accepted by the appliance.
pub trait ApplianceController: Send + Sync {
    fn ignite(&self) -> impl Future<Output = Result<(), PanelError>> + Send;

    fn shutdown(&self) -> impl Future<Output = Result<(), PanelError>> + Send;

    fn set_power(&self, level: PowerLevel) -> impl Future<Output = Result<(), PanelError>> + Send;

    fn set_fan(&self, level: FanLevel) -> impl Future<Output = Result<(), PanelError>> + Send;
}
