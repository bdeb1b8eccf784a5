//! Zone gateway port: per-room thermostats.

use std::future::Future;

use stovepanel_domain::error::PanelError;
use stovepanel_domain::zone::{ZoneSetpointCommand, ZoneState};

/// Access to the thermostat valves of every room.
pub trait ZoneGateway: Send + Sync {
    /// Current reading of every room known to the gateway.
    fn zone_states(&self) -> impl Future<Output = Result<Vec<ZoneState>, PanelError>> + Send;

    /// Push a setpoint change.
    ///
    /// `Ok(false)` means the gateway answered but refused the change.
    fn set_zone_setpoint(
        &self,
        command: ZoneSetpointCommand,
    ) -> impl Future<Output = Result<bool, PanelError>> + Send;
}
