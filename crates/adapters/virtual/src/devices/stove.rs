//! Virtual stove: ignites and shuts down instantly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stovepanel_app::ports::{ApplianceController, ApplianceStatusSource};
use stovepanel_domain::appliance::{ApplianceStatus, FanLevel, PowerLevel};
use stovepanel_domain::error::{PanelError, UpstreamError};

const OFF: (i32, &str) = (0, "OFF");
const WORK: (i32, &str) = (6, "WORK");

struct StoveState {
    running: bool,
    power: PowerLevel,
    fan: FanLevel,
    offline: bool,
}

/// A simulated pellet stove.
///
/// Clones share the same device.
#[derive(Clone)]
pub struct VirtualStove {
    state: Arc<Mutex<StoveState>>,
}

impl Default for VirtualStove {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoveState {
                running: false,
                power: PowerLevel::MIN,
                fan: FanLevel::MIN,
                offline: false,
            })),
        }
    }
}

impl VirtualStove {
    /// Put the stove in the heating state without going through a command.
    pub fn force_heating(&self) {
        self.lock().running = true;
    }

    /// Make every call fail as if the cloud API were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Current power level, whether or not the stove is running.
    #[must_use]
    pub fn power(&self) -> PowerLevel {
        self.lock().power
    }

    #[must_use]
    pub fn fan(&self) -> FanLevel {
        self.lock().fan
    }

    fn lock(&self) -> MutexGuard<'_, StoveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, StoveState>, PanelError> {
        let state = self.lock();
        if state.offline {
            return Err(UpstreamError::appliance("virtual stove is offline").into());
        }
        Ok(state)
    }
}

impl ApplianceStatusSource for VirtualStove {
    async fn status(&self) -> Result<ApplianceStatus, PanelError> {
        let state = self.online()?;
        let (code, description) = if state.running { WORK } else { OFF };
        Ok(ApplianceStatus::new(code, description).with_levels(state.power.get(), state.fan.get()))
    }
}

impl ApplianceController for VirtualStove {
    async fn ignite(&self) -> Result<(), PanelError> {
        self.online()?.running = true;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), PanelError> {
        self.online()?.running = false;
        Ok(())
    }

    async fn set_power(&self, level: PowerLevel) -> Result<(), PanelError> {
        self.online()?.power = level;
        Ok(())
    }

    async fn set_fan(&self, level: FanLevel) -> Result<(), PanelError> {
        self.online()?.fan = level;
        Ok(())
    }
}
