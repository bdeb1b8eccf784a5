//! Virtual thermostats: one valve per room.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use stovepanel_app::ports::ZoneGateway;
use stovepanel_domain::error::{PanelError, UpstreamError};
use stovepanel_domain::id::RoomId;
use stovepanel_domain::time::{Timestamp, now};
use stovepanel_domain::zone::{ZoneMode, ZoneSetpointCommand, ZoneState};

/// Setpoint reported while a valve is in `max` mode.
const MAX_MODE_SETPOINT: f64 = 30.0;

/// Initial reading of one simulated room.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSeed {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub measured: Option<f64>,
    /// Setpoint of the room's own program.
    #[serde(default)]
    pub setpoint: Option<f64>,
}

impl RoomSeed {
    #[must_use]
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        measured: Option<f64>,
        setpoint: Option<f64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            measured,
            setpoint,
        }
    }
}

struct Valve {
    name: String,
    measured: Option<f64>,
    program: Option<f64>,
    mode: ZoneMode,
    manual: Option<f64>,
    until: Option<Timestamp>,
}

impl Valve {
    fn expire(&mut self, at: Timestamp) {
        if self.mode == ZoneMode::Manual && self.until.is_some_and(|until| until <= at) {
            self.mode = ZoneMode::Home;
            self.manual = None;
            self.until = None;
        }
    }

    fn setpoint(&self) -> Option<f64> {
        match self.mode {
            ZoneMode::Manual => self.manual,
            ZoneMode::Home => self.program,
            ZoneMode::Max => Some(MAX_MODE_SETPOINT),
            ZoneMode::Off => None,
        }
    }
}

#[derive(Default)]
struct Gateway {
    valves: BTreeMap<RoomId, Valve>,
    offline: bool,
}

/// A simulated thermostat gateway.
///
/// Manual setpoints fall back to the room's program once their end time has
/// passed, like the real valves do. Clones share the same gateway.
#[derive(Clone, Default)]
pub struct VirtualThermostats {
    gateway: Arc<Mutex<Gateway>>,
}

impl VirtualThermostats {
    #[must_use]
    pub fn from_seed(rooms: &[RoomSeed]) -> Self {
        let valves = rooms
            .iter()
            .map(|room| {
                let valve = Valve {
                    name: room.name.clone(),
                    measured: room.measured,
                    program: room.setpoint,
                    mode: ZoneMode::Home,
                    manual: None,
                    until: None,
                };
                (room.id.clone(), valve)
            })
            .collect();
        Self {
            gateway: Arc::new(Mutex::new(Gateway {
                valves,
                offline: false,
            })),
        }
    }

    /// Update the temperature reported for a room.
    pub fn set_measured(&self, room: &RoomId, measured: Option<f64>) {
        if let Some(valve) = self.lock().valves.get_mut(room) {
            valve.measured = measured;
        }
    }

    /// Turn the knob by hand: manual mode with no end time.
    pub fn adjust_by_hand(&self, room: &RoomId, setpoint: f64) {
        if let Some(valve) = self.lock().valves.get_mut(room) {
            valve.mode = ZoneMode::Manual;
            valve.manual = Some(setpoint);
            valve.until = None;
        }
    }

    /// Make every call fail as if the gateway were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn lock(&self) -> MutexGuard<'_, Gateway> {
        self.gateway.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, Gateway>, PanelError> {
        let gateway = self.lock();
        if gateway.offline {
            return Err(UpstreamError::zone_gateway("virtual gateway is offline").into());
        }
        Ok(gateway)
    }
}

impl ZoneGateway for VirtualThermostats {
    async fn zone_states(&self) -> Result<Vec<ZoneState>, PanelError> {
        let mut gateway = self.online()?;
        let at = now();
        Ok(gateway
            .valves
            .iter_mut()
            .map(|(room_id, valve)| {
                valve.expire(at);
                ZoneState {
                    room_id: room_id.clone(),
                    name: valve.name.clone(),
                    measured: valve.measured,
                    setpoint: valve.setpoint(),
                    mode: valve.mode,
                }
            })
            .collect())
    }

    async fn set_zone_setpoint(&self, command: ZoneSetpointCommand) -> Result<bool, PanelError> {
        let mut gateway = self.online()?;
        let Some(valve) = gateway.valves.get_mut(&command.room_id) else {
            return Ok(false);
        };
        match (command.mode, command.temperature) {
            (ZoneMode::Manual, None) => return Ok(false),
            (ZoneMode::Manual, Some(temperature)) => {
                valve.manual = Some(temperature);
                valve.until = command.end_time;
            }
            _ => {
                valve.manual = None;
                valve.until = None;
            }
        }
        valve.mode = command.mode;
        Ok(true)
    }
}
