//! Zone: a room with its own thermostat valve.

use serde::{Deserialize, Serialize};

use crate::id::RoomId;
use crate::time::Timestamp;

/// Thermostat operating mode as exposed by the zone gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneMode {
    /// Fixed setpoint chosen by a person or by the engine.
    Manual,
    /// The thermostat follows its own program.
    Home,
    /// Frost protection / valve fully open, depending on the device.
    Max,
    Off,
}

impl ZoneMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Home => "home",
            Self::Max => "max",
            Self::Off => "off",
        }
    }
}

/// Live reading of one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    pub room_id: RoomId,
    pub name: String,
    pub measured: Option<f64>,
    pub setpoint: Option<f64>,
    pub mode: ZoneMode,
}

/// A setpoint change pushed to the zone gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSetpointCommand {
    pub room_id: RoomId,
    pub mode: ZoneMode,
    pub temperature: Option<f64>,
    /// When the thermostat should drop the manual setpoint on its own.
    pub end_time: Option<Timestamp>,
}

impl ZoneSetpointCommand {
    /// Hold `temperature` in manual mode until `end_time`.
    #[must_use]
    pub fn manual(room_id: RoomId, temperature: f64, end_time: Option<Timestamp>) -> Self {
        Self {
            room_id,
            mode: ZoneMode::Manual,
            temperature: Some(temperature),
            end_time,
        }
    }

    /// Put the room back into `mode`, carrying a setpoint only for manual mode.
    #[must_use]
    pub fn restore(room_id: RoomId, mode: ZoneMode, setpoint: Option<f64>) -> Self {
        Self {
            room_id,
            mode,
            temperature: if mode == ZoneMode::Manual { setpoint } else { None },
            end_time: None,
        }
    }
}
