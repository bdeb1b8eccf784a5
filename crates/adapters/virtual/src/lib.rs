//! # stovepanel-adapter-virtual
//!
//! Virtual/demo devices that stand in for the real stove cloud API and the
//! thermostat gateway.
//!
//! ## Provided devices
//!
//! | Device | Port | Behaviour |
//! |--------|------|-----------|
//! | Virtual Stove | `ApplianceStatusSource`, `ApplianceController` | Switches between `OFF` and `WORK` instantly, remembers power and fan |
//! | Virtual Thermostats | `ZoneGateway` | One valve per seeded room, manual setpoints expire at their end time |
//!
//! Both can be taken offline to exercise the error paths of the cycles.
//!
//! ## Dependency rule
//!
//! Depends on `stovepanel-app` (port traits) and `stovepanel-domain` only.

mod devices;

use serde::Deserialize;
use stovepanel_domain::id::RoomId;

pub use devices::{RoomSeed, VirtualStove, VirtualThermostats};

/// Initial state of the simulated devices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// Whether the stove starts out heating.
    pub heating: bool,
    pub rooms: Vec<RoomSeed>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            heating: false,
            rooms: [
                ("living", "Living room", 19.5, 20.0),
                ("bedroom", "Bedroom", 18.0, 18.5),
            ]
            .into_iter()
            .filter_map(|(id, name, measured, setpoint)| {
                let id = RoomId::parse(id).ok()?;
                Some(RoomSeed::new(id, name, Some(measured), Some(setpoint)))
            })
            .collect(),
        }
    }
}

/// The simulated stove and thermostats, built from a [`Seed`].
#[derive(Clone)]
pub struct VirtualPlant {
    pub stove: VirtualStove,
    pub thermostats: VirtualThermostats,
}

impl VirtualPlant {
    #[must_use]
    pub fn from_seed(seed: &Seed) -> Self {
        let stove = VirtualStove::default();
        if seed.heating {
            stove.force_heating();
        }
        Self {
            stove,
            thermostats: VirtualThermostats::from_seed(&seed.rooms),
        }
    }
}
