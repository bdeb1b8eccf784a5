mod stove;
mod thermostat;

pub use stove::VirtualStove;
pub use thermostat::{RoomSeed, VirtualThermostats};
