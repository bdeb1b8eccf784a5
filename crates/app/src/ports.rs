//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod appliance;
pub mod clock;
pub mod event_log;
pub mod identity;
pub mod state_store;
pub mod zone_gateway;

pub use appliance::{ApplianceController, ApplianceStatusSource};
pub use clock::{Clock, SystemClock};
pub use event_log::{CoordinationEventReader, CoordinationEventSink};
pub use identity::IdentityContext;
pub use state_store::StateStore;
pub use zone_gateway::ZoneGateway;
