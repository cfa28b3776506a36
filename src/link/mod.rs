//! Link status model, capability traits, and the scripted simulation.

pub mod sim;
pub mod status;
pub mod traits;

pub use sim::ScriptedLink;
pub use status::{ConnectionOptions, LinkStatus, PortSelection};
pub use traits::{ConnectionProbe, ReconnectActuator};
