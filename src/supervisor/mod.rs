//! Supervisor layer: the link watchdog state machine.

pub mod watchdog;

pub use watchdog::{LinkWatchdog, WatchdogHealth, WatchdogPhase};
