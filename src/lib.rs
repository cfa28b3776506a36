pub mod cli;
pub mod config;
pub mod error;
pub mod link;
pub mod supervisor;
pub mod timer;

pub use config::{AppConfig, LoggingConfig, SettingsSource, StaticSettings, WatchdogConfig};
pub use error::{RelinkError, Result};
pub use link::{
    ConnectionOptions, ConnectionProbe, LinkStatus, PortSelection, ReconnectActuator, ScriptedLink,
};
pub use supervisor::{LinkWatchdog, WatchdogHealth, WatchdogPhase};
pub use timer::{RepeatedTimer, ResettableTimer};
