use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RelinkError;

/// Reported state of the device link.
///
/// For watchdog purposes only `is_unavailable` matters: `Offline` and `Error`
/// are treated identically, because a reconnect attempt against a powered-off
/// device can surface as a transport error rather than a clean offline
/// indication, and that artifact must not reset the debounce counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Link is up and the device is responsive
    Operational,
    /// Connection attempt in progress
    Connecting,
    /// Link is up but the device is busy with a job
    Busy,
    /// No connection
    Offline,
    /// Transport-level fault
    Error,
    /// Status could not be determined
    Unknown,
}

impl LinkStatus {
    /// True for the statuses the watchdog counts toward the debounce threshold
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LinkStatus::Offline | LinkStatus::Error)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Operational => write!(f, "operational"),
            LinkStatus::Connecting => write!(f, "connecting"),
            LinkStatus::Busy => write!(f, "busy"),
            LinkStatus::Offline => write!(f, "offline"),
            LinkStatus::Error => write!(f, "error"),
            LinkStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for LinkStatus {
    type Err = RelinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operational" => Ok(LinkStatus::Operational),
            "connecting" => Ok(LinkStatus::Connecting),
            "busy" => Ok(LinkStatus::Busy),
            "offline" => Ok(LinkStatus::Offline),
            "error" => Ok(LinkStatus::Error),
            "unknown" => Ok(LinkStatus::Unknown),
            other => Err(RelinkError::InvalidArgument(format!(
                "unknown link status: {other}"
            ))),
        }
    }
}

/// Serial port choice: a concrete device identifier, or automatic discovery.
///
/// Serializes as a plain string; `"auto"` (any case) and the empty string map
/// to `Auto`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortSelection {
    Auto,
    Named(String),
}

impl PortSelection {
    pub fn is_auto(&self) -> bool {
        matches!(self, PortSelection::Auto)
    }
}

impl From<String> for PortSelection {
    fn from(s: String) -> Self {
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            PortSelection::Auto
        } else {
            PortSelection::Named(s)
        }
    }
}

impl From<&str> for PortSelection {
    fn from(s: &str) -> Self {
        PortSelection::from(s.to_string())
    }
}

impl From<PortSelection> for String {
    fn from(port: PortSelection) -> Self {
        match port {
            PortSelection::Auto => "auto".to_string(),
            PortSelection::Named(name) => name,
        }
    }
}

impl std::fmt::Display for PortSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSelection::Auto => write!(f, "auto"),
            PortSelection::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Endpoint used for a reconnect attempt. Always re-read from the probe at the
/// moment of the attempt, never cached, since the operator may have changed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub port: PortSelection,
    pub baud: u32,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            port: PortSelection::Auto,
            baud: 115_200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_statuses() {
        assert!(LinkStatus::Offline.is_unavailable());
        assert!(LinkStatus::Error.is_unavailable());
        assert!(!LinkStatus::Operational.is_unavailable());
        assert!(!LinkStatus::Connecting.is_unavailable());
        assert!(!LinkStatus::Busy.is_unavailable());
        assert!(!LinkStatus::Unknown.is_unavailable());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Offline".parse::<LinkStatus>().unwrap(),
            LinkStatus::Offline
        );
        assert_eq!(
            " operational ".parse::<LinkStatus>().unwrap(),
            LinkStatus::Operational
        );
        assert!("bogus".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_port_selection_sentinel() {
        assert_eq!(PortSelection::from("auto"), PortSelection::Auto);
        assert_eq!(PortSelection::from("AUTO"), PortSelection::Auto);
        assert_eq!(PortSelection::from(""), PortSelection::Auto);
        assert_eq!(
            PortSelection::from("/dev/ttyUSB0"),
            PortSelection::Named("/dev/ttyUSB0".to_string())
        );
    }

    #[test]
    fn test_port_selection_display() {
        assert_eq!(PortSelection::Auto.to_string(), "auto");
        assert_eq!(
            PortSelection::Named("/dev/ttyACM0".to_string()).to_string(),
            "/dev/ttyACM0"
        );
    }
}
