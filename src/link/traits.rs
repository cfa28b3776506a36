//! Capability traits the supervisor consumes from its host.
//!
//! The watchdog core never talks to a device directly; it observes link state
//! through a [`ConnectionProbe`] and requests reconnection through a
//! [`ReconnectActuator`]. Both calls are treated as synchronous, bounded-latency
//! externals from the supervisor's point of view.

use async_trait::async_trait;

use super::status::{ConnectionOptions, LinkStatus};
use crate::error::Result;

/// Read-only view of the link exposed by the host environment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Current link status
    async fn status(&self) -> LinkStatus;

    /// Current user-configured endpoint
    async fn connection_options(&self) -> ConnectionOptions;

    /// Whether the named port currently exists as an addressable device.
    /// Only meaningful for concrete identifiers, not the auto sentinel.
    async fn port_exists(&self, port: &str) -> bool;
}

/// Capability that issues the low-level reconnect request.
///
/// Fire-and-forget from the supervisor's perspective: the outcome is observed
/// only through subsequent [`ConnectionProbe::status`] polls. An `Err` here is
/// logged and otherwise ignored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReconnectActuator: Send + Sync {
    async fn connect(&self, options: &ConnectionOptions) -> Result<()>;
}
