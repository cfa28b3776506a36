//! Scripted link simulation.
//!
//! Implements both capability traits from a fixed status script, recording
//! every connect request. Backs the `simulate` CLI mode and the integration
//! tests; it is not a device driver.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use super::status::{ConnectionOptions, LinkStatus};
use super::traits::{ConnectionProbe, ReconnectActuator};
use crate::error::Result;

pub struct ScriptedLink {
    script: Mutex<VecDeque<LinkStatus>>,
    /// Status reported once the script is exhausted
    fallback: LinkStatus,
    options: RwLock<ConnectionOptions>,
    port_present: AtomicBool,
    polls: AtomicU64,
    connects: Mutex<Vec<ConnectionOptions>>,
}

impl ScriptedLink {
    pub fn new(
        script: Vec<LinkStatus>,
        fallback: LinkStatus,
        options: ConnectionOptions,
        port_present: bool,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            options: RwLock::new(options),
            port_present: AtomicBool::new(port_present),
            polls: AtomicU64::new(0),
            connects: Mutex::new(Vec::new()),
        }
    }

    /// Link that reports the same status forever
    pub fn steady(status: LinkStatus, options: ConnectionOptions, port_present: bool) -> Self {
        Self::new(Vec::new(), status, options, port_present)
    }

    /// Number of status polls observed so far
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Number of connect requests received so far
    pub fn connect_count(&self) -> usize {
        self.connects.lock().expect("connect log poisoned").len()
    }

    /// Endpoints of every connect request, in order
    pub fn connect_log(&self) -> Vec<ConnectionOptions> {
        self.connects.lock().expect("connect log poisoned").clone()
    }

    pub fn set_port_present(&self, present: bool) {
        self.port_present.store(present, Ordering::Relaxed);
    }

    pub fn set_options(&self, options: ConnectionOptions) {
        *self.options.write().expect("options lock poisoned") = options;
    }
}

#[async_trait]
impl ConnectionProbe for ScriptedLink {
    async fn status(&self) -> LinkStatus {
        self.polls.fetch_add(1, Ordering::Relaxed);
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or(self.fallback)
    }

    async fn connection_options(&self) -> ConnectionOptions {
        self.options.read().expect("options lock poisoned").clone()
    }

    async fn port_exists(&self, _port: &str) -> bool {
        self.port_present.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReconnectActuator for ScriptedLink {
    async fn connect(&self, options: &ConnectionOptions) -> Result<()> {
        self.connects
            .lock()
            .expect("connect log poisoned")
            .push(options.clone());
        Ok(())
    }
}
