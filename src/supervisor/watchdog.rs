//! Link watchdog: settle-then-poll supervision of a serial device link.
//!
//! The cycle is two phases. A one-shot settle delay gives a just-(re)started
//! link time to stabilize, then a repeating poll samples link status. Offline
//! and error observations increment a consecutive counter; when the counter
//! reaches the configured threshold the watchdog attempts a reconnect and
//! restarts the whole cycle from the settle phase.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{SettingsSource, WatchdogConfig};
use crate::link::status::{LinkStatus, PortSelection};
use crate::link::traits::{ConnectionProbe, ReconnectActuator};
use crate::timer::{RepeatedTimer, ResettableTimer};

/// Watchdog cycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchdogPhase {
    /// No timers armed
    Stopped,
    /// One-shot settle delay active
    Settling,
    /// Repeating status poll active
    Polling,
}

impl std::fmt::Display for WatchdogPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchdogPhase::Stopped => write!(f, "stopped"),
            WatchdogPhase::Settling => write!(f, "settling"),
            WatchdogPhase::Polling => write!(f, "polling"),
        }
    }
}

/// Snapshot of watchdog state for observability
#[derive(Debug, Clone, Serialize)]
pub struct WatchdogHealth {
    pub phase: WatchdogPhase,
    pub consecutive_offline: u32,
    pub reconnect_attempts: u64,
    pub settle_armed: bool,
    pub poll_armed: bool,
    pub last_status: Option<LinkStatus>,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Mutable state, touched only by `restart`/`stop` and the timer callbacks.
///
/// The phases are mutually exclusive: at most one of the two timer slots is
/// occupied at any instant.
struct WatchdogState {
    /// Bumped by every restart/stop; callbacks from a superseded cycle no-op
    generation: u64,
    phase: WatchdogPhase,
    consecutive_offline: u32,
    settle_timer: Option<ResettableTimer>,
    poll_timer: Option<RepeatedTimer>,
    last_status: Option<LinkStatus>,
    last_checked: Option<DateTime<Utc>>,
}

impl WatchdogState {
    fn new() -> Self {
        Self {
            generation: 0,
            phase: WatchdogPhase::Stopped,
            consecutive_offline: 0,
            settle_timer: None,
            poll_timer: None,
            last_status: None,
            last_checked: None,
        }
    }

    /// Cancel both timers. The settle timer goes first, otherwise a firing
    /// settle timer could arm a poll timer mid-teardown.
    fn stop_timers(&mut self) {
        if let Some(timer) = self.settle_timer.take() {
            timer.cancel();
            debug!("stopped settle timer");
        }
        if let Some(timer) = self.poll_timer.take() {
            timer.cancel();
            debug!("stopped poll timer");
        }
    }
}

/// Connection-health supervisor for a single device link.
///
/// Cheap to clone; clones share the same state. All host lifecycle hooks
/// (`start`, `on_settings_initialized`, `on_settings_saved`) route to
/// [`restart`](LinkWatchdog::restart), which re-reads settings and re-arms the
/// cycle from scratch. `stop` is idempotent and terminal for the current cycle
/// only; a later restart starts a fresh one.
#[derive(Clone)]
pub struct LinkWatchdog {
    probe: Arc<dyn ConnectionProbe>,
    actuator: Arc<dyn ReconnectActuator>,
    settings: Arc<dyn SettingsSource>,
    state: Arc<Mutex<WatchdogState>>,
    reconnects: Arc<AtomicU64>,
}

impl LinkWatchdog {
    pub fn new(
        probe: Arc<dyn ConnectionProbe>,
        actuator: Arc<dyn ReconnectActuator>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            probe,
            actuator,
            settings,
            state: Arc::new(Mutex::new(WatchdogState::new())),
            reconnects: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Host startup hook
    pub async fn start(&self) {
        info!("watchdog started");
        self.restart().await;
    }

    /// Host hook: settings storage initialized
    pub async fn on_settings_initialized(&self) {
        info!("settings initialized, restarting watchdog");
        self.restart().await;
    }

    /// Host hook: settings saved/changed. Settings are re-read from the
    /// source, so the new values take effect with this restart.
    pub async fn on_settings_saved(&self) {
        info!("settings saved, restarting watchdog");
        self.restart().await;
    }

    /// Stop the current cycle. Idempotent in any phase.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        state.stop_timers();
        state.generation += 1;
        state.phase = WatchdogPhase::Stopped;
        state.consecutive_offline = 0;
    }

    /// Single entry point for (re)arming: stop whatever is running, re-read
    /// settings, and when enabled enter the settle phase.
    pub async fn restart(&self) {
        self.restart_inner(None).await;
    }

    // Boxed because the future is recursive: the poll timer callback awaits
    // `restart_inner` again via `check_connection`.
    fn restart_inner(
        &self,
        expected_generation: Option<u64>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
        let config = self.settings.load().await.sanitized();

        let mut state = self.state.lock().await;
        if let Some(generation) = expected_generation {
            if state.generation != generation {
                debug!("restart request from a superseded cycle, ignoring");
                return;
            }
        }

        state.stop_timers();
        state.generation += 1;
        state.consecutive_offline = 0;

        info!(
            "restarting: enabled={}, initial_delay={}s, poll_period={}s, offline_threshold={}",
            config.enabled,
            config.initial_delay().as_secs(),
            config.poll_period().as_secs(),
            config.threshold()
        );

        if !config.enabled {
            state.phase = WatchdogPhase::Stopped;
            info!("connection checking is disabled, not restarting");
            return;
        }

        state.phase = WatchdogPhase::Settling;
        let generation = state.generation;
        let watchdog = self.clone();
        let timer = ResettableTimer::new(config.initial_delay(), move || {
            let watchdog = watchdog.clone();
            let config = config.clone();
            async move {
                watchdog.begin_polling(generation, config).await;
            }
        });
        timer.start();
        state.settle_timer = Some(timer);
        })
    }

    /// Settle delay elapsed: enter the polling phase.
    async fn begin_polling(&self, generation: u64, config: WatchdogConfig) {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("settle timer fired for a superseded cycle, ignoring");
            return;
        }

        state.settle_timer = None;
        state.consecutive_offline = 0;

        let period = config.poll_period();
        let threshold = config.threshold();
        info!(
            "polling link status at {}s interval, reconnect after {} consecutive offline indications",
            period.as_secs(),
            threshold
        );

        state.phase = WatchdogPhase::Polling;
        let watchdog = self.clone();
        let timer = RepeatedTimer::new(period, true, move || {
            let watchdog = watchdog.clone();
            async move {
                watchdog.check_connection(generation, threshold).await;
            }
        });
        timer.start();
        state.poll_timer = Some(timer);
    }

    /// One poll tick: sample status, update the debounce counter, and kick the
    /// connection when the threshold is reached.
    async fn check_connection(&self, generation: u64, threshold: u32) {
        // Probe outside the state lock; it is an external call.
        let status = self.probe.status().await;

        let breached = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                debug!("poll tick from a superseded cycle, ignoring");
                return;
            }

            state.last_status = Some(status);
            state.last_checked = Some(Utc::now());

            if status.is_unavailable() {
                state.consecutive_offline += 1;
                info!(
                    "link unavailable ({}, {} of {})",
                    status, state.consecutive_offline, threshold
                );
            } else {
                if state.consecutive_offline > 0 {
                    debug!("link {} again, offline count reset", status);
                }
                state.consecutive_offline = 0;
            }

            state.consecutive_offline >= threshold
        };

        if breached {
            self.attempt_reconnect().await;
            // Start from scratch, settle delay included, so the link gets time
            // to stabilize before polling resumes. A stop or restart that won
            // the race in the meantime takes precedence.
            self.restart_inner(Some(generation)).await;
        }
    }

    /// The reconnect action. The endpoint is read fresh from the probe at this
    /// moment; a concrete port that is provably absent short-circuits the
    /// attempt so we do not generate a storm of failed-connection side effects.
    async fn attempt_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);

        let options = self.probe.connection_options().await;
        if let PortSelection::Named(port) = &options.port {
            if !self.probe.port_exists(port).await {
                info!("unable to reconnect: port {} not found", port);
                return;
            }
        }

        info!("reconnecting on {} at {} baud", options.port, options.baud);
        if let Err(err) = self.actuator.connect(&options).await {
            // Outcome is observed through the next poll cycle either way.
            warn!("reconnect request failed: {}", err);
        }
    }

    /// Current cycle phase
    pub async fn phase(&self) -> WatchdogPhase {
        self.state.lock().await.phase
    }

    /// Consecutive unavailable observations in the current poll phase
    pub async fn consecutive_offline(&self) -> u32 {
        self.state.lock().await.consecutive_offline
    }

    /// Total reconnect attempts, short-circuited ones included
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Snapshot of the supervisor state
    pub async fn health(&self) -> WatchdogHealth {
        let state = self.state.lock().await;
        WatchdogHealth {
            phase: state.phase,
            consecutive_offline: state.consecutive_offline,
            reconnect_attempts: self.reconnects.load(Ordering::Relaxed),
            settle_armed: state
                .settle_timer
                .as_ref()
                .map(ResettableTimer::is_armed)
                .unwrap_or(false),
            poll_armed: state
                .poll_timer
                .as_ref()
                .map(RepeatedTimer::is_armed)
                .unwrap_or(false),
            last_status: state.last_status,
            last_checked: state.last_checked,
        }
    }
}
