//! Repeating fixed-interval timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::{cancel_channel, Armed, TimerAction};

/// Runs an async action every period until cancelled.
///
/// With `run_first` the action fires once immediately rather than waiting a
/// full period. One firing fully completes before the next tick is polled;
/// missed ticks are delayed, never bursted. `cancel()` is idempotent and
/// guarantees no further firings are scheduled after it returns, though a
/// firing already in flight still completes.
pub struct RepeatedTimer {
    period: Duration,
    run_first: bool,
    action: TimerAction,
    armed: Mutex<Option<Armed>>,
}

impl RepeatedTimer {
    pub fn new<F, Fut>(period: Duration, run_first: bool, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let action: TimerAction = Arc::new(move || Box::pin(action()));
        Self {
            // tokio intervals reject a zero period
            period: period.max(Duration::from_millis(1)),
            run_first,
            action,
            armed: Mutex::new(None),
        }
    }

    /// Arm the timer. Any previously armed instance is cancelled first.
    pub fn start(&self) {
        let mut slot = self.armed.lock().expect("timer state poisoned");
        if let Some(previous) = slot.take() {
            previous.cancel();
        }

        let (cancel_tx, mut cancel_rx) = cancel_channel();
        let period = self.period;
        let run_first = self.run_first;
        let action = Arc::clone(&self.action);

        let task = async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !run_first {
                // The first interval tick completes immediately; consume it so
                // the first firing waits a full period.
                ticks.tick().await;
            }
            loop {
                tokio::select! {
                    biased;
                    _ = cancel_rx.changed() => break,
                    _ = ticks.tick() => {
                        (action)().await;
                    }
                }
            }
        };

        *slot = Some(Armed::spawn(task, cancel_tx));
    }

    /// Cancel the timer. Safe to call from any state, any number of times.
    pub fn cancel(&self) {
        if let Some(armed) = self.armed.lock().expect("timer state poisoned").take() {
            armed.cancel();
        }
    }

    /// True while the timer is scheduling firings
    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .expect("timer state poisoned")
            .as_ref()
            .map(|armed| !armed.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for RepeatedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
