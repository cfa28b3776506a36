//! Timer primitives backing the watchdog cycle.
//!
//! Both timers run their action on a spawned tokio task, independent of
//! whoever calls `start`/`cancel`, so supervisor logic running inside one
//! timer's callback can safely cancel the other. Cancellation is signalled
//! through a watch channel and checked with a biased select before the action
//! is entered: a cancel that lands before the action begins executing always
//! wins, while an action already in flight runs to completion.

pub mod repeated;
pub mod resettable;

pub use repeated::RepeatedTimer;
pub use resettable::ResettableTimer;

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Zero-argument async action, re-invocable so a timer can be restarted
pub(crate) type TimerAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// One armed instance of a timer: the cancel signal plus the spawned task.
///
/// Each `start()` creates a fresh `Armed`, so a cancel on a handle that has
/// been replaced can never affect a later instance.
pub(crate) struct Armed {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Armed {
    pub(crate) fn spawn<F>(task: F, cancel_tx: watch::Sender<bool>) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            cancel_tx,
            handle: tokio::spawn(task),
        }
    }

    /// Signal cancellation. The task observes the signal at its next poll;
    /// if the action has not begun by then, it never runs.
    pub(crate) fn cancel(self) {
        let _ = self.cancel_tx.send(true);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub(crate) fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
