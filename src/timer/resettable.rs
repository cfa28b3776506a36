//! One-shot resettable timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{cancel_channel, Armed, TimerAction};

/// Runs an async action once after a delay, on its own tokio task.
///
/// `start()` re-arms from a fresh state, cancelling any armed instance first.
/// `cancel()` is idempotent: if the action has not yet begun it never runs; if
/// it is already executing the in-flight execution is unaffected. Dropping the
/// timer also cancels a pending firing.
pub struct ResettableTimer {
    delay: Duration,
    action: TimerAction,
    armed: Mutex<Option<Armed>>,
}

impl ResettableTimer {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let action: TimerAction = Arc::new(move || Box::pin(action()));
        Self {
            delay,
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
        let delay = self.delay;
        let action = Arc::clone(&self.action);

        let task = async move {
            tokio::select! {
                biased;
                _ = cancel_rx.changed() => {}
                _ = tokio::time::sleep(delay) => {
                    (action)().await;
                }
            }
        };

        *slot = Some(Armed::spawn(task, cancel_tx));
    }

    /// Cancel a pending firing. Safe to call from any state, any number of times.
    pub fn cancel(&self) {
        if let Some(armed) = self.armed.lock().expect("timer state poisoned").take() {
            armed.cancel();
        }
    }

    /// True while a firing is still pending or executing
    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .expect("timer state poisoned")
            .as_ref()
            .map(|armed| !armed.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ResettableTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_timer(delay: Duration) -> (ResettableTimer, Arc<AtomicU32>) {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let timer = ResettableTimer::new(delay, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (timer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.start();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // One-shot: no further firings
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire_suppresses_action() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.start();

        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.cancel();
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_cancel_is_noop() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.start();
        timer.cancel();
        timer.cancel();
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_rearms_from_fresh_state() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.start();
        timer.cancel();

        timer.start();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_armed_resets_delay() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.start();

        tokio::time::sleep(Duration::from_secs(4)).await;
        timer.start();

        // Old instance was cancelled at t=4; the new one fires at t=9.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_fires() {
        let (timer, fired) = counting_timer(Duration::from_secs(0));
        timer.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
