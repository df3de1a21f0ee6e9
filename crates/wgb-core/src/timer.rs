//! Cancellable deferred tasks for lobby / play timeouts.
//!
//! A timer is a background task that sleeps and then runs its body once. The
//! handle supports idempotent cancellation and exposes whether the body has
//! started, so callers can tell "cancelled in time" from "already fired". The
//! body itself must re-validate current state before acting; scheduling a
//! timer never freezes the world.

use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct TimerHandle {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Cancel the timer. No-op if it already fired or was already cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the timer body has started running.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Schedule `body` to run once after `delay`, unless cancelled first.
pub fn schedule<F>(delay: Duration, body: F) -> TimerHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let fired = Arc::new(AtomicBool::new(false));

    let token = cancel.clone();
    let fired_flag = fired.clone();
    // Create the sleep here so the deadline is fixed at scheduling time, not
    // at the spawned task's first poll.
    let delay = sleep(delay);
    tokio::spawn(async move {
        tokio::select! {
          _ = token.cancelled() => {}
          _ = delay => {
            fired_flag.store(true, Ordering::SeqCst);
            body.await;
          }
        }
    });

    TimerHandle { cancel, fired }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let timer = schedule(Duration::from_secs(120), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });

        advance(Duration::from_secs(119)).await;
        assert!(!timer.is_fired());
        advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(timer.is_fired());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_fire_suppresses_body() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let timer = schedule(Duration::from_secs(60), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        // Cancelling twice is a no-op, not an error.
        timer.cancel();

        advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert!(!timer.is_fired());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_noop() {
        let timer = schedule(Duration::from_secs(1), async {});
        advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(timer.is_fired());
        timer.cancel();
        assert!(timer.is_fired());
    }
}
