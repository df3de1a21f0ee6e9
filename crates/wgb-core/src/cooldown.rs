//! In-memory throttling for guess spam.
//!
//! Two mechanisms share one table: a simple per-actor cooldown (minimum gap
//! between actions) and a rolling-window quota (at most N actions inside a
//! window). The rolling list is pruned on every check, not periodically, so
//! it never retains timestamps older than the window. `cleanup` is best-effort
//! housekeeping driven by an external tick.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::ActorId;

#[derive(Debug)]
struct ActorEntry {
    last_action: Instant,
    window: VecDeque<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub allowed: bool,
    pub retry_after: f64,
}

impl Verdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: 0.0,
        }
    }

    fn deny(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: retry_after.as_secs_f64(),
        }
    }
}

#[derive(Default)]
pub struct RateLimiter {
    actors: Mutex<HashMap<ActorId, ActorEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject actions closer together than `cooldown`; on allow, records now
    /// as the actor's last action.
    pub async fn check_and_record(&self, actor: ActorId, cooldown: Duration) -> Verdict {
        self.check_and_record_at(actor, cooldown, Instant::now()).await
    }

    pub(crate) async fn check_and_record_at(
        &self,
        actor: ActorId,
        cooldown: Duration,
        now: Instant,
    ) -> Verdict {
        let mut actors = self.actors.lock().await;
        if let Some(entry) = actors.get_mut(&actor) {
            let elapsed = now.saturating_duration_since(entry.last_action);
            if elapsed < cooldown {
                return Verdict::deny(cooldown - elapsed);
            }
            entry.last_action = now;
            return Verdict::allow();
        }

        actors.insert(
            actor,
            ActorEntry {
                last_action: now,
                window: VecDeque::new(),
            },
        );
        Verdict::allow()
    }

    /// Rolling-window quota: at most `max_count` actions inside `window`.
    /// On allow, records now into the actor's window.
    pub async fn check_rate_window(
        &self,
        actor: ActorId,
        max_count: usize,
        window: Duration,
    ) -> Verdict {
        self.check_rate_window_at(actor, max_count, window, Instant::now())
            .await
    }

    pub(crate) async fn check_rate_window_at(
        &self,
        actor: ActorId,
        max_count: usize,
        window: Duration,
        now: Instant,
    ) -> Verdict {
        let mut actors = self.actors.lock().await;
        let entry = actors.entry(actor).or_insert_with(|| ActorEntry {
            last_action: now,
            window: VecDeque::new(),
        });

        // Prune on every check.
        while entry
            .window
            .front()
            .map(|t| now.saturating_duration_since(*t) >= window)
            .unwrap_or(false)
        {
            entry.window.pop_front();
        }

        if entry.window.len() >= max_count {
            let retry_after = entry
                .window
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            return Verdict::deny(retry_after);
        }

        entry.window.push_back(now);
        entry.last_action = now;
        Verdict::allow()
    }

    /// Drop actors whose most recent action is older than `expiry`, bounding
    /// memory. Triggered externally every few minutes.
    pub async fn cleanup(&self, expiry: Duration) {
        let now = Instant::now();
        let mut actors = self.actors.lock().await;
        let before = actors.len();
        actors.retain(|_, e| now.saturating_duration_since(e.last_action) < expiry);
        let dropped = before - actors.len();
        if dropped > 0 {
            tracing::debug!(dropped, "rate limiter cleanup");
        }
    }

    pub async fn tracked_actors(&self) -> usize {
        self.actors.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use tokio::time::advance;

    fn actor(n: i64) -> ActorId {
        ActorId::User(UserId(n))
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_rejects_inside_window_with_remaining_time() {
        let rl = RateLimiter::new();
        let cd = Duration::from_secs(2);

        assert!(rl.check_and_record(actor(1), cd).await.allowed);

        advance(Duration::from_secs(1)).await;
        let v = rl.check_and_record(actor(1), cd).await;
        assert!(!v.allowed);
        assert!((v.retry_after - 1.0).abs() < 0.01, "got {}", v.retry_after);

        advance(Duration::from_millis(1100)).await;
        assert!(rl.check_and_record(actor(1), cd).await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn rolling_window_caps_and_prunes() {
        let rl = RateLimiter::new();
        let window = Duration::from_secs(60);

        for _ in 0..10 {
            assert!(rl.check_rate_window(actor(1), 10, window).await.allowed);
            advance(Duration::from_secs(1)).await;
        }

        // 11th inside the window is rejected.
        let v = rl.check_rate_window(actor(1), 10, window).await;
        assert!(!v.allowed);
        assert!(v.retry_after > 0.0);

        // 61s after the first action, the oldest entry has aged out.
        advance(Duration::from_secs(51)).await;
        assert!(rl.check_rate_window(actor(1), 10, window).await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn actors_are_independent() {
        let rl = RateLimiter::new();
        let cd = Duration::from_secs(5);
        assert!(rl.check_and_record(actor(1), cd).await.allowed);
        assert!(rl.check_and_record(actor(2), cd).await.allowed);
        assert!(!rl.check_and_record(actor(1), cd).await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_drops_stale_actors() {
        let rl = RateLimiter::new();
        let cd = Duration::from_secs(1);
        rl.check_and_record(actor(1), cd).await;
        advance(Duration::from_secs(200)).await;
        rl.check_and_record(actor(2), cd).await;

        rl.cleanup(Duration::from_secs(300)).await;
        assert_eq!(rl.tracked_actors().await, 2);

        advance(Duration::from_secs(150)).await;
        rl.cleanup(Duration::from_secs(300)).await;
        assert_eq!(rl.tracked_actors().await, 1);
    }
}
