use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ActorId, ChannelId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{ButtonRow, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per channel (platform 1 msg/sec style limits).
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_channel_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Best-effort defense against platform 429s during guess-heavy rounds where
/// every guess produces a board update. It does not guarantee zero 429s, but
/// it should drastically reduce them.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_target: Mutex<HashMap<ActorId, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_target: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for(&self, target: ActorId) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_target.lock().await;
        map.entry(target)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_target(&self, target: ActorId) {
        let global_wait = { self.global.lock().await.reserve() };
        let target_wait = {
            let lim = self.limiter_for(target).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = if global_wait > target_wait {
            global_wait
        } else {
            target_wait
        };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        self.throttle_target(ActorId::Channel(channel_id)).await;
        self.inner.send_text(channel_id, text).await
    }

    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<MessageRef> {
        self.throttle_target(ActorId::User(user_id)).await;
        self.inner.send_dm(user_id, text).await
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.throttle_target(ActorId::Channel(msg.channel_id)).await;
        self.inner.edit_text(msg, text).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.throttle_target(ActorId::Channel(msg.channel_id)).await;
        self.inner.delete_message(msg).await
    }

    async fn send_buttons(
        &self,
        channel_id: ChannelId,
        text: &str,
        buttons: ButtonRow,
    ) -> Result<MessageRef> {
        self.throttle_target(ActorId::Channel(channel_id)).await;
        self.inner.send_buttons(channel_id, text, buttons).await
    }

    async fn answer_button(&self, click_id: &str, text: Option<&str>) -> Result<()> {
        // No channel available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_button(click_id, text).await
    }
}
