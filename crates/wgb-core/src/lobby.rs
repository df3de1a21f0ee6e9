//! Lobby lifecycle orchestration.
//!
//! The controller owns everything around a session that is not pure game
//! logic: creating and registering sessions, the solo-lobby and play-duration
//! timers, posting lifecycle announcements, and funneling terminal sessions
//! through scoring into the stats store. Session locks are never held across
//! messaging or stats I/O; timer fires re-validate state under the lock
//! before acting, so a late fire degrades to a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;

use crate::{
    config::Config,
    dictionary::Dictionary,
    domain::{ChannelId, SessionId, UserId},
    game::{BeeState, GameKind, GamePayload, GameSession, HangmanState, SessionState},
    hints::{definition_or_fallback, DefinitionProvider},
    messaging::{port::MessagingPort, types::ButtonRow},
    registry::{GameRegistry, SharedSession},
    scoring,
    stats::StatsStore,
    timer::{schedule, TimerHandle},
    Error, Reject, Result,
};

#[derive(Default)]
struct SessionTimers {
    lobby: Option<TimerHandle>,
    play: Option<TimerHandle>,
}

pub struct LobbyController {
    // Self-handle for timer bodies; set once at construction.
    weak: Weak<LobbyController>,
    config: Arc<Config>,
    dict: Arc<Dictionary>,
    registry: Arc<GameRegistry>,
    stats: Arc<StatsStore>,
    messenger: Arc<dyn MessagingPort>,
    definitions: Arc<dyn DefinitionProvider>,
    timers: Mutex<HashMap<SessionId, SessionTimers>>,
}

impl LobbyController {
    pub fn new(
        config: Arc<Config>,
        dict: Arc<Dictionary>,
        registry: Arc<GameRegistry>,
        stats: Arc<StatsStore>,
        messenger: Arc<dyn MessagingPort>,
        definitions: Arc<dyn DefinitionProvider>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            config,
            dict,
            registry,
            stats,
            messenger,
            definitions,
            timers: Mutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<GameRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// Create and register a lobby for `kind` in `channel`, announce it with
    /// join/start/cancel buttons and arm the solo-lobby timer.
    pub async fn open(
        &self,
        channel: ChannelId,
        starter: UserId,
        kind: GameKind,
    ) -> Result<SessionId> {
        let payload = self.new_payload(kind)?;
        let id = new_session_id();
        let session = Arc::new(Mutex::new(GameSession::create(
            id.clone(),
            starter,
            payload,
            self.config.max_players,
            self.config.min_players,
        )));

        self.registry.register(channel, session).await?;

        let timeout = self.config.lobby_timeout(kind);
        self.arm_lobby_timer(&id, timeout).await;

        self.announce_buttons(
            channel,
            &format!(
                "{} opened a {} lobby. Waiting for players ({} to {}).",
                mention(starter),
                kind.label(),
                self.config.min_players,
                self.config.max_players,
            ),
            ButtonRow::lobby(&id.0),
        )
        .await;

        tracing::info!(session = %id.0, channel = channel.0, kind = kind.label(), "lobby opened");
        Ok(id)
    }

    pub async fn join(&self, channel: ChannelId, player: UserId) -> Result<()> {
        let session = self.require_session(channel).await?;
        let (id, count) = {
            let mut s = session.lock().await;
            s.add_player(player)?;
            (s.id().clone(), s.players().len())
        };
        self.registry.index_player(&id, player).await;
        self.announce(
            channel,
            &format!("{} joined ({count} in the lobby).", mention(player)),
        )
        .await;
        Ok(())
    }

    pub async fn leave(&self, channel: ChannelId, player: UserId) -> Result<()> {
        let session = self.require_session(channel).await?;
        let (id, count, kind) = {
            let mut s = session.lock().await;
            s.remove_player(player)?;
            (s.id().clone(), s.players().len(), s.kind())
        };
        self.registry.unindex_player(&id, player).await;

        // Back down to a lone starter: the solo timeout applies again unless
        // the original timer is still pending.
        if count == 1 {
            let needs_rearm = {
                let timers = self.timers.lock().await;
                timers
                    .get(&id)
                    .and_then(|t| t.lobby.as_ref())
                    .map(|t| t.is_fired() || t.is_cancelled())
                    .unwrap_or(true)
            };
            if needs_rearm {
                self.arm_lobby_timer(&id, self.config.lobby_timeout(kind)).await;
            }
        }

        self.announce(
            channel,
            &format!("{} left ({count} in the lobby).", mention(player)),
        )
        .await;
        Ok(())
    }

    pub async fn start(&self, channel: ChannelId, requester: UserId) -> Result<()> {
        let session = self.require_session(channel).await?;
        let (id, kind, board, first) = {
            let mut s = session.lock().await;
            s.start(requester)?;
            (
                s.id().clone(),
                s.kind(),
                render_board(&s),
                s.current_player(),
            )
        };

        {
            let mut timers = self.timers.lock().await;
            if let Some(t) = timers.get_mut(&id) {
                if let Some(lobby) = t.lobby.take() {
                    lobby.cancel();
                }
            }
        }
        if let Some(play) = self.config.play_timeout(kind) {
            self.arm_play_timer(&id, play).await;
        }

        let turn_line = match first {
            Some(p) => format!("\n{} goes first.", mention(p)),
            None => String::new(),
        };
        self.announce(channel, &format!("Game on!\n{board}{turn_line}")).await;
        tracing::info!(session = %id.0, kind = kind.label(), "game started");
        Ok(())
    }

    pub async fn cancel(&self, channel: ChannelId, requester: UserId) -> Result<()> {
        let session = self.require_session(channel).await?;
        let id = {
            let mut s = session.lock().await;
            s.cancel(requester)?;
            s.id().clone()
        };
        self.teardown(&id).await;
        self.announce(channel, "Game cancelled.").await;
        tracing::info!(session = %id.0, "lobby cancelled by starter");
        Ok(())
    }

    /// Run the end-of-game sequence for a session that just went terminal:
    /// scoring, stats, summary post, then removal from the registry. Cancelled
    /// sessions are torn down without touching stats.
    pub async fn finish(&self, channel: ChannelId, session: &SharedSession) {
        let (id, state, kind, scores, team, secret) = {
            let s = session.lock().await;
            (
                s.id().clone(),
                s.state(),
                s.kind(),
                scoring::individual_scores(&s),
                scoring::team_score(&s),
                s.hangman().map(|h| h.word().to_string()),
            )
        };

        if !state.is_terminal() {
            tracing::warn!(session = %id.0, "finish called on a live session");
            return;
        }

        if state != SessionState::Cancelled {
            let won = matches!(state, SessionState::Won | SessionState::Completed);
            self.stats.record_game_result(&scores, won).await;

            let mut lines = vec![match (state, kind) {
                (SessionState::Won, _) => format!("Victory! Team score: {team}."),
                (SessionState::Lost, _) => "Out of guesses. Better luck next time.".to_string(),
                (_, GameKind::SpellingBee) => format!("Time! Team score: {team}."),
                _ => format!("Game over. Team score: {team}."),
            }];
            for (player, points) in &scores {
                lines.push(format!("{}: {points}", mention(*player)));
            }
            if let Some(word) = secret {
                let definition =
                    definition_or_fallback(&self.definitions, &word, self.config.hint_retries)
                        .await;
                lines.push(format!("The word was \"{word}\": {definition}"));
            }
            self.announce(channel, &lines.join("\n")).await;
        }

        self.teardown(&id).await;
        tracing::info!(session = %id.0, state = ?state, "session finished");
    }

    // === Timers ===

    async fn arm_lobby_timer(&self, id: &SessionId, timeout: std::time::Duration) {
        let Some(ctrl) = self.weak.upgrade() else {
            return;
        };
        let sid = id.clone();
        let handle = schedule(timeout, async move {
            ctrl.on_lobby_timeout(sid).await;
        });
        self.timers.lock().await.entry(id.clone()).or_default().lobby = Some(handle);
    }

    async fn arm_play_timer(&self, id: &SessionId, timeout: std::time::Duration) {
        let Some(ctrl) = self.weak.upgrade() else {
            return;
        };
        let sid = id.clone();
        let handle = schedule(timeout, async move {
            ctrl.on_play_timeout(sid).await;
        });
        self.timers.lock().await.entry(id.clone()).or_default().play = Some(handle);
    }

    /// Solo-lobby timer body. State is rechecked under the lock: if a second
    /// player joined in the meantime the fire is a no-op.
    async fn on_lobby_timeout(self: Arc<Self>, id: SessionId) {
        let Some(session) = self.registry.find_by_id(&id).await else {
            return;
        };
        let timed_out = session.lock().await.timeout_lobby();
        if !timed_out {
            return;
        }

        let channel = self.channel_of(&id).await;
        self.teardown(&id).await;
        if let Some(channel) = channel {
            self.announce(channel, "Nobody joined in time; lobby closed.").await;
        }
        tracing::info!(session = %id.0, "solo lobby timed out");
    }

    /// Play-duration timer body (spelling bee). Forces `Completed` and runs
    /// the normal end-of-game sequence.
    async fn on_play_timeout(self: Arc<Self>, id: SessionId) {
        let Some(session) = self.registry.find_by_id(&id).await else {
            return;
        };
        let completed = session.lock().await.complete();
        if !completed {
            return;
        }
        if let Some(channel) = self.channel_of(&id).await {
            self.finish(channel, &session).await;
        } else {
            self.teardown(&id).await;
        }
    }

    async fn teardown(&self, id: &SessionId) {
        if let Some(timers) = self.timers.lock().await.remove(id) {
            if let Some(t) = timers.lobby {
                t.cancel();
            }
            if let Some(t) = timers.play {
                t.cancel();
            }
        }
        self.registry.unregister(id).await;
    }

    // === Helpers ===

    fn new_payload(&self, kind: GameKind) -> Result<GamePayload> {
        match kind {
            GameKind::Hangman => {
                let word = self
                    .dict
                    .random_secret(4, 10)
                    .ok_or_else(|| Error::Config("dictionary has no usable words".to_string()))?;
                Ok(GamePayload::Hangman(HangmanState::new(word)))
            }
            GameKind::SpellingBee => {
                let seed = self
                    .dict
                    .random_pangram_seed()
                    .ok_or_else(|| Error::Config("dictionary has no pangram seeds".to_string()))?;
                let state = BeeState::from_seed(&seed)
                    .ok_or_else(|| Error::Config(format!("bad pangram seed '{seed}'")))?;
                Ok(GamePayload::SpellingBee(state))
            }
        }
    }

    async fn require_session(&self, channel: ChannelId) -> Result<SharedSession> {
        self.registry
            .find_by_channel(channel)
            .await
            .ok_or(Error::Rejected(Reject::NoSuchGame))
    }

    async fn channel_of(&self, id: &SessionId) -> Option<ChannelId> {
        self.registry.channel_of(id).await
    }

    /// Messaging failures never abort game flow; they are logged and play
    /// continues.
    async fn announce(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.messenger.send_text(channel, text).await {
            tracing::warn!(channel = channel.0, error = %e, "failed to post announcement");
        }
    }

    async fn announce_buttons(&self, channel: ChannelId, text: &str, buttons: ButtonRow) {
        if let Err(e) = self.messenger.send_buttons(channel, text, buttons).await {
            tracing::warn!(channel = channel.0, error = %e, "failed to post lobby buttons");
        }
    }
}

/// Channel-facing rendering of the current board.
pub fn render_board(session: &GameSession) -> String {
    match (session.hangman(), session.bee()) {
        (Some(h), _) => format!(
            "{}\nwrong: [{}]  lives left: {}",
            h.mask(),
            h.wrong_letters().iter().collect::<String>(),
            h.remaining_mistakes(),
        ),
        (_, Some(b)) => {
            let outer: String = b
                .letters()
                .iter()
                .filter(|c| **c != b.center())
                .collect();
            format!(
                "Letters: {outer} around [{}]  words found: {}",
                b.center(),
                b.found_count(),
            )
        }
        _ => String::new(),
    }
}

fn mention(user: UserId) -> String {
    format!("player {}", user.0)
}

fn new_session_id() -> SessionId {
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    SessionId(format!("g-{tail}"))
}
