//! Dispatch of parsed platform updates onto lobby and game operations.
//!
//! Adapters turn raw platform events into [`IncomingUpdate`] values and hand
//! them here. Every rule rejection becomes a short reply that tells the player
//! what to do differently, never an internal detail; unexpected errors are
//! logged and answered generically. Guesses pass through the per-player
//! cooldown and the rolling-window quota before they reach a session.

use std::sync::Arc;

use crate::{
    cooldown::RateLimiter,
    domain::{ActorId, ChannelId, UserId},
    game::{GameKind, GuessOutcome, MissReason, SessionState},
    lobby::{render_board, LobbyController},
    messaging::{
        port::MessagingPort,
        types::{ButtonClick, Command, IncomingUpdate, TextMessage},
    },
    registry::SharedSession,
    Error, Reject,
};

pub struct Handlers {
    lobby: Arc<LobbyController>,
    limiter: Arc<RateLimiter>,
    messenger: Arc<dyn MessagingPort>,
}

impl Handlers {
    pub fn new(
        lobby: Arc<LobbyController>,
        limiter: Arc<RateLimiter>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            lobby,
            limiter,
            messenger,
        }
    }

    pub async fn handle(&self, update: IncomingUpdate) {
        match update {
            IncomingUpdate::Command(cmd) => self.handle_command(cmd).await,
            IncomingUpdate::Text(msg) => self.handle_text(msg).await,
            IncomingUpdate::ButtonClick(click) => self.handle_click(click).await,
        }
    }

    async fn handle_command(&self, cmd: Command) {
        let channel = cmd.channel_id;
        let user = cmd.user_id;
        let outcome = match cmd.name.as_str() {
            "hangman" => self.lobby.open(channel, user, GameKind::Hangman).await.map(|_| ()),
            "bee" => self
                .lobby
                .open(channel, user, GameKind::SpellingBee)
                .await
                .map(|_| ()),
            "join" => self.lobby.join(channel, user).await,
            "leave" => self.lobby.leave(channel, user).await,
            "start" => self.lobby.start(channel, user).await,
            "cancel" => self.lobby.cancel(channel, user).await,
            "board" => {
                self.reply_board(channel).await;
                Ok(())
            }
            "top" => {
                self.reply_leaderboard(channel).await;
                Ok(())
            }
            "stats" => {
                self.reply_stats(channel, user).await;
                Ok(())
            }
            other => {
                tracing::debug!(command = other, "ignoring unknown command");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            self.reply_error(channel, &e).await;
        }
    }

    /// Free text in a channel: a guess if a game is running there, otherwise
    /// ordinary conversation we stay out of.
    async fn handle_text(&self, msg: TextMessage) {
        let Some(session) = self.lobby.registry().find_by_channel(msg.channel_id).await else {
            return;
        };
        let text = msg.text.trim();
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_alphabetic()) {
            return;
        }

        if let Some(reply) = self.gate_guess(msg.user_id).await {
            self.reply(msg.channel_id, &reply).await;
            return;
        }

        let mut chars = text.chars();
        let first = chars.next();
        let is_single_letter = first.is_some() && chars.next().is_none();

        let result = {
            let mut s = session.lock().await;
            if is_single_letter {
                let letter = first.unwrap_or_default();
                s.guess_letter(msg.user_id, letter)
            } else {
                s.submit_word(msg.user_id, text, self.lobby.dictionary())
            }
        };

        match result {
            Ok(outcome) => {
                self.report_outcome(msg.channel_id, &session, outcome).await
            }
            Err(reject) => self.reply_reject(msg.channel_id, &reject).await,
        }
    }

    async fn handle_click(&self, click: ButtonClick) {
        // Button payloads look like "lobby:<session>:<action>".
        let action = click.data.rsplit(':').next().unwrap_or_default();
        let outcome = match action {
            "join" => self.lobby.join(click.channel_id, click.user_id).await,
            "start" => self.lobby.start(click.channel_id, click.user_id).await,
            "cancel" => self.lobby.cancel(click.channel_id, click.user_id).await,
            other => {
                tracing::debug!(action = other, "ignoring unknown button");
                Ok(())
            }
        };

        let ack = match &outcome {
            Ok(()) => None,
            Err(e) => Some(user_message(e)),
        };
        if let Err(e) = self
            .messenger
            .answer_button(&click.click_id, ack.as_deref())
            .await
        {
            tracing::warn!(error = %e, "failed to acknowledge button");
        }
    }

    /// Cooldown then rolling quota; returns the rejection text when gated.
    async fn gate_guess(&self, user: UserId) -> Option<String> {
        let cfg = self.lobby.config();
        let actor = ActorId::User(user);

        let v = self
            .limiter
            .check_and_record(actor, cfg.guess_cooldown)
            .await;
        if !v.allowed {
            return Some(Reject::RateLimited {
                retry_after: v.retry_after,
            }
            .to_string());
        }

        let v = self
            .limiter
            .check_rate_window(actor, cfg.rate_limit_max as usize, cfg.rate_limit_window)
            .await;
        if !v.allowed {
            return Some(Reject::RateLimited {
                retry_after: v.retry_after,
            }
            .to_string());
        }
        None
    }

    async fn report_outcome(
        &self,
        channel: ChannelId,
        session: &SharedSession,
        outcome: GuessOutcome,
    ) {
        let (board, next, terminal, kind) = {
            let s = session.lock().await;
            (
                render_board(&s),
                s.current_player(),
                s.state().is_terminal(),
                s.kind(),
            )
        };

        let mut lines = Vec::new();
        if outcome.correct {
            lines.push(format!("Correct! +{} points.", outcome.points_awarded));
        } else if let Some(reason) = outcome.miss {
            lines.push(miss_text(reason).to_string());
        }
        if !terminal {
            lines.push(board);
            // Turn announcements only make sense for turn-based kinds, and
            // not when a correct guess kept the turn.
            if kind == GameKind::Hangman && !outcome.bonus_turn {
                if let Some(p) = next {
                    lines.push(format!("Next up: player {}.", p.0));
                }
            }
        }
        if !lines.is_empty() {
            self.reply(channel, &lines.join("\n")).await;
        }

        if terminal {
            self.lobby.finish(channel, session).await;
        }
    }

    async fn reply_board(&self, channel: ChannelId) {
        let Some(session) = self.lobby.registry().find_by_channel(channel).await else {
            self.reply_reject(channel, &Reject::NoSuchGame).await;
            return;
        };
        let (board, state) = {
            let s = session.lock().await;
            (render_board(&s), s.state())
        };
        match state {
            SessionState::Lobby => self.reply(channel, "Still in the lobby.").await,
            _ => self.reply(channel, &board).await,
        }
    }

    async fn reply_leaderboard(&self, channel: ChannelId) {
        let top = self.lobby.stats().leaderboard(10).await;
        if top.is_empty() {
            self.reply(channel, "No scores this week yet.").await;
            return;
        }
        let mut lines = vec!["This week's top scorers:".to_string()];
        for (rank, (player, points)) in top.iter().enumerate() {
            lines.push(format!("{}. player {}: {points}", rank + 1, player.0));
        }
        self.reply(channel, &lines.join("\n")).await;
    }

    async fn reply_stats(&self, channel: ChannelId, user: UserId) {
        let s = self.lobby.stats().get(user).await;
        self.reply(
            channel,
            &format!(
                "player {}: {} games, {} won, {} total points ({} this week), best game {}",
                user.0, s.games_played, s.games_won, s.total_points, s.weekly_points, s.best_game_points,
            ),
        )
        .await;
    }

    async fn reply_reject(&self, channel: ChannelId, reject: &Reject) {
        self.reply(channel, &reject.to_string()).await;
    }

    async fn reply_error(&self, channel: ChannelId, error: &Error) {
        self.reply(channel, &user_message(error)).await;
    }

    async fn reply(&self, channel: ChannelId, text: &str) {
        // Stay under the tighter of our safe limit and the platform's own
        // cap; long leaderboards get cut, not split. Counted in chars on
        // both sides so multi-byte text cannot straddle the limit.
        let limit = self
            .lobby
            .config()
            .message_safe_limit
            .min(self.messenger.capabilities().max_message_len);
        let text = if text.chars().count() > limit {
            let cut: String = text.chars().take(limit.saturating_sub(1)).collect();
            format!("{cut}…")
        } else {
            text.to_string()
        };
        if let Err(e) = self.messenger.send_text(channel, &text).await {
            tracing::warn!(channel = channel.0, error = %e, "failed to send reply");
        }
    }
}

/// User-facing text for an operation failure. Rule rejections explain
/// themselves; anything else is logged and answered generically so internals
/// never leak into chat.
fn user_message(error: &Error) -> String {
    match error.as_reject() {
        Some(reject) => reject.to_string(),
        None => {
            tracing::error!(error = %error, "operation failed");
            "Something went wrong; please try again.".to_string()
        }
    }
}

fn miss_text(reason: MissReason) -> &'static str {
    match reason {
        MissReason::WrongLetter => "Nope, not in the word.",
        MissReason::TooShort => "Too short; words need at least 4 letters.",
        MissReason::MissingCenter => "Every word must use the center letter.",
        MissReason::ForeignLetter => "Only the puzzle letters are allowed.",
        MissReason::NotAWord => "Not in the dictionary.",
        MissReason::AlreadyFound => "Someone already found that one.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::dictionary::Dictionary;
    use crate::domain::{MessageId, MessageRef};
    use crate::hints::DefinitionProvider;
    use crate::messaging::types::{ButtonRow, MessagingCapabilities};
    use crate::registry::GameRegistry;
    use crate::stats::StatsStore;
    use crate::Result;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::advance;

    struct RecordingMessenger {
        sent: Mutex<Vec<(ChannelId, String)>>,
        max_len: usize,
    }

    impl RecordingMessenger {
        fn new() -> Arc<Self> {
            Self::with_max_len(4096)
        }

        fn with_max_len(max_len: usize) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                max_len,
            })
        }

        async fn last_text(&self) -> String {
            self.sent
                .lock()
                .await
                .last()
                .map(|(_, t)| t.clone())
                .unwrap_or_default()
        }

        async fn all_text(&self) -> String {
            self.sent
                .lock()
                .await
                .iter()
                .map(|(_, t)| t.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_edit: true,
                supports_buttons: true,
                supports_dm: true,
                max_message_len: self.max_len,
            }
        }

        async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
            self.sent.lock().await.push((channel_id, text.to_string()));
            Ok(MessageRef {
                channel_id,
                message_id: MessageId(1),
            })
        }

        async fn send_dm(&self, _user_id: UserId, _text: &str) -> Result<MessageRef> {
            Ok(MessageRef {
                channel_id: ChannelId(0),
                message_id: MessageId(1),
            })
        }

        async fn edit_text(&self, _msg: MessageRef, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
            Ok(())
        }

        async fn send_buttons(
            &self,
            channel_id: ChannelId,
            text: &str,
            _buttons: ButtonRow,
        ) -> Result<MessageRef> {
            self.sent.lock().await.push((channel_id, text.to_string()));
            Ok(MessageRef {
                channel_id,
                message_id: MessageId(1),
            })
        }

        async fn answer_button(&self, _click_id: &str, _text: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    struct CannedDefinitions;

    #[async_trait]
    impl DefinitionProvider for CannedDefinitions {
        async fn define(&self, _word: &str) -> Result<String> {
            Ok("a word in the dictionary".to_string())
        }
    }

    fn stats_path(tag: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!(
            "/tmp/wgb-handlers-{tag}-{}-{ts}.json",
            std::process::id()
        ))
    }

    fn fixture(tag: &str) -> (Handlers, Arc<RecordingMessenger>) {
        let messenger = RecordingMessenger::new();
        let lobby = LobbyController::new(
            Arc::new(test_config()),
            Arc::new(Dictionary::from_lines("cat\ndog\nplacenta\nplant\nclean\npant\n")),
            Arc::new(GameRegistry::new()),
            Arc::new(StatsStore::open(stats_path(tag))),
            messenger.clone(),
            Arc::new(CannedDefinitions),
        );
        let handlers = Handlers::new(lobby, Arc::new(RateLimiter::new()), messenger.clone());
        (handlers, messenger)
    }

    fn cmd(channel: i64, user: i64, name: &str) -> IncomingUpdate {
        IncomingUpdate::Command(Command {
            channel_id: ChannelId(channel),
            user_id: UserId(user),
            username: None,
            name: name.to_string(),
            args: String::new(),
        })
    }

    fn text(channel: i64, user: i64, body: &str) -> IncomingUpdate {
        IncomingUpdate::Text(TextMessage {
            channel_id: ChannelId(channel),
            user_id: UserId(user),
            username: None,
            text: body.to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_become_specific_replies() {
        let (handlers, messenger) = fixture("rejects");
        handlers.handle(cmd(10, 1, "hangman")).await;
        handlers.handle(cmd(10, 2, "join")).await;
        handlers.handle(cmd(10, 2, "join")).await;
        assert!(messenger.last_text().await.contains("already joined"));

        handlers.handle(cmd(10, 2, "start")).await;
        assert!(messenger.last_text().await.contains("only the starter"));

        handlers.handle(cmd(10, 2, "leave")).await;
        handlers.handle(cmd(10, 2, "leave")).await;
        assert!(messenger.last_text().await.contains("not in this game"));
    }

    #[tokio::test(start_paused = true)]
    async fn guesses_are_cooldown_gated() {
        let (handlers, messenger) = fixture("gate");
        handlers.handle(cmd(10, 1, "hangman")).await;
        handlers.handle(cmd(10, 2, "join")).await;
        handlers.handle(cmd(10, 1, "start")).await;

        let session = handlers
            .lobby
            .registry()
            .find_by_channel(ChannelId(10))
            .await
            .unwrap();
        let turn = session.lock().await.current_player().unwrap();

        handlers.handle(text(10, turn.0, "q")).await;
        handlers.handle(text(10, turn.0, "w")).await;
        assert!(messenger.last_text().await.contains("slow down"));

        // After the cooldown passes the same player may guess again.
        advance(Duration::from_secs(3)).await;
        handlers.handle(text(10, turn.0, "w")).await;
        assert!(!messenger.last_text().await.contains("slow down"));
    }

    #[tokio::test(start_paused = true)]
    async fn full_hangman_round_through_the_handlers() {
        let (handlers, messenger) = fixture("round");
        handlers.handle(cmd(10, 1, "hangman")).await;
        handlers.handle(cmd(10, 2, "join")).await;
        handlers.handle(cmd(10, 1, "start")).await;

        let session = handlers
            .lobby
            .registry()
            .find_by_channel(ChannelId(10))
            .await
            .unwrap();
        let word: Vec<char> = {
            let s = session.lock().await;
            s.hangman().map(|h| h.word().chars().collect()).unwrap_or_default()
        };

        let mut seen = std::collections::BTreeSet::new();
        for c in word {
            if !seen.insert(c) {
                continue;
            }
            let turn = {
                let s = session.lock().await;
                match s.current_player() {
                    Some(p) => p,
                    None => break,
                }
            };
            advance(Duration::from_secs(3)).await; // clear the cooldown
            handlers.handle(text(10, turn.0, &c.to_string())).await;
        }

        // Session is gone and the summary went out.
        assert!(handlers.lobby.registry().is_empty().await);
        let all = messenger.all_text().await;
        assert!(all.contains("Victory"), "{all}");
        assert!(all.contains("a word in the dictionary"), "{all}");
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_turn_guess_is_rejected() {
        let (handlers, messenger) = fixture("turn");
        handlers.handle(cmd(10, 1, "hangman")).await;
        handlers.handle(cmd(10, 2, "join")).await;
        handlers.handle(cmd(10, 1, "start")).await;

        let session = handlers
            .lobby
            .registry()
            .find_by_channel(ChannelId(10))
            .await
            .unwrap();
        let turn = session.lock().await.current_player().unwrap();
        let other = if turn.0 == 1 { 2 } else { 1 };

        handlers.handle(text(10, other, "a")).await;
        assert!(messenger.last_text().await.contains("not your turn"));
    }

    #[tokio::test(start_paused = true)]
    async fn replies_are_clamped_to_the_platform_cap_in_chars() {
        let messenger = RecordingMessenger::with_max_len(20);
        let lobby = LobbyController::new(
            Arc::new(test_config()),
            Arc::new(Dictionary::from_lines("placenta\nplant\nclean\n")),
            Arc::new(GameRegistry::new()),
            Arc::new(StatsStore::open(stats_path("clamp"))),
            messenger.clone(),
            Arc::new(CannedDefinitions),
        );
        let handlers = Handlers::new(lobby, Arc::new(RateLimiter::new()), messenger.clone());

        // Multi-byte input: the cut counts chars, not bytes, so it can never
        // split a character or overshoot the cap.
        handlers.reply(ChannelId(10), &"é".repeat(100)).await;
        let last = messenger.last_text().await;
        assert!(last.chars().count() <= 20, "{} chars", last.chars().count());
        assert!(last.ends_with('…'), "{last}");

        // Short replies pass through untouched.
        handlers.reply(ChannelId(10), "ok").await;
        assert_eq!(messenger.last_text().await, "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn leaderboard_and_stats_replies() {
        let (handlers, messenger) = fixture("board");
        handlers.handle(cmd(10, 1, "top")).await;
        assert!(messenger.last_text().await.contains("No scores"));

        handlers.handle(cmd(10, 1, "stats")).await;
        assert!(messenger.last_text().await.contains("0 games"));
    }
}
