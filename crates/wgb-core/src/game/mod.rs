//! Turn-based game sessions.
//!
//! A `GameSession` is the authoritative state of one game instance: roster,
//! turn pointer, lifecycle state and kind-specific progress. The lobby,
//! registry and scoring layers are written once against this type; the two
//! game kinds differ only in their payload.

pub mod bee;
pub mod hangman;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{
    dictionary::{letter_rarity, Dictionary},
    domain::{SessionId, UserId},
    errors::Reject,
};

pub use bee::BeeState;
pub use hangman::HangmanState;

/// Why an action that reached the game scored nothing. Shared between the
/// two game kinds; hangman only ever produces `WrongLetter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    WrongLetter,
    TooShort,
    MissingCenter,
    ForeignLetter,
    NotAWord,
    AlreadyFound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    Hangman,
    SpellingBee,
}

impl GameKind {
    pub fn label(&self) -> &'static str {
        match self {
            GameKind::Hangman => "hangman",
            GameKind::SpellingBee => "spelling bee",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Lobby,
    Active,
    Won,
    Lost,
    Cancelled,
    Completed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Won | SessionState::Lost | SessionState::Cancelled | SessionState::Completed
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GamePayload {
    Hangman(HangmanState),
    SpellingBee(BeeState),
}

/// Structured result of a guess/submit action. `miss` carries the reason
/// whenever `correct` is false so handlers can report something specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuessOutcome {
    pub correct: bool,
    pub points_awarded: u32,
    pub terminal: bool,
    pub bonus_turn: bool,
    pub miss: Option<MissReason>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    id: SessionId,
    kind: GameKind,
    starter: UserId,
    players: Vec<UserId>,
    state: SessionState,
    turn_index: usize,
    created_at: DateTime<Utc>,
    finisher: Option<UserId>,
    player_points: BTreeMap<UserId, u32>,
    payload: GamePayload,
    max_players: usize,
    min_players: usize,
}

impl GameSession {
    pub fn create(
        id: SessionId,
        starter: UserId,
        payload: GamePayload,
        max_players: usize,
        min_players: usize,
    ) -> Self {
        let kind = match &payload {
            GamePayload::Hangman(_) => GameKind::Hangman,
            GamePayload::SpellingBee(_) => GameKind::SpellingBee,
        };
        let mut player_points = BTreeMap::new();
        player_points.insert(starter, 0);
        Self {
            id,
            kind,
            starter,
            players: vec![starter],
            state: SessionState::Lobby,
            turn_index: 0,
            created_at: Utc::now(),
            finisher: None,
            player_points,
            payload,
            max_players,
            min_players,
        }
    }

    // === Accessors ===

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn starter(&self) -> UserId {
        self.starter
    }

    pub fn players(&self) -> &[UserId] {
        &self.players
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finisher(&self) -> Option<UserId> {
        self.finisher
    }

    pub fn current_player(&self) -> Option<UserId> {
        if self.state != SessionState::Active {
            return None;
        }
        self.players.get(self.turn_index).copied()
    }

    pub fn mistakes(&self) -> u32 {
        match &self.payload {
            GamePayload::Hangman(h) => h.mistakes(),
            GamePayload::SpellingBee(_) => 0,
        }
    }

    /// Per-player points accumulated during play (rarity, participation,
    /// word scores). Does not include the end-of-game team split.
    pub fn player_points(&self) -> &BTreeMap<UserId, u32> {
        &self.player_points
    }

    pub fn hangman(&self) -> Option<&HangmanState> {
        match &self.payload {
            GamePayload::Hangman(h) => Some(h),
            _ => None,
        }
    }

    pub fn bee(&self) -> Option<&BeeState> {
        match &self.payload {
            GamePayload::SpellingBee(b) => Some(b),
            _ => None,
        }
    }

    // === Lobby mutations ===

    pub fn add_player(&mut self, player: UserId) -> Result<(), Reject> {
        self.guard_lobby()?;
        if self.players.contains(&player) {
            return Err(Reject::AlreadyJoined);
        }
        if self.players.len() >= self.max_players {
            return Err(Reject::Full);
        }
        // New players always go to the end; insertion order is turn order.
        self.players.push(player);
        self.player_points.insert(player, 0);
        Ok(())
    }

    pub fn remove_player(&mut self, player: UserId) -> Result<(), Reject> {
        self.guard_lobby()?;
        if player == self.starter {
            return Err(Reject::IsStarter);
        }
        let Some(pos) = self.players.iter().position(|p| *p == player) else {
            return Err(Reject::NotInGame);
        };
        // Relative order of the remaining players is preserved.
        self.players.remove(pos);
        self.player_points.remove(&player);
        Ok(())
    }

    /// Transition lobby -> active. First turn is picked uniformly at random
    /// among the joined players.
    pub fn start(&mut self, requester: UserId) -> Result<(), Reject> {
        self.guard_lobby()?;
        if requester != self.starter {
            return Err(Reject::NotStarter);
        }
        if self.players.len() < self.min_players {
            return Err(Reject::TooFewPlayers {
                min: self.min_players,
            });
        }
        self.state = SessionState::Active;
        self.turn_index = rand::thread_rng().gen_range(0..self.players.len());
        Ok(())
    }

    /// Cancellation is a starter privilege and only allowed pre-start, the
    /// same restriction the lobby buttons enforce.
    pub fn cancel(&mut self, requester: UserId) -> Result<(), Reject> {
        self.guard_lobby()?;
        if requester != self.starter {
            return Err(Reject::NotStarter);
        }
        self.state = SessionState::Cancelled;
        Ok(())
    }

    // === Gameplay mutations ===

    pub fn guess_letter(&mut self, player: UserId, letter: char) -> Result<GuessOutcome, Reject> {
        self.guard_active()?;
        if !self.players.contains(&player) {
            return Err(Reject::NotInGame);
        }
        // Kind check runs before the turn guard: turn order only exists in
        // hangman, so a stray letter in a free-for-all game should explain
        // the input shape, not complain about turns.
        if matches!(self.payload, GamePayload::SpellingBee(_)) {
            return Err(Reject::InvalidInput(
                "this game takes whole words, not letters".to_string(),
            ));
        }
        if self.current_player() != Some(player) {
            return Err(Reject::NotYourTurn);
        }
        if !letter.is_ascii_alphabetic() {
            return Err(Reject::InvalidInput("guess a single letter a-z".to_string()));
        }

        let GamePayload::Hangman(h) = &mut self.payload else {
            return Err(Reject::InvalidInput(
                "this game takes whole words, not letters".to_string(),
            ));
        };

        let mut outcome = match h.guess(letter) {
            hangman::LetterGuess::AlreadyGuessed => {
                return Err(Reject::InvalidInput(format!(
                    "'{letter}' was already guessed"
                )));
            }
            hangman::LetterGuess::Correct { occurrences } => {
                // Rarity points per revealed occurrence plus one participation
                // point per guess; a correct guess keeps the turn.
                let points = letter_rarity(letter) * occurrences + 1;
                GuessOutcome {
                    correct: true,
                    points_awarded: points,
                    terminal: false,
                    bonus_turn: true,
                    miss: None,
                }
            }
            hangman::LetterGuess::Wrong => GuessOutcome {
                correct: false,
                points_awarded: 1,
                terminal: false,
                bonus_turn: false,
                miss: Some(MissReason::WrongLetter),
            },
        };

        let solved = h.is_solved();
        let out_of_mistakes = h.is_out_of_mistakes();

        *self.player_points.entry(player).or_insert(0) += outcome.points_awarded;
        if !outcome.correct {
            self.advance_turn();
        }

        // Terminal detection runs after every mutation, exactly once.
        if solved {
            self.state = SessionState::Won;
            self.finisher = Some(player);
            outcome.terminal = true;
            outcome.bonus_turn = false;
        } else if out_of_mistakes {
            self.state = SessionState::Lost;
            outcome.terminal = true;
        }

        Ok(outcome)
    }

    pub fn submit_word(
        &mut self,
        player: UserId,
        word: &str,
        dict: &Dictionary,
    ) -> Result<GuessOutcome, Reject> {
        self.guard_active()?;
        if !self.players.contains(&player) {
            return Err(Reject::NotInGame);
        }
        let trimmed = word.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Reject::InvalidInput("submit letters only".to_string()));
        }

        let GamePayload::SpellingBee(b) = &mut self.payload else {
            return Err(Reject::InvalidInput(
                "this game takes single letters, not words".to_string(),
            ));
        };

        match b.check(trimmed, dict) {
            bee::SubmitCheck::Accepted { points, .. } => {
                b.record(trimmed, player);
                *self.player_points.entry(player).or_insert(0) += points;
                Ok(GuessOutcome {
                    correct: true,
                    points_awarded: points,
                    terminal: false,
                    bonus_turn: false,
                    miss: None,
                })
            }
            bee::SubmitCheck::Miss(reason) => Ok(GuessOutcome {
                correct: false,
                points_awarded: 0,
                terminal: false,
                bonus_turn: false,
                miss: Some(reason),
            }),
        }
    }

    /// Advance the turn pointer cyclically. No-op on an empty roster.
    pub fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.players.len();
    }

    // === Timer-driven transitions ===

    /// Solo-lobby timeout: cancels the lobby only if it is still in the lobby
    /// phase with a single player. Returns whether the transition happened,
    /// so a late-firing timer degrades to a no-op.
    pub fn timeout_lobby(&mut self) -> bool {
        if self.state == SessionState::Lobby && self.players.len() == 1 {
            self.state = SessionState::Cancelled;
            return true;
        }
        false
    }

    /// Play-duration timeout: ends an active game, moving it to `Completed`
    /// so scoring can run. Returns whether the transition happened.
    pub fn complete(&mut self) -> bool {
        if self.state == SessionState::Active {
            self.state = SessionState::Completed;
            return true;
        }
        false
    }

    // === Guards ===

    fn guard_not_terminal(&self) -> Result<(), Reject> {
        if self.state.is_terminal() {
            return Err(Reject::SessionTerminal);
        }
        Ok(())
    }

    fn guard_lobby(&self) -> Result<(), Reject> {
        self.guard_not_terminal()?;
        if self.state != SessionState::Lobby {
            return Err(Reject::AlreadyStarted);
        }
        Ok(())
    }

    fn guard_active(&self) -> Result<(), Reject> {
        self.guard_not_terminal()?;
        if self.state != SessionState::Active {
            return Err(Reject::NotStarted);
        }
        Ok(())
    }
}
