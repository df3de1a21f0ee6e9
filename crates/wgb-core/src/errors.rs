/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs retryable).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),

    #[error(transparent)]
    Rejected(#[from] Reject),
}

impl Error {
    /// The rule rejection behind this error, if that is what it is.
    pub fn as_reject(&self) -> Option<&Reject> {
        match self {
            Error::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expected rejections of game / lobby operations.
///
/// These are not failures of the bot: they are "no, and here is why" answers
/// that handlers translate into short user-facing messages. Session state is
/// always unchanged when one of these is returned, so retrying after
/// conditions change is safe.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Reject {
    #[error("you already joined this game")]
    AlreadyJoined,

    #[error("the game is full")]
    Full,

    #[error("you are not in this game")]
    NotInGame,

    #[error("the starter cannot leave; cancel the game instead")]
    IsStarter,

    #[error("only the starter may do that")]
    NotStarter,

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("the game has not started yet")]
    NotStarted,

    #[error("at least {min} players are needed to start")]
    TooFewPlayers { min: usize },

    #[error("this game is already over")]
    SessionTerminal,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("there is already an active game in this channel")]
    ChannelBusy,

    #[error("no active game here")]
    NoSuchGame,

    #[error("slow down; try again in {retry_after:.1}s")]
    RateLimited { retry_after: f64 },
}
