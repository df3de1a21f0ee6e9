use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, game::GameKind, Result};

/// Typed configuration for the bot.
///
/// Everything is environment-variable driven with sensible defaults; the two
/// game kinds use different timeout values for conceptually the same
/// mechanism, so both are configurable rather than hard-coded.
#[derive(Clone, Debug)]
pub struct Config {
    // Storage
    pub data_dir: PathBuf,
    pub stats_file: PathBuf,
    pub dictionary_path: Option<PathBuf>,

    // Lobby / play timers per game kind
    pub hangman_lobby_timeout: Duration,
    pub bee_lobby_timeout: Duration,
    pub bee_play_timeout: Duration,

    // Roster bounds
    pub max_players: usize,
    pub min_players: usize,

    // Throttling
    pub guess_cooldown: Duration,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub cooldown_expiry: Duration,
    pub cleanup_interval: Duration,

    // Definition hints (optional external provider)
    pub hint_api_key: Option<String>,
    pub hint_timeout: Duration,
    pub hint_retries: u32,

    // Outbound message limits
    pub message_safe_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let data_dir = env_path("WGB_DATA_DIR").unwrap_or_else(|| PathBuf::from("/tmp/wordgame-bot"));
        fs::create_dir_all(&data_dir)?;

        let stats_file = env_path("WGB_STATS_FILE").unwrap_or_else(|| data_dir.join("stats.json"));
        let dictionary_path = env_path("WGB_DICTIONARY_PATH");

        let hangman_lobby_timeout =
            Duration::from_secs(env_u64("WGB_HANGMAN_LOBBY_TIMEOUT").unwrap_or(180));
        let bee_lobby_timeout = Duration::from_secs(env_u64("WGB_BEE_LOBBY_TIMEOUT").unwrap_or(120));
        let bee_play_timeout = Duration::from_secs(env_u64("WGB_BEE_PLAY_TIMEOUT").unwrap_or(600));

        let max_players = env_usize("WGB_MAX_PLAYERS").unwrap_or(4);
        let min_players = env_usize("WGB_MIN_PLAYERS").unwrap_or(2);
        if min_players == 0 || min_players > max_players {
            return Err(Error::Config(format!(
                "invalid player bounds: min {min_players}, max {max_players}"
            )));
        }

        let guess_cooldown = Duration::from_secs(env_u64("WGB_GUESS_COOLDOWN").unwrap_or(2));
        let rate_limit_max = env_u32("WGB_RATE_LIMIT_MAX").unwrap_or(10);
        let rate_limit_window = Duration::from_secs(env_u64("WGB_RATE_LIMIT_WINDOW").unwrap_or(60));
        let cooldown_expiry = Duration::from_secs(env_u64("WGB_COOLDOWN_EXPIRY").unwrap_or(300));
        let cleanup_interval = Duration::from_secs(env_u64("WGB_CLEANUP_INTERVAL").unwrap_or(180));

        let hint_api_key = env_str("WGB_HINT_API_KEY").and_then(non_empty);
        let hint_timeout = Duration::from_secs(env_u64("WGB_HINT_TIMEOUT").unwrap_or(8));
        let hint_retries = env_u32("WGB_HINT_RETRIES").unwrap_or(2);

        let message_safe_limit = env_usize("WGB_MESSAGE_SAFE_LIMIT").unwrap_or(1900);

        Ok(Self {
            data_dir,
            stats_file,
            dictionary_path,
            hangman_lobby_timeout,
            bee_lobby_timeout,
            bee_play_timeout,
            max_players,
            min_players,
            guess_cooldown,
            rate_limit_max,
            rate_limit_window,
            cooldown_expiry,
            cleanup_interval,
            hint_api_key,
            hint_timeout,
            hint_retries,
            message_safe_limit,
        })
    }

    /// How long a single-player lobby may wait before the solo timeout fires.
    pub fn lobby_timeout(&self, kind: GameKind) -> Duration {
        match kind {
            GameKind::Hangman => self.hangman_lobby_timeout,
            GameKind::SpellingBee => self.bee_lobby_timeout,
        }
    }

    /// Active-phase duration cap, if the game kind has one.
    pub fn play_timeout(&self, kind: GameKind) -> Option<Duration> {
        match kind {
            GameKind::Hangman => None,
            GameKind::SpellingBee => Some(self.bee_play_timeout),
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        data_dir: PathBuf::from("/tmp"),
        stats_file: PathBuf::from("/tmp/wgb-test-stats.json"),
        dictionary_path: None,
        hangman_lobby_timeout: Duration::from_secs(180),
        bee_lobby_timeout: Duration::from_secs(120),
        bee_play_timeout: Duration::from_secs(600),
        max_players: 4,
        min_players: 2,
        guess_cooldown: Duration::from_secs(2),
        rate_limit_max: 10,
        rate_limit_window: Duration::from_secs(60),
        cooldown_expiry: Duration::from_secs(300),
        cleanup_interval: Duration::from_secs(180),
        hint_api_key: None,
        hint_timeout: Duration::from_secs(8),
        hint_retries: 2,
        message_safe_limit: 1900,
    }
}
