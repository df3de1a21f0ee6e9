//! Durable per-player statistics.
//!
//! A flat JSON file keyed by player id. The in-memory copy is authoritative
//! for the process lifetime: a failed save is logged and never rolls back an
//! applied change. A malformed or missing file falls back to an empty store.
//!
//! Weekly fields reset lazily on the ISO week boundary (Monday): every public
//! read or write first runs the rollover check, which zeroes weekly fields at
//! most once per week and archives the prior week's top ten beforehand.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::UserId, scoring::weekly_leaderboard, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u64,
    pub games_won: u64,
    pub games_lost: u64,
    pub total_points: u64,
    pub weekly_points: u64,
    pub weekly_games: u64,
    pub best_game_points: u64,
    #[serde(default)]
    pub cosmetics: Vec<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub week_start: NaiveDate,
    pub top: Vec<(i64, u64)>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StatsFile {
    last_weekly_reset: Option<NaiveDate>,
    players: HashMap<i64, PlayerStats>,
    #[serde(default)]
    weekly_archive: Vec<WeeklySnapshot>,
}

pub struct StatsStore {
    path: PathBuf,
    state: Mutex<StatsFile>,
}

/// Most recent Monday at or before `now` (ISO week start).
pub fn week_start(now: DateTime<Utc>) -> NaiveDate {
    let date = now.date_naive();
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - ChronoDuration::days(days_from_monday)
}

impl StatsStore {
    /// Open the store, loading existing data if present. Corruption is not
    /// fatal: it logs and starts from an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(txt) if !txt.trim().is_empty() => match serde_json::from_str(&txt) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "stats file corrupt, starting empty");
                    StatsFile::default()
                }
            },
            _ => StatsFile::default(),
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Stats for one player, created lazily on first lookup.
    pub async fn get(&self, player: UserId) -> PlayerStats {
        let mut st = self.state.lock().await;
        rollover_if_needed(&mut st, Utc::now());
        st.players
            .entry(player.0)
            .or_insert_with(|| new_player(Utc::now()))
            .clone()
    }

    /// Merge a finished game into every participant's record and persist.
    /// `won` applies to all participants (team games win or lose together);
    /// cancelled/timed-out games should not be recorded at all.
    pub async fn record_game_result(
        &self,
        scores: &std::collections::BTreeMap<UserId, u32>,
        won: bool,
    ) {
        let snapshot = {
            let mut st = self.state.lock().await;
            rollover_if_needed(&mut st, Utc::now());
            for (player, points) in scores {
                let entry = st
                    .players
                    .entry(player.0)
                    .or_insert_with(|| new_player(Utc::now()));
                entry.games_played += 1;
                if won {
                    entry.games_won += 1;
                } else {
                    entry.games_lost += 1;
                }
                entry.total_points += *points as u64;
                entry.weekly_points += *points as u64;
                entry.weekly_games += 1;
                entry.best_game_points = entry.best_game_points.max(*points as u64);
            }
            st.clone()
        };

        // In-memory state stays authoritative even if the save fails.
        if let Err(e) = self.save(&snapshot) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to persist stats");
        }
    }

    /// Weekly leaderboard rows, descending.
    pub async fn leaderboard(&self, limit: usize) -> Vec<(UserId, u64)> {
        let mut st = self.state.lock().await;
        rollover_if_needed(&mut st, Utc::now());
        let entries: Vec<(UserId, u64)> = st
            .players
            .iter()
            .filter(|(_, p)| p.weekly_points > 0)
            .map(|(id, p)| (UserId(*id), p.weekly_points))
            .collect();
        weekly_leaderboard(&entries, limit)
    }

    pub async fn archived_weeks(&self) -> usize {
        self.state.lock().await.weekly_archive.len()
    }

    /// Force-persist the current state (shutdown path).
    pub async fn flush(&self) -> Result<()> {
        let snapshot = self.state.lock().await.clone();
        self.save(&snapshot)
    }

    fn save(&self, data: &StatsFile) -> Result<()> {
        let txt = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }

    #[cfg(test)]
    async fn rollover_at(&self, now: DateTime<Utc>) {
        let mut st = self.state.lock().await;
        rollover_if_needed(&mut st, now);
    }

    #[cfg(test)]
    async fn weekly_points_of(&self, player: UserId) -> u64 {
        self.state
            .lock()
            .await
            .players
            .get(&player.0)
            .map(|p| p.weekly_points)
            .unwrap_or(0)
    }

    #[cfg(test)]
    async fn bump_weekly(&self, player: UserId, points: u64) {
        let mut st = self.state.lock().await;
        // Seed the reset marker so a later rollover check does not zero the
        // points we are about to add, mirroring how record_game_result accrues.
        if st.last_weekly_reset.is_none() {
            st.last_weekly_reset = Some(week_start(Utc::now()));
        }
        let entry = st
            .players
            .entry(player.0)
            .or_insert_with(|| new_player(Utc::now()));
        entry.weekly_points += points;
        entry.total_points += points;
    }
}

fn new_player(now: DateTime<Utc>) -> PlayerStats {
    PlayerStats {
        joined_at: Some(now),
        ..PlayerStats::default()
    }
}

fn rollover_if_needed(st: &mut StatsFile, now: DateTime<Utc>) {
    let current = week_start(now);
    if st.last_weekly_reset == Some(current) {
        return;
    }

    // Archive the outgoing week's top ten before zeroing anything.
    if let Some(prev) = st.last_weekly_reset {
        let entries: Vec<(UserId, u64)> = st
            .players
            .iter()
            .filter(|(_, p)| p.weekly_points > 0)
            .map(|(id, p)| (UserId(*id), p.weekly_points))
            .collect();
        let top = weekly_leaderboard(&entries, 10)
            .into_iter()
            .map(|(id, pts)| (id.0, pts))
            .collect::<Vec<_>>();
        if !top.is_empty() {
            st.weekly_archive.push(WeeklySnapshot {
                week_start: prev,
                top,
            });
        }
    }

    for p in st.players.values_mut() {
        p.weekly_points = 0;
        p.weekly_games = 0;
    }
    st.last_weekly_reset = Some(current);
}
