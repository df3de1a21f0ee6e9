//! Pure score computation from a finished session.
//!
//! Nothing in here mutates state; the lobby calls these once a session turns
//! terminal and feeds the result into the stats store.

use std::collections::BTreeMap;

use crate::{
    domain::UserId,
    game::{GameKind, GameSession, SessionState},
};

const HANGMAN_BASE: u32 = 100;
const HANGMAN_PER_LETTER: u32 = 10;
const HANGMAN_PERFECT_BONUS: u32 = 50;
const HANGMAN_MISTAKE_PENALTY: u32 = 20;
const HANGMAN_WIN_FLOOR: u32 = 50;

/// Team score for a terminal session. The formula is game-specific: hangman
/// uses the classic base/length/mistake formula floored at 50 for a win and
/// 0 for a loss; spelling bee's team score is the sum of word scores.
pub fn team_score(session: &GameSession) -> u32 {
    match session.kind() {
        GameKind::Hangman => hangman_team_score(session),
        GameKind::SpellingBee => session.player_points().values().sum(),
    }
}

fn hangman_team_score(session: &GameSession) -> u32 {
    match session.state() {
        SessionState::Won => {
            let word_len = session
                .hangman()
                .map(|h| h.word_len() as u32)
                .unwrap_or(0);
            let mistakes = session.mistakes();
            let perfect = if mistakes == 0 { HANGMAN_PERFECT_BONUS } else { 0 };
            let gross = HANGMAN_BASE + word_len * HANGMAN_PER_LETTER + perfect;
            let penalty = mistakes * HANGMAN_MISTAKE_PENALTY;
            gross.saturating_sub(penalty).max(HANGMAN_WIN_FLOOR)
        }
        _ => 0,
    }
}

/// Finisher bonus scales inversely with total mistakes.
pub fn finisher_bonus(mistakes: u32) -> u32 {
    match mistakes {
        0 => 20,
        1..=2 => 15,
        3..=4 => 10,
        _ => 5,
    }
}

/// Per-player totals: an even integer split of the team score (the remainder
/// is dropped, not redistributed), plus points accumulated during play, plus
/// the finisher bonus for whoever completed the winning action.
pub fn individual_scores(session: &GameSession) -> BTreeMap<UserId, u32> {
    let mut out = BTreeMap::new();
    let players = session.players();
    if players.is_empty() {
        return out;
    }

    match session.kind() {
        GameKind::Hangman => {
            let share = team_score(session) / players.len() as u32;
            for p in players {
                let mut total = share + session.player_points().get(p).copied().unwrap_or(0);
                if session.finisher() == Some(*p) {
                    total += finisher_bonus(session.mistakes());
                }
                out.insert(*p, total);
            }
        }
        GameKind::SpellingBee => {
            // Everyone keeps what they found; no split, no finisher.
            for p in players {
                out.insert(*p, session.player_points().get(p).copied().unwrap_or(0));
            }
        }
    }
    out
}

/// This week's top scorers, descending by weekly points. Stable sort keeps
/// insertion order for ties.
pub fn weekly_leaderboard(entries: &[(UserId, u64)], limit: usize) -> Vec<(UserId, u64)> {
    let mut rows: Vec<(UserId, u64)> = entries.to_vec();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionId;
    use crate::game::{GamePayload, HangmanState};

    fn won_session(word: &str, players: &[i64], wrong_before_win: &[char]) -> GameSession {
        let mut s = GameSession::create(
            SessionId("s".to_string()),
            UserId(players[0]),
            GamePayload::Hangman(HangmanState::new(word)),
            4,
            2,
        );
        for p in &players[1..] {
            s.add_player(UserId(*p)).unwrap();
        }
        s.start(UserId(players[0])).unwrap();
        for c in wrong_before_win {
            let me = s.current_player().unwrap();
            s.guess_letter(me, *c).unwrap();
        }
        let mut letters: Vec<char> = word.chars().collect();
        letters.dedup();
        for c in letters {
            let me = s.current_player().unwrap();
            s.guess_letter(me, c).unwrap();
        }
        s
    }

    #[test]
    fn perfect_cat_scores_180() {
        let s = won_session("cat", &[1, 2], &[]);
        assert_eq!(s.state(), SessionState::Won);
        // 100 base + 3 letters * 10 + 50 perfect.
        assert_eq!(team_score(&s), 180);
    }

    #[test]
    fn mistakes_erode_but_never_below_the_win_floor() {
        for wrong in [
            vec!['x'],
            vec!['x', 'z'],
            vec!['x', 'z', 'q', 'j', 'v'],
        ] {
            let s = won_session("cat", &[1, 2], &wrong);
            assert_eq!(s.state(), SessionState::Won);
            let score = team_score(&s);
            assert!(score >= 50, "score {score} for {} mistakes", wrong.len());
        }
        // 5 mistakes: 130 gross - 100 penalty = 30, floored to 50.
        let s = won_session("cat", &[1, 2], &['x', 'z', 'q', 'j', 'v']);
        assert_eq!(team_score(&s), 50);
    }

    #[test]
    fn lost_game_scores_zero() {
        let mut s = GameSession::create(
            SessionId("s".to_string()),
            UserId(1),
            GamePayload::Hangman(HangmanState::new("cat")),
            4,
            2,
        );
        s.add_player(UserId(2)).unwrap();
        s.start(UserId(1)).unwrap();
        for c in ['x', 'y', 'z', 'q', 'j', 'k'] {
            let me = s.current_player().unwrap();
            s.guess_letter(me, c).unwrap();
        }
        assert_eq!(s.state(), SessionState::Lost);
        assert_eq!(team_score(&s), 0);
    }

    #[test]
    fn finisher_bonus_tiers() {
        assert_eq!(finisher_bonus(0), 20);
        assert_eq!(finisher_bonus(1), 15);
        assert_eq!(finisher_bonus(2), 15);
        assert_eq!(finisher_bonus(3), 10);
        assert_eq!(finisher_bonus(4), 10);
        assert_eq!(finisher_bonus(5), 5);
        assert_eq!(finisher_bonus(6), 5);
    }

    #[test]
    fn split_drops_the_remainder() {
        // Team score 180 over 2 players: 90 each, nothing lost. Over 4
        // players with a 181-ish total the floor division would lose points;
        // that loss is expected behavior, not a bug.
        let s = won_session("cat", &[1, 2], &[]);
        let scores = individual_scores(&s);
        let share_sum: u32 = s
            .players()
            .iter()
            .map(|_| team_score(&s) / s.players().len() as u32)
            .sum();
        assert!(share_sum <= team_score(&s));

        // The finisher got the bonus on top of share + play points.
        let finisher = s.finisher().unwrap();
        let other: Vec<&UserId> = s.players().iter().filter(|p| **p != finisher).collect();
        assert!(scores[&finisher] > scores[other[0]]);
    }

    #[test]
    fn leaderboard_sorts_descending_with_stable_ties() {
        let entries = vec![
            (UserId(1), 10),
            (UserId(2), 30),
            (UserId(3), 10),
            (UserId(4), 50),
        ];
        let top = weekly_leaderboard(&entries, 3);
        assert_eq!(
            top,
            vec![(UserId(4), 50), (UserId(2), 30), (UserId(1), 10)]
        );
    }
}
