use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

use crate::Result;

/// Word list shared by both game kinds.
///
/// Hangman draws its secret words from here; spelling bee checks submissions
/// against it. Loaded once from disk when a path is configured, otherwise the
/// builtin list ships with the crate.
#[derive(Clone, Debug)]
pub struct Dictionary {
    words: Vec<String>,
    index: HashSet<String>,
}

/// Builtin fallback list (used when no dictionary file is configured).
pub static BUILTIN: Lazy<Dictionary> = Lazy::new(|| Dictionary::from_lines(include_str!("words.txt")));

impl Dictionary {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_lines(&content))
    }

    pub fn from_lines(content: &str) -> Self {
        let words: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_alphabetic()))
            .collect();
        let index = words.iter().cloned().collect();
        Self { words, index }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pick a random secret word with a length inside `min..=max`.
    pub fn random_secret(&self, min_len: usize, max_len: usize) -> Option<String> {
        let candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|w| w.len() >= min_len && w.len() <= max_len)
            .collect();
        let mut rng = rand::thread_rng();
        candidates.choose(&mut rng).map(|w| (*w).clone())
    }

    /// Pick a word with exactly seven distinct letters to seed a spelling bee.
    pub fn random_pangram_seed(&self) -> Option<String> {
        let candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|w| w.chars().collect::<HashSet<_>>().len() == 7)
            .collect();
        let mut rng = rand::thread_rng();
        candidates.choose(&mut rng).map(|w| (*w).clone())
    }
}

/// Rarity points awarded for a correct hangman guess of this letter
/// (Scrabble-style tiers).
pub fn letter_rarity(c: char) -> u32 {
    match c.to_ascii_lowercase() {
        'e' | 'a' | 'i' | 'o' | 'n' | 'r' | 't' | 'l' | 's' | 'u' => 1,
        'd' | 'g' => 2,
        'b' | 'c' | 'm' | 'p' => 3,
        'f' | 'h' | 'v' | 'w' | 'y' => 4,
        'k' => 5,
        'j' | 'x' => 8,
        'q' | 'z' => 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_loads_and_indexes() {
        assert!(BUILTIN.len() > 50);
        assert!(BUILTIN.contains("cat"));
        assert!(BUILTIN.contains("CAT"));
        assert!(!BUILTIN.contains("zzzzz"));
    }

    #[test]
    fn random_secret_respects_length_bounds() {
        for _ in 0..20 {
            let w = BUILTIN.random_secret(4, 6).unwrap();
            assert!(w.len() >= 4 && w.len() <= 6, "got {w}");
        }
    }

    #[test]
    fn pangram_seed_has_seven_distinct_letters() {
        let w = BUILTIN.random_pangram_seed().unwrap();
        let distinct: HashSet<char> = w.chars().collect();
        assert_eq!(distinct.len(), 7, "got {w}");
    }

    #[test]
    fn rarity_tiers() {
        assert_eq!(letter_rarity('e'), 1);
        assert_eq!(letter_rarity('Q'), 10);
        assert_eq!(letter_rarity('k'), 5);
        assert_eq!(letter_rarity('!'), 0);
    }
}
