use std::collections::{BTreeMap, BTreeSet};

use super::MissReason;
use crate::dictionary::Dictionary;
use crate::domain::UserId;

pub const MIN_WORD_LEN: usize = 4;
pub const PANGRAM_BONUS: u32 = 7;

/// Spelling-bee progress: seven letters, one mandatory center letter, and the
/// words found so far (with who found them). Submissions are free-for-all;
/// there is no turn order in this game kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeeState {
    letters: [char; 7],
    center: char,
    found: BTreeMap<String, UserId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitCheck {
    Accepted { points: u32, pangram: bool },
    Miss(MissReason),
}

impl BeeState {
    pub fn new(letters: [char; 7], center: char) -> Self {
        debug_assert!(letters.contains(&center));
        Self {
            letters,
            center,
            found: BTreeMap::new(),
        }
    }

    /// Build a puzzle from a seed word with exactly seven distinct letters;
    /// the first letter becomes the center.
    pub fn from_seed(seed: &str) -> Option<Self> {
        let seed = seed.to_lowercase();
        let distinct: BTreeSet<char> = seed.chars().collect();
        if distinct.len() != 7 {
            return None;
        }
        let mut letters = ['\0'; 7];
        for (i, c) in distinct.iter().enumerate() {
            letters[i] = *c;
        }
        let center = seed.chars().next()?;
        Some(Self::new(letters, center))
    }

    pub fn letters(&self) -> &[char; 7] {
        &self.letters
    }

    pub fn center(&self) -> char {
        self.center
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    pub fn found_words(&self) -> impl Iterator<Item = (&String, &UserId)> {
        self.found.iter()
    }

    /// Validate a submission against the puzzle and the dictionary. Does not
    /// record it; callers apply `record` after an `Accepted` check so the
    /// check-then-act pair stays inside one session operation.
    pub fn check(&self, word: &str, dict: &Dictionary) -> SubmitCheck {
        let word = word.to_lowercase();

        if word.chars().count() < MIN_WORD_LEN {
            return SubmitCheck::Miss(MissReason::TooShort);
        }
        if !word.contains(self.center) {
            return SubmitCheck::Miss(MissReason::MissingCenter);
        }
        if word.chars().any(|c| !self.letters.contains(&c)) {
            return SubmitCheck::Miss(MissReason::ForeignLetter);
        }
        if !dict.contains(&word) {
            return SubmitCheck::Miss(MissReason::NotAWord);
        }
        if self.found.contains_key(&word) {
            return SubmitCheck::Miss(MissReason::AlreadyFound);
        }

        let pangram = self.is_pangram(&word);
        SubmitCheck::Accepted {
            points: word_score(&word, pangram),
            pangram,
        }
    }

    pub fn record(&mut self, word: &str, player: UserId) {
        self.found.insert(word.to_lowercase(), player);
    }

    pub fn is_pangram(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.letters.iter().all(|c| word.contains(*c))
    }
}

/// Four-letter words score 1; longer words score their length; pangrams add a
/// flat bonus on top.
pub fn word_score(word: &str, pangram: bool) -> u32 {
    let len = word.chars().count() as u32;
    let base = if len == 4 { 1 } else { len };
    if pangram {
        base + PANGRAM_BONUS
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::from_lines("plan\nplant\nplane\nplacate\npecan\ncant\nlance\ncrumble\numbel")
    }

    fn puzzle() -> BeeState {
        // Letters of "placate": p l a c t e (+n to fill seven).
        BeeState::new(['p', 'l', 'a', 'c', 't', 'e', 'n'], 'a')
    }

    #[test]
    fn accepts_valid_words_with_length_scores() {
        let b = puzzle();
        assert_eq!(
            b.check("plan", &dict()),
            SubmitCheck::Accepted {
                points: 1,
                pangram: false
            }
        );
        assert_eq!(
            b.check("plant", &dict()),
            SubmitCheck::Accepted {
                points: 5,
                pangram: false
            }
        );
    }

    #[test]
    fn rejects_shape_and_rule_misses() {
        let b = puzzle();
        assert_eq!(b.check("pat", &dict()), SubmitCheck::Miss(MissReason::TooShort));
        assert_eq!(
            b.check("pelt", &dict()),
            SubmitCheck::Miss(MissReason::MissingCenter)
        );
        assert_eq!(
            b.check("chant", &dict()),
            SubmitCheck::Miss(MissReason::ForeignLetter)
        );
        assert_eq!(
            b.check("palt", &dict()),
            SubmitCheck::Miss(MissReason::NotAWord)
        );
    }

    #[test]
    fn duplicate_find_is_a_miss() {
        let mut b = puzzle();
        b.record("plan", UserId(1));
        assert_eq!(
            b.check("plan", &dict()),
            SubmitCheck::Miss(MissReason::AlreadyFound)
        );
        assert_eq!(b.found_count(), 1);
    }

    #[test]
    fn pangram_earns_the_bonus() {
        let b = BeeState::from_seed("crumble").unwrap();
        assert!(b.is_pangram("crumble"));
        assert_eq!(
            b.check("crumble", &Dictionary::from_lines("crumble")),
            SubmitCheck::Accepted {
                points: 7 + PANGRAM_BONUS,
                pangram: true
            }
        );
    }

    #[test]
    fn from_seed_requires_seven_distinct_letters() {
        assert!(BeeState::from_seed("banana").is_none());
        let b = BeeState::from_seed("dolphin").unwrap();
        assert_eq!(b.center(), 'd');
        assert_eq!(b.letters().len(), 7);
    }
}
