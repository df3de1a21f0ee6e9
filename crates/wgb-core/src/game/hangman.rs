use std::collections::BTreeSet;

/// Wrong guesses allowed before the gallows is complete.
pub const MAX_MISTAKES: u32 = 6;

/// Hangman-specific progress: the secret word, every letter guessed so far
/// and the mistake counter. Turn ownership and scoring live in the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HangmanState {
    word: String,
    guessed: BTreeSet<char>,
    mistakes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LetterGuess {
    AlreadyGuessed,
    Correct { occurrences: u32 },
    Wrong,
}

impl HangmanState {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into().to_lowercase(),
            guessed: BTreeSet::new(),
            mistakes: 0,
        }
    }

    pub fn guess(&mut self, letter: char) -> LetterGuess {
        let letter = letter.to_ascii_lowercase();
        if !self.guessed.insert(letter) {
            return LetterGuess::AlreadyGuessed;
        }

        let occurrences = self.word.chars().filter(|c| *c == letter).count() as u32;
        if occurrences == 0 {
            self.mistakes += 1;
            return LetterGuess::Wrong;
        }
        LetterGuess::Correct { occurrences }
    }

    pub fn is_solved(&self) -> bool {
        self.word.chars().all(|c| self.guessed.contains(&c))
    }

    pub fn is_out_of_mistakes(&self) -> bool {
        self.mistakes >= MAX_MISTAKES
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn remaining_mistakes(&self) -> u32 {
        MAX_MISTAKES.saturating_sub(self.mistakes)
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn word_len(&self) -> usize {
        self.word.chars().count()
    }

    /// Board rendering: revealed letters in place, `_` for the rest.
    pub fn mask(&self) -> String {
        self.word
            .chars()
            .map(|c| {
                if self.guessed.contains(&c) {
                    c.to_string()
                } else {
                    "_".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn wrong_letters(&self) -> Vec<char> {
        self.guessed
            .iter()
            .copied()
            .filter(|c| !self.word.contains(*c))
            .collect()
    }
}
