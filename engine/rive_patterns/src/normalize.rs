//! Utterance normalization.
//!
//! The fixed rule: lowercase, delete every punctuation character in the
//! configured set, split on Unicode whitespace.

/// Punctuation removed from user input by default.
pub const DEFAULT_PUNCTUATION: &str = ".,!?;:";

/// Turns raw user input into the word list the matcher consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalizer {
    punctuation: Vec<char>,
}

impl Normalizer {
    /// A normalizer stripping the given punctuation characters.
    pub fn new(punctuation: &str) -> Self {
        Normalizer {
            punctuation: punctuation.chars().collect(),
        }
    }

    /// Normalize `input` into words.
    pub fn words(&self, input: &str) -> Vec<String> {
        self.normalize(input)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Normalize `input` into a single space-joined string.
    pub fn normalize(&self, input: &str) -> String {
        let lowered = input.to_lowercase();
        let stripped: String = lowered
            .chars()
            .filter(|c| !self.punctuation.contains(c))
            .collect();
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PUNCTUATION)
    }
}
