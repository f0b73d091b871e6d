//! Target words for spelling rounds

use rand::seq::IndexedRandom;

/// Used when no usable word was configured
pub const DEFAULT_WORDS: &[&str] = &["soletrando", "python", "robotica"];

/// Supplies the word to spell in a round
pub trait WordSource: Send + Sync {
    fn pick(&self) -> String;
}

/// In-memory word list, picked from uniformly at random
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Keep words longer than two letters, falling back to the defaults
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| w.chars().count() > 2)
            .collect();

        if words.is_empty() {
            return Self::default();
        }
        Self { words }
    }

    #[cfg(test)]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Default for WordList {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordSource for WordList {
    fn pick(&self) -> String {
        self.words
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_WORDS[0].to_string())
    }
}
