//! Canonical letter map and token classification
//!
//! The map is built once at start-up and never mutated afterwards. Several
//! spoken forms may resolve to the same letter, but a spoken form never
//! resolves to more than one letter.

use std::collections::{BTreeSet, HashMap};

/// Control word that ends a spelling round
pub const CONFIRM_WORD: &str = "confirmar";

/// Control word that removes the last spelled letter
pub const DELETE_WORD: &str = "apagar";

/// Brazilian Portuguese letter names and their common phonetic variants
#[rustfmt::skip]
const BRAZILIAN_LETTERS: &[(&str, char)] = &[
    ("a", 'a'), ("á", 'a'), ("ah", 'a'),
    ("bê", 'b'), ("be", 'b'), ("b", 'b'),
    ("cê", 'c'), ("ce", 'c'), ("c", 'c'),
    ("dê", 'd'), ("de", 'd'), ("d", 'd'),
    ("e", 'e'), ("é", 'e'), ("eh", 'e'),
    ("efe", 'f'), ("éfe", 'f'), ("f", 'f'),
    ("gê", 'g'), ("ge", 'g'), ("g", 'g'),
    ("agá", 'h'), ("h", 'h'),
    ("i", 'i'), ("í", 'i'),
    ("jota", 'j'), ("j", 'j'),
    ("cá", 'k'), ("ka", 'k'), ("k", 'k'),
    ("ele", 'l'), ("éle", 'l'), ("l", 'l'),
    ("eme", 'm'), ("éme", 'm'), ("m", 'm'), ("em", 'm'),
    ("ene", 'n'), ("éne", 'n'), ("n", 'n'), ("en", 'n'),
    ("o", 'o'), ("ó", 'o'), ("oh", 'o'),
    ("pê", 'p'), ("pe", 'p'), ("p", 'p'),
    ("quê", 'q'), ("que", 'q'), ("q", 'q'),
    ("erre", 'r'), ("érre", 'r'), ("r", 'r'),
    ("esse", 's'), ("ésse", 's'), ("s", 's'), ("es", 's'), ("és", 's'),
    ("tê", 't'), ("te", 't'), ("t", 't'),
    ("u", 'u'),
    ("vê", 'v'), ("ve", 'v'), ("v", 'v'),
    ("dáblio", 'w'), ("dablio", 'w'), ("w", 'w'),
    ("xis", 'x'), ("x", 'x'), ("chis", 'x'),
    ("ípsilon", 'y'), ("ipsilon", 'y'), ("y", 'y'),
    ("zê", 'z'), ("ze", 'z'), ("z", 'z'),
];

/// What a recognized word means to a spelling round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpokenToken {
    /// A letter, already normalized to 'a'..='z'
    Letter(char),
    /// Finish the round with the current spelling
    Confirm,
    /// Remove the last spelled letter
    Delete,
}

/// Errors raised while building a letter map
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LetterMapError {
    #[error("spoken form {token:?} maps to {letter:?}, which is not a letter a-z")]
    NotALetter { token: String, letter: char },

    #[error("spoken form {token:?} maps to both {first:?} and {second:?}")]
    Ambiguous {
        token: String,
        first: char,
        second: char,
    },

    #[error("letter {0:?} has no spoken form")]
    MissingLetter(char),

    #[error("control word {0:?} is empty or also a letter name")]
    InvalidControlWord(String),
}

/// Immutable mapping from spoken forms to canonical letters
#[derive(Debug, Clone)]
pub struct LetterMap {
    letters: HashMap<String, char>,
    confirm: String,
    delete: String,
}

impl LetterMap {
    /// Build a map from `(spoken form, letter)` pairs plus the two control words.
    ///
    /// Spoken forms are trimmed and lowercased. Every letter of the alphabet
    /// must be reachable and control words must not shadow a letter.
    pub fn new<'a, I>(entries: I, confirm: &str, delete: &str) -> Result<Self, LetterMapError>
    where
        I: IntoIterator<Item = (&'a str, char)>,
    {
        let mut letters: HashMap<String, char> = HashMap::new();

        for (token, letter) in entries {
            let token = normalize(token);
            if !letter.is_ascii_lowercase() {
                return Err(LetterMapError::NotALetter { token, letter });
            }
            match letters.get(&token) {
                Some(&first) if first != letter => {
                    return Err(LetterMapError::Ambiguous {
                        token,
                        first,
                        second: letter,
                    });
                }
                _ => {
                    letters.insert(token, letter);
                }
            }
        }

        let covered: BTreeSet<char> = letters.values().copied().collect();
        if let Some(missing) = ('a'..='z').find(|c| !covered.contains(c)) {
            return Err(LetterMapError::MissingLetter(missing));
        }

        let confirm = normalize(confirm);
        let delete = normalize(delete);
        for word in [&confirm, &delete] {
            if word.is_empty() || letters.contains_key(word) {
                return Err(LetterMapError::InvalidControlWord(word.clone()));
            }
        }
        if confirm == delete {
            return Err(LetterMapError::InvalidControlWord(delete));
        }

        Ok(Self {
            letters,
            confirm,
            delete,
        })
    }

    /// The Brazilian Portuguese vocabulary with `confirmar` / `apagar`
    pub fn brazilian() -> Result<Self, LetterMapError> {
        Self::new(BRAZILIAN_LETTERS.iter().copied(), CONFIRM_WORD, DELETE_WORD)
    }

    /// Classify a recognized word. Exact match only, case-insensitive.
    pub fn classify(&self, spoken: &str) -> Option<SpokenToken> {
        let spoken = normalize(spoken);
        if spoken == self.confirm {
            Some(SpokenToken::Confirm)
        } else if spoken == self.delete {
            Some(SpokenToken::Delete)
        } else {
            self.letters.get(&spoken).copied().map(SpokenToken::Letter)
        }
    }

    /// Everything the recognizer should listen for, sorted
    pub fn vocabulary(&self) -> Vec<String> {
        let mut words: Vec<String> = self.letters.keys().cloned().collect();
        words.push(self.confirm.clone());
        words.push(self.delete.clone());
        words.sort();
        words
    }

    /// Number of spoken letter forms
    pub fn spoken_forms(&self) -> usize {
        self.letters.len()
    }
}

fn normalize(spoken: &str) -> String {
    spoken.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Vec<(String, char)> {
        ('a'..='z').map(|c| (c.to_string(), c)).collect()
    }

    #[test]
    fn test_brazilian_covers_alphabet() {
        let map = LetterMap::brazilian().unwrap();
        for c in 'a'..='z' {
            assert_eq!(map.classify(&c.to_string()), Some(SpokenToken::Letter(c)));
        }
        assert_eq!(map.spoken_forms(), BRAZILIAN_LETTERS.len());
    }

    #[test]
    fn test_variants_resolve_to_same_letter() {
        let map = LetterMap::brazilian().unwrap();
        for spoken in ["esse", "ésse", "s", "es", "és"] {
            assert_eq!(map.classify(spoken), Some(SpokenToken::Letter('s')));
        }
        for spoken in ["dáblio", "dablio", "w"] {
            assert_eq!(map.classify(spoken), Some(SpokenToken::Letter('w')));
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let map = LetterMap::brazilian().unwrap();
        assert_eq!(map.classify("CÊ"), Some(SpokenToken::Letter('c')));
        assert_eq!(map.classify("Efe"), Some(SpokenToken::Letter('f')));
        assert_eq!(map.classify("CONFIRMAR"), Some(SpokenToken::Confirm));
        assert_eq!(map.classify(" Apagar "), Some(SpokenToken::Delete));
    }

    #[test]
    fn test_classify_exact_match_only() {
        let map = LetterMap::brazilian().unwrap();
        assert_eq!(map.classify("xyz"), None);
        assert_eq!(map.classify("ef"), None);
        assert_eq!(map.classify("confirma"), None);
        assert_eq!(map.classify(""), None);
    }

    #[test]
    fn test_control_words_are_not_letters() {
        let map = LetterMap::brazilian().unwrap();
        assert_eq!(map.classify("confirmar"), Some(SpokenToken::Confirm));
        assert_eq!(map.classify("apagar"), Some(SpokenToken::Delete));
    }

    #[test]
    fn test_vocabulary_includes_controls() {
        let map = LetterMap::brazilian().unwrap();
        let vocab = map.vocabulary();
        assert_eq!(vocab.len(), map.spoken_forms() + 2);
        assert!(vocab.contains(&"confirmar".to_string()));
        assert!(vocab.contains(&"apagar".to_string()));
        assert!(vocab.contains(&"ípsilon".to_string()));
    }

    #[test]
    fn test_rejects_non_letter_value() {
        let mut entries = alphabet();
        entries.push(("bang".to_string(), '!'));
        let result = LetterMap::new(entries.iter().map(|(t, c)| (t.as_str(), *c)), "ok", "undo");
        assert!(matches!(result, Err(LetterMapError::NotALetter { letter: '!', .. })));
    }

    #[test]
    fn test_rejects_one_to_many() {
        let mut entries = alphabet();
        entries.push(("A".to_string(), 'b'));
        let result = LetterMap::new(entries.iter().map(|(t, c)| (t.as_str(), *c)), "ok", "undo");
        assert_eq!(
            result.unwrap_err(),
            LetterMapError::Ambiguous {
                token: "a".to_string(),
                first: 'a',
                second: 'b',
            }
        );
    }

    #[test]
    fn test_rejects_missing_letter() {
        let entries: Vec<(String, char)> = alphabet()
            .into_iter()
            .filter(|(_, c)| *c != 'q')
            .collect();
        let result = LetterMap::new(entries.iter().map(|(t, c)| (t.as_str(), *c)), "ok", "undo");
        assert_eq!(result.unwrap_err(), LetterMapError::MissingLetter('q'));
    }

    #[test]
    fn test_rejects_control_word_collision() {
        let entries = alphabet();
        let result = LetterMap::new(entries.iter().map(|(t, c)| (t.as_str(), *c)), "x", "undo");
        assert_eq!(result.unwrap_err(), LetterMapError::InvalidControlWord("x".to_string()));

        let result = LetterMap::new(entries.iter().map(|(t, c)| (t.as_str(), *c)), "ok", "OK");
        assert!(result.is_err());
    }
}
