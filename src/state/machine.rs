//! Core spelling session state machine
//!
//! Applies one recognized token at a time to the spelling buffer and
//! reports what the presentation side should be told about it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::letters::{LetterMap, SpokenToken};
use crate::speech::Recognition;

/// Recognitions below this confidence are ignored unless configured otherwise
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// The three states of a spelling session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not listening yet
    Idle,
    /// Consuming recognized tokens
    Listening,
    /// Confirmed or aborted; no further tokens are consumed
    Terminated,
}

impl Default for State {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Listening => write!(f, "Listening"),
            State::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Produced by the session for the presentation side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The buffer changed while spelling is still in progress
    Incremental(String),
    /// The user confirmed; this is the spelled word
    Final(String),
}

/// One round's spelling buffer and the rules that edit it
#[derive(Debug)]
pub struct SpellingSession {
    state: State,
    buffer: String,
    letters: Arc<LetterMap>,
    threshold: f32,
    /// Time when the session entered Listening
    started_at: Option<Instant>,
}

impl SpellingSession {
    /// Create an idle session
    pub fn new(letters: Arc<LetterMap>, threshold: f32) -> Self {
        Self {
            state: State::Idle,
            buffer: String::new(),
            letters,
            threshold,
            started_at: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The word spelled so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// How long the session has been listening
    pub fn listening_for(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Enter Listening with an empty buffer
    pub fn start(&mut self) {
        self.buffer.clear();
        self.started_at = Some(Instant::now());
        self.transition_to(State::Listening);
    }

    /// Leave Listening without a final result, discarding the buffer.
    ///
    /// Returns false if the session was not listening.
    pub fn abort(&mut self) -> bool {
        if self.state != State::Listening {
            return false;
        }
        self.buffer.clear();
        self.transition_to(State::Terminated);
        true
    }

    /// Apply one recognized token
    pub fn apply(&mut self, token: &Recognition) -> Option<Notification> {
        if self.state != State::Listening {
            debug!(state = %self.state, text = %token.text, "token ignored, not listening");
            return None;
        }

        if token.confidence < self.threshold {
            debug!(
                text = %token.text,
                confidence = token.confidence,
                threshold = self.threshold,
                "token below confidence threshold"
            );
            return None;
        }

        match self.letters.classify(&token.text) {
            Some(SpokenToken::Confirm) => {
                self.transition_to(State::Terminated);
                Some(Notification::Final(self.buffer.clone()))
            }
            Some(SpokenToken::Delete) => {
                let removed = self.buffer.pop()?;
                debug!(%removed, buffer = %self.buffer, "letter deleted");
                Some(Notification::Incremental(self.buffer.clone()))
            }
            Some(SpokenToken::Letter(letter)) => {
                self.buffer.push(letter);
                debug!(%letter, buffer = %self.buffer, "letter appended");
                Some(Notification::Incremental(self.buffer.clone()))
            }
            None => {
                debug!(text = %token.text, "unrecognized token ignored");
                None
            }
        }
    }

    fn transition_to(&mut self, new_state: State) {
        info!(
            from = %self.state,
            to = %new_state,
            duration_ms = self.listening_for().as_millis() as u64,
            "spelling session transition"
        );
        self.state = new_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_session() -> SpellingSession {
        let letters = Arc::new(LetterMap::brazilian().unwrap());
        let mut session = SpellingSession::new(letters, DEFAULT_CONFIDENCE_THRESHOLD);
        session.start();
        session
    }

    fn feed(session: &mut SpellingSession, tokens: &[(&str, f32)]) -> Vec<Notification> {
        tokens
            .iter()
            .filter_map(|(text, confidence)| session.apply(&Recognition::new(*text, *confidence)))
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let letters = Arc::new(LetterMap::brazilian().unwrap());
        let session = SpellingSession::new(letters, 0.5);
        assert_eq!(session.state(), State::Idle);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_idle_ignores_tokens() {
        let letters = Arc::new(LetterMap::brazilian().unwrap());
        let mut session = SpellingSession::new(letters, 0.5);
        assert_eq!(session.apply(&Recognition::new("efe", 0.9)), None);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_spell_and_confirm() {
        let mut session = create_session();
        let notifications = feed(
            &mut session,
            &[("efe", 0.9), ("eme", 0.9), ("confirmar", 0.9)],
        );
        assert_eq!(
            notifications,
            vec![
                Notification::Incremental("f".to_string()),
                Notification::Incremental("fm".to_string()),
                Notification::Final("fm".to_string()),
            ]
        );
        assert_eq!(session.state(), State::Terminated);
    }

    #[test]
    fn test_delete_then_confirm_empty() {
        let mut session = create_session();
        let notifications = feed(
            &mut session,
            &[("cê", 0.9), ("apagar", 0.9), ("confirmar", 0.9)],
        );
        assert_eq!(
            notifications,
            vec![
                Notification::Incremental("c".to_string()),
                Notification::Incremental(String::new()),
                Notification::Final(String::new()),
            ]
        );
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let mut session = create_session();
        assert!(feed(&mut session, &[("cê", 0.3)]).is_empty());
        assert_eq!(session.buffer(), "");
        assert_eq!(session.state(), State::Listening);
    }

    #[test]
    fn test_below_threshold_never_changes_buffer() {
        let mut session = create_session();
        feed(&mut session, &[("a", 0.9)]);
        let notifications = feed(
            &mut session,
            &[("bê", 0.49), ("apagar", 0.1), ("confirmar", 0.0), ("xis", 0.2)],
        );
        assert!(notifications.is_empty());
        assert_eq!(session.buffer(), "a");
        assert_eq!(session.state(), State::Listening);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut session = create_session();
        assert_eq!(
            session.apply(&Recognition::new("a", 0.5)),
            Some(Notification::Incremental("a".to_string()))
        );
    }

    #[test]
    fn test_unknown_token_is_ignored() {
        let mut session = create_session();
        assert!(feed(&mut session, &[("xyz", 0.9)]).is_empty());
        assert_eq!(session.state(), State::Listening);
    }

    #[test]
    fn test_delete_on_empty_is_silent() {
        let mut session = create_session();
        assert!(feed(&mut session, &[("apagar", 0.9), ("apagar", 0.9)]).is_empty());
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_variants_produce_identical_buffers() {
        let spellings: [&[(&str, f32)]; 3] = [
            &[("esse", 0.9), ("ó", 0.9), ("ele", 0.9)],
            &[("és", 0.9), ("oh", 0.9), ("éle", 0.9)],
            &[("S", 0.9), ("O", 0.9), ("L", 0.9)],
        ];
        for tokens in spellings {
            let mut session = create_session();
            feed(&mut session, tokens);
            assert_eq!(session.buffer(), "sol");
        }
    }

    #[test]
    fn test_confirm_terminates_once() {
        let mut session = create_session();
        let notifications = feed(
            &mut session,
            &[
                ("a", 0.9),
                ("confirmar", 0.9),
                ("bê", 0.9),
                ("apagar", 0.9),
                ("confirmar", 0.9),
            ],
        );
        assert_eq!(
            notifications,
            vec![
                Notification::Incremental("a".to_string()),
                Notification::Final("a".to_string()),
            ]
        );
        assert_eq!(session.buffer(), "a");
    }

    #[test]
    fn test_letters_then_confirm_round_trip() {
        let mut session = create_session();
        let word = "robotica";
        for letter in word.to_uppercase().chars() {
            session.apply(&Recognition::new(letter.to_string(), 0.8));
        }
        assert_eq!(
            session.apply(&Recognition::new("Confirmar", 0.8)),
            Some(Notification::Final(word.to_string()))
        );
    }

    #[test]
    fn test_abort_discards_buffer() {
        let mut session = create_session();
        feed(&mut session, &[("a", 0.9), ("bê", 0.9)]);

        assert!(session.abort());
        assert_eq!(session.state(), State::Terminated);
        assert_eq!(session.buffer(), "");
        assert!(feed(&mut session, &[("confirmar", 0.9)]).is_empty());

        assert!(!session.abort());
    }

    #[test]
    fn test_restart_clears_buffer() {
        let mut session = create_session();
        feed(&mut session, &[("a", 0.9), ("confirmar", 0.9)]);

        session.start();
        assert_eq!(session.state(), State::Listening);
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_custom_threshold() {
        let letters = Arc::new(LetterMap::brazilian().unwrap());
        let mut session = SpellingSession::new(letters, 0.8);
        session.start();
        assert!(feed(&mut session, &[("a", 0.7)]).is_empty());
        assert_eq!(feed(&mut session, &[("a", 0.8)]).len(), 1);
    }
}
