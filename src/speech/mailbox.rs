//! In-process recognizer backed by a one-slot mailbox
//!
//! Stands in for the robot's recognizer: whoever bridges the robot (or a
//! test) posts recognitions, the capture listener polls them.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{Recognition, SpeechError, SpeechRecognizer};

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Recognition>,
    subscribers: BTreeSet<String>,
    vocabulary: Vec<String>,
}

/// Mailbox recognizer holding only the latest recognition
#[derive(Debug, Default)]
pub struct LocalRecognizer {
    slot: Mutex<Slot>,
}

impl LocalRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the mailbox with a new recognition.
    ///
    /// Returns `Ok(false)` without touching the mailbox when nobody is
    /// subscribed, mirroring a recognizer that is not running.
    pub fn post(&self, recognition: Recognition) -> Result<bool, SpeechError> {
        if !(0.0..=1.0).contains(&recognition.confidence) {
            return Err(SpeechError::InvalidConfidence(recognition.confidence));
        }

        let mut slot = self.lock()?;
        if slot.subscribers.is_empty() {
            debug!(text = %recognition.text, "recognition dropped, no subscriber");
            return Ok(false);
        }

        if let Some(previous) = slot.latest.replace(recognition) {
            debug!(text = %previous.text, "unread recognition overwritten");
        }
        Ok(true)
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock().map(|s| !s.subscribers.is_empty()).unwrap_or(false)
    }

    /// Words the last subscriber asked to listen for
    pub fn vocabulary(&self) -> Vec<String> {
        self.lock().map(|s| s.vocabulary.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot>, SpeechError> {
        self.slot
            .lock()
            .map_err(|e| SpeechError::Service(format!("mailbox mutex poisoned: {}", e)))
    }
}

impl SpeechRecognizer for LocalRecognizer {
    fn set_vocabulary(&self, words: &[String]) -> Result<(), SpeechError> {
        self.lock()?.vocabulary = words.to_vec();
        Ok(())
    }

    fn subscribe(&self, name: &str) -> Result<(), SpeechError> {
        self.lock()?.subscribers.insert(name.to_string());
        Ok(())
    }

    fn unsubscribe(&self, name: &str) -> Result<(), SpeechError> {
        let mut slot = self.lock()?;
        if !slot.subscribers.remove(name) {
            return Err(SpeechError::NotSubscribed(name.to_string()));
        }
        if slot.subscribers.is_empty() {
            slot.latest = None;
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<Recognition>, SpeechError> {
        let slot = self.lock()?;
        Ok(slot.latest.clone().filter(|r| !r.text.is_empty()))
    }

    fn clear(&self) -> Result<(), SpeechError> {
        self.lock()?.latest = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_without_subscriber_is_dropped() {
        let recognizer = LocalRecognizer::new();
        assert!(!recognizer.post(Recognition::new("efe", 0.9)).unwrap());
        assert_eq!(recognizer.read().unwrap(), None);
    }

    #[test]
    fn test_last_value_wins() {
        let recognizer = LocalRecognizer::new();
        recognizer.subscribe("SpellingGame").unwrap();

        recognizer.post(Recognition::new("efe", 0.9)).unwrap();
        recognizer.post(Recognition::new("eme", 0.8)).unwrap();

        assert_eq!(recognizer.read().unwrap(), Some(Recognition::new("eme", 0.8)));
    }

    #[test]
    fn test_read_does_not_consume_clear_does() {
        let recognizer = LocalRecognizer::new();
        recognizer.subscribe("SpellingGame").unwrap();
        recognizer.post(Recognition::new("cê", 0.7)).unwrap();

        assert!(recognizer.read().unwrap().is_some());
        assert!(recognizer.read().unwrap().is_some());

        recognizer.clear().unwrap();
        assert_eq!(recognizer.read().unwrap(), None);
    }

    #[test]
    fn test_empty_text_reads_as_nothing() {
        let recognizer = LocalRecognizer::new();
        recognizer.subscribe("SpellingGame").unwrap();
        recognizer.post(Recognition::new("", 0.0)).unwrap();
        assert_eq!(recognizer.read().unwrap(), None);
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let recognizer = LocalRecognizer::new();
        recognizer.subscribe("SpellingGame").unwrap();
        assert_eq!(
            recognizer.post(Recognition::new("a", 1.5)),
            Err(SpeechError::InvalidConfidence(1.5))
        );
        assert!(recognizer.post(Recognition::new("a", f32::NAN)).is_err());
    }

    #[test]
    fn test_unsubscribe_unknown_fails() {
        let recognizer = LocalRecognizer::new();
        assert_eq!(
            recognizer.unsubscribe("nobody"),
            Err(SpeechError::NotSubscribed("nobody".to_string()))
        );
    }

    #[test]
    fn test_last_unsubscribe_discards_mailbox() {
        let recognizer = LocalRecognizer::new();
        recognizer.subscribe("SpellingGame").unwrap();
        recognizer.post(Recognition::new("efe", 0.9)).unwrap();
        recognizer.unsubscribe("SpellingGame").unwrap();

        assert!(!recognizer.is_subscribed());
        assert_eq!(recognizer.read().unwrap(), None);
    }

    #[test]
    fn test_set_vocabulary() {
        let recognizer = LocalRecognizer::new();
        let words = vec!["apagar".to_string(), "confirmar".to_string()];
        recognizer.set_vocabulary(&words).unwrap();
        assert_eq!(recognizer.vocabulary(), words);
    }
}
