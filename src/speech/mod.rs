//! Speech module: the robot's recognizer and voice as seen by the game
//!
//! The recognizer exposes a one-slot mailbox holding the most recent
//! recognition. Consumers poll it, clear it after reading, and accept that
//! anything overwritten between two polls is lost.

mod mailbox;
pub mod phrases;
mod voice;

use serde::{Deserialize, Serialize};

pub use mailbox::LocalRecognizer;
pub use voice::EventVoice;

/// One recognized word and how sure the recognizer is about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    /// In `[0, 1]`
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Speech recognition service with a polled mailbox
pub trait SpeechRecognizer: Send + Sync {
    /// Restrict recognition to these words
    fn set_vocabulary(&self, words: &[String]) -> Result<(), SpeechError>;

    /// Start recognizing on behalf of `name`
    fn subscribe(&self, name: &str) -> Result<(), SpeechError>;

    /// Stop recognizing on behalf of `name`
    fn unsubscribe(&self, name: &str) -> Result<(), SpeechError>;

    /// Peek at the mailbox. `None` when nothing new has been recognized.
    fn read(&self) -> Result<Option<Recognition>, SpeechError>;

    /// Empty the mailbox
    fn clear(&self) -> Result<(), SpeechError>;
}

/// Text-to-speech. Fire-and-forget, no acknowledgment.
pub trait SpeechOutput: Send + Sync {
    fn say(&self, text: &str);
}

/// Errors reported by speech services
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpeechError {
    #[error("subscriber {0:?} is not registered")]
    NotSubscribed(String),

    #[error("confidence {0} is outside [0, 1]")]
    InvalidConfidence(f32),

    #[error("speech service failed: {0}")]
    Service(String),
}
