//! Robot voice as seen from the daemon
//!
//! The daemon has no text-to-speech of its own. Whatever the robot should
//! say is pushed to IPC subscribers, and the robot bridge speaks it.

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::SpellingEvent;

use super::SpeechOutput;

/// Logs what the robot would have said
#[derive(Debug, Clone, Default)]
pub struct LogVoice;

impl SpeechOutput for LogVoice {
    fn say(&self, text: &str) {
        info!(%text, "[simulation] robot would say");
    }
}

/// Broadcasts each phrase as `SpellingEvent::RobotSaid`, falling back to
/// the log when nobody receives events
#[derive(Debug, Clone)]
pub struct EventVoice {
    events: broadcast::Sender<SpellingEvent>,
    fallback: LogVoice,
}

impl EventVoice {
    pub fn new(events: broadcast::Sender<SpellingEvent>) -> Self {
        Self {
            events,
            fallback: LogVoice,
        }
    }
}

impl SpeechOutput for EventVoice {
    fn say(&self, text: &str) {
        let event = SpellingEvent::RobotSaid {
            text: text.to_string(),
        };
        if self.events.send(event).is_err() {
            self.fallback.say(text);
        } else {
            debug!(%text, "robot speech sent to subscribers");
        }
    }
}
