//! Events module for spelling game progress
//!
//! Structured events emitted by the game controller as a round moves from
//! word selection through spelling to its result. Presentation clients
//! receive them over IPC.

use serde::{Deserialize, Serialize};

use crate::capture::AbortReason;

/// Events emitted by the game controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpellingEvent {
    /// A new target word was chosen
    RoundStarted { round: u64, word: String },

    /// The robot is listening for letters
    ListeningStarted { round: u64 },

    /// The spelled word changed (letter added or deleted)
    SpellingUpdated { round: u64, spelling: String },

    /// The user confirmed and the spelling was checked
    RoundFinished {
        round: u64,
        word: String,
        spelling: String,
        correct: bool,
    },

    /// Listening stopped without a result; spelling may be started again
    SpellingAborted { round: u64, reason: AbortReason },

    /// The round was abandoned
    RoundCancelled { round: u64 },

    /// Something the robot should speak
    RobotSaid { text: String },
}

impl std::fmt::Display for SpellingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpellingEvent::RoundStarted { round, word } => {
                write!(f, "ROUND_STARTED #{} ({})", round, word)
            }
            SpellingEvent::ListeningStarted { round } => write!(f, "LISTENING_STARTED #{}", round),
            SpellingEvent::SpellingUpdated { round, spelling } => {
                write!(f, "SPELLING_UPDATED #{} ({:?})", round, spelling)
            }
            SpellingEvent::RoundFinished {
                round,
                spelling,
                correct,
                ..
            } => {
                let verdict = if *correct { "correct" } else { "wrong" };
                write!(f, "ROUND_FINISHED #{} ({:?}, {})", round, spelling, verdict)
            }
            SpellingEvent::SpellingAborted { round, reason } => {
                write!(f, "SPELLING_ABORTED #{} ({})", round, reason)
            }
            SpellingEvent::RoundCancelled { round } => write!(f, "ROUND_CANCELLED #{}", round),
            SpellingEvent::RobotSaid { text } => write!(f, "ROBOT_SAID ({:?})", text),
        }
    }
}
