//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::SpellingEvent;
use crate::game::Round;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from a presentation client to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Turn this connection into a stream of spelling events
    Subscribe,

    /// Pick a new target word, abandoning any round in progress
    NewRound,

    /// Start listening for the current round's spelling
    StartSpelling,

    /// Abandon the current round without a result
    CancelRound,

    /// A recognition from the robot's recognizer, delivered to the mailbox
    Recognized { text: String, confidence: f32 },

    /// Check a typed spelling against a word
    CheckSpelling { word: String, spelling: String },
}

/// Responses from daemon to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed; notifications follow
    Subscribed,

    /// A new round began
    RoundStarted { round: u64, word: String },

    /// The robot is listening for this round
    Listening { round: u64 },

    /// The round was abandoned
    Cancelled { round: u64 },

    /// Whether the recognition reached an active listener
    Recognized { delivered: bool },

    /// Result of a spelling check
    Checked { correct: bool },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl std::fmt::Display) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A spelling event occurred
    Event { event: SpellingEvent },

    /// The client fell behind and missed events
    Lagged { skipped: u64 },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Whether a speech recognizer is attached
    pub speech_input: bool,

    /// Whether a capture listener is running
    pub listening: bool,

    /// Current round, if any
    pub round: Option<Round>,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            speech_input: false,
            listening: false,
            round: None,
            uptime_secs: 0,
        }
    }
}
