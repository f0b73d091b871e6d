//! Game controller: one round at a time
//!
//! Owns the current round and its capture listener. Capture events arrive
//! on the async side through `handle_capture`; everything the presentation
//! needs to know leaves through the broadcast channel as `SpellingEvent`s.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::capture::{AbortReason, CaptureContext, CaptureError, CaptureEvent, SpellingListener};
use crate::events::SpellingEvent;
use crate::speech::phrases;

use super::words::WordSource;

/// Where a round is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundPhase {
    /// Word chosen, not listening
    Ready,
    /// Capture listener running
    Spelling,
    /// Spelling confirmed and checked
    Finished { correct: bool },
}

/// One target word and what has been spelled for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: u64,
    pub word: String,
    pub spelling: String,
    #[serde(flatten)]
    pub phase: RoundPhase,
}

/// Errors returned by game operations
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("no round in progress")]
    NoRound,

    #[error("round {0} is already listening")]
    AlreadyListening(u64),

    #[error("round {0} is finished, start a new round")]
    RoundFinished(u64),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl GameError {
    /// Stable identifier for IPC error responses
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NoRound => "no_round",
            GameError::AlreadyListening(_) => "already_listening",
            GameError::RoundFinished(_) => "round_finished",
            GameError::Capture(CaptureError::SpeechUnavailable) => "speech_unavailable",
            GameError::Capture(CaptureError::ThreadSpawn(_)) => "capture_failed",
        }
    }
}

/// Compare a spelling with the target word.
///
/// Case-insensitive; spaces inside the spelling are ignored.
pub fn check_spelling(word: &str, spelling: &str) -> bool {
    spelling.to_lowercase().replace(' ', "") == word.to_lowercase()
}

/// The spelling game controller
pub struct Game {
    words: Box<dyn WordSource>,
    capture: CaptureContext,
    capture_tx: mpsc::Sender<CaptureEvent>,
    event_tx: broadcast::Sender<SpellingEvent>,
    last_round: u64,
    round: Option<Round>,
    listener: Option<SpellingListener>,
}

impl Game {
    pub fn new(
        words: Box<dyn WordSource>,
        capture: CaptureContext,
        capture_tx: mpsc::Sender<CaptureEvent>,
        event_tx: broadcast::Sender<SpellingEvent>,
    ) -> Self {
        Self {
            words,
            capture,
            capture_tx,
            event_tx,
            last_round: 0,
            round: None,
            listener: None,
        }
    }

    /// Have the robot announce it is ready
    pub fn greet(&self) {
        self.capture.voice.say(phrases::GREETING);
    }

    /// The current round, if any
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Whether speech recognition is attached at all
    pub fn has_speech_input(&self) -> bool {
        self.capture.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| l.is_running())
    }

    /// Abandon whatever is in progress and pick a new word
    pub fn new_round(&mut self) -> &Round {
        self.stop_listening();

        self.last_round += 1;
        let id = self.last_round;
        let word = self.words.pick();

        info!(round = id, %word, "new round");
        self.capture.voice.say(&phrases::new_word(&word));
        emit(
            &self.event_tx,
            SpellingEvent::RoundStarted {
                round: id,
                word: word.clone(),
            },
        );

        self.round.insert(Round {
            id,
            word,
            spelling: String::new(),
            phase: RoundPhase::Ready,
        })
    }

    /// Start listening for the current round's spelling
    pub fn start_spelling(&mut self) -> Result<u64, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NoRound)?;
        match round.phase {
            RoundPhase::Ready => {}
            RoundPhase::Spelling => return Err(GameError::AlreadyListening(round.id)),
            RoundPhase::Finished { .. } => return Err(GameError::RoundFinished(round.id)),
        }

        round.spelling.clear();
        match SpellingListener::start(round.id, self.capture.clone(), self.capture_tx.clone()) {
            Ok(listener) => {
                round.phase = RoundPhase::Spelling;
                self.listener = Some(listener);
                info!(round = round.id, "listening for spelling");
                emit(&self.event_tx, SpellingEvent::ListeningStarted { round: round.id });
                Ok(round.id)
            }
            Err(e) => {
                warn!(round = round.id, ?e, "could not start listening");
                if matches!(e, CaptureError::SpeechUnavailable) {
                    emit(
                        &self.event_tx,
                        SpellingEvent::SpellingAborted {
                            round: round.id,
                            reason: AbortReason::SpeechUnavailable,
                        },
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Abandon the current round without a result
    pub fn cancel_round(&mut self) -> Result<u64, GameError> {
        let round = self.round.take().ok_or(GameError::NoRound)?;
        self.stop_listening();

        info!(round = round.id, "round cancelled");
        emit(&self.event_tx, SpellingEvent::RoundCancelled { round: round.id });
        Ok(round.id)
    }

    /// Stop any listener, e.g. on daemon shutdown
    pub fn shutdown(&mut self) {
        self.stop_listening();
        if let Some(round) = self.round.as_mut() {
            if round.phase == RoundPhase::Spelling {
                round.phase = RoundPhase::Ready;
            }
        }
    }

    /// Apply an event from the capture listener
    pub fn handle_capture(&mut self, event: CaptureEvent) {
        let Some(round) = self
            .round
            .as_mut()
            .filter(|r| r.id == event.round() && r.phase == RoundPhase::Spelling)
        else {
            debug!(round = event.round(), "stale capture event dropped");
            return;
        };

        match event {
            CaptureEvent::Incremental { buffer, .. } => {
                round.spelling = buffer;
                emit(
                    &self.event_tx,
                    SpellingEvent::SpellingUpdated {
                        round: round.id,
                        spelling: round.spelling.clone(),
                    },
                );
            }
            CaptureEvent::Final { buffer, .. } => {
                let correct = check_spelling(&round.word, &buffer);
                round.spelling = buffer;
                round.phase = RoundPhase::Finished { correct };
                self.listener = None;

                info!(round = round.id, spelling = %round.spelling, correct, "round finished");
                if correct {
                    self.capture.voice.say(phrases::CORRECT);
                } else {
                    self.capture.voice.say(&phrases::wrong(&round.word));
                }
                emit(
                    &self.event_tx,
                    SpellingEvent::RoundFinished {
                        round: round.id,
                        word: round.word.clone(),
                        spelling: round.spelling.clone(),
                        correct,
                    },
                );
            }
            CaptureEvent::Aborted { reason, .. } => {
                round.spelling.clear();
                round.phase = RoundPhase::Ready;
                self.listener = None;

                warn!(round = round.id, %reason, "spelling aborted");
                emit(
                    &self.event_tx,
                    SpellingEvent::SpellingAborted {
                        round: round.id,
                        reason,
                    },
                );
            }
        }
    }

    fn stop_listening(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
    }
}

fn emit(event_tx: &broadcast::Sender<SpellingEvent>, event: SpellingEvent) {
    debug!(%event, "emitting spelling event");
    // No subscribers is fine
    let _ = event_tx.send(event);
}
