//! Spelling capture listener
//!
//! Polls the recognizer mailbox on a dedicated thread, feeds each new
//! recognition to a `SpellingSession` and forwards the resulting
//! notifications to the async side over an mpsc channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::letters::LetterMap;
use crate::speech::{phrases, SpeechError, SpeechOutput, SpeechRecognizer};
use crate::state::{Notification, SpellingSession, DEFAULT_CONFIDENCE_THRESHOLD};

/// Prefix of the name each listener subscribes to the recognizer with
pub const SUBSCRIBER_NAME: &str = "SpellingGame";

/// Unique per round, so a stopping listener never unsubscribes its successor
fn subscriber_name(round: u64) -> String {
    format!("{}-{}", SUBSCRIBER_NAME, round)
}

/// Tunables for the capture loop
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Minimum confidence for a recognition to count
    pub confidence_threshold: f32,
    /// Time between two mailbox reads
    pub poll_interval: Duration,
    /// Abort listening after this long, if set
    pub max_listen: Option<Duration>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            poll_interval: Duration::from_secs(1),
            max_listen: None,
        }
    }
}

/// Collaborators a capture listener needs
#[derive(Clone)]
pub struct CaptureContext {
    /// `None` when the robot has no recognizer
    pub recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pub voice: Arc<dyn SpeechOutput>,
    pub letters: Arc<LetterMap>,
    pub config: CaptureConfig,
}

/// Why listening stopped without a final result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// No recognizer to listen with
    SpeechUnavailable,
    /// The recognizer failed while polling
    SpeechFailed { message: String },
    /// The listening time limit was reached
    TimedOut,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::SpeechUnavailable => write!(f, "speech recognition unavailable"),
            AbortReason::SpeechFailed { message } => {
                write!(f, "speech recognition failed: {}", message)
            }
            AbortReason::TimedOut => write!(f, "listening timed out"),
        }
    }
}

/// Events sent from the capture listener to the game controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The spelling buffer changed
    Incremental { round: u64, buffer: String },
    /// The user confirmed the spelling
    Final { round: u64, buffer: String },
    /// Listening stopped without a final result
    Aborted { round: u64, reason: AbortReason },
}

impl CaptureEvent {
    /// Round the event belongs to
    pub fn round(&self) -> u64 {
        match self {
            CaptureEvent::Incremental { round, .. }
            | CaptureEvent::Final { round, .. }
            | CaptureEvent::Aborted { round, .. } => *round,
        }
    }
}

/// Errors that can occur when starting a capture listener
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("speech recognition is unavailable")]
    SpeechUnavailable,

    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
}

/// How the poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Confirmed,
    Cancelled,
    TimedOut,
    Disconnected,
}

/// Listens for one round's spelling on a dedicated thread
pub struct SpellingListener {
    round: u64,
    running: Arc<AtomicBool>,
}

impl SpellingListener {
    /// Start listening for `round`.
    ///
    /// Without a recognizer the robot apologizes and
    /// `CaptureError::SpeechUnavailable` is returned; nothing is spawned.
    pub fn start(
        round: u64,
        ctx: CaptureContext,
        event_tx: mpsc::Sender<CaptureEvent>,
    ) -> Result<Self, CaptureError> {
        let Some(recognizer) = ctx.recognizer.clone() else {
            warn!(round, "no speech recognizer, cannot listen");
            ctx.voice.say(phrases::CANNOT_HEAR);
            return Err(CaptureError::SpeechUnavailable);
        };

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        thread::Builder::new()
            .name(format!("spelling-capture-{}", round))
            .spawn(move || {
                info!(round, "capture listener thread started");
                run_capture(round, &*recognizer, &ctx, &thread_running, &event_tx);
                thread_running.store(false, Ordering::SeqCst);
                info!(round, "capture listener thread stopped");
            })
            .map_err(|e| {
                running.store(false, Ordering::SeqCst);
                CaptureError::ThreadSpawn(e.to_string())
            })?;

        Ok(Self { round, running })
    }

    /// Ask the listener to stop. It exits within one poll interval and
    /// reports no final result.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!(round = self.round, "capture listener stop requested");
        }
    }

    /// Check if the listener thread is still polling
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SpellingListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clear the mailbox, subscribe, poll until the session ends, always unsubscribe
fn run_capture(
    round: u64,
    recognizer: &dyn SpeechRecognizer,
    ctx: &CaptureContext,
    running: &AtomicBool,
    event_tx: &mpsc::Sender<CaptureEvent>,
) {
    let name = subscriber_name(round);
    let result = recognizer
        .set_vocabulary(&ctx.letters.vocabulary())
        .and_then(|()| recognizer.clear())
        .and_then(|()| recognizer.subscribe(&name))
        .and_then(|()| {
            ctx.voice.say(phrases::SPELL_PROMPT);
            poll_mailbox(round, recognizer, ctx, running, event_tx)
        });

    if let Err(e) = recognizer.unsubscribe(&name) {
        debug!(?e, %name, "unsubscribe after capture failed");
    }

    let abort = match result {
        Ok(LoopExit::Confirmed) => None,
        Ok(LoopExit::Cancelled) => {
            info!(round, "spelling cancelled");
            None
        }
        Ok(LoopExit::Disconnected) => {
            warn!(round, "capture event channel closed");
            None
        }
        Ok(LoopExit::TimedOut) => {
            warn!(round, "spelling timed out");
            ctx.voice.say(phrases::TIME_IS_UP);
            Some(AbortReason::TimedOut)
        }
        Err(e) => {
            error!(round, ?e, "speech recognition error during spelling");
            ctx.voice.say(phrases::SORRY_ERROR);
            Some(AbortReason::SpeechFailed {
                message: e.to_string(),
            })
        }
    };

    if let Some(reason) = abort {
        if event_tx
            .blocking_send(CaptureEvent::Aborted { round, reason })
            .is_err()
        {
            warn!(round, "failed to report abort - channel closed?");
        }
    }
}

/// The poll loop proper: sleep, read, clear, apply
fn poll_mailbox(
    round: u64,
    recognizer: &dyn SpeechRecognizer,
    ctx: &CaptureContext,
    running: &AtomicBool,
    event_tx: &mpsc::Sender<CaptureEvent>,
) -> Result<LoopExit, SpeechError> {
    let mut session = SpellingSession::new(
        Arc::clone(&ctx.letters),
        ctx.config.confidence_threshold,
    );
    session.start();

    loop {
        thread::sleep(ctx.config.poll_interval);

        if !running.load(Ordering::SeqCst) {
            session.abort();
            return Ok(LoopExit::Cancelled);
        }

        if let Some(limit) = ctx.config.max_listen {
            if session.listening_for() >= limit {
                session.abort();
                return Ok(LoopExit::TimedOut);
            }
        }

        let Some(recognition) = recognizer.read()? else {
            continue;
        };
        recognizer.clear()?;

        debug!(
            round,
            text = %recognition.text,
            confidence = recognition.confidence,
            "recognition received"
        );

        let (event, exit) = match session.apply(&recognition) {
            Some(Notification::Incremental(buffer)) => {
                (CaptureEvent::Incremental { round, buffer }, None)
            }
            Some(Notification::Final(buffer)) => {
                (CaptureEvent::Final { round, buffer }, Some(LoopExit::Confirmed))
            }
            None => continue,
        };

        // We use blocking_send since this thread is outside the runtime
        if event_tx.blocking_send(event).is_err() {
            session.abort();
            return Ok(LoopExit::Disconnected);
        }

        if let Some(exit) = exit {
            return Ok(exit);
        }
    }
}
