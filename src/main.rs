//! spelling-daemon: Background daemon for a robot-mediated spelling game
//!
//! A user spells a word aloud, letter by letter; the robot prompts and
//! gives feedback; a presentation client shows progress over IPC.
//!
//! This daemon provides:
//! - A capture listener thread polling the recognizer mailbox
//! - An explicit spelling state machine (append, delete, confirm)
//! - A game controller choosing words and checking results
//! - IPC for driving rounds, feeding recognitions and streaming events

mod capture;
mod config;
mod events;
mod game;
mod ipc;
mod letters;
mod lifecycle;
mod speech;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::{CaptureContext, CaptureEvent};
use crate::config::Config;
use crate::events::SpellingEvent;
use crate::game::{Game, WordList};
use crate::ipc::{GameHandle, Server};
use crate::letters::LetterMap;
use crate::lifecycle::ShutdownSignal;
use crate::speech::{EventVoice, LocalRecognizer, SpeechOutput, SpeechRecognizer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "spelling-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        threshold = config.capture.confidence_threshold,
        poll_ms = config.capture.poll_interval.as_millis() as u64,
        speech_input = config.speech_input,
        "configuration loaded"
    );

    let letters = Arc::new(LetterMap::brazilian()?);
    info!(spoken_forms = letters.spoken_forms(), "letter map built");

    // Speech input arrives through IPC `recognized` requests
    let recognizer = config.speech_input.then(|| Arc::new(LocalRecognizer::new()));
    if recognizer.is_none() {
        warn!("speech input disabled, spelling rounds cannot listen");
    }

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // Capture listener -> game controller
    let (capture_tx, mut capture_rx) = mpsc::channel::<CaptureEvent>(32);
    // Game controller and robot voice -> IPC subscribers
    let (event_tx, mut event_log_rx) = broadcast::channel::<SpellingEvent>(64);

    // The robot bridge speaks whatever reaches subscribers
    let voice: Arc<dyn SpeechOutput> = Arc::new(EventVoice::new(event_tx.clone()));

    let capture = CaptureContext {
        recognizer: recognizer
            .clone()
            .map(|r| r as Arc<dyn SpeechRecognizer>),
        voice,
        letters,
        config: config.capture.clone(),
    };
    let game = Game::new(
        Box::new(WordList::new(&config.words)),
        capture,
        capture_tx,
        event_tx.clone(),
    );
    game.greet();
    let game = Arc::new(Mutex::new(game));

    // Create IPC server
    let server = Server::new(
        &config.socket_path,
        GameHandle {
            game: Arc::clone(&game),
            recognizer,
            events: event_tx.clone(),
        },
    )?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Hand capture events to the game controller
        _ = async {
            while let Some(event) = capture_rx.recv().await {
                game.lock().await.handle_capture(event);
            }
        } => {
            info!("capture event channel closed");
        }

        // Log spelling events
        _ = async {
            loop {
                match event_log_rx.recv().await {
                    Ok(event) => info!(%event, "spelling event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "spelling event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("spelling event logger exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(reason) => info!(%reason, "shutdown signal received"),
                Err(e) => error!(?e, "signal handling failed"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    game.lock().await.shutdown();
    server.shutdown().await;

    info!("spelling-daemon stopped");

    Ok(())
}
