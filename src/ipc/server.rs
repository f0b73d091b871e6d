//! Unix domain socket server for IPC
//!
//! Provides request-response communication for driving the game and push
//! notifications of spelling events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::events::SpellingEvent;
use crate::game::{check_spelling, Game};
use crate::speech::{LocalRecognizer, Recognition};

use super::protocol::{DaemonStatus, Notification, Request, Response, MAX_MESSAGE_LEN};

/// What the server needs to reach the game
#[derive(Clone)]
pub struct GameHandle {
    pub game: Arc<Mutex<Game>>,
    /// Mailbox fed by `recognized` requests; `None` without speech input
    pub recognizer: Option<Arc<LocalRecognizer>>,
    pub events: broadcast::Sender<SpellingEvent>,
}

/// Shared server state
struct ServerState {
    handle: GameHandle,
    start_time: Instant,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(socket_path: &Path, handle: GameHandle) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state: Arc::new(ServerState {
                handle,
                start_time: Instant::now(),
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(mut stream: UnixStream, state: Arc<ServerState>) -> Result<()> {
        loop {
            let Some(request) = Self::read_message::<Request>(&mut stream).await? else {
                debug!("client disconnected");
                return Ok(());
            };

            debug!(?request, "received request");

            if request == Request::Subscribe {
                // Subscribe before confirming so no event slips between the two
                let events = state.handle.events.subscribe();
                Self::send_message(&mut stream, &Response::Subscribed).await?;
                debug!("client subscribed to notifications");
                return Self::stream_events(stream, events).await;
            }

            let response = Self::process_request(request, &state).await;
            Self::send_message(&mut stream, &response).await?;
        }
    }

    /// Push spelling events until the client goes away
    async fn stream_events(
        mut stream: UnixStream,
        mut events: broadcast::Receiver<SpellingEvent>,
    ) -> Result<()> {
        loop {
            let notification = match events.recv().await {
                Ok(event) => Notification::Event { event },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged");
                    Notification::Lagged { skipped }
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            };

            if let Err(e) = Self::send_message(&mut stream, &notification).await {
                debug!(?e, "subscriber disconnected");
                return Ok(());
            }
        }
    }

    /// Read one length-prefixed JSON message. `None` on clean disconnect.
    async fn read_message<T: serde::de::DeserializeOwned>(
        stream: &mut UnixStream,
    ) -> Result<Option<T>> {
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_LEN {
            warn!(len, "message too large, disconnecting");
            return Ok(None);
        }

        let mut msg_buf = vec![0u8; len];
        stream.read_exact(&mut msg_buf).await?;

        let msg = serde_json::from_slice(&msg_buf).context("failed to parse request")?;
        Ok(Some(msg))
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(request: Request, state: &ServerState) -> Response {
        let handle = &state.handle;
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let game = handle.game.lock().await;
                Response::Status(DaemonStatus {
                    speech_input: game.has_speech_input(),
                    listening: game.is_listening(),
                    round: game.round().cloned(),
                    uptime_secs: state.start_time.elapsed().as_secs(),
                    ..DaemonStatus::default()
                })
            }

            Request::NewRound => {
                let mut game = handle.game.lock().await;
                let round = game.new_round();
                Response::RoundStarted {
                    round: round.id,
                    word: round.word.clone(),
                }
            }

            Request::StartSpelling => match handle.game.lock().await.start_spelling() {
                Ok(round) => Response::Listening { round },
                Err(e) => Response::error(e.code(), e),
            },

            Request::CancelRound => match handle.game.lock().await.cancel_round() {
                Ok(round) => Response::Cancelled { round },
                Err(e) => Response::error(e.code(), e),
            },

            Request::Recognized { text, confidence } => {
                let Some(recognizer) = handle.recognizer.as_ref() else {
                    return Response::error("speech_unavailable", "speech input is disabled");
                };
                match recognizer.post(Recognition::new(text, confidence)) {
                    Ok(delivered) => Response::Recognized { delivered },
                    Err(e) => Response::error("invalid_recognition", e),
                }
            }

            Request::CheckSpelling { word, spelling } => Response::Checked {
                correct: check_spelling(&word, &spelling),
            },

            Request::Subscribe => Response::Subscribed,
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
