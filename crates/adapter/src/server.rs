//! WebSocket server for chess rooms
//!
//! Accepts TCP connections, upgrades them on `/ws/{room}`, and runs one task
//! per connection. Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::{SinkExt, StreamExt};
use percent_encoding::percent_decode_str;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use chess_rooms_core::SessionRegistry;
use chess_rooms_engine::ChessRules;
use chess_rooms_types::{ConnectionId, RoomKey, Seat};

use crate::dispatch::{Dispatcher, Outbound};
use crate::protocol::{create_error, parse_message, ClientMessage, ProtocolError, MALFORMED_MESSAGE};

pub const HOST_ENV: &str = "CHESS_ROOMS_HOST";
pub const PORT_ENV: &str = "CHESS_ROOMS_PORT";
pub const LOG_ENV: &str = "CHESS_ROOMS_LOG";
pub const HANDSHAKE_TIMEOUT_ENV: &str = "CHESS_ROOMS_HANDSHAKE_TIMEOUT_MS";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    pub log_filter: String,
    /// How long a new connection may take to finish the WebSocket upgrade.
    pub handshake_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_filter: "info".to_string(),
            handshake_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Missing, empty or unparseable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Self {
            host: non_empty(HOST_ENV).unwrap_or(defaults.host),
            port: non_empty(PORT_ENV)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            log_filter: non_empty(LOG_ENV).unwrap_or(defaults.log_filter),
            handshake_timeout_ms: non_empty(HANDSHAKE_TIMEOUT_ENV)
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.handshake_timeout_ms),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

pub type ChessRegistry = SessionRegistry<ChessRules, Dispatcher>;

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    registry: ChessRegistry,
    dispatcher: Dispatcher,
    next_conn: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        let dispatcher = Dispatcher::new();
        Self {
            config,
            registry: SessionRegistry::new(ChessRules::new(), dispatcher.clone()),
            dispatcher,
            next_conn: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &ChessRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }
}

/// Vacates the connection's seat when dropped, on every exit path.
struct SeatLease {
    state: Arc<ServerState>,
    key: RoomKey,
    seat: Seat,
    conn: ConnectionId,
}

impl Drop for SeatLease {
    fn drop(&mut self) {
        self.state.registry.release(&self.key, self.seat, self.conn);
    }
}

/// Start the WebSocket server
///
/// Runs until the listener fails. The bound address is reported on
/// `ready_tx`, which makes port `0` usable.
pub async fn run_server(
    state: Arc<ServerState>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "chess rooms listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let conn = state.next_connection_id();
        debug!(conn = %conn, peer = %peer, "client connected");

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, conn, state).await {
                warn!(conn = %conn, error = %format!("{e:#}"), "client error");
            }
            debug!(conn = %conn, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    conn: ConnectionId,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let mut room: Option<RoomKey> = None;
    let handshake = tokio_tungstenite::accept_hdr_async(socket, |req: &Request, resp: Response| {
        match parse_room_path(req.uri().path()) {
            Some(key) => {
                room = Some(key);
                Ok(resp)
            }
            None => Err(not_found(req.uri().path())),
        }
    });
    let ws = tokio::time::timeout(state.config.handshake_timeout(), handshake)
        .await
        .context("websocket handshake timed out")?
        .context("websocket handshake failed")?;
    let Some(key) = room else {
        anyhow::bail!("handshake completed without a room");
    };

    let (mut sink, mut stream) = ws.split();

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let _registration = state.dispatcher.register(conn, tx);

    // Spawn task to write messages to client
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            match item {
                Outbound::Message(msg) => {
                    let text = match serde_json::to_string(&msg) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(conn = %conn, error = %e, "failed to serialize message");
                            continue;
                        }
                    };
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close { reason } => {
                    let frame = CloseFrame {
                        code: CloseCode::Policy,
                        reason: reason.into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
        let _ = sink.close().await;
    });

    let seat = match state.registry.join_or_create(&key, conn) {
        Ok(seat) => seat,
        Err(err) => {
            info!(conn = %conn, room = %key, "room full, closing");
            state
                .dispatcher
                .send(conn, create_error(err.client_message()));
            state.dispatcher.close(conn, err.client_message());
            return Ok(());
        }
    };
    let _lease = SeatLease {
        state: Arc::clone(&state),
        key: key.clone(),
        seat,
        conn,
    };

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(conn = %conn, error = %e, "read failed");
                break;
            }
        };
        match frame {
            Message::Text(text) => handle_text(&state, &key, seat, conn, text.as_str()),
            Message::Binary(_) => reply_malformed(&state, conn, &ProtocolError::Binary),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    Ok(())
}

fn handle_text(state: &ServerState, key: &RoomKey, seat: Seat, conn: ConnectionId, text: &str) {
    match parse_message(text) {
        Ok(ClientMessage::Move(request)) => {
            // Refusals already reached the client through the registry.
            let _ = state.registry.submit_move(key, seat, conn, &request.token);
        }
        Ok(ClientMessage::Unknown(kind)) => {
            debug!(conn = %conn, kind = %kind, "ignoring unknown message type");
        }
        Err(e) => reply_malformed(state, conn, &e),
    }
}

fn reply_malformed(state: &ServerState, conn: ConnectionId, error: &ProtocolError) {
    debug!(conn = %conn, error = %error, "malformed message");
    state.dispatcher.send(conn, create_error(MALFORMED_MESSAGE));
}

fn not_found(path: &str) -> ErrorResponse {
    let mut resp = ErrorResponse::new(Some(format!("no room at {path}")));
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}

/// Extract the room key from a `/ws/{room}` request path.
///
/// The segment is percent-decoded and must be non-empty with no further `/`.
pub fn parse_room_path(path: &str) -> Option<RoomKey> {
    let segment = path.strip_prefix("/ws/")?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(RoomKey::new(decoded.into_owned()))
}

/// Check that `host:port` can be bound right now.
pub fn check_tcp_listen_available(host: &str, port: u16) -> std::io::Result<()> {
    let listener = std::net::TcpListener::bind((host, port))?;
    drop(listener);
    Ok(())
}
