#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chess_rooms::adapter::server::{run_server, ServerConfig, ServerState};
use chess_rooms::types::{RoomKey, Seat};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const STEP: Duration = Duration::from_secs(2);

pub async fn start_server() -> (Arc<ServerState>, SocketAddr) {
    start_server_with(ServerConfig::default()).await
}

/// Start a server on an ephemeral loopback port with otherwise custom settings.
pub async fn start_server_with(config: ServerConfig) -> (Arc<ServerState>, SocketAddr) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..config
    };
    let state = Arc::new(ServerState::new(config));
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        let _ = run_server(server_state, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(STEP, ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (state, addr)
}

pub async fn connect(addr: SocketAddr, room: &str) -> Ws {
    let (ws, _) = connect_async(format!("ws://{addr}/ws/{room}"))
        .await
        .expect("connect failed");
    ws
}

/// Connect and wait until the server has seated the connection in `seat`.
pub async fn join(state: &ServerState, addr: SocketAddr, room: &str, seat: Seat) -> Ws {
    let ws = connect(addr, room).await;
    let key = RoomKey::new(room);
    wait_until(|| {
        state
            .registry()
            .lookup(&key)
            .and_then(|snap| snap.occupant(seat))
            .is_some()
    })
    .await;
    ws
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(STEP, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub async fn recv_frame(ws: &mut Ws) -> Message {
    loop {
        let msg = tokio::time::timeout(STEP, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read failed");
        match msg {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

pub async fn recv_json(ws: &mut Ws) -> Value {
    match recv_frame(ws).await {
        Message::Text(text) => serde_json::from_str(&text).expect("invalid json from server"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

pub async fn recv_close(ws: &mut Ws) -> Option<CloseFrame> {
    match recv_frame(ws).await {
        Message::Close(frame) => frame,
        other => panic!("expected a close frame, got {other:?}"),
    }
}

/// Assert nothing arrives for a short while.
pub async fn assert_silent(ws: &mut Ws) {
    let next = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

pub async fn send_text(ws: &mut Ws, text: &str) {
    ws.send(Message::text(text.to_string())).await.expect("send failed");
}

pub async fn send_move(ws: &mut Ws, token: &str) {
    send_text(ws, &json!({"type": "move", "move": token}).to_string()).await;
}

/// Seat two players in `room` and consume their `game_start` messages.
pub async fn start_game(state: &ServerState, addr: SocketAddr, room: &str) -> (Ws, Ws) {
    let mut white = join(state, addr, room, Seat::First).await;
    let mut black = join(state, addr, room, Seat::Second).await;
    assert_eq!(recv_json(&mut white).await["type"], "game_start");
    assert_eq!(recv_json(&mut black).await["type"], "game_start");
    (white, black)
}
