//! Adapter module - chess rooms over WebSocket with a JSON protocol
//!
//! This crate puts the session core on the network. Each client opens a
//! WebSocket on `/ws/{room}`; the first two clients to name a room play each
//! other, first as White and second as Black.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: Client upgrades on `ws://host:port/ws/{room}` (default: 127.0.0.1:8000)
//! 2. **Seating**: First joiner waits; the second joiner starts the game
//! 3. **Moves**: The side to move sends `move`; both players get the result
//! 4. **Departure**: Closing the socket frees the seat and tells the opponent
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **move**: `{"type":"move","move":"e2e4"}` (UCI long algebraic)
//!
//! Any other `type` is ignored.
//!
//! ## Server → Client
//!
//! - **game_start**: `color`, `fen`, `move_history`
//! - **move**: `move`, `fen`, `status`, `move_history`
//! - **error**: `message`, sent only to the offending client
//! - **opponent_disconnected**: the other seat was vacated
//!
//! # Environment Variables
//!
//! - `CHESS_ROOMS_HOST`: Bind address (default: "127.0.0.1")
//! - `CHESS_ROOMS_PORT`: Port number (default: 8000)
//! - `CHESS_ROOMS_LOG`: Default log filter (default: "info"; `RUST_LOG` wins)
//! - `CHESS_ROOMS_HANDSHAKE_TIMEOUT_MS`: Upgrade deadline for new sockets (default: 10000)
//!
//! # Example Protocol Flow
//!
//! ```text
//! A connects to /ws/r1                 (no message yet)
//! B connects to /ws/r1
//! Server -> A: {"type":"game_start","color":"white","fen":"rnbqkbnr/... w KQkq - 0 1","move_history":[]}
//! Server -> B: {"type":"game_start","color":"black","fen":"rnbqkbnr/... w KQkq - 0 1","move_history":[]}
//! A -> Server: {"type":"move","move":"e2e4"}
//! Server -> A, B: {"type":"move","move":"e2e4","fen":"...","status":"Black to move","move_history":["e2e4"]}
//! ```
//!
//! # Implementation
//!
//! - See [`protocol`] for message structure definitions
//! - See [`dispatch`] for per-connection outbound queues
//! - See [`server`] for the accept loop and connection handler
//! - See [`logging`] for subscriber setup

pub mod dispatch;
pub mod logging;
pub mod protocol;
pub mod server;

pub use chess_rooms_core as core;
pub use chess_rooms_engine as engine;
pub use chess_rooms_types as types;
