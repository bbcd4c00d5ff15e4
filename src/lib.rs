//! Chess rooms (workspace facade crate).
//!
//! Re-exports the implementation crates under `crates/` as
//! `chess_rooms::{types, engine, core, adapter}`.

pub use chess_rooms_adapter as adapter;
pub use chess_rooms_core as core;
pub use chess_rooms_engine as engine;
pub use chess_rooms_types as types;
