//! Session core - rooms, seats, and the game session state machine
//!
//! This crate is synchronous and knows nothing about sockets. The network
//! adapter turns connection events into registry calls, and the registry hands
//! the resulting notices to an [`Outbox`] supplied at construction time.
//!
//! # Module Structure
//!
//! - [`session`]: [`GameSession`], its lifecycle table ([`advance`]) and status lines
//! - [`registry`]: [`SessionRegistry`], the room table with per-room locking
//! - [`event`]: [`SessionEvent`], [`Notice`] and the [`Outbox`] seam
//! - [`error`]: [`JoinError`] and [`MoveError`]
//!
//! # Guarantees
//!
//! - **Two seats**: a room never holds more than two connections; a third
//!   joiner gets [`JoinError::RoomFull`]
//! - **Per-room serialization**: join, move and release on one room key run
//!   one at a time; distinct rooms do not contend on a global lock
//! - **Engine-owned turns**: whose move it is comes from the rules engine,
//!   never from a separately tracked flag
//! - **Replayable log**: only accepted moves are logged, so replaying the log
//!   from the start position reproduces the board
//!
//! # Example
//!
//! ```
//! use std::sync::Mutex;
//!
//! use chess_rooms_core::{Notice, Outbox, SessionEvent, SessionRegistry};
//! use chess_rooms_engine::ChessRules;
//! use chess_rooms_types::{ConnectionId, RoomKey, Seat};
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<Notice>>);
//!
//! impl Outbox for Collect {
//!     fn deliver(&self, notice: Notice) {
//!         self.0.lock().unwrap().push(notice);
//!     }
//! }
//!
//! let registry = SessionRegistry::new(ChessRules::new(), Collect::default());
//! let room = RoomKey::new("r1");
//!
//! let white = registry.join_or_create(&room, ConnectionId(1)).unwrap();
//! let black = registry.join_or_create(&room, ConnectionId(2)).unwrap();
//! assert_eq!((white, black), (Seat::First, Seat::Second));
//!
//! registry.submit_move(&room, white, ConnectionId(1), "e2e4").unwrap();
//!
//! let sent = registry.outbox().0.lock().unwrap();
//! assert!(matches!(
//!     &sent.last().unwrap().event,
//!     SessionEvent::Moved { status, .. } if status == "Black to move"
//! ));
//! ```

pub mod error;
pub mod event;
pub mod registry;
pub mod session;

pub use chess_rooms_engine as engine;
pub use chess_rooms_types as types;

pub use error::{JoinError, MoveError};
pub use event::{Notice, Notices, Outbox, SessionEvent};
pub use registry::SessionRegistry;
pub use session::{advance, status_line, GameSession, SessionSnapshot, Trigger};
