//! Events a session emits and the seam they leave the core through.

use arrayvec::ArrayVec;

use chess_rooms_types::{Color, ConnectionId, SEAT_COUNT};

/// Something a seated connection should be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Both seats are filled; the addressee plays `color`.
    GameStart {
        color: Color,
        position: String,
        history: Vec<String>,
    },
    /// A move was accepted.
    Moved {
        token: String,
        position: String,
        status: String,
        history: Vec<String>,
    },
    /// The addressee's own request was refused.
    Rejected { reason: String },
    /// The other seat was vacated.
    OpponentLeft,
}

/// An event together with the connection it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: ConnectionId,
    pub event: SessionEvent,
}

impl Notice {
    pub fn new(to: ConnectionId, event: SessionEvent) -> Self {
        Self { to, event }
    }
}

/// At most one notice per seat comes out of a single transition.
pub type Notices = ArrayVec<Notice, SEAT_COUNT>;

/// Delivery sink for notices.
///
/// Called while the room's lock is held, so implementations must not block
/// and must never call back into the registry.
pub trait Outbox: Send + Sync {
    fn deliver(&self, notice: Notice);
}

impl<O: Outbox + ?Sized> Outbox for std::sync::Arc<O> {
    fn deliver(&self, notice: Notice) {
        (**self).deliver(notice)
    }
}
