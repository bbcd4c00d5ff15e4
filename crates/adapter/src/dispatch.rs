//! Message fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use chess_rooms_core::{Notice, Outbox};
use chess_rooms_types::ConnectionId;

use crate::protocol::ServerMessage;

/// Item queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message(ServerMessage),
    /// Send a close frame with `reason` and stop writing.
    Close { reason: String },
}

/// Connection table shared by the accept loop and the session registry.
///
/// Sends never block: each connection drains its own unbounded queue.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    peers: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Outbound>>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route messages for `conn` into `tx` until the returned guard drops.
    pub fn register(&self, conn: ConnectionId, tx: mpsc::UnboundedSender<Outbound>) -> Registration {
        self.peers.write().insert(conn, tx);
        Registration {
            dispatcher: self.clone(),
            conn,
        }
    }

    /// Queue `message` for `conn`. Returns `false` if the peer is gone.
    pub fn send(&self, conn: ConnectionId, message: ServerMessage) -> bool {
        self.push(conn, Outbound::Message(message))
    }

    /// Ask `conn`'s writer to close the socket after what is already queued.
    pub fn close(&self, conn: ConnectionId, reason: impl Into<String>) -> bool {
        self.push(
            conn,
            Outbound::Close {
                reason: reason.into(),
            },
        )
    }

    pub fn connection_count(&self) -> usize {
        self.peers.read().len()
    }

    fn push(&self, conn: ConnectionId, item: Outbound) -> bool {
        let peers = self.peers.read();
        let Some(tx) = peers.get(&conn) else {
            debug!(conn = %conn, "no such connection, message dropped");
            return false;
        };
        if tx.send(item).is_err() {
            debug!(conn = %conn, "writer gone, message dropped");
            return false;
        }
        true
    }

    fn unregister(&self, conn: ConnectionId) {
        self.peers.write().remove(&conn);
    }
}

impl Outbox for Dispatcher {
    fn deliver(&self, notice: Notice) {
        self.send(notice.to, ServerMessage::from(notice.event));
    }
}

/// Keeps a connection registered with a [`Dispatcher`]; unregisters on drop.
#[derive(Debug)]
pub struct Registration {
    dispatcher: Dispatcher,
    conn: ConnectionId,
}

impl Registration {
    pub fn conn(&self) -> ConnectionId {
        self.conn
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispatcher.unregister(self.conn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rooms_core::SessionEvent;

    #[test]
    fn delivers_in_order_to_the_addressee() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reg = dispatcher.register(ConnectionId(1), tx);

        dispatcher.deliver(Notice::new(ConnectionId(1), SessionEvent::OpponentLeft));
        assert!(dispatcher.close(ConnectionId(1), "bye"));

        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Message(ServerMessage::OpponentDisconnected)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Close {
                reason: "bye".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_or_closed_peers_are_swallowed() {
        let dispatcher = Dispatcher::new();
        assert!(!dispatcher.send(ConnectionId(9), ServerMessage::OpponentDisconnected));

        let (tx, rx) = mpsc::unbounded_channel();
        let _reg = dispatcher.register(ConnectionId(2), tx);
        drop(rx);
        assert!(!dispatcher.send(ConnectionId(2), ServerMessage::OpponentDisconnected));
        dispatcher.deliver(Notice::new(ConnectionId(2), SessionEvent::OpponentLeft));
    }

    #[test]
    fn registration_drop_unregisters() {
        let dispatcher = Dispatcher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let reg = dispatcher.register(ConnectionId(3), tx);
        assert_eq!(reg.conn(), ConnectionId(3));
        assert_eq!(dispatcher.connection_count(), 1);
        drop(reg);
        assert_eq!(dispatcher.connection_count(), 0);
        assert!(!dispatcher.send(ConnectionId(3), ServerMessage::OpponentDisconnected));
    }
}
