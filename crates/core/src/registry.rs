//! Process-wide room table.
//!
//! Rooms live in a [`DashMap`]; every mutating operation holds the room's
//! shard lock for the whole read-decide-mutate-notify sequence, so two
//! operations on the same key never interleave while unrelated rooms proceed
//! in parallel. Notices are handed to the [`Outbox`] before the lock is
//! released, which keeps each connection's messages in session order.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use chess_rooms_engine::RulesEngine;
use chess_rooms_types::{ConnectionId, RoomKey, Seat};

use crate::error::{JoinError, MoveError};
use crate::event::{Notice, Notices, Outbox, SessionEvent};
use crate::session::{GameSession, SessionSnapshot};

pub struct SessionRegistry<E: RulesEngine, O: Outbox> {
    rooms: DashMap<RoomKey, GameSession<E::Board>>,
    engine: E,
    outbox: O,
}

impl<E: RulesEngine, O: Outbox> SessionRegistry<E, O> {
    pub fn new(engine: E, outbox: O) -> Self {
        Self {
            rooms: DashMap::new(),
            engine,
            outbox,
        }
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    /// Seat `conn` in `key`, creating the room on first reference.
    pub fn join_or_create(&self, key: &RoomKey, conn: ConnectionId) -> Result<Seat, JoinError> {
        let mut session = self.rooms.entry(key.clone()).or_insert_with(|| {
            info!(room = %key, "room created");
            GameSession::new(key.clone(), &self.engine)
        });

        let (seat, notices) = session.join(conn, &self.engine)?;
        info!(room = %key, conn = %conn, seat = %seat, lifecycle = session.lifecycle().as_str(), "seated");
        self.flush(notices);
        Ok(seat)
    }

    /// Play `token` for the connection holding `seat` in `key`.
    ///
    /// Refusals other than [`MoveError::NotSeated`] are also reported to
    /// `conn` as a [`SessionEvent::Rejected`]. Messages from connections that
    /// do not hold the seat are dropped without a reply.
    pub fn submit_move(
        &self,
        key: &RoomKey,
        seat: Seat,
        conn: ConnectionId,
        token: &str,
    ) -> Result<(), MoveError> {
        let Some(mut session) = self.rooms.get_mut(key) else {
            return Err(MoveError::NotSeated);
        };

        match session.request_move(seat, conn, token, &self.engine) {
            Ok(notices) => {
                debug!(room = %key, conn = %conn, token, ply = session.move_log().len(), "move accepted");
                if session.lifecycle().is_terminal() {
                    info!(room = %key, outcome = session.lifecycle().as_str(), "game over");
                }
                self.flush(notices);
                Ok(())
            }
            Err(err) => {
                match err.client_message() {
                    Some(reason) => {
                        debug!(room = %key, conn = %conn, token, error = %err, "move rejected");
                        self.outbox.deliver(Notice::new(
                            conn,
                            SessionEvent::Rejected {
                                reason: reason.to_string(),
                            },
                        ));
                    }
                    None => {
                        debug!(room = %key, conn = %conn, seat = %seat, "move from non-holder dropped");
                    }
                }
                Err(err)
            }
        }
    }

    /// Vacate `seat` in `key` if `conn` holds it; drop the room once empty.
    ///
    /// Returns whether anything changed. Releasing an empty seat, a seat held
    /// by someone else, or a seat in an unknown room is a no-op.
    pub fn release(&self, key: &RoomKey, seat: Seat, conn: ConnectionId) -> bool {
        let Entry::Occupied(mut entry) = self.rooms.entry(key.clone()) else {
            return false;
        };
        let Some(notices) = entry.get_mut().vacate(seat, conn) else {
            return false;
        };
        info!(room = %key, conn = %conn, seat = %seat, "seat released");
        self.flush(notices);

        if entry.get().is_vacant() {
            entry.remove();
            info!(room = %key, "room removed");
        }
        true
    }

    pub fn lookup(&self, key: &RoomKey) -> Option<SessionSnapshot> {
        self.rooms
            .get(key)
            .map(|session| session.snapshot(&self.engine))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn flush(&self, notices: Notices) {
        for notice in notices {
            self.outbox.deliver(notice);
        }
    }
}
