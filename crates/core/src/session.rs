//! One room's game: board, seats, move log and lifecycle.
//!
//! Lifecycle changes go through [`advance`], a fixed table keyed by the
//! current state and a [`Trigger`]. Seat and move operations only ever report
//! triggers; they never assign the lifecycle themselves.

use chess_rooms_engine::RulesEngine;
use chess_rooms_types::{
    BoardFlags, Color, Conclusion, ConnectionId, Lifecycle, RoomKey, Seat, Verdict, SEAT_COUNT,
};

use crate::error::{JoinError, MoveError};
use crate::event::{Notice, Notices, SessionEvent};

/// Input to the lifecycle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A seat was taken; `occupied` seats are now filled.
    SeatFilled { occupied: usize },
    /// A seat was emptied.
    SeatVacated,
    /// The engine judged the position after `mover` played.
    Judged { verdict: Verdict, mover: Color },
}

/// Lifecycle transition table.
///
/// | From | Trigger | To |
/// |------|---------|----|
/// | `Waiting` | `SeatFilled { occupied: 2 }` | `Active` |
/// | `Active` | `Judged { Checkmate, mover }` | `Terminal(Checkmate { winner: mover })` |
/// | `Active` | `Judged { Draw(reason), .. }` | `Terminal(Draw(reason))` |
/// | any | anything else | unchanged |
pub fn advance(state: Lifecycle, trigger: Trigger) -> Lifecycle {
    match (state, trigger) {
        (Lifecycle::Waiting, Trigger::SeatFilled { occupied }) if occupied == SEAT_COUNT => {
            Lifecycle::Active
        }
        (
            Lifecycle::Active,
            Trigger::Judged {
                verdict: Verdict::Checkmate,
                mover,
            },
        ) => Lifecycle::Terminal(Conclusion::Checkmate { winner: mover }),
        (
            Lifecycle::Active,
            Trigger::Judged {
                verdict: Verdict::Draw(reason),
                ..
            },
        ) => Lifecycle::Terminal(Conclusion::Draw(reason)),
        (state, _) => state,
    }
}

/// Human-readable status shown to both players after a move.
pub fn status_line(lifecycle: Lifecycle, flags: BoardFlags, turn: Color) -> String {
    match lifecycle {
        Lifecycle::Terminal(Conclusion::Checkmate { .. }) => "Game Over - Checkmate!".to_string(),
        Lifecycle::Terminal(Conclusion::Draw(_)) => "Game Over - Draw!".to_string(),
        _ if flags.check => "Check!".to_string(),
        _ => format!("{} to move", turn.name()),
    }
}

/// Consistent copy of a session taken under the room lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub key: RoomKey,
    pub lifecycle: Lifecycle,
    pub seats: [Option<ConnectionId>; SEAT_COUNT],
    pub position: String,
    pub history: Vec<String>,
    pub status: String,
}

impl SessionSnapshot {
    pub fn occupant(&self, seat: Seat) -> Option<ConnectionId> {
        self.seats[seat.index()]
    }
}

/// Live state of one room.
#[derive(Debug, Clone)]
pub struct GameSession<B> {
    key: RoomKey,
    board: B,
    lifecycle: Lifecycle,
    seats: [Option<ConnectionId>; SEAT_COUNT],
    move_log: Vec<String>,
    flags: BoardFlags,
}

impl<B: Clone> GameSession<B> {
    /// Fresh session at the engine's starting position, both seats empty.
    pub fn new<E>(key: RoomKey, engine: &E) -> Self
    where
        E: RulesEngine<Board = B>,
    {
        let board = engine.initial();
        let flags = engine.flags(&board);
        Self {
            key,
            board,
            lifecycle: Lifecycle::Waiting,
            seats: [None; SEAT_COUNT],
            move_log: Vec::new(),
            flags,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn flags(&self) -> BoardFlags {
        self.flags
    }

    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    pub fn occupant(&self, seat: Seat) -> Option<ConnectionId> {
        self.seats[seat.index()]
    }

    pub fn seat_of(&self, conn: ConnectionId) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.occupant(*seat) == Some(conn))
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_vacant(&self) -> bool {
        self.occupied() == 0
    }

    /// Seat `conn` in the first empty seat.
    ///
    /// Whenever this fills the last seat, both occupants are sent
    /// `GameStart` with their color, the position and the move log so far.
    /// Joining twice with the same connection returns its current seat.
    pub fn join<E>(&mut self, conn: ConnectionId, engine: &E) -> Result<(Seat, Notices), JoinError>
    where
        E: RulesEngine<Board = B>,
    {
        if let Some(seat) = self.seat_of(conn) {
            return Ok((seat, Notices::new()));
        }
        let seat = Seat::ALL
            .into_iter()
            .find(|seat| self.occupant(*seat).is_none())
            .ok_or_else(|| JoinError::RoomFull(self.key.clone()))?;

        self.seats[seat.index()] = Some(conn);
        let occupied = self.occupied();
        self.lifecycle = advance(self.lifecycle, Trigger::SeatFilled { occupied });

        let mut notices = Notices::new();
        if occupied == SEAT_COUNT {
            let position = engine.position(&self.board);
            for (seat, to) in self.occupants() {
                notices.push(Notice::new(
                    to,
                    SessionEvent::GameStart {
                        color: seat.color(),
                        position: position.clone(),
                        history: self.move_log.clone(),
                    },
                ));
            }
        }
        Ok((seat, notices))
    }

    /// Play `token` for the connection holding `seat`.
    ///
    /// Checks run in order: seat ownership, lifecycle, turn, then the engine.
    /// Any failure leaves the session untouched.
    pub fn request_move<E>(
        &mut self,
        seat: Seat,
        conn: ConnectionId,
        token: &str,
        engine: &E,
    ) -> Result<Notices, MoveError>
    where
        E: RulesEngine<Board = B>,
    {
        if self.occupant(seat) != Some(conn) {
            return Err(MoveError::NotSeated);
        }
        match self.lifecycle {
            Lifecycle::Waiting => return Err(MoveError::WaitingForOpponent),
            Lifecycle::Terminal(_) => return Err(MoveError::GameOver),
            Lifecycle::Active => {}
        }
        let mover = seat.color();
        if engine.turn(&self.board) != mover {
            return Err(MoveError::NotYourTurn);
        }

        let applied = engine.apply(&self.board, token)?;
        self.board = applied.board;
        self.move_log.push(applied.token.clone());
        self.flags = engine.flags(&self.board);
        self.lifecycle = advance(
            self.lifecycle,
            Trigger::Judged {
                verdict: self.flags.verdict(),
                mover,
            },
        );

        let position = engine.position(&self.board);
        let status = status_line(self.lifecycle, self.flags, engine.turn(&self.board));
        let notices: Notices = self
            .occupants()
            .map(|(_, to)| {
                Notice::new(
                    to,
                    SessionEvent::Moved {
                        token: applied.token.clone(),
                        position: position.clone(),
                        status: status.clone(),
                        history: self.move_log.clone(),
                    },
                )
            })
            .collect();
        Ok(notices)
    }

    /// Empty `seat` if `conn` holds it.
    ///
    /// Returns `None` when `conn` is not the holder, including when the seat
    /// is already empty. The lifecycle is left as it is.
    pub fn vacate(&mut self, seat: Seat, conn: ConnectionId) -> Option<Notices> {
        if self.occupant(seat) != Some(conn) {
            return None;
        }
        self.seats[seat.index()] = None;
        self.lifecycle = advance(self.lifecycle, Trigger::SeatVacated);

        let mut notices = Notices::new();
        if let Some(peer) = self.occupant(seat.other()) {
            notices.push(Notice::new(peer, SessionEvent::OpponentLeft));
        }
        Some(notices)
    }

    pub fn status<E>(&self, engine: &E) -> String
    where
        E: RulesEngine<Board = B>,
    {
        status_line(self.lifecycle, self.flags, engine.turn(&self.board))
    }

    pub fn snapshot<E>(&self, engine: &E) -> SessionSnapshot
    where
        E: RulesEngine<Board = B>,
    {
        SessionSnapshot {
            key: self.key.clone(),
            lifecycle: self.lifecycle,
            seats: self.seats,
            position: engine.position(&self.board),
            history: self.move_log.clone(),
            status: self.status(engine),
        }
    }

    fn occupants(&self) -> impl Iterator<Item = (Seat, ConnectionId)> + '_ {
        Seat::ALL
            .into_iter()
            .filter_map(|seat| self.occupant(seat).map(|conn| (seat, conn)))
    }
}
