//! Shared vocabulary for chess rooms - identifiers, seats, and lifecycle states
//!
//! This crate defines the small value types used by every other crate in the
//! workspace. All types are plain data with no external dependencies, so they
//! can be used by the rules adapter, the session core and the network adapter
//! alike.
//!
//! # Seats and colors
//!
//! A room has exactly two seats. The seat a connection holds fixes the color it
//! plays:
//!
//! | Seat | Color |
//! |------|-------|
//! | `First` | White |
//! | `Second` | Black |
//!
//! # Lifecycle
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Waiting` | Second seat has never been filled |
//! | `Active` | Both seats were filled, no terminal verdict yet |
//! | `Terminal` | Checkmate or a draw was reached |
//!
//! # Examples
//!
//! ```
//! use chess_rooms_types::{Color, Seat, RoomKey};
//!
//! let seat = Seat::First;
//! assert_eq!(seat.color(), Color::White);
//! assert_eq!(seat.other(), Seat::Second);
//! assert_eq!(Seat::from_color(Color::Black), Seat::Second);
//!
//! let key = RoomKey::new("r1");
//! assert_eq!(key.as_str(), "r1");
//! ```

use std::fmt;

/// Number of seats in every room.
pub const SEAT_COUNT: usize = 2;

/// Caller-chosen identifier selecting a room. Equality is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RoomKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Opaque identity of one physical connection.
///
/// Assigned by the transport when the connection is accepted and never reused
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Side to move in the underlying game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Lowercase wire name (`"white"` / `"black"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// Capitalized display name, as used in status lines.
    pub fn name(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two fixed sides of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Seats in assignment order.
    pub const ALL: [Seat; SEAT_COUNT] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Seat::First => Color::White,
            Seat::Second => Color::Black,
        }
    }

    pub fn from_color(color: Color) -> Self {
        match color {
            Color::White => Seat::First,
            Color::Black => Seat::Second,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::First => f.write_str("first"),
            Seat::Second => f.write_str("second"),
        }
    }
}

/// Why a game ended without a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
}

/// How a terminal game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conclusion {
    Checkmate { winner: Color },
    Draw(DrawReason),
}

/// Lifecycle of one room's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Waiting,
    Active,
    Terminal(Conclusion),
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Terminal(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Waiting => "waiting",
            Lifecycle::Active => "active",
            Lifecycle::Terminal(Conclusion::Checkmate { .. }) => "checkmate",
            Lifecycle::Terminal(Conclusion::Draw(_)) => "draw",
        }
    }
}

/// Status predicates reported by the rules engine for one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoardFlags {
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub insufficient_material: bool,
}

impl BoardFlags {
    /// Collapse the predicates into a single verdict.
    ///
    /// Checkmate wins over everything else; stalemate is reported before
    /// insufficient material when both hold.
    pub fn verdict(&self) -> Verdict {
        if self.checkmate {
            Verdict::Checkmate
        } else if self.stalemate {
            Verdict::Draw(DrawReason::Stalemate)
        } else if self.insufficient_material {
            Verdict::Draw(DrawReason::InsufficientMaterial)
        } else if self.check {
            Verdict::Check
        } else {
            Verdict::Continue
        }
    }
}

/// Outcome of a position after an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Continue,
    Check,
    Checkmate,
    Draw(DrawReason),
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Verdict::Checkmate | Verdict::Draw(_))
    }
}
