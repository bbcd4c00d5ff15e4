//! Rules engine adapter - the only place that knows the rules of chess
//!
//! The session core treats a board as an opaque value and asks this crate
//! every question it has about it. Keeping the seam narrow means the core can
//! never drift from the rules: whose turn it is comes from the engine's own
//! side-to-move, not from a flag tracked next to it.
//!
//! # Module Structure
//!
//! - [`rules`]: the [`RulesEngine`] capability trait and [`RulesError`]
//! - [`chess_rules`]: [`ChessRules`], standard chess on top of the `chess` crate
//!
//! # Example
//!
//! ```
//! use chess_rooms_engine::{ChessRules, RulesEngine};
//! use chess_rooms_types::Color;
//!
//! let rules = ChessRules::new();
//! let start = rules.initial();
//! let applied = rules.apply(&start, "e2e4").unwrap();
//!
//! assert_eq!(applied.token, "e2e4");
//! assert_eq!(rules.turn(&applied.board), Color::Black);
//! assert!(rules.apply(&applied.board, "e2e4").is_err());
//! ```

pub mod chess_rules;
pub mod rules;

pub use chess_rooms_types as types;

pub use chess_rules::{format_uci, parse_uci, ChessRules, Position};
pub use rules::{Applied, RulesEngine, RulesError};
