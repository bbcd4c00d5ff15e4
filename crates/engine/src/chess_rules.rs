//! Standard chess rules backed by the `chess` crate.
//!
//! Move tokens are UCI long algebraic notation: source square, destination
//! square and an optional lowercase promotion piece (`e2e4`, `e7e8q`).
//! Castling is written as the king's two-square move (`e1g1`).

use std::str::FromStr;

use chess::{BitBoard, Board, BoardStatus, ChessMove, File, MoveGen, Piece, Rank, Square};

use chess_rooms_types::Color;

use crate::rules::{Applied, RulesEngine, RulesError};

/// A chess position together with the move counters the FEN snapshot needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// Load a position from a FEN string.
    ///
    /// The move counters are optional and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_str(fen).map_err(|e| RulesError::InvalidPosition(format!("{fen}: {e}")))?;
        let mut counters = fen.split_whitespace().skip(4);
        let halfmove_clock = match counters.next() {
            Some(s) => s
                .parse()
                .map_err(|_| RulesError::InvalidPosition(format!("{fen}: bad halfmove clock")))?,
            None => 0,
        };
        let fullmove_number = match counters.next() {
            Some(s) => s
                .parse()
                .map_err(|_| RulesError::InvalidPosition(format!("{fen}: bad fullmove number")))?,
            None => 1,
        };
        Ok(Self {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// FEN with the tracked counters.
    ///
    /// The en-passant field names the capture target square, and only when a
    /// legal en-passant capture exists.
    pub fn fen(&self) -> String {
        let rendered = self.board.to_string();
        let fields: Vec<&str> = rendered.split_whitespace().take(3).collect();
        let en_passant = self
            .en_passant_target()
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {} {} {}",
            fields.join(" "),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Square a pawn can legally capture onto en passant, if any.
    pub fn en_passant_target(&self) -> Option<Square> {
        // `chess` records the square of the pawn that just double-pushed.
        let pushed = self.board.en_passant()?;
        let target = match self.board.side_to_move() {
            chess::Color::White => pushed.up(),
            chess::Color::Black => pushed.down(),
        }?;
        MoveGen::new_legal(&self.board)
            .any(|mv| {
                mv.get_dest() == target && self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            })
            .then_some(target)
    }

    /// Play a move already known to be legal.
    fn play(&self, mv: ChessMove) -> Self {
        let resets_clock = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();
        let black_moved = self.board.side_to_move() == chess::Color::Black;
        Self {
            board: self.board.make_move_new(mv),
            halfmove_clock: if resets_clock {
                0
            } else {
                self.halfmove_clock + 1
            },
            fullmove_number: if black_moved {
                self.fullmove_number + 1
            } else {
                self.fullmove_number
            },
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

/// Standard chess.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessRules;

impl ChessRules {
    pub fn new() -> Self {
        Self
    }
}

impl RulesEngine for ChessRules {
    type Board = Position;

    fn initial(&self) -> Position {
        Position::default()
    }

    fn apply(&self, position: &Position, token: &str) -> Result<Applied<Position>, RulesError> {
        let mv = parse_uci(token).ok_or_else(|| RulesError::Unparseable(token.to_string()))?;
        if !position.board.legal(mv) {
            return Err(RulesError::Illegal(token.to_string()));
        }
        Ok(Applied {
            board: position.play(mv),
            token: format_uci(mv),
        })
    }

    fn turn(&self, position: &Position) -> Color {
        match position.board.side_to_move() {
            chess::Color::White => Color::White,
            chess::Color::Black => Color::Black,
        }
    }

    fn is_check(&self, position: &Position) -> bool {
        position.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        position.board.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self, position: &Position) -> bool {
        position.board.status() == BoardStatus::Stalemate
    }

    fn is_insufficient_material(&self, position: &Position) -> bool {
        insufficient_material(&position.board)
    }

    fn position(&self, position: &Position) -> String {
        position.fen()
    }
}

/// Parse a UCI move token without consulting any position.
pub fn parse_uci(token: &str) -> Option<ChessMove> {
    let bytes = token.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return None;
    }
    let source = square_at(bytes[0], bytes[1])?;
    let dest = square_at(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4) {
        None => None,
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return None,
    };
    Some(ChessMove::new(source, dest, promotion))
}

/// Canonical UCI rendering of a move.
pub fn format_uci(mv: ChessMove) -> String {
    let promotion = match mv.get_promotion() {
        Some(Piece::Queen) => "q",
        Some(Piece::Rook) => "r",
        Some(Piece::Bishop) => "b",
        Some(Piece::Knight) => "n",
        _ => "",
    };
    format!("{}{}{}", mv.get_source(), mv.get_dest(), promotion)
}

fn square_at(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index(usize::from(rank - b'1')),
        File::from_index(usize::from(file - b'a')),
    ))
}

/// No pawns, rooks or queens, and either a single minor piece or bishops
/// confined to one square color.
fn insufficient_material(board: &Board) -> bool {
    let heavy: BitBoard =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    if knights.popcnt() + bishops.popcnt() <= 1 {
        return true;
    }
    if knights.popcnt() > 0 {
        return false;
    }

    let mut shades = bishops.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn play_all(rules: &ChessRules, tokens: &[&str]) -> Position {
        let mut position = rules.initial();
        for token in tokens {
            position = rules
                .apply(&position, token)
                .unwrap_or_else(|e| panic!("{token} rejected: {e}"))
                .board;
        }
        position
    }

    #[test]
    fn test_initial_position_fen() {
        let rules = ChessRules::new();
        let position = rules.initial();
        assert_eq!(rules.position(&position), START_FEN);
        assert_eq!(rules.turn(&position), Color::White);
        assert_eq!(rules.flags(&position), Default::default());
    }

    #[test]
    fn test_from_fen_roundtrips_start() {
        let position = Position::from_fen(START_FEN).unwrap();
        assert_eq!(position, Position::default());
        assert_eq!(position.fen(), START_FEN);
    }

    #[test]
    fn test_from_fen_rejects_garbage() {
        assert!(matches!(
            Position::from_fen("not a position"),
            Err(RulesError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_legal_opening_move_flips_turn() {
        let rules = ChessRules::new();
        let applied = rules.apply(&rules.initial(), "e2e4").unwrap();
        assert_eq!(applied.token, "e2e4");
        assert_eq!(rules.turn(&applied.board), Color::Black);
        assert!(rules.position(&applied.board).starts_with(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"
        ));
    }

    #[test]
    fn test_unparseable_tokens() {
        let rules = ChessRules::new();
        let start = rules.initial();
        for token in ["", "e2", "e2e", "e2e4qq", "i2i4", "e0e4", "E2E4", "e7e8k", "0000"] {
            assert_eq!(
                rules.apply(&start, token),
                Err(RulesError::Unparseable(token.to_string())),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let rules = ChessRules::new();
        let start = rules.initial();
        assert_eq!(
            rules.apply(&start, "e2e5"),
            Err(RulesError::Illegal("e2e5".to_string()))
        );
        // Black piece while White is to move.
        assert!(!rules.is_legal(&start, "e7e5"));
        assert!(rules.is_legal(&start, "g1f3"));
    }

    #[test]
    fn test_move_counters() {
        let rules = ChessRules::new();
        let position = play_all(&rules, &["e2e4", "e7e5", "g1f3"]);
        assert_eq!(position.halfmove_clock(), 1);
        assert_eq!(position.fullmove_number(), 2);
        let fen = rules.position(&position);
        assert!(
            fen.starts_with("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq"),
            "{fen}"
        );
        assert!(fen.ends_with(" 1 2"), "{fen}");
    }

    #[test]
    fn test_en_passant_target_after_double_push() {
        let rules = ChessRules::new();
        let position = play_all(&rules, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(position.en_passant_target(), Some(Square::D6));
        assert_eq!(
            rules.position(&position),
            "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
        );

        let captured = rules.apply(&position, "e5d6").unwrap().board;
        assert_eq!(captured.board().piece_on(Square::D5), None);
        assert_eq!(captured.en_passant_target(), None);
    }

    #[test]
    fn test_en_passant_field_empty_without_capture() {
        let rules = ChessRules::new();
        // No black pawn next to e4.
        let position = play_all(&rules, &["e2e4"]);
        assert_eq!(position.en_passant_target(), None);
        assert!(rules.position(&position).ends_with(" b KQkq - 0 1"));

        // b4 sits next to c4 but capturing would expose the king on a4.
        let pinned = Position::from_fen("8/8/8/8/kp5R/8/2P5/4K3 w - - 0 1").unwrap();
        let after = rules.apply(&pinned, "c2c4").unwrap().board;
        assert!(!rules.is_legal(&after, "b4c3"));
        assert_eq!(after.en_passant_target(), None);
        assert_eq!(rules.position(&after), "8/8/8/8/kpP4R/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn test_check_is_reported() {
        let rules = ChessRules::new();
        let position = play_all(&rules, &["e2e4", "f7f6", "d1h5"]);
        let flags = rules.flags(&position);
        assert!(flags.check);
        assert!(!flags.checkmate);
        // g7g6 is the only block; unrelated moves stay illegal.
        assert!(rules.is_legal(&position, "g7g6"));
        assert!(!rules.is_legal(&position, "a7a6"));
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let rules = ChessRules::new();
        let position = play_all(&rules, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(rules.is_check(&position));
        assert!(rules.is_checkmate(&position));
        assert!(!rules.is_stalemate(&position));
        assert_eq!(rules.turn(&position), Color::White);
    }

    #[test]
    fn test_stalemate_is_detected() {
        let rules = ChessRules::new();
        let position = Position::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        let after = rules.apply(&position, "f1f7").unwrap().board;
        assert!(rules.is_stalemate(&after));
        assert!(!rules.is_check(&after));
        assert!(!rules.is_checkmate(&after));
    }

    #[test]
    fn test_capture_into_bare_kings_is_insufficient() {
        let rules = ChessRules::new();
        let position = Position::from_fen("8/8/8/8/8/k7/2r5/2K5 w - - 0 1").unwrap();
        assert!(rules.is_check(&position));
        assert!(!rules.is_insufficient_material(&position));
        let after = rules.apply(&position, "c1c2").unwrap().board;
        assert!(rules.is_insufficient_material(&after));
        assert_eq!(after.halfmove_clock(), 0);
    }

    #[test]
    fn test_insufficient_material_cases() {
        let rules = ChessRules::new();
        let cases = [
            ("8/8/8/4k3/8/8/8/4K3 w - - 0 1", true),
            ("8/8/8/4k3/8/8/8/3NK3 w - - 0 1", true),
            ("8/8/8/4k3/8/8/8/3BK3 w - - 0 1", true),
            // Bishops on c1 and f8 share dark squares.
            ("5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1", true),
            // Bishops on c1 (dark) and c8 (light).
            ("2b5/8/8/4k3/8/8/8/2B1K3 w - - 0 1", false),
            ("8/8/8/4k3/8/8/8/2NNK3 w - - 0 1", false),
            ("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1", false),
        ];
        for (fen, expected) in cases {
            let position = Position::from_fen(fen).unwrap();
            assert_eq!(rules.is_insufficient_material(&position), expected, "{fen}");
        }
    }

    #[test]
    fn test_promotion_requires_piece() {
        let rules = ChessRules::new();
        let position = Position::from_fen("8/P7/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(matches!(
            rules.apply(&position, "a7a8"),
            Err(RulesError::Illegal(_))
        ));
        let applied = rules.apply(&position, "a7a8q").unwrap();
        assert_eq!(applied.token, "a7a8q");
        assert!(rules.is_check(&applied.board));
    }

    #[test]
    fn test_castling_token() {
        let rules = ChessRules::new();
        let position = play_all(&rules, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]);
        let applied = rules.apply(&position, "e1g1").unwrap();
        assert_eq!(applied.token, "e1g1");
        assert!(rules
            .position(&applied.board)
            .starts_with("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1 b kq"));
    }

    #[test]
    fn test_parse_and_format_uci() {
        let mv = parse_uci("b7b8n").unwrap();
        assert_eq!(mv.get_promotion(), Some(Piece::Knight));
        assert_eq!(format_uci(mv), "b7b8n");
        assert_eq!(format_uci(parse_uci("h1a8").unwrap()), "h1a8");
        assert!(parse_uci("h9a8").is_none());
    }
}
