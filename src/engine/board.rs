//! Bitboard position representation.
//!
//! `Position` stores piece placement as 12 bitboards (2 colours × 6 piece
//! kinds) plus redundant occupancy, side to move, castling rights,
//! en-passant target, and the two move counters. Moves are applied forward
//! only; callers that need to explore (the legality filter, perft) clone the
//! position, which is a flat ~100-byte copy.

use crate::engine::attacks;
use crate::engine::types::{
    Bitboard, CastlingRights, ChessError, Color, Move, MoveKind, Piece, PieceKind, Square,
};

/// A complete chess position.
///
/// Square indexing is LERF: a1 = 0, b1 = 1, … h8 = 63.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Piece bitboards: `pieces[color][kind]`.
    pieces: [[Bitboard; PieceKind::COUNT]; 2],

    /// Per-colour occupancy (union over kinds).
    occupied: [Bitboard; 2],

    /// Union of both colours.
    all_occupied: Bitboard,

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability.
    pub castling: CastlingRights,

    /// En-passant target square (the square *behind* a just-double-pushed
    /// pawn), valid only for the immediately following move.
    pub en_passant: Option<Square>,

    /// Half-moves since the last capture or pawn move (fifty-move rule).
    pub halfmove_clock: u16,

    /// Full-move number; starts at 1, incremented after Black moves.
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Position {
    /// An empty board, White to move, no rights.
    pub fn empty() -> Self {
        Position {
            pieces: [[Bitboard::EMPTY; PieceKind::COUNT]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard starting position.
    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Low-level placement
    // -----------------------------------------------------------------------

    #[inline]
    fn put(&mut self, sq: Square, color: Color, kind: PieceKind) {
        let bb = Bitboard::single(sq);
        self.pieces[color.index()][kind.index()] |= bb;
        self.occupied[color.index()] |= bb;
        self.all_occupied |= bb;
    }

    #[inline]
    fn take(&mut self, sq: Square, color: Color, kind: PieceKind) {
        let bb = Bitboard::single(sq);
        self.pieces[color.index()][kind.index()] &= !bb;
        self.occupied[color.index()] &= !bb;
        self.all_occupied &= !bb;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The piece on a square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        let bb = Bitboard::single(sq);
        if (self.all_occupied & bb).none() {
            return None;
        }
        let color = if (self.occupied[Color::White.index()] & bb).any() {
            Color::White
        } else {
            Color::Black
        };
        for kind in PieceKind::ALL {
            if (self.pieces[color.index()][kind.index()] & bb).any() {
                return Some(Piece::new(color, kind));
            }
        }
        None
    }

    /// Bitboard of one colour's pieces of one kind.
    #[inline]
    pub fn bb(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// All of one colour's pieces.
    #[inline]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    /// Everything on the board.
    #[inline]
    pub fn occupancy_all(&self) -> Bitboard {
        self.all_occupied
    }

    /// The king square of a colour. Exactly one king per side is an
    /// invariant established at every FEN load.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces[color.index()][PieceKind::King.index()]
            .first()
            .expect("king must exist")
    }

    /// Like `piece_at` restricted to one colour; panics when empty. Only
    /// called on squares the bitboards say are occupied by `color`.
    #[inline]
    fn kind_at(&self, sq: Square, color: Color) -> PieceKind {
        let bb = Bitboard::single(sq);
        for kind in PieceKind::ALL {
            if (self.pieces[color.index()][kind.index()] & bb).any() {
                return kind;
            }
        }
        panic!("no {color} piece on {sq}");
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Consults piece placement only — never castling or en-passant state —
    /// so the legality filter can call it freely on simulated positions.
    pub fn attacked_by(&self, sq: Square, by: Color) -> bool {
        let occ = self.all_occupied;

        // A pawn of `by` attacks sq iff sq "attacks back" as a pawn of the
        // opposite colour.
        if (attacks::pawn(!by, sq) & self.bb(by, PieceKind::Pawn)).any() {
            return true;
        }
        if (attacks::knight(sq) & self.bb(by, PieceKind::Knight)).any() {
            return true;
        }
        if (attacks::king(sq) & self.bb(by, PieceKind::King)).any() {
            return true;
        }
        let straight = self.bb(by, PieceKind::Rook) | self.bb(by, PieceKind::Queen);
        if (attacks::rook(sq, occ) & straight).any() {
            return true;
        }
        let diagonal = self.bb(by, PieceKind::Bishop) | self.bb(by, PieceKind::Queen);
        if (attacks::bishop(sq, occ) & diagonal).any() {
            return true;
        }
        false
    }

    /// Is `color`'s king currently attacked?
    #[inline]
    pub fn in_check(&self, color: Color) -> bool {
        self.attacked_by(self.king_square(color), !color)
    }

    // -----------------------------------------------------------------------
    // Move application (forward only)
    // -----------------------------------------------------------------------

    /// Apply a move generated for this position.
    ///
    /// The caller guarantees the move is at least pseudo-legal here; king
    /// safety is the legality filter's concern. Updates castling rights,
    /// en-passant target, both move counters, and the side to move.
    pub fn apply(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = !us;
        let moving = self.kind_at(mv.from, us);

        let mut captured = false;
        match mv.kind {
            MoveKind::EnPassant => {
                // The captured pawn sits behind the target square.
                let victim = match us {
                    Color::White => Square(mv.to.0 - 8),
                    Color::Black => Square(mv.to.0 + 8),
                };
                self.take(victim, them, PieceKind::Pawn);
                captured = true;
            }
            MoveKind::Capture => {
                let victim = self.kind_at(mv.to, them);
                self.take(mv.to, them, victim);
                captured = true;
            }
            _ => {}
        }

        self.take(mv.from, us, moving);
        self.put(mv.to, us, mv.promotion.unwrap_or(moving));

        if mv.kind == MoveKind::Castle {
            let (rook_from, rook_to) = castle_rook_squares(mv.to);
            self.take(rook_from, us, PieceKind::Rook);
            self.put(rook_to, us, PieceKind::Rook);
        }

        // Rights revocation is permanent: king moves drop both flags for
        // the mover; touching a rook home square (departure or capture)
        // drops the matching flag.
        if moving == PieceKind::King {
            self.castling.revoke_all(us);
        }
        self.castling.revoke_for_rook_square(mv.from);
        self.castling.revoke_for_rook_square(mv.to);

        self.en_passant = if mv.kind == MoveKind::DoublePush {
            Some(match us {
                Color::White => Square(mv.from.0 + 8),
                Color::Black => Square(mv.from.0 - 8),
            })
        } else {
            None
        };

        if moving == PieceKind::Pawn || captured {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;

        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    // -----------------------------------------------------------------------
    // Repetition signature
    // -----------------------------------------------------------------------

    /// Position signature for threefold-repetition detection: the first
    /// four FEN fields (placement, side to move, castling, en-passant).
    /// Decodable — appending counters yields a parseable FEN.
    pub fn repetition_key(&self) -> String {
        let fen = self.to_fen();
        let mut end = fen.len();
        // Strip the trailing two space-separated counter fields.
        for _ in 0..2 {
            end = fen[..end].rfind(' ').expect("FEN has 6 fields");
        }
        fen[..end].to_string()
    }

    // -----------------------------------------------------------------------
    // Consistency check
    // -----------------------------------------------------------------------

    /// Verify the redundant occupancy bitboards against the piece boards.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        for color in [Color::White, Color::Black] {
            let mut expected = Bitboard::EMPTY;
            for kind in PieceKind::ALL {
                expected |= self.pieces[color.index()][kind.index()];
            }
            assert_eq!(
                self.occupied[color.index()],
                expected,
                "occupancy mismatch for {color}"
            );
        }
        assert_eq!(
            self.all_occupied,
            self.occupied[0] | self.occupied[1],
            "total occupancy mismatch"
        );
    }

    // -----------------------------------------------------------------------
    // Rendering helpers
    // -----------------------------------------------------------------------

    /// 8×8 occupant grid, rank 8 first (row-major, the order a renderer
    /// draws from the top).
    pub fn board_grid(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (row, rank_row) in grid.iter_mut().enumerate() {
            for (file, cell) in rank_row.iter_mut().enumerate() {
                let sq = Square::from_file_rank(file as u8, 7 - row as u8);
                *cell = self.piece_at(sq);
            }
        }
        grid
    }

    /// Text rendering for debugging and the terminal collaborator.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                s.push(match self.piece_at(sq) {
                    Some(piece) => piece.fen_char(),
                    None => '.',
                });
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

/// For a castling king destination, the rook's (from, to) squares.
fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        6 => (Square(7), Square(5)),    // white kingside: h1 -> f1
        2 => (Square(0), Square(3)),    // white queenside: a1 -> d1
        62 => (Square(63), Square(61)), // black kingside: h8 -> f8
        58 => (Square(56), Square(59)), // black queenside: a8 -> d8
        _ => panic!("invalid castling destination: {king_to}"),
    }
}

// ---------------------------------------------------------------------------
// FEN
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string, validating all six fields and requiring exactly
    /// one king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty();

        // Field 1: piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "rank {} overflows 8 squares",
                        rank + 1
                    )));
                }
                if let Some(run) = ch.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(ChessError::InvalidFen(format!(
                            "bad empty-run digit '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += run as u8;
                } else if let Some((color, kind)) = PieceKind::from_fen_char(ch) {
                    pos.put(Square::from_file_rank(file, rank), color, kind);
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "bad piece character '{ch}'"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} covers {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = pos.bb(color, PieceKind::King).count();
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {kings} kings (expected 1)"
                )));
            }
        }

        // Field 2: side to move.
        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "bad side to move: '{other}'"
                )));
            }
        };

        // Field 3: castling.
        pos.castling = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("bad castling field: '{}'", fields[2]))
        })?;

        // Field 4: en-passant target. Must sit on rank 3 or 6.
        if fields[3] != "-" {
            let ep = Square::parse(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("bad en-passant square: '{}'", fields[3]))
            })?;
            if ep.rank() != 2 && ep.rank() != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en-passant square {} not on rank 3 or 6",
                    fields[3]
                )));
            }
            pos.en_passant = Some(ep);
        }

        // Fields 5 and 6: counters.
        pos.halfmove_clock = fields[4]
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("bad halfmove clock: '{}'", fields[4])))?;
        pos.fullmove_number = fields[5]
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("bad fullmove number: '{}'", fields[5])))?;
        if pos.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        #[cfg(debug_assertions)]
        pos.assert_consistent();

        Ok(pos)
    }

    /// Export the position as FEN.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_run = 0u8;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_run > 0 {
                            fen.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        fen.push(' ');
        fen.push_str(&self.castling.to_fen());
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.name()),
            None => fen.push('-'),
        }
        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
