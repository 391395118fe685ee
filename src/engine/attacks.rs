//! Attack-set computation.
//!
//! Knight, king, and pawn attack sets are small and fixed, so they are
//! precomputed once per process (`OnceLock`). Sliding pieces walk their rays
//! over the occupancy bitboard at query time; an interactive game answers a
//! few hundred of these per user move, which is nowhere near worth a
//! lookup-table scheme.

use crate::engine::types::{Bitboard, Color, Square};
use std::sync::OnceLock;

// =========================================================================
// Leaper tables
// =========================================================================

/// Get the process-wide leaper attack tables.
fn leapers() -> &'static LeaperTables {
    static TABLES: OnceLock<LeaperTables> = OnceLock::new();
    TABLES.get_or_init(LeaperTables::build)
}

struct LeaperTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    /// `pawn[color][square]` — squares a pawn of `color` on `square` attacks.
    pawn: [[Bitboard; 64]; 2],
}

impl LeaperTables {
    fn build() -> Self {
        const KNIGHT_JUMPS: [(i8, i8); 8] = [
            (-2, -1),
            (-2, 1),
            (-1, -2),
            (-1, 2),
            (1, -2),
            (1, 2),
            (2, -1),
            (2, 1),
        ];
        const KING_STEPS: [(i8, i8); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];

        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        let mut pawn = [[Bitboard::EMPTY; 64]; 2];

        for sq in 0..64u8 {
            knight[sq as usize] = offsets_from(sq, &KNIGHT_JUMPS);
            king[sq as usize] = offsets_from(sq, &KING_STEPS);
            pawn[Color::White.index()][sq as usize] = offsets_from(sq, &[(1, -1), (1, 1)]);
            pawn[Color::Black.index()][sq as usize] = offsets_from(sq, &[(-1, -1), (-1, 1)]);
        }

        LeaperTables { knight, king, pawn }
    }
}

/// Collect the on-board squares reached by applying (rank, file) offsets.
fn offsets_from(sq: u8, offsets: &[(i8, i8)]) -> Bitboard {
    let rank = (sq >> 3) as i8;
    let file = (sq & 7) as i8;
    let mut bb = Bitboard::EMPTY;
    for &(dr, df) in offsets {
        let r = rank + dr;
        let f = file + df;
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb.insert(Square::from_file_rank(f as u8, r as u8));
        }
    }
    bb
}

// =========================================================================
// Public lookups
// =========================================================================

/// Squares a knight on `sq` attacks.
#[inline]
pub fn knight(sq: Square) -> Bitboard {
    leapers().knight[sq.0 as usize]
}

/// Squares a king on `sq` attacks.
#[inline]
pub fn king(sq: Square) -> Bitboard {
    leapers().king[sq.0 as usize]
}

/// Squares a pawn of `color` on `sq` attacks (captures only, not pushes).
#[inline]
pub fn pawn(color: Color, sq: Square) -> Bitboard {
    leapers().pawn[color.index()][sq.0 as usize]
}

// =========================================================================
// Sliders
// =========================================================================

const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Squares a rook on `sq` attacks, given the full occupancy. The first
/// occupant on each ray is included (it may be capturable).
pub fn rook(sq: Square, occupied: Bitboard) -> Bitboard {
    rays(sq, occupied, &ORTHOGONAL)
}

/// Squares a bishop on `sq` attacks, given the full occupancy.
pub fn bishop(sq: Square, occupied: Bitboard) -> Bitboard {
    rays(sq, occupied, &DIAGONAL)
}

/// Queen = rook | bishop.
pub fn queen(sq: Square, occupied: Bitboard) -> Bitboard {
    rook(sq, occupied) | bishop(sq, occupied)
}

fn rays(sq: Square, occupied: Bitboard, directions: &[(i8, i8)]) -> Bitboard {
    let rank = sq.rank() as i8;
    let file = sq.file() as i8;
    let mut attacks = Bitboard::EMPTY;
    for &(dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = Square::from_file_rank(f as u8, r as u8);
            attacks.insert(target);
            if occupied.contains(target) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

// =========================================================================
// Tests
// =========================================================================
