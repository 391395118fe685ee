//! Move generation.
//!
//! Two stages:
//!   1. pseudo-legal generation per piece kind (movement rules and
//!      occupancy, but not king safety);
//!   2. legality filtering — apply each candidate to a scratch copy and
//!      reject it if the mover's king ends up attacked.
//!
//! Simulate-and-test is O(moves × generation) per position, which is well
//! inside the budget of an interactive game.

use crate::engine::attacks;
use crate::engine::board::Position;
use crate::engine::types::{Bitboard, Color, Move, MoveKind, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// All legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    let mut pseudo = Vec::with_capacity(64);
    pseudo_legal(pos, &mut pseudo);

    pseudo
        .into_iter()
        .filter(|&mv| {
            let mut scratch = pos.clone();
            scratch.apply(mv);
            !scratch.in_check(us)
        })
        .collect()
}

/// Legal moves that start on `from` (for move highlighting).
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|mv| mv.from == from)
        .collect()
}

// =========================================================================
// Pseudo-legal generation
// =========================================================================

fn pseudo_legal(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move;
    pawn_moves(pos, us, out);
    knight_moves(pos, us, out);
    slider_moves(pos, us, PieceKind::Bishop, out);
    slider_moves(pos, us, PieceKind::Rook, out);
    slider_moves(pos, us, PieceKind::Queen, out);
    king_moves(pos, us, out);
    castle_moves(pos, us, out);
}

// -------------------------------------------------------------------------
// Pawns
// -------------------------------------------------------------------------

fn pawn_moves(pos: &Position, us: Color, out: &mut Vec<Move>) {
    let enemy = pos.occupancy(!us);
    let empty = !pos.occupancy_all();

    let (step, start_rank, promo_rank): (i8, u8, u8) = match us {
        Color::White => (8, 1, 6),
        Color::Black => (-8, 6, 1),
    };

    for from in pos.bb(us, PieceKind::Pawn).squares() {
        let rank = from.rank();
        let promoting = rank == promo_rank;

        // Single push; double push from the start rank through two empties.
        let ahead = Square((from.0 as i8 + step) as u8);
        if empty.contains(ahead) {
            if promoting {
                push_promotions(from, ahead, MoveKind::Quiet, out);
            } else {
                out.push(Move::quiet(from, ahead));
                if rank == start_rank {
                    let ahead2 = Square((from.0 as i8 + 2 * step) as u8);
                    if empty.contains(ahead2) {
                        out.push(Move::new(from, ahead2, MoveKind::DoublePush));
                    }
                }
            }
        }

        // Diagonal captures, promoting where applicable.
        for to in (attacks::pawn(us, from) & enemy).squares() {
            if promoting {
                push_promotions(from, to, MoveKind::Capture, out);
            } else {
                out.push(Move::new(from, to, MoveKind::Capture));
            }
        }

        // En-passant capture onto the target square.
        if let Some(ep) = pos.en_passant
            && attacks::pawn(us, from).contains(ep)
        {
            out.push(Move::new(from, ep, MoveKind::EnPassant));
        }
    }
}

/// A pawn reaching the last rank must promote: one move per kind, never a
/// non-promoting move.
fn push_promotions(from: Square, to: Square, kind: MoveKind, out: &mut Vec<Move>) {
    for promo in PieceKind::PROMOTIONS {
        out.push(Move::promoting(from, to, promo, kind));
    }
}

// -------------------------------------------------------------------------
// Knights
// -------------------------------------------------------------------------

fn knight_moves(pos: &Position, us: Color, out: &mut Vec<Move>) {
    let friendly = pos.occupancy(us);
    let enemy = pos.occupancy(!us);

    for from in pos.bb(us, PieceKind::Knight).squares() {
        for to in (attacks::knight(from) & !friendly).squares() {
            out.push(target_move(from, to, enemy));
        }
    }
}

// -------------------------------------------------------------------------
// Sliders
// -------------------------------------------------------------------------

fn slider_moves(pos: &Position, us: Color, kind: PieceKind, out: &mut Vec<Move>) {
    let friendly = pos.occupancy(us);
    let enemy = pos.occupancy(!us);
    let occ = pos.occupancy_all();

    for from in pos.bb(us, kind).squares() {
        let reach = match kind {
            PieceKind::Bishop => attacks::bishop(from, occ),
            PieceKind::Rook => attacks::rook(from, occ),
            PieceKind::Queen => attacks::queen(from, occ),
            _ => unreachable!("not a slider: {kind}"),
        };
        for to in (reach & !friendly).squares() {
            out.push(target_move(from, to, enemy));
        }
    }
}

// -------------------------------------------------------------------------
// King
// -------------------------------------------------------------------------

fn king_moves(pos: &Position, us: Color, out: &mut Vec<Move>) {
    let from = pos.king_square(us);
    let friendly = pos.occupancy(us);
    let enemy = pos.occupancy(!us);

    for to in (attacks::king(from) & !friendly).squares() {
        out.push(target_move(from, to, enemy));
    }
}

fn target_move(from: Square, to: Square, enemy: Bitboard) -> Move {
    let kind = if enemy.contains(to) {
        MoveKind::Capture
    } else {
        MoveKind::Quiet
    };
    Move::new(from, to, kind)
}

// -------------------------------------------------------------------------
// Castling
// -------------------------------------------------------------------------

fn castle_moves(pos: &Position, us: Color, out: &mut Vec<Move>) {
    let them = !us;
    let king = pos.king_square(us);

    // No castling out of check.
    if pos.attacked_by(king, them) {
        return;
    }

    let base = match us {
        Color::White => 0u8,
        Color::Black => 56u8,
    };
    let occ = pos.occupancy_all();

    // Kingside: f and g empty, f and g unattacked (king passes through f).
    if pos.castling.kingside(us) {
        let f = Square(base + 5);
        let g = Square(base + 6);
        if !occ.contains(f)
            && !occ.contains(g)
            && !pos.attacked_by(f, them)
            && !pos.attacked_by(g, them)
        {
            out.push(Move::new(king, g, MoveKind::Castle));
        }
    }

    // Queenside: b, c, d empty; c and d unattacked (b is only traversed by
    // the rook, which may pass through an attacked square).
    if pos.castling.queenside(us) {
        let b = Square(base + 1);
        let c = Square(base + 2);
        let d = Square(base + 3);
        if !occ.contains(b)
            && !occ.contains(c)
            && !occ.contains(d)
            && !pos.attacked_by(c, them)
            && !pos.attacked_by(d, them)
        {
            out.push(Move::new(king, c, MoveKind::Castle));
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
