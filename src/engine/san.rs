//! Standard Algebraic Notation.
//!
//! Generation (`to_san`) feeds the move history; parsing (`from_san`) lets
//! a collaborator accept input like `Nf3` or `exd5` alongside coordinate
//! pairs. Check and mate suffixes are the caller's job — only the game
//! knows the status after the move lands.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Move, PieceKind, Square};

// =========================================================================
// Generation
// =========================================================================

/// Render a move in SAN, without `+`/`#` suffixes.
///
/// `legal` must be the full legal-move list of `pos` (passed in so callers
/// that already generated it do not pay twice).
pub fn to_san(pos: &Position, mv: Move, legal: &[Move]) -> String {
    if mv.is_castle() {
        return if mv.to.file() > mv.from.file() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let kind = pos
        .piece_at(mv.from)
        .map(|p| p.kind)
        .expect("SAN: from-square is empty");

    let mut san = String::with_capacity(8);

    if kind == PieceKind::Pawn {
        if mv.is_capture() {
            san.push((b'a' + mv.from.file()) as char);
            san.push('x');
        }
        san.push_str(&mv.to.name());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(letter(promo));
        }
    } else {
        san.push(letter(kind));
        san.push_str(&disambiguation(pos, mv, kind, legal));
        if mv.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.name());
    }

    san
}

/// File, rank, or both — whatever distinguishes this move from other legal
/// moves of the same piece kind to the same destination.
fn disambiguation(pos: &Position, mv: Move, kind: PieceKind, legal: &[Move]) -> String {
    let us = pos.side_to_move;
    let rivals: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && !m.is_castle()
                && pos
                    .piece_at(m.from)
                    .is_some_and(|p| p.color == us && p.kind == kind)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file_clashes = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let rank_clashes = rivals.iter().any(|m| m.from.rank() == mv.from.rank());

    match (file_clashes, rank_clashes) {
        (false, _) => format!("{}", (b'a' + mv.from.file()) as char),
        (true, false) => format!("{}", (b'1' + mv.from.rank()) as char),
        (true, true) => mv.from.name(),
    }
}

fn letter(kind: PieceKind) -> char {
    match kind {
        PieceKind::Pawn => 'P',
        PieceKind::Knight => 'N',
        PieceKind::Bishop => 'B',
        PieceKind::Rook => 'R',
        PieceKind::Queen => 'Q',
        PieceKind::King => 'K',
    }
}

// =========================================================================
// Parsing
// =========================================================================

/// Resolve a SAN string against the legal moves of `pos`.
///
/// Accepts `e4`, `Nf3`, `Bxe5`, `O-O`, `0-0-0`, `e8=Q`; trailing `+`, `#`,
/// `!`, `?` annotations are ignored.
pub fn from_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    let legal = movegen::legal_moves(pos);
    let san = san.trim_end_matches(['+', '#', '!', '?']);

    if san == "O-O" || san == "0-0" {
        return find_castle(pos, &legal, true);
    }
    if san == "O-O-O" || san == "0-0-0" {
        return find_castle(pos, &legal, false);
    }

    let chars: Vec<char> = san.chars().collect();
    if chars.is_empty() {
        return Err(reject(san, "empty SAN string"));
    }

    // Promotion suffix.
    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let promo = match chars[chars.len() - 1] {
            'Q' | 'q' => PieceKind::Queen,
            'R' | 'r' => PieceKind::Rook,
            'B' | 'b' => PieceKind::Bishop,
            'N' | 'n' => PieceKind::Knight,
            other => return Err(ChessError::InvalidPromotion(other.to_string())),
        };
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };

    // Leading piece letter, pawn otherwise.
    let (kind, rest) = match chars.first() {
        Some('N') => (PieceKind::Knight, &chars[1..]),
        Some('B') => (PieceKind::Bishop, &chars[1..]),
        Some('R') => (PieceKind::Rook, &chars[1..]),
        Some('Q') => (PieceKind::Queen, &chars[1..]),
        Some('K') => (PieceKind::King, &chars[1..]),
        _ => (PieceKind::Pawn, chars),
    };

    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(reject(san, "SAN too short"));
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest =
        Square::parse(&dest_str).ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    let hint = &rest[..rest.len() - 2];
    let hint_file = hint
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a');
    let hint_rank = hint
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| c as u8 - b'1');

    let us = pos.side_to_move;
    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == dest
                && pos
                    .piece_at(m.from)
                    .is_some_and(|p| p.color == us && p.kind == kind)
                && hint_file.is_none_or(|f| m.from.file() == f)
                && hint_rank.is_none_or(|r| m.from.rank() == r)
                && m.promotion == promotion
        })
        .collect();

    match candidates.len() {
        0 => Err(reject(san, "no legal move matches")),
        1 => Ok(*candidates[0]),
        n => Err(reject(san, &format!("ambiguous, {n} candidates"))),
    }
}

fn find_castle(pos: &Position, legal: &[Move], kingside: bool) -> Result<Move, ChessError> {
    let king = pos.king_square(pos.side_to_move);
    let file = if kingside { 6 } else { 2 };
    legal
        .iter()
        .find(|m| m.is_castle() && m.from == king && m.to.file() == file)
        .copied()
        .ok_or_else(|| {
            reject(
                if kingside { "O-O" } else { "O-O-O" },
                "castling not legal here",
            )
        })
}

fn reject(san: &str, reason: &str) -> ChessError {
    ChessError::IllegalMove {
        from: String::new(),
        to: san.to_string(),
        reason: reason.to_string(),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::MoveKind;

    fn sq(name: &str) -> Square {
        Square::parse(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn san_of(fen: &str, from: &str, to: &str, kind: MoveKind) -> String {
        let p = pos(fen);
        let legal = movegen::legal_moves(&p);
        to_san(&p, Move::new(sq(from), sq(to), kind), &legal)
    }

    // -------------------------------------------------------------------
    // Generation
    // -------------------------------------------------------------------

    #[test]
    fn pawn_push() {
        assert_eq!(
            san_of(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "e2",
                "e4",
                MoveKind::DoublePush
            ),
            "e4"
        );
    }

    #[test]
    fn pawn_capture_prefixes_file() {
        assert_eq!(
            san_of(
                "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
                "e4",
                "d5",
                MoveKind::Capture
            ),
            "exd5"
        );
    }

    #[test]
    fn en_passant_reads_like_a_capture() {
        assert_eq!(
            san_of(
                "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
                "e5",
                "f6",
                MoveKind::EnPassant
            ),
            "exf6"
        );
    }

    #[test]
    fn promotion_suffix() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let legal = movegen::legal_moves(&p);
        let mv = Move::promoting(sq("e7"), sq("e8"), PieceKind::Queen, MoveKind::Quiet);
        assert_eq!(to_san(&p, mv, &legal), "e8=Q");
    }

    #[test]
    fn knight_move() {
        assert_eq!(
            san_of(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "g1",
                "f3",
                MoveKind::Quiet
            ),
            "Nf3"
        );
    }

    #[test]
    fn castling_notation() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, "e1", "g1", MoveKind::Castle), "O-O");
        assert_eq!(san_of(fen, "e1", "c1", MoveKind::Castle), "O-O-O");
    }

    #[test]
    fn file_disambiguation() {
        // Rooks on a1 and h1 both reach e1.
        assert_eq!(
            san_of("4k3/8/8/8/8/4K3/8/R6R w - - 0 1", "a1", "e1", MoveKind::Quiet),
            "Rae1"
        );
    }

    #[test]
    fn rank_disambiguation() {
        // Rooks on a1 and a8 both reach a4.
        assert_eq!(
            san_of("R3k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a4", MoveKind::Quiet),
            "R1a4"
        );
    }

    // -------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------

    #[test]
    fn parse_pawn_push() {
        let mv = from_san(&Position::starting(), "e4").unwrap();
        assert_eq!(mv.from, sq("e2"));
        assert_eq!(mv.to, sq("e4"));
        assert_eq!(mv.kind, MoveKind::DoublePush);
    }

    #[test]
    fn parse_knight_move() {
        let mv = from_san(&Position::starting(), "Nf3").unwrap();
        assert_eq!(mv.from, sq("g1"));
        assert_eq!(mv.to, sq("f3"));
    }

    #[test]
    fn parse_castle() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let mv = from_san(&p, "O-O").unwrap();
        assert!(mv.is_castle());
        assert_eq!(mv.to.file(), 6);
        let mv = from_san(&p, "0-0-0").unwrap();
        assert_eq!(mv.to.file(), 2);
    }

    #[test]
    fn parse_promotion() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let mv = from_san(&p, "e8=Q").unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        // Bare e8 is not a legal move: promotion is mandatory.
        assert!(from_san(&p, "e8").is_err());
    }

    #[test]
    fn parse_strips_annotations() {
        let p = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let mv = from_san(&p, "exd5+?").unwrap();
        assert_eq!(mv.to, sq("d5"));
        assert!(mv.is_capture());
    }

    #[test]
    fn parse_rejects_illegal() {
        assert!(from_san(&Position::starting(), "Qh5").is_err());
        assert!(from_san(&Position::starting(), "").is_err());
        assert!(from_san(&Position::starting(), "zz9").is_err());
    }

    #[test]
    fn parse_disambiguated() {
        let p = pos("4k3/8/8/8/8/4K3/8/R6R w - - 0 1");
        let mv = from_san(&p, "Rae1").unwrap();
        assert_eq!(mv.from, sq("a1"));
        let mv = from_san(&p, "Rhe1").unwrap();
        assert_eq!(mv.from, sq("h1"));
        // Missing hint is ambiguous.
        assert!(from_san(&p, "Re1").is_err());
    }

    // -------------------------------------------------------------------
    // Round-trip over whole move sets
    // -------------------------------------------------------------------

    #[test]
    fn round_trip_starting_position() {
        round_trip("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn round_trip_kiwipete() {
        round_trip("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    }

    #[test]
    fn round_trip_promotion_heavy() {
        round_trip("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
    }

    fn round_trip(fen: &str) {
        let p = pos(fen);
        let legal = movegen::legal_moves(&p);
        for mv in &legal {
            let text = to_san(&p, *mv, &legal);
            let parsed = from_san(&p, &text).unwrap_or_else(|e| panic!("'{text}' failed: {e}"));
            assert_eq!(parsed, *mv, "round-trip mismatch for '{text}'");
        }
    }
}
