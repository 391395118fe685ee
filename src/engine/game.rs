//! Game state machine.
//!
//! `Game` wraps a `Position` with everything one game needs beyond a single
//! board: signature history for threefold repetition, move records, and
//! status classification (checkmate, stalemate, the draw rules). It is the
//! type the match controller drives; the clock and resignation/draw-offer
//! results live a level up.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::san;
use crate::engine::types::{
    ChessError, Color, DrawReason, GameStatus, Move, PieceKind, Square,
};

// =========================================================================
// PlayedMove
// =========================================================================

/// One entry of the move history.
#[derive(Clone, Debug)]
pub struct PlayedMove {
    pub mv: Move,
    /// SAN at the time of playing, including `+`/`#` suffix.
    pub san: String,
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

/// A chess game from some starting position to a board-terminal state.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    status: GameStatus,
    history: Vec<PlayedMove>,
    /// Repetition keys of every position reached, the current one included.
    signatures: Vec<String>,
    starting_fen: String,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A fresh game from the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::starting())
    }

    /// A game from an arbitrary FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    fn from_position(position: Position) -> Self {
        let starting_fen = position.to_fen();
        let signatures = vec![position.repetition_key()];
        let mut game = Game {
            position,
            status: GameStatus::Active,
            history: Vec::new(),
            signatures,
            starting_fen,
        };
        game.status = game.classify();
        game
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    /// Terminal by board state (mate, stalemate, or a rule draw).
    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Is the side to move in check? Exposed separately from status so a
    /// UI can highlight the king.
    pub fn in_check(&self) -> bool {
        self.position.in_check(self.position.side_to_move)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.position)
    }

    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.position, from)
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.position.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.position.fullmove_number
    }

    // -----------------------------------------------------------------
    // Playing moves
    // -----------------------------------------------------------------

    /// Play by coordinates, the way a collaborator reports a click pair.
    ///
    /// Resolves `from`/`to` against the legal move set and enforces the
    /// promotion protocol: a promoting pawn move without a `promotion` kind
    /// fails with `InvalidPromotion` (the collaborator re-asks with a kind
    /// supplied), as does a kind supplied for a non-promoting move.
    ///
    /// Returns the SAN of the move played. Failure never mutates state.
    pub fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<String, ChessError> {
        if self.is_over() {
            return Err(ChessError::MatchOver(self.status.to_string()));
        }

        let legal = self.legal_moves();
        let candidates: Vec<Move> = legal
            .iter()
            .copied()
            .filter(|m| m.from == from && m.to == to)
            .collect();

        if candidates.is_empty() {
            return Err(ChessError::IllegalMove {
                from: from.name(),
                to: to.name(),
                reason: "not a legal move".into(),
            });
        }

        // Either every candidate promotes (a pawn reached the last rank) or
        // none does.
        let mv = if candidates[0].promotion.is_some() {
            let kind = promotion.ok_or_else(|| {
                ChessError::InvalidPromotion(format!(
                    "promotion piece required for {from} -> {to}"
                ))
            })?;
            candidates
                .into_iter()
                .find(|m| m.promotion == Some(kind))
                .ok_or_else(|| ChessError::InvalidPromotion(format!("cannot promote to {kind}")))?
        } else {
            if let Some(kind) = promotion {
                return Err(ChessError::InvalidPromotion(format!(
                    "{from} -> {to} is not a promoting move (got {kind})"
                )));
            }
            candidates[0]
        };

        Ok(self.commit(mv, &legal))
    }

    /// Play an exact generated `Move`.
    pub fn apply(&mut self, mv: Move) -> Result<String, ChessError> {
        if self.is_over() {
            return Err(ChessError::MatchOver(self.status.to_string()));
        }
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return Err(ChessError::IllegalMove {
                from: mv.from.name(),
                to: mv.to.name(),
                reason: "not a legal move".into(),
            });
        }
        Ok(self.commit(mv, &legal))
    }

    /// Apply a validated move and refresh all derived state.
    fn commit(&mut self, mv: Move, legal: &[Move]) -> String {
        let san = san::to_san(&self.position, mv, legal);

        self.position.apply(mv);
        self.signatures.push(self.position.repetition_key());
        self.status = self.classify();

        let san = match self.status {
            GameStatus::Checkmate => format!("{san}#"),
            GameStatus::Check => format!("{san}+"),
            _ => san,
        };

        self.history.push(PlayedMove {
            mv,
            san: san.clone(),
            status_after: self.status,
        });
        san
    }

    // -----------------------------------------------------------------
    // Status classification
    // -----------------------------------------------------------------

    fn classify(&self) -> GameStatus {
        let in_check = self.in_check();

        if movegen::legal_moves(&self.position).is_empty() {
            return if in_check {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }

        // 50 full moves per side without a capture or pawn move.
        if self.position.halfmove_clock >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }

        if self.current_repetitions() >= 3 {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }

        if self.insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }

        if in_check {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    /// How often the current position (placement + side to move + castling
    /// + en passant) has occurred, the present occurrence included.
    fn current_repetitions(&self) -> usize {
        let current = self.signatures.last().expect("signatures never empty");
        self.signatures.iter().filter(|s| *s == current).count()
    }

    /// Dead-position check. Auto-draws: K vs K, K+B vs K, K+N vs K, and
    /// K+B vs K+B with both bishops on the same square colour. Two knights
    /// against a lone king can still mate and is not auto-drawn.
    fn insufficient_material(&self) -> bool {
        let pos = &self.position;

        for color in [Color::White, Color::Black] {
            if pos.bb(color, PieceKind::Pawn).any()
                || pos.bb(color, PieceKind::Rook).any()
                || pos.bb(color, PieceKind::Queen).any()
            {
                return false;
            }
        }

        let w_bishops = pos.bb(Color::White, PieceKind::Bishop);
        let b_bishops = pos.bb(Color::Black, PieceKind::Bishop);
        let w_minor = pos.bb(Color::White, PieceKind::Knight).count() + w_bishops.count();
        let b_minor = pos.bb(Color::Black, PieceKind::Knight).count() + b_bishops.count();

        // K vs K, or a single minor on one side only.
        if w_minor + b_minor <= 1 {
            return true;
        }

        // K+B vs K+B with same-coloured bishops.
        if w_minor == 1 && b_minor == 1 && w_bishops.count() == 1 && b_bishops.count() == 1 {
            let shade = |sq: Square| (sq.rank() + sq.file()) & 1;
            return shade(w_bishops.first().unwrap()) == shade(b_bishops.first().unwrap());
        }

        false
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
