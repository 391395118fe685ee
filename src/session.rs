//! Match controller.
//!
//! `MatchSession` drives one game end-to-end: it owns the `Game` and the
//! `ChessClock`, validates move intents coming from a collaborator (UI,
//! test harness), advances the clock on every committed move, and latches
//! the final `MatchResult` — whether it comes from the board (mate,
//! stalemate, rule draw), the clock, or the players (agreed draw,
//! resignation). The collaborator owns all rendering and scheduling; it
//! talks to the session exclusively through these methods.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{ChessClock, ClockSnapshot};
use crate::config::MatchConfig;
use crate::engine::game::Game;
use crate::engine::types::{
    ChessError, Color, DrawReason, GameStatus, Move, PieceKind, Square,
};

// =========================================================================
// MatchResult
// =========================================================================

/// Why a match is drawn (board rules plus mutual agreement).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
    Agreement,
}

impl From<DrawReason> for DrawKind {
    fn from(reason: DrawReason) -> Self {
        match reason {
            DrawReason::FiftyMoveRule => DrawKind::FiftyMoveRule,
            DrawReason::ThreefoldRepetition => DrawKind::ThreefoldRepetition,
            DrawReason::InsufficientMaterial => DrawKind::InsufficientMaterial,
        }
    }
}

/// Final outcome of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchResult {
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawKind),
    Timeout { loser: Color },
    Resignation { loser: Color },
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            MatchResult::Stalemate => write!(f, "stalemate"),
            MatchResult::Draw(DrawKind::FiftyMoveRule) => write!(f, "draw by fifty-move rule"),
            MatchResult::Draw(DrawKind::ThreefoldRepetition) => write!(f, "draw by repetition"),
            MatchResult::Draw(DrawKind::InsufficientMaterial) => {
                write!(f, "draw by insufficient material")
            }
            MatchResult::Draw(DrawKind::Agreement) => write!(f, "draw by agreement"),
            MatchResult::Timeout { loser } => write!(f, "{loser} loses on time"),
            MatchResult::Resignation { loser } => write!(f, "{loser} resigns"),
        }
    }
}

// =========================================================================
// MoveOutcome
// =========================================================================

/// What a collaborator gets back from a successful move: the updated board,
/// whose turn it is, and the final result if the move ended the match.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    /// SAN of the move just played, with `+`/`#` suffix.
    pub san: String,
    /// Position after the move.
    pub fen: String,
    /// 8×8 grid, rank 8 first; pieces encoded like "wP", "bK".
    pub board: Vec<Vec<Option<String>>>,
    /// Side to move after this move (meaningless once `result` is set).
    pub turn: Color,
    /// Board-level status string ("active", "check", "checkmate", …).
    pub status: String,
    /// Set when this move ended the match.
    pub result: Option<MatchResult>,
    pub clock: ClockSnapshot,
}

// =========================================================================
// MatchSession
// =========================================================================

/// One match from setup to final result.
///
/// Single-owner: the session is synchronous and never shares its game or
/// clock state. A server embedding it must confine each session to one
/// owner.
pub struct MatchSession {
    id: String,
    config: MatchConfig,
    game: Game,
    clock: ChessClock,
    result: Option<MatchResult>,
    created_at: DateTime<Utc>,
}

impl MatchSession {
    /// Start a match; White's clock begins running at `now`.
    pub fn new(config: MatchConfig, now: Instant) -> Self {
        let session = MatchSession {
            id: Uuid::new_v4().to_string(),
            clock: ChessClock::new(config.allowance, now),
            game: Game::new(),
            result: None,
            created_at: Utc::now(),
            config,
        };
        tracing::info!(
            id = %session.id,
            white = %session.config.white_name,
            black = %session.config.black_name,
            allowance_secs = session.config.allowance.as_secs(),
            "match started"
        );
        session
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn side_to_move(&self) -> Color {
        self.game.side_to_move()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display name of a side.
    pub fn player_name(&self, side: Color) -> &str {
        match side {
            Color::White => &self.config.white_name,
            Color::Black => &self.config.black_name,
        }
    }

    /// Clock view without charging (for rendering between ticks).
    pub fn clock(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    /// Legal moves starting on `from`, for move highlighting.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        self.game.legal_moves_from(from)
    }

    // -----------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------

    /// Attempt a move by coordinates.
    ///
    /// An illegal attempt (including the missing-promotion case) returns
    /// the error and mutates nothing — the collaborator re-prompts. On
    /// success the mover's clock is charged up to `now` and the opponent's
    /// starts; if the move or the clock ended the match, the outcome
    /// carries the result.
    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        now: Instant,
    ) -> Result<MoveOutcome, ChessError> {
        if let Some(result) = self.result {
            return Err(ChessError::MatchOver(result.to_string()));
        }

        // A flag that already fell takes precedence over the move.
        let snap = self.clock.tick(now);
        if let Some(loser) = snap.timed_out {
            self.finish(MatchResult::Timeout { loser });
            return Err(ChessError::MatchOver(
                self.result.expect("just set").to_string(),
            ));
        }

        let san = self.game.play(from, to, promotion)?;
        self.clock.press(now);

        tracing::debug!(id = %self.id, %san, "move played");

        if let Some(result) = board_result(self.game.status(), self.game.side_to_move()) {
            self.finish(result);
        }

        Ok(self.outcome(san))
    }

    // -----------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------

    /// Charge the running clock up to `now`. Call this at a sub-second
    /// cadence for display fidelity; the charge itself is elapsed-based,
    /// so missed or irregular calls lose nothing.
    pub fn tick(&mut self, now: Instant) -> ClockSnapshot {
        if self.result.is_some() {
            return self.clock.snapshot();
        }
        let snap = self.clock.tick(now);
        if let Some(loser) = snap.timed_out {
            self.finish(MatchResult::Timeout { loser });
        }
        snap
    }

    // -----------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------

    /// Resolve a draw proposal. Acceptance ends the match immediately,
    /// whatever the board says.
    pub fn propose_draw(&mut self, accepted: bool) -> Option<MatchResult> {
        if self.result.is_none() && accepted {
            self.finish(MatchResult::Draw(DrawKind::Agreement));
        }
        self.result
    }

    /// `side` resigns.
    pub fn resign(&mut self, side: Color) -> MatchResult {
        if self.result.is_none() {
            self.finish(MatchResult::Resignation { loser: side });
        }
        self.result.expect("set above or already present")
    }

    /// Throw away the current game and clocks and start over with the
    /// configured allowance.
    pub fn restart(&mut self, now: Instant) {
        self.game = Game::new();
        self.clock.reset(self.config.allowance, now);
        self.result = None;
        tracing::info!(id = %self.id, "match restarted");
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn finish(&mut self, result: MatchResult) {
        self.clock.halt();
        self.result = Some(result);
        tracing::info!(id = %self.id, %result, "match finished");
    }

    fn outcome(&self, san: String) -> MoveOutcome {
        MoveOutcome {
            san,
            fen: self.game.to_fen(),
            board: self.board_codes(),
            turn: self.game.side_to_move(),
            status: self.game.status().as_str().to_string(),
            result: self.result,
            clock: self.clock.snapshot(),
        }
    }

    /// Board as "wP"/"bK" codes, rank 8 first, for collaborators that
    /// render from serialized state.
    fn board_codes(&self) -> Vec<Vec<Option<String>>> {
        self.game
            .position()
            .board_grid()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        cell.map(|piece| {
                            let side = match piece.color {
                                Color::White => 'w',
                                Color::Black => 'b',
                            };
                            let kind = piece.kind.fen_char(Color::White);
                            format!("{side}{kind}")
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Map a terminal board status to a match result. `to_move` is the side to
/// move *after* the terminal position arose (the mated side).
fn board_result(status: GameStatus, to_move: Color) -> Option<MatchResult> {
    match status {
        GameStatus::Checkmate => Some(MatchResult::Checkmate {
            winner: !to_move,
        }),
        GameStatus::Stalemate => Some(MatchResult::Stalemate),
        GameStatus::Draw(reason) => Some(MatchResult::Draw(reason.into())),
        GameStatus::Active | GameStatus::Check => None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sq(name: &str) -> Square {
        Square::parse(name).unwrap()
    }

    fn session(allowance_secs: u64, start: Instant) -> MatchSession {
        MatchSession::new(
            MatchConfig {
                allowance: Duration::from_secs(allowance_secs),
                ..MatchConfig::default()
            },
            start,
        )
    }

    fn step(
        s: &mut MatchSession,
        from: &str,
        to: &str,
        now: Instant,
    ) -> MoveOutcome {
        s.attempt_move(sq(from), sq(to), None, now)
            .unwrap_or_else(|e| panic!("{from}{to} failed: {e}"))
    }

    // -----------------------------------------------------------------
    // Basic flow
    // -----------------------------------------------------------------

    #[test]
    fn new_session_is_live() {
        let s = session(300, Instant::now());
        assert!(!s.is_over());
        assert_eq!(s.result(), None);
        assert_eq!(s.side_to_move(), Color::White);
        assert_eq!(s.player_name(Color::White), "Player 1");
        assert_eq!(s.player_name(Color::Black), "Player 2");
        assert!(!s.id().is_empty());
    }

    #[test]
    fn moves_alternate_and_charge_the_mover() {
        let start = Instant::now();
        let mut s = session(300, start);

        let out = step(&mut s, "e2", "e4", start + Duration::from_secs(10));
        assert_eq!(out.san, "e4");
        assert_eq!(out.turn, Color::Black);
        assert_eq!(out.result, None);
        assert_eq!(out.clock.white_remaining_ms, 290_000);
        assert_eq!(out.clock.black_remaining_ms, 300_000);

        let out = step(&mut s, "e7", "e5", start + Duration::from_secs(14));
        assert_eq!(out.clock.black_remaining_ms, 296_000);
        assert_eq!(out.clock.white_remaining_ms, 290_000);
    }

    #[test]
    fn illegal_move_changes_nothing() {
        let start = Instant::now();
        let mut s = session(300, start);
        let fen_before = s.game().to_fen();

        let err = s
            .attempt_move(sq("e2"), sq("e5"), None, start + Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ChessError::IllegalMove { .. }));
        assert_eq!(s.game().to_fen(), fen_before);
        assert_eq!(s.side_to_move(), Color::White);
        // The running clock still charges on the next tick, from the
        // original start.
        let snap = s.tick(start + Duration::from_secs(2));
        assert_eq!(snap.white_remaining_ms, 298_000);
    }

    #[test]
    fn legal_moves_from_supports_highlighting() {
        let s = session(300, Instant::now());
        assert_eq!(s.legal_moves_from(sq("e2")).len(), 2);
        assert_eq!(s.legal_moves_from(sq("e5")).len(), 0);
    }

    // -----------------------------------------------------------------
    // Terminal outcomes
    // -----------------------------------------------------------------

    #[test]
    fn scholars_mate_ends_the_match() {
        let start = Instant::now();
        let mut s = session(300, start);
        let mut t = start;
        for (from, to) in [
            ("e2", "e4"),
            ("e7", "e5"),
            ("f1", "c4"),
            ("b8", "c6"),
            ("d1", "h5"),
            ("g8", "f6"),
        ] {
            t += Duration::from_secs(1);
            step(&mut s, from, to, t);
        }
        let out = step(&mut s, "h5", "f7", t + Duration::from_secs(1));
        assert_eq!(out.san, "Qxf7#");
        assert_eq!(out.status, "checkmate");
        assert_eq!(
            out.result,
            Some(MatchResult::Checkmate {
                winner: Color::White
            })
        );
        assert!(s.is_over());

        // Further moves are refused.
        let err = s
            .attempt_move(sq("e8"), sq("f7"), None, t + Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, ChessError::MatchOver(_)));
    }

    #[test]
    fn timeout_reported_by_tick() {
        let start = Instant::now();
        let mut s = session(60, start);
        let snap = s.tick(start + Duration::from_secs(61));
        assert_eq!(snap.timed_out, Some(Color::White));
        assert_eq!(snap.white_remaining_ms, 0);
        assert_eq!(s.result(), Some(MatchResult::Timeout { loser: Color::White }));
    }

    #[test]
    fn flag_fall_beats_a_late_move() {
        let start = Instant::now();
        let mut s = session(60, start);
        let err = s
            .attempt_move(sq("e2"), sq("e4"), None, start + Duration::from_secs(75))
            .unwrap_err();
        assert!(matches!(err, ChessError::MatchOver(_)));
        assert_eq!(s.result(), Some(MatchResult::Timeout { loser: Color::White }));
    }

    #[test]
    fn inactive_side_never_times_out() {
        let start = Instant::now();
        let mut s = session(60, start);
        step(&mut s, "e2", "e4", start + Duration::from_secs(30));
        // Black is now running; White sits at 30s forever.
        let snap = s.tick(start + Duration::from_secs(95));
        assert_eq!(snap.timed_out, Some(Color::Black));
        assert_eq!(snap.white_remaining_ms, 30_000);
        assert_eq!(s.result(), Some(MatchResult::Timeout { loser: Color::Black }));
    }

    #[test]
    fn draw_agreement_ends_immediately() {
        let start = Instant::now();
        let mut s = session(300, start);
        step(&mut s, "e2", "e4", start + Duration::from_secs(1));

        assert_eq!(s.propose_draw(false), None);
        assert!(!s.is_over());

        assert_eq!(
            s.propose_draw(true),
            Some(MatchResult::Draw(DrawKind::Agreement))
        );
        assert!(s.is_over());
    }

    #[test]
    fn resignation_names_the_loser() {
        let start = Instant::now();
        let mut s = session(300, start);
        let result = s.resign(Color::Black);
        assert_eq!(result, MatchResult::Resignation { loser: Color::Black });
        assert!(s.is_over());
        // Resigning twice does not overwrite the result.
        assert_eq!(s.resign(Color::White), result);
    }

    #[test]
    fn result_freezes_the_clock() {
        let start = Instant::now();
        let mut s = session(300, start);
        step(&mut s, "e2", "e4", start + Duration::from_secs(10));
        s.resign(Color::Black);
        let snap = s.tick(start + Duration::from_secs(500));
        assert_eq!(snap.timed_out, None);
        assert_eq!(snap.black_remaining_ms, 300_000);
    }

    // -----------------------------------------------------------------
    // Promotion protocol
    // -----------------------------------------------------------------

    #[test]
    fn promotion_needs_two_steps_without_a_kind() {
        let start = Instant::now();
        let mut s = session(300, start);
        // March the h-pawn: 1. h4 g5 2. hxg5 a6 3. g6 a5 4. g7 a4 5. gxh8=Q
        let mut t = start;
        for (from, to) in [
            ("h2", "h4"),
            ("g7", "g5"),
            ("h4", "g5"),
            ("a7", "a6"),
            ("g5", "g6"),
            ("a6", "a5"),
            ("g6", "g7"),
            ("a5", "a4"),
        ] {
            t += Duration::from_secs(1);
            step(&mut s, from, to, t);
        }

        t += Duration::from_secs(1);
        let err = s.attempt_move(sq("g7"), sq("h8"), None, t).unwrap_err();
        assert!(matches!(err, ChessError::InvalidPromotion(_)));
        assert_eq!(s.side_to_move(), Color::White, "failed attempt is a no-op");

        let out = s
            .attempt_move(sq("g7"), sq("h8"), Some(PieceKind::Queen), t)
            .unwrap();
        assert_eq!(out.san, "gxh8=Q");
        assert_eq!(out.turn, Color::Black);
    }

    // -----------------------------------------------------------------
    // Restart
    // -----------------------------------------------------------------

    #[test]
    fn restart_resets_board_clock_and_result() {
        let start = Instant::now();
        let mut s = session(60, start);
        step(&mut s, "e2", "e4", start + Duration::from_secs(10));
        s.resign(Color::White);
        assert!(s.is_over());

        let later = start + Duration::from_secs(20);
        s.restart(later);
        assert!(!s.is_over());
        assert_eq!(s.result(), None);
        assert_eq!(
            s.game().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        let snap = s.tick(later + Duration::from_secs(1));
        assert_eq!(snap.white_remaining_ms, 59_000);
        assert_eq!(snap.black_remaining_ms, 60_000);
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    #[test]
    fn outcome_serializes_camel_case() {
        let start = Instant::now();
        let mut s = session(300, start);
        let out = step(&mut s, "e2", "e4", start + Duration::from_secs(1));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["san"], "e4");
        assert_eq!(json["turn"], "black");
        assert_eq!(json["status"], "active");
        assert_eq!(json["result"], serde_json::Value::Null);
        assert_eq!(json["board"][7][4], "wK");
        assert_eq!(json["board"][4][4], "wP"); // the pawn on e4
        assert_eq!(json["clock"]["whiteRemainingMs"], 299_000);
    }

    #[test]
    fn results_serialize_with_stable_tags() {
        let mate = serde_json::to_value(MatchResult::Checkmate {
            winner: Color::White,
        })
        .unwrap();
        assert_eq!(mate["checkmate"]["winner"], "white");

        let draw = serde_json::to_value(MatchResult::Draw(DrawKind::Agreement)).unwrap();
        assert_eq!(draw["draw"], "agreement");

        let timeout = serde_json::to_value(MatchResult::Timeout {
            loser: Color::Black,
        })
        .unwrap();
        assert_eq!(timeout["timeout"]["loser"], "black");
    }
}
