//! Two-player timed chess.
//!
//! A self-contained rules engine (board, move generation, legality,
//! terminal-state classification), a two-sided chess clock driven by
//! caller-supplied timestamps, and a match controller that ties them into
//! one game with a final result. UI is a collaborator: it renders state,
//! feeds move intents and clock ticks in, and handles the typed errors it
//! gets back.

pub mod clock;
pub mod config;
pub mod engine;
pub mod session;

pub use clock::{ChessClock, ClockSnapshot};
pub use config::MatchConfig;
pub use engine::{
    ChessError, Color, Game, GameStatus, Move, Piece, PieceKind, Position, Square,
};
pub use session::{DrawKind, MatchResult, MatchSession, MoveOutcome};
