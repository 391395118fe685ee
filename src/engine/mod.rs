pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod san;
pub mod types;

pub use board::Position;
pub use game::{Game, PlayedMove};
pub use movegen::{legal_moves, legal_moves_from};
pub use types::*;
