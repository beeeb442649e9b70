//! Tic-Tac-Toe rules and game state machine

pub mod board;
pub mod engine;
pub mod game;
pub mod lines;
pub mod symmetry;

pub use board::{Board, Cell, Mark, is_draw};
pub use game::{GameOutcome, GameResult, GameState};
pub use lines::{LineAnalyzer, WINNING_LINES};
pub use symmetry::{ROTATION_TABLES, Rotate, Rotation};
