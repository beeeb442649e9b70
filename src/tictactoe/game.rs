//! Game state machine
//!
//! A [`GameState`] is a value: [`GameState::step`] never mutates, it returns
//! the successor state. Illegal clicks on occupied cells and moves after the
//! game has ended are silently ignored; only out-of-range positions fail.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::{Board, Mark, check_position, is_draw};
use crate::Result;

/// Game outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Mark),
    Draw,
}

impl GameOutcome {
    /// Terminal reward from `mark`'s point of view: +1 win, 0 draw, -1 loss
    pub fn reward_for(self, mark: Mark) -> f64 {
        match self {
            GameOutcome::Win(winner) if winner == mark => 1.0,
            GameOutcome::Win(_) => -1.0,
            GameOutcome::Draw => 0.0,
        }
    }

    /// Result label as seen by `mark`
    pub fn result_for(self, mark: Mark) -> GameResult {
        match self {
            GameOutcome::Win(winner) if winner == mark => GameResult::Win,
            GameOutcome::Win(_) => GameResult::Loss,
            GameOutcome::Draw => GameResult::Draw,
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Win(mark) => write!(f, "{mark} is the winner"),
            GameOutcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Outcome relative to one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Win,
    Draw,
    Loss,
}

/// Snapshot of a game in progress or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    /// Mark to move next (unchanged once terminal)
    pub turn: Mark,
    pub move_count: usize,
    pub outcome: Option<GameOutcome>,
}

impl GameState {
    /// Empty board with `first` to move
    pub fn new(first: Mark) -> Self {
        Self {
            board: Board::new(),
            turn: first,
            move_count: 0,
            outcome: None,
        }
    }

    /// Start a game with O to move, or a random first mover
    pub fn initial<R: Rng + ?Sized>(random_first: bool, rng: &mut R) -> Self {
        let first = if random_first && rng.random::<bool>() {
            Mark::X
        } else {
            Mark::O
        };
        Self::new(first)
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Apply one move for the mark whose turn it is.
    ///
    /// Returns the state unchanged when the game is over or `pos` is taken.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidPosition`] if `pos` is outside 0-8.
    #[must_use = "step returns the next state; the original is unchanged"]
    pub fn step(&self, pos: usize) -> Result<GameState> {
        check_position(pos)?;
        if self.is_terminal() || !self.board.is_empty(pos) {
            return Ok(*self);
        }

        let board = self.board.apply_mark(pos, self.turn)?;
        let move_count = self.move_count + 1;
        let winner = board.winner();
        let outcome = match winner {
            Some(mark) => Some(GameOutcome::Win(mark)),
            None if is_draw(move_count, winner) => Some(GameOutcome::Draw),
            None => None,
        };
        let turn = if outcome.is_some() {
            self.turn
        } else {
            self.turn.opponent()
        };

        Ok(GameState {
            board,
            turn,
            move_count,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn play(first: Mark, moves: &[usize]) -> GameState {
        moves.iter().fold(GameState::new(first), |state, &pos| {
            state.step(pos).unwrap()
        })
    }

    #[test]
    fn test_step_flips_turn() {
        let state = GameState::new(Mark::O).step(4).unwrap();
        assert_eq!(state.turn, Mark::X);
        assert_eq!(state.move_count, 1);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_scripted_win_for_first_mover() {
        let state = play(Mark::O, &[0, 3, 1, 4, 2]);
        assert_eq!(state.outcome, Some(GameOutcome::Win(Mark::O)));
        assert_eq!(state.move_count, 5);
        assert!(state.is_terminal());
        assert_eq!(state.turn, Mark::O);
    }

    #[test]
    fn test_full_board_draw() {
        let state = play(Mark::O, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(state.outcome, Some(GameOutcome::Draw));
        assert_eq!(state.move_count, 9);
    }

    #[test]
    fn test_occupied_and_terminal_are_noops() {
        let state = GameState::new(Mark::O).step(0).unwrap();
        assert_eq!(state.step(0).unwrap(), state);

        let finished = play(Mark::O, &[0, 3, 1, 4, 2]);
        assert_eq!(finished.step(8).unwrap(), finished);
    }

    #[test]
    fn test_out_of_range_is_precondition_error() {
        let err = GameState::new(Mark::O).step(9).unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn test_initial_fixed_first_mover() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(GameState::initial(false, &mut rng).turn, Mark::O);
        }
    }

    #[test]
    fn test_rewards_by_perspective() {
        let outcome = GameOutcome::Win(Mark::X);
        assert_eq!(outcome.reward_for(Mark::X), 1.0);
        assert_eq!(outcome.reward_for(Mark::O), -1.0);
        assert_eq!(GameOutcome::Draw.reward_for(Mark::O), 0.0);
        assert_eq!(outcome.result_for(Mark::O), GameResult::Loss);
    }
}
