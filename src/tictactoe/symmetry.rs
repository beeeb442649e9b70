//! Rotational symmetry of the board
//!
//! The four quarter-turn rotations are precomputed as static permutation
//! tables mapping an old position to its new position.

use serde::{Deserialize, Serialize};

use super::board::{Board, Cell};

/// Old position -> new position for each rotation, clockwise.
pub const ROTATION_TABLES: [[usize; 9]; 4] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
    [8, 7, 6, 5, 4, 3, 2, 1, 0],
    [6, 3, 0, 7, 4, 1, 8, 5, 2],
];

/// A clockwise rotation of the board by a multiple of 90 degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// All four rotations, identity first
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// The three non-identity rotations used for augmentation
    pub const AUGMENTATIONS: [Rotation; 3] = [Rotation::R90, Rotation::R180, Rotation::R270];

    fn quarter_turns(self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    fn from_quarter_turns(turns: usize) -> Self {
        Self::ALL[turns % 4]
    }

    /// Rotation equivalent to applying `self` then `other`
    pub fn compose(self, other: Rotation) -> Rotation {
        Self::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    pub fn inverse(self) -> Rotation {
        Self::from_quarter_turns(4 - self.quarter_turns())
    }

    /// Apply rotation to a position (0-8)
    pub fn rotate_position(self, pos: usize) -> usize {
        ROTATION_TABLES[self.quarter_turns()][pos]
    }

    /// Apply rotation to a board
    pub fn rotate_board(self, board: &Board) -> Board {
        let table = &ROTATION_TABLES[self.quarter_turns()];
        let mut cells = [Cell::Empty; 9];
        for (old, &cell) in board.cells.iter().enumerate() {
            cells[table[old]] = cell;
        }
        Board::from_cells(cells)
    }
}

/// Values that can be carried through a board rotation
pub trait Rotate {
    #[must_use]
    fn rotated(&self, rotation: Rotation) -> Self;
}

impl Rotate for Board {
    fn rotated(&self, rotation: Rotation) -> Self {
        rotation.rotate_board(self)
    }
}

impl Rotate for usize {
    fn rotated(&self, rotation: Rotation) -> Self {
        rotation.rotate_position(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::Mark;

    #[test]
    fn test_tables_match_geometry() {
        // clockwise: (row, col) -> (col, 2 - row)
        for rotation in Rotation::ALL {
            for pos in 0..9 {
                let (mut row, mut col) = (pos / 3, pos % 3);
                for _ in 0..rotation.quarter_turns() {
                    let new_row = col;
                    let new_col = 2 - row;
                    row = new_row;
                    col = new_col;
                }
                assert_eq!(rotation.rotate_position(pos), row * 3 + col);
            }
        }
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let board: Board = "OX..O.X..".parse().unwrap();
        let mut rotated = board;
        for _ in 0..4 {
            rotated = rotated.rotated(Rotation::R90);
        }
        assert_eq!(rotated, board);

        for pos in 0..9 {
            let mut p = pos;
            for _ in 0..4 {
                p = p.rotated(Rotation::R90);
            }
            assert_eq!(p, pos);
        }
    }

    #[test]
    fn test_compose_and_inverse() {
        assert_eq!(Rotation::R90.compose(Rotation::R90), Rotation::R180);
        assert_eq!(Rotation::R270.compose(Rotation::R180), Rotation::R90);
        for rotation in Rotation::ALL {
            assert_eq!(rotation.compose(rotation.inverse()), Rotation::R0);
        }
    }

    #[test]
    fn test_rotation_moves_marks_with_positions() {
        let board = Board::new().apply_mark(0, Mark::O).unwrap();
        let rotated = board.rotated(Rotation::R90);
        assert_eq!(rotated.get(2), Cell::O);
        assert_eq!(rotated.occupied_count(), 1);
    }
}
