//! Winning line analysis for Tic-Tac-Toe

use super::{Board, Cell, Mark};

/// Winning line indices on the 3x3 board
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Utility for analyzing winning lines in Tic-Tac-Toe
pub struct LineAnalyzer;

impl LineAnalyzer {
    /// Check if a mark has three in a row
    pub fn has_won(cells: &[Cell; 9], mark: Mark) -> bool {
        let target = mark.to_cell();
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|&idx| cells[idx] == target))
    }

    /// First position that completes a line for `mark`
    pub fn winning_move(board: &Board, mark: Mark) -> Option<usize> {
        WINNING_LINES
            .iter()
            .find_map(|line| Self::open_pair(&board.cells, mark, line))
    }

    /// Does playing `pos` leave two of `mark` plus one empty cell on some line?
    ///
    /// False when `pos` is out of range or occupied.
    pub fn creates_threat(board: &Board, pos: usize, mark: Mark) -> bool {
        let Ok(next) = board.apply_mark(pos, mark) else {
            return false;
        };
        WINNING_LINES
            .iter()
            .any(|line| Self::open_pair(&next.cells, mark, line).is_some())
    }

    /// Does playing `pos` close an opponent two-in-a-row?
    ///
    /// Some line through `pos` held two opponent marks and one empty cell
    /// before the move, and afterwards holds two opponent marks and no empty.
    pub fn blocks_threat(board: &Board, pos: usize, mark: Mark) -> bool {
        let Ok(next) = board.apply_mark(pos, mark) else {
            return false;
        };
        let opponent = mark.opponent();

        WINNING_LINES
            .iter()
            .filter(|line| line.contains(&pos))
            .any(|line| {
                let before = Self::count(&board.cells, line);
                let after = Self::count(&next.cells, line);
                let threat = match opponent {
                    Mark::O => before.o == 2,
                    Mark::X => before.x == 2,
                } && before.empty == 1;
                let closed = match opponent {
                    Mark::O => after.o == 2,
                    Mark::X => after.x == 2,
                } && after.empty == 0;
                threat && closed
            })
    }

    /// The empty cell of a line holding exactly two of `mark`
    fn open_pair(cells: &[Cell; 9], mark: Mark, line: &[usize; 3]) -> Option<usize> {
        let target = mark.to_cell();
        let mut count = 0;
        let mut empty_pos = None;

        for &idx in line {
            match cells[idx] {
                Cell::Empty => {
                    if empty_pos.is_some() {
                        return None;
                    }
                    empty_pos = Some(idx);
                }
                c if c == target => count += 1,
                _ => return None,
            }
        }

        if count == 2 { empty_pos } else { None }
    }

    fn count(cells: &[Cell; 9], line: &[usize; 3]) -> LineCount {
        let mut count = LineCount::default();
        for &idx in line {
            match cells[idx] {
                Cell::Empty => count.empty += 1,
                Cell::O => count.o += 1,
                Cell::X => count.x += 1,
            }
        }
        count
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct LineCount {
    o: usize,
    x: usize,
    empty: usize,
}
