//! Board representation and the pure rules over it

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A cell on the Tic-Tac-Toe board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    O,
    X,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::O => 'O',
            Cell::X => 'X',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | ' ' | '_' => Some(Cell::Empty),
            'O' | 'o' => Some(Cell::O),
            'X' | 'x' => Some(Cell::X),
            _ => None,
        }
    }

    /// The mark occupying this cell, if any
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::O => Some(Mark::O),
            Cell::X => Some(Mark::X),
        }
    }
}

/// One of the two player symbols.
///
/// `O` is the conventional first mover (mark A) and `X` the second (mark B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    O,
    X,
}

impl Mark {
    /// Get the opposing mark
    pub fn opponent(self) -> Mark {
        match self {
            Mark::O => Mark::X,
            Mark::X => Mark::O,
        }
    }

    pub fn to_cell(self) -> Cell {
        match self {
            Mark::O => Cell::O,
            Mark::X => Cell::X,
        }
    }

    pub fn to_char(self) -> char {
        self.to_cell().to_char()
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl FromStr for Mark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "O" | "o" => Ok(Mark::O),
            "X" | "x" => Ok(Mark::X),
            other => Err(Error::InvalidMark {
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable 3x3 board value.
///
/// Positions are numbered row-major from 0 (top left) to 8 (bottom right).
/// `Copy` keeps snapshots cheap; every mutation produces a new board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    pub cells: [Cell; 9],
}

/// Reject positions outside 0-8
pub(crate) fn check_position(pos: usize) -> Result<()> {
    if pos >= 9 {
        return Err(Error::InvalidPosition { position: pos });
    }
    Ok(())
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; 9],
        }
    }

    pub fn from_cells(cells: [Cell; 9]) -> Self {
        Board { cells }
    }

    /// Get cell at position (0-8)
    ///
    /// # Panics
    ///
    /// If `pos` is 9 or more. Use [`Board::apply_mark`] for positions that
    /// have not been checked.
    pub fn get(&self, pos: usize) -> Cell {
        self.cells[pos]
    }

    /// Check if a position is empty
    ///
    /// # Panics
    ///
    /// If `pos` is 9 or more.
    pub fn is_empty(&self, pos: usize) -> bool {
        self.cells[pos] == Cell::Empty
    }

    /// Empty positions in ascending order
    pub fn legal_moves(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Cell::Empty).count()
    }

    pub fn is_full(&self) -> bool {
        !self.cells.contains(&Cell::Empty)
    }

    /// Place `mark` at `pos` and return the new board.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPosition`] when `pos` is outside 0-8
    /// - [`Error::InvalidMove`] when the cell is already occupied
    #[must_use = "apply_mark returns a new board; the original is unchanged"]
    pub fn apply_mark(&self, pos: usize, mark: Mark) -> Result<Board> {
        check_position(pos)?;
        if !self.is_empty(pos) {
            return Err(Error::InvalidMove { position: pos });
        }

        let mut next = *self;
        next.cells[pos] = mark.to_cell();
        Ok(next)
    }

    /// Check if a mark has three in a row
    pub fn has_won(&self, mark: Mark) -> bool {
        super::lines::LineAnalyzer::has_won(&self.cells, mark)
    }

    /// The mark owning the first completed line, if any
    pub fn winner(&self) -> Option<Mark> {
        super::lines::WINNING_LINES.iter().find_map(|line| {
            let first = self.cells[line[0]];
            if first != Cell::Empty && line.iter().all(|&idx| self.cells[idx] == first) {
                first.mark()
            } else {
                None
            }
        })
    }

    /// Reconstruct the single move that turns `before` into `after`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousTransition`] unless exactly one cell differs
    /// and that cell went from empty to a mark.
    pub fn infer_move(before: &Board, after: &Board) -> Result<usize> {
        let changed: Vec<usize> = (0..9)
            .filter(|&i| before.cells[i] != after.cells[i])
            .collect();

        match changed.as_slice() {
            [pos] if before.cells[*pos] == Cell::Empty => Ok(*pos),
            [pos] => Err(Error::AmbiguousTransition {
                reason: format!(
                    "cell {} changed from {} to {}",
                    pos,
                    before.cells[*pos].to_char(),
                    after.cells[*pos].to_char()
                ),
            }),
            [] => Err(Error::AmbiguousTransition {
                reason: "boards are identical".to_string(),
            }),
            many => Err(Error::AmbiguousTransition {
                reason: format!("{} cells changed", many.len()),
            }),
        }
    }

    /// Canonical 9-character encoding used as a table key
    pub fn encode(&self) -> String {
        self.cells.iter().map(|&c| c.to_char()).collect()
    }
}

/// True iff nobody has won and all nine cells have been played.
pub fn is_draw(move_count: usize, winner: Option<Mark>) -> bool {
    winner.is_none() && move_count >= 9
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Board {
    type Err = Error;

    /// Parse the encoding produced by [`Board::encode`]. Whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != 9 {
            return Err(Error::InvalidMark {
                value: s.to_string(),
            });
        }

        let mut cells = [Cell::Empty; 9];
        for (i, &c) in chars.iter().enumerate() {
            cells[i] = Cell::from_char(c).ok_or_else(|| Error::InvalidMark {
                value: c.to_string(),
            })?;
        }
        Ok(Board { cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &cell) in self.cells.iter().enumerate() {
            write!(f, "{}", cell.to_char())?;
            if (i + 1).is_multiple_of(3) && i < 8 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
