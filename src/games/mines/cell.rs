use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::models::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    #[default]
    Hidden,
    Revealed,
}

/// One grid position. The mine flag is fixed at construction; a cell only ever
/// goes Hidden -> Revealed and is replaced wholesale when the grid is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    row: usize,
    col: usize,
    is_mine: bool,
    state: CellState,
}

impl Cell {
    pub fn new(row: usize, col: usize, is_mine: bool) -> Self {
        Self {
            row,
            col,
            is_mine,
            state: CellState::Hidden,
        }
    }

    pub fn safe(position: Position) -> Self {
        Self::new(position.row, position.col, false)
    }

    pub fn mine(position: Position) -> Self {
        Self::new(position.row, position.col, true)
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }

    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn is_revealed(&self) -> bool {
        self.state == CellState::Revealed
    }

    pub fn is_hidden(&self) -> bool {
        self.state == CellState::Hidden
    }

    /// Returns true if this call changed the cell.
    pub(crate) fn reveal(&mut self) -> bool {
        let was_hidden = self.is_hidden();
        self.state = CellState::Revealed;
        was_hidden
    }
}

impl fmt::Display for Cell {
    /// | Cell            | Char |
    /// | --------------- | ---- |
    /// | hidden          | `·`  |
    /// | revealed mine   | `*`  |
    /// | revealed safe   | `o`  |
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.state, self.is_mine) {
            (CellState::Hidden, _) => write!(f, "·"),
            (CellState::Revealed, true) => write!(f, "*"),
            (CellState::Revealed, false) => write!(f, "o"),
        }
    }
}
