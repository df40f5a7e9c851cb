//! Grid state machine: mine placement, reveal mechanics, win/loss detection.
//!
//! Ready --start_game--> Playing --reveal(mine)--> Lost
//!                       Playing --reveal(last safe)--> Won
//! {Won, Lost} --reset--> Ready

use std::fmt;
use std::slice::Chunks;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use crate::engine::models::Position;

pub const GRID_ROWS: usize = 5;
pub const GRID_COLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    /// Row-major, `rows * cols` long.
    grid: Vec<Cell>,
    state: GameState,
    revealed_count: usize,
    safe_revealed_count: usize,
    flagged_count: usize,
}

impl Board {
    /// Creates a Ready board with an all-safe grid. Dimensions are at least 1x1
    /// and the mine count is clamped into `[1, rows * cols]`.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            mines: mines.clamp(1, rows * cols),
            grid: fresh_grid(rows, cols),
            state: GameState::Ready,
            revealed_count: 0,
            safe_revealed_count: 0,
            flagged_count: 0,
        }
    }

    /// The 5x5 product board.
    pub fn standard(mines: usize) -> Self {
        Self::new(GRID_ROWS, GRID_COLS, mines)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn game_state(&self) -> GameState {
        self.state
    }

    /// Number of Revealed cells, including the ones uncovered by the terminal reveal.
    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    /// Safe cells uncovered by player moves. Drives the win check and the multiplier.
    pub fn safe_revealed_count(&self) -> usize {
        self.safe_revealed_count
    }

    /// Flagging is not part of the game yet, this is always 0.
    pub fn flagged_count(&self) -> usize {
        self.flagged_count
    }

    pub fn safe_cells_count(&self) -> usize {
        self.total_cells() - self.mines
    }

    pub fn remaining_mines(&self) -> usize {
        self.mines.saturating_sub(self.flagged_count)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.grid
    }

    pub fn rows_iter(&self) -> Chunks<'_, Cell> {
        self.grid.chunks(self.cols)
    }

    pub fn is_valid_position(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index_of(row, col).map(|i| &self.grid[i])
    }

    pub fn mine_positions(&self) -> Vec<Position> {
        self.grid
            .iter()
            .filter(|c| c.is_mine())
            .map(Cell::position)
            .collect()
    }

    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        self.is_valid_position(row, col).then(|| row * self.cols + col)
    }

    fn point_from_index(&self, index: usize) -> Position {
        Position::new(index / self.cols, index % self.cols)
    }

    /// Re-seeds mines uniformly at random without replacement and starts play.
    pub fn start_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.grid = fresh_grid(self.rows, self.cols);

        let mut positions: Vec<usize> = (0..self.total_cells()).collect();
        let (chosen, _) = positions.partial_shuffle(rng, self.mines);
        for &index in chosen.iter() {
            let pos = self.point_from_index(index);
            self.grid[index] = Cell::mine(pos);
        }

        self.begin();
    }

    /// Starts play with mines at exactly the given positions. Duplicates and
    /// out-of-range entries are skipped, entries beyond the mine count ignored.
    pub fn start_game_with_mines(&mut self, mines: &[Position]) {
        self.grid = fresh_grid(self.rows, self.cols);

        let mut placed = 0;
        for pos in mines {
            if placed == self.mines {
                break;
            }
            let Some(index) = self.index_of(pos.row, pos.col) else {
                continue;
            };
            if self.grid[index].is_mine() {
                continue;
            }
            self.grid[index] = Cell::mine(*pos);
            placed += 1;
        }

        if placed != self.mines {
            tracing::warn!(
                requested = self.mines,
                placed,
                "fixed mine layout short of mine count, using placed count"
            );
            self.mines = placed;
        }

        self.begin();
    }

    fn begin(&mut self) {
        self.revealed_count = 0;
        self.safe_revealed_count = 0;
        self.flagged_count = 0;
        self.state = GameState::Playing;
    }

    /// Reveals one cell. Returns true only for a safe reveal; hitting a mine
    /// still reveals the cell but returns false and ends the round.
    pub fn reveal_cell(&mut self, row: usize, col: usize) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let Some(index) = self.index_of(row, col) else {
            return false;
        };
        if !self.grid[index].reveal() {
            return false;
        }
        self.revealed_count += 1;

        if self.grid[index].is_mine() {
            self.state = GameState::Lost;
            self.reveal_all();
            return false;
        }

        self.safe_revealed_count += 1;
        if self.safe_revealed_count == self.safe_cells_count() {
            self.state = GameState::Won;
            self.reveal_all();
        }
        true
    }

    fn reveal_all(&mut self) {
        for cell in self.grid.iter_mut() {
            if cell.reveal() {
                self.revealed_count += 1;
            }
        }
    }

    /// A uniformly random hidden cell, or None once everything is revealed.
    pub fn choose_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Cell> {
        self.grid.iter().filter(|c| c.is_hidden()).choose(rng)
    }

    pub fn reset(&mut self) {
        self.grid = fresh_grid(self.rows, self.cols);
        self.state = GameState::Ready;
        self.revealed_count = 0;
        self.safe_revealed_count = 0;
        self.flagged_count = 0;
    }
}

fn fresh_grid(rows: usize, cols: usize) -> Vec<Cell> {
    (0..rows * cols)
        .map(|i| Cell::new(i / cols, i % cols, false))
        .collect()
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.rows_iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", cell)?;
            }
        }
        Ok(())
    }
}
