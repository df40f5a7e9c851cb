//! 5x5 mines wagering game: a grid of hidden cells, some holding mines. Each
//! safe reveal grows the payout multiplier; a mine loses the bet.

pub mod board;
pub mod cell;
pub mod payout;
pub mod session;

pub use board::{Board, GameState, GRID_COLS, GRID_ROWS};
pub use cell::{Cell, CellState};
pub use payout::SessionStats;
pub use session::GameSession;
