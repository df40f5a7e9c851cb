//! Core engine data types shared by the game, the autoplay driver and the CLIs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::ParsePositionError;

/// A (row, col) coordinate on the grid. Row-major, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PositionRepr", into = "String")]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    /// Parses `"row,col"`, whitespace around either number is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| ParsePositionError::MissingSeparator(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| ParsePositionError::InvalidNumber(part.trim().to_string()))
        };
        Ok(Position::new(parse(row)?, parse(col)?))
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.to_string()
    }
}

/// Accepts both `"2,3"` and `{ row = 2, col = 3 }` in config files.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Text(String),
    Table { row: usize, col: usize },
}

impl TryFrom<PositionRepr> for Position {
    type Error = ParsePositionError;

    fn try_from(repr: PositionRepr) -> Result<Self, Self::Error> {
        match repr {
            PositionRepr::Text(s) => s.parse(),
            PositionRepr::Table { row, col } => Ok(Position::new(row, col)),
        }
    }
}

/// Outcome of one settled round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub won: bool,
    pub multiplier: f64,
    /// `bet_amount * multiplier` when won, otherwise 0.
    pub payout: f64,
    pub bet_amount: f64,
}

impl GameResult {
    pub fn win(bet_amount: f64, multiplier: f64) -> Self {
        Self {
            won: true,
            multiplier,
            payout: bet_amount * multiplier,
            bet_amount,
        }
    }

    pub fn loss(bet_amount: f64, multiplier: f64) -> Self {
        Self {
            won: false,
            multiplier,
            payout: 0.0,
            bet_amount,
        }
    }

    /// Net effect of this round on the balance.
    pub fn net(&self) -> f64 {
        self.payout - self.bet_amount
    }
}

/// Why an autoplay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    InsufficientBalance,
    Stopped,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Completed => "completed",
            StopReason::InsufficientBalance => "insufficient_balance",
            StopReason::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
