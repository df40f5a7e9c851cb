//! Multiplier law and history aggregates.
//!
//! Each safe reveal multiplies the pot by `T / S` (total cells over safe
//! cells), so after `r` safe reveals the multiplier is `(T / S)^r`, rounded to
//! two decimals.

use serde::{Deserialize, Serialize};

use crate::engine::models::GameResult;

pub fn multiplier(total_cells: usize, mines: usize, safe_reveals: usize) -> f64 {
    let safe_cells = total_cells.saturating_sub(mines);
    if safe_reveals == 0 || safe_cells == 0 {
        return 1.0;
    }
    let step = total_cells as f64 / safe_cells as f64;
    round_cents(step.powi(safe_reveals as i32))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of won rounds, 0 for an empty history.
pub fn win_rate(history: &[GameResult]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let wins = history.iter().filter(|r| r.won).count();
    wins as f64 / history.len() as f64 * 100.0
}

pub fn total_winnings(history: &[GameResult]) -> f64 {
    history.iter().map(|r| r.payout).sum()
}

pub fn total_bets(history: &[GameResult]) -> f64 {
    history.iter().map(|r| r.bet_amount).sum()
}

pub fn profit(history: &[GameResult]) -> f64 {
    total_winnings(history) - total_bets(history)
}

/// Point-in-time summary of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_winnings: f64,
    pub total_bets: f64,
    pub profit: f64,
    pub best_multiplier: f64,
    pub balance: f64,
}

impl SessionStats {
    pub fn from_history(history: &[GameResult], balance: f64) -> Self {
        let wins = history.iter().filter(|r| r.won).count();
        Self {
            rounds: history.len(),
            wins,
            losses: history.len() - wins,
            win_rate: win_rate(history),
            total_winnings: total_winnings(history),
            total_bets: total_bets(history),
            profit: profit(history),
            best_multiplier: history
                .iter()
                .filter(|r| r.won)
                .map(|r| r.multiplier)
                .fold(1.0, f64::max),
            balance,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rounds  {} won / {} lost ({:.1}%)  wagered={:.2}  paid={:.2}  \
             profit={:+.2}  best x{:.2}  balance={:.2}",
            self.rounds,
            self.wins,
            self.losses,
            self.win_rate,
            self.total_bets,
            self.total_winnings,
            self.profit,
            self.best_multiplier,
            self.balance,
        )
    }
}
