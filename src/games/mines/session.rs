//! Wagering layer: balance, bet sizing, multiplier, cash-out and history.
//!
//! A session owns exactly one live `Board`. Starting, resetting or changing the
//! mine count swaps in a brand-new board; no board outlives its round.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::board::{Board, GameState};
use super::payout::{self, SessionStats};
use crate::engine::models::{GameResult, Position};

pub const DEFAULT_BALANCE: f64 = 1000.0;
pub const DEFAULT_BET: f64 = 1.0;
pub const DEFAULT_MINES: usize = 3;
pub const MIN_MINES: usize = 1;
pub const MAX_MINES: usize = 20;

#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    balance: f64,
    current_bet: f64,
    mine_count: usize,
    current_multiplier: f64,
    is_game_active: bool,
    history: Vec<GameResult>,
    rng: StdRng,
    /// When set, every round uses this layout instead of a random one.
    fixed_mines: Option<Vec<Position>>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE)
    }
}

impl GameSession {
    pub fn new(initial_balance: f64) -> Self {
        Self::with_rng(initial_balance, StdRng::from_entropy())
    }

    /// Reproducible session: mine layouts and random picks derive from `seed`.
    pub fn with_seed(initial_balance: f64, seed: u64) -> Self {
        Self::with_rng(initial_balance, StdRng::seed_from_u64(seed))
    }

    /// Every round places mines at `mines`; the mine count follows the layout.
    pub fn with_fixed_mines(initial_balance: f64, mines: Vec<Position>) -> Self {
        let mut session = Self::with_seed(initial_balance, 0);
        session.mine_count = mines.len().clamp(MIN_MINES, MAX_MINES);
        session.board = Board::standard(session.mine_count);
        session.fixed_mines = Some(mines);
        session
    }

    fn with_rng(initial_balance: f64, rng: StdRng) -> Self {
        Self {
            board: Board::standard(DEFAULT_MINES),
            balance: initial_balance.max(0.0),
            current_bet: DEFAULT_BET,
            mine_count: DEFAULT_MINES,
            current_multiplier: 1.0,
            is_game_active: false,
            history: Vec::new(),
            rng,
            fixed_mines: None,
        }
    }

    // --- Read-only state ---

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn current_bet(&self) -> f64 {
        self.current_bet
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn current_multiplier(&self) -> f64 {
        self.current_multiplier
    }

    pub fn is_game_active(&self) -> bool {
        self.is_game_active
    }

    pub fn game_state(&self) -> GameState {
        self.board.game_state()
    }

    /// Owned copy of the history, oldest first.
    pub fn game_history(&self) -> Vec<GameResult> {
        self.history.clone()
    }

    pub fn history(&self) -> &[GameResult] {
        &self.history
    }

    /// Multiplier the next safe reveal would lock in.
    pub fn next_multiplier(&self) -> f64 {
        payout::multiplier(
            self.board.total_cells(),
            self.board.mines(),
            self.board.safe_revealed_count() + 1,
        )
    }

    // --- Round lifecycle ---

    /// Replaces the board with a Ready one. Called mid-round this abandons the
    /// round: the bet stays debited, nothing is recorded, and the session stays
    /// active with no playable board until the next `start_new_game`.
    pub fn set_mine_count(&mut self, count: usize) {
        self.mine_count = count.clamp(MIN_MINES, MAX_MINES);
        self.board = Board::standard(self.mine_count);
    }

    /// Debits the current bet and starts a fresh board. The only path that
    /// takes money from the balance.
    pub fn start_new_game(&mut self) -> bool {
        if self.current_bet > self.balance {
            tracing::debug!(
                bet = self.current_bet,
                balance = self.balance,
                "cannot start round, insufficient balance"
            );
            return false;
        }
        self.balance -= self.current_bet;
        self.current_multiplier = 1.0;
        self.is_game_active = true;

        let mut board = Board::standard(self.mine_count);
        match &self.fixed_mines {
            Some(mines) => board.start_game_with_mines(mines),
            None => board.start_game(&mut self.rng),
        }
        self.board = board;

        tracing::debug!(
            bet = self.current_bet,
            mines = self.board.mines(),
            balance = self.balance,
            "round started"
        );
        true
    }

    /// Reveals a cell in the active round, settling it automatically if the
    /// board reaches Won or Lost.
    pub fn reveal_cell(&mut self, row: usize, col: usize) -> bool {
        if !self.is_game_active {
            return false;
        }
        let success = self.board.reveal_cell(row, col);
        if success {
            self.update_multiplier();
        }
        if self.board.game_state().is_finished() {
            self.end_game();
        }
        success
    }

    /// Reveals a random hidden cell. None when no round is in play.
    pub fn reveal_random(&mut self) -> Option<(Position, bool)> {
        if !self.is_game_active || !self.board.game_state().is_playing() {
            return None;
        }
        let pos = self.board.choose_random(&mut self.rng)?.position();
        Some((pos, self.reveal_cell(pos.row, pos.col)))
    }

    /// Takes the current multiplier while the board is still in play. Cells
    /// stay as revealed so far.
    pub fn cash_out(&mut self) -> Option<GameResult> {
        if !self.is_game_active || self.board.game_state() != GameState::Playing {
            return None;
        }
        let result = GameResult::win(self.current_bet, self.current_multiplier);
        self.balance += result.payout;
        self.history.push(result);
        self.is_game_active = false;

        tracing::debug!(
            multiplier = result.multiplier,
            payout = result.payout,
            balance = self.balance,
            "cashed out"
        );
        Some(result)
    }

    pub fn reset_game(&mut self) {
        self.is_game_active = false;
        self.current_multiplier = 1.0;
        self.board = Board::standard(self.mine_count);
    }

    fn update_multiplier(&mut self) {
        self.current_multiplier = payout::multiplier(
            self.board.total_cells(),
            self.board.mines(),
            self.board.safe_revealed_count(),
        );
    }

    fn end_game(&mut self) {
        self.is_game_active = false;
        let result = if self.board.game_state() == GameState::Won {
            GameResult::win(self.current_bet, self.current_multiplier)
        } else {
            GameResult::loss(self.current_bet, self.current_multiplier)
        };
        if result.won {
            self.balance += result.payout;
        }
        self.history.push(result);

        tracing::debug!(
            won = result.won,
            multiplier = result.multiplier,
            payout = result.payout,
            balance = self.balance,
            "round settled"
        );
    }

    // --- Bet sizing ---

    pub fn set_bet(&mut self, amount: f64) -> bool {
        if amount.is_nan() || amount <= 0.0 || amount > self.balance {
            tracing::debug!(amount, balance = self.balance, "bet rejected");
            return false;
        }
        self.current_bet = amount;
        true
    }

    pub fn increase_bet(&mut self) -> bool {
        self.set_bet(self.current_bet * 2.0)
    }

    pub fn decrease_bet(&mut self) -> bool {
        self.set_bet((self.current_bet / 2.0).floor().max(1.0))
    }

    pub fn can_afford_bet(&self, amount: f64) -> bool {
        amount <= self.balance
    }

    pub fn max_bet(&self) -> f64 {
        self.balance
    }

    // --- Aggregates ---

    pub fn win_rate(&self) -> f64 {
        payout::win_rate(&self.history)
    }

    pub fn total_winnings(&self) -> f64 {
        payout::total_winnings(&self.history)
    }

    pub fn total_bets(&self) -> f64 {
        payout::total_bets(&self.history)
    }

    pub fn profit(&self) -> f64 {
        payout::profit(&self.history)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_history(&self.history, self.balance)
    }
}
