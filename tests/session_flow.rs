//! End-to-end rounds through the public session API.
//!
//! Run with:
//!     cargo test --test session_flow

use mines_game_engine::engine::models::{GameResult, Position, StopReason};
use mines_game_engine::games::mines::{CellState, GameSession, GameState};

const LAYOUT: [Position; 3] = [
    Position::new(0, 4),
    Position::new(2, 2),
    Position::new(4, 0),
];

fn session() -> GameSession {
    GameSession::with_fixed_mines(100.0, LAYOUT.to_vec())
}

#[test]
fn cash_out_then_lose() {
    let mut s = session();
    assert!(s.set_bet(10.0));

    // Round 1: three safe reveals, then cash out
    assert!(s.start_new_game());
    for (r, c) in [(0, 0), (0, 1), (1, 1)] {
        assert!(s.reveal_cell(r, c));
    }
    assert_eq!(s.current_multiplier(), 1.47);
    let first = s.cash_out().unwrap();
    assert_eq!(first.multiplier, 1.47);
    assert!((s.balance() - 104.7).abs() < 1e-9);

    // Round 2: one safe reveal, then a mine
    assert!(s.start_new_game());
    assert_eq!(s.current_multiplier(), 1.0);
    assert!(s.reveal_cell(3, 3));
    assert!(!s.reveal_cell(2, 2));
    assert_eq!(s.game_state(), GameState::Lost);
    assert!(s.cash_out().is_none());

    let history = s.game_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1], GameResult::loss(10.0, 1.14));
    assert!((s.balance() - 94.7).abs() < 1e-9);
    assert!((s.profit() - -5.3).abs() < 1e-9);
    assert_eq!(s.win_rate(), 50.0);

    // Loss exposes the whole grid
    let board = s.board();
    assert!(board.cells().iter().all(|c| c.state() == CellState::Revealed));
    assert_eq!(board.revealed_count(), 25);
    assert_eq!(board.safe_revealed_count(), 1);
}

#[test]
fn reveals_after_settlement_change_nothing() {
    let mut s = session();
    s.start_new_game();
    s.reveal_cell(0, 0);
    s.cash_out();

    let balance = s.balance();
    assert!(!s.reveal_cell(1, 0));
    assert!(s.reveal_random().is_none());
    assert!(s.cash_out().is_none());
    assert_eq!(s.balance(), balance);
    assert_eq!(s.game_history().len(), 1);
}

#[test]
fn history_copy_is_detached() {
    let mut s = session();
    s.start_new_game();
    s.cash_out();

    let mut copy = s.game_history();
    copy.clear();
    assert_eq!(s.game_history().len(), 1);
}

#[test]
fn same_seed_same_layouts() {
    let mut a = GameSession::with_seed(50.0, 1234);
    let mut b = GameSession::with_seed(50.0, 1234);
    for _ in 0..5 {
        a.start_new_game();
        b.start_new_game();
        assert_eq!(a.board().mine_positions(), b.board().mine_positions());
        assert_eq!(a.board().mine_positions().len(), 3);
        a.reset_game();
        b.reset_game();
    }
}

#[test]
fn mine_count_changes_apply_to_next_round() {
    let mut s = GameSession::with_seed(50.0, 5);
    s.set_mine_count(10);
    s.start_new_game();
    assert_eq!(s.board().mine_positions().len(), 10);
    assert_eq!(s.board().safe_cells_count(), 15);
    // 25/15 per safe reveal
    assert_eq!(s.next_multiplier(), 1.67);
}

#[test]
fn value_types_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&StopReason::InsufficientBalance).unwrap(),
        "\"insufficient_balance\""
    );
    assert_eq!(serde_json::to_string(&GameState::Playing).unwrap(), "\"playing\"");
    assert_eq!(serde_json::to_string(&Position::new(3, 1)).unwrap(), "\"3,1\"");

    let pos: Position = serde_json::from_str("{\"row\": 2, \"col\": 4}").unwrap();
    assert_eq!(pos, Position::new(2, 4));
    assert_eq!(" 1 , 2".parse::<Position>().unwrap(), Position::new(1, 2));
    assert!("12".parse::<Position>().is_err());
}

#[test]
fn stats_snapshot() {
    let mut s = session();
    s.set_bet(5.0);
    s.start_new_game();
    s.reveal_cell(0, 0);
    s.cash_out();
    s.start_new_game();
    s.reveal_cell(4, 0);

    let stats = s.stats();
    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.best_multiplier, 1.14);
    assert_eq!(stats.balance, s.balance());
}
