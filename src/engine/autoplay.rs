//! Autoplay driver: plays a fixed reveal script across up to N rounds of a
//! shared session, pausing between steps, with a cooperative stop flag.
//!
//! The run is one sequential task. It suspends only at the two delays of each
//! round; the stop flag is checked at the top of every round, so a stop
//! requested mid-round or during a delay takes effect before the next round.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::models::{GameResult, Position, StopReason};
use crate::games::mines::{GameSession, GameState};

pub const DEFAULT_DELAY_BETWEEN_ROUNDS_MS: u64 = 200;
pub const DEFAULT_DELAY_AFTER_REVEAL_MS: u64 = 400;

/// The session an autoplay run drives. Locked only for the duration of a
/// synchronous step, never across a delay.
pub type SharedSession = Arc<Mutex<GameSession>>;

pub fn shared(session: GameSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One entry of the reveal script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealStep {
    At(Position),
    /// Any still-hidden cell, picked when the step runs.
    Random,
}

impl From<Position> for RevealStep {
    fn from(pos: Position) -> Self {
        RevealStep::At(pos)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPlayConfig {
    pub rounds: u32,
    pub steps: Vec<RevealStep>,
    #[serde(default = "default_delay_between_rounds")]
    pub delay_between_rounds_ms: u64,
    #[serde(default = "default_delay_after_reveal")]
    pub delay_after_reveal_ms: u64,
}

fn default_delay_between_rounds() -> u64 {
    DEFAULT_DELAY_BETWEEN_ROUNDS_MS
}

fn default_delay_after_reveal() -> u64 {
    DEFAULT_DELAY_AFTER_REVEAL_MS
}

impl AutoPlayConfig {
    pub fn new(rounds: u32, steps: Vec<RevealStep>) -> Self {
        Self {
            rounds,
            steps,
            delay_between_rounds_ms: DEFAULT_DELAY_BETWEEN_ROUNDS_MS,
            delay_after_reveal_ms: DEFAULT_DELAY_AFTER_REVEAL_MS,
        }
    }

    pub fn from_cells(rounds: u32, cells: &[Position]) -> Self {
        Self::new(rounds, cells.iter().copied().map(RevealStep::At).collect())
    }

    pub fn with_delays(mut self, between_rounds_ms: u64, after_reveal_ms: u64) -> Self {
        self.delay_between_rounds_ms = between_rounds_ms;
        self.delay_after_reveal_ms = after_reveal_ms;
        self
    }

    pub fn delay_between_rounds(&self) -> Duration {
        Duration::from_millis(self.delay_between_rounds_ms)
    }

    pub fn delay_after_reveal(&self) -> Duration {
        Duration::from_millis(self.delay_after_reveal_ms)
    }
}

type RoundStartFn = Box<dyn FnMut(u32) + Send>;
type RoundEndFn = Box<dyn FnMut(u32, Option<&GameResult>) + Send>;
type CompleteFn = Box<dyn FnMut(StopReason) + Send>;

/// Optional observers, each invoked in order on the run's own task.
#[derive(Default)]
pub struct AutoPlayHooks {
    on_round_start: Option<RoundStartFn>,
    on_round_end: Option<RoundEndFn>,
    on_complete: Option<CompleteFn>,
}

impl AutoPlayHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_round_start(mut self, f: impl FnMut(u32) + Send + 'static) -> Self {
        self.on_round_start = Some(Box::new(f));
        self
    }

    /// Receives the cash-out result of the round, which is None when the
    /// board settled the round itself (mine hit or board cleared).
    pub fn on_round_end(
        mut self,
        f: impl FnMut(u32, Option<&GameResult>) + Send + 'static,
    ) -> Self {
        self.on_round_end = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(StopReason) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    fn round_start(&mut self, round: u32) {
        if let Some(f) = self.on_round_start.as_mut() {
            f(round);
        }
    }

    fn round_end(&mut self, round: u32, result: Option<&GameResult>) {
        if let Some(f) = self.on_round_end.as_mut() {
            f(round, result);
        }
    }

    fn complete(&mut self, reason: StopReason) {
        if let Some(f) = self.on_complete.as_mut() {
            f(reason);
        }
    }
}

/// Outcome of one autoplay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPlayReport {
    pub reason: StopReason,
    /// Rounds whose bet was placed.
    pub rounds_played: u32,
    /// How each played round was settled, in order. None only if the round was
    /// left unsettled, which the script/cash-out sequence never does.
    pub results: Vec<Option<GameResult>>,
}

impl AutoPlayReport {
    pub fn wins(&self) -> usize {
        self.results.iter().flatten().filter(|r| r.won).count()
    }

    pub fn net(&self) -> f64 {
        self.results.iter().flatten().map(GameResult::net).sum()
    }
}

/// Cloneable handle that can stop a run from another task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Drives a shared session through scripted rounds. Callers must not start a
/// second run on the same controller while one is in progress.
pub struct AutoPlayController {
    session: SharedSession,
    running: Arc<AtomicBool>,
}

impl AutoPlayController {
    pub fn new(session: SharedSession) -> Self {
        Self {
            session,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Takes effect at the next round boundary.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    /// Runs up to `config.rounds` rounds. An empty script is a no-op and
    /// returns None without touching the session or firing any hook.
    pub async fn start_auto_play(
        &self,
        config: &AutoPlayConfig,
        mut hooks: AutoPlayHooks,
    ) -> Option<AutoPlayReport> {
        if config.steps.is_empty() {
            tracing::debug!("empty reveal script, autoplay not started");
            return None;
        }

        self.running.store(true, Ordering::SeqCst);
        lock_session(&self.session).reset_game();
        tracing::info!(
            rounds = config.rounds,
            steps = config.steps.len(),
            "autoplay started"
        );

        let mut report = AutoPlayReport {
            reason: StopReason::Completed,
            rounds_played: 0,
            results: Vec::new(),
        };

        for round in 1..=config.rounds {
            if !self.is_running() {
                report.reason = StopReason::Stopped;
                break;
            }

            hooks.round_start(round);
            let started = lock_session(&self.session).start_new_game();
            if !started {
                report.reason = StopReason::InsufficientBalance;
                break;
            }
            report.rounds_played += 1;

            pause(config.delay_between_rounds()).await;

            let (cash_out, settled) = {
                let mut session = lock_session(&self.session);
                let settled_before = session.history().len();
                play_script(&mut session, &config.steps);
                let cash_out = session.cash_out();
                let settled = session.history()[settled_before..].last().copied();
                tracing::debug!(
                    round,
                    state = ?session.game_state(),
                    won = settled.map(|r| r.won),
                    multiplier = settled.map(|r| r.multiplier),
                    balance = session.balance(),
                    "autoplay round finished\n{}",
                    session.board()
                );
                (cash_out, settled)
            };
            report.results.push(settled);

            hooks.round_end(round, cash_out.as_ref());
            pause(config.delay_after_reveal()).await;
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!(
            reason = %report.reason,
            rounds_played = report.rounds_played,
            wins = report.wins(),
            net = report.net(),
            "autoplay finished"
        );
        hooks.complete(report.reason);
        Some(report)
    }
}

/// Applies the script in order, stopping as soon as the board leaves Playing.
fn play_script(session: &mut GameSession, steps: &[RevealStep]) {
    for step in steps {
        match step {
            RevealStep::At(pos) => {
                session.reveal_cell(pos.row, pos.col);
            }
            RevealStep::Random => {
                session.reveal_random();
            }
        }
        if session.game_state() != GameState::Playing {
            break;
        }
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine_at_origin(balance: f64) -> SharedSession {
        shared(GameSession::with_fixed_mines(
            balance,
            vec![Position::new(0, 0)],
        ))
    }

    fn event_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn logging_hooks(log: &Arc<Mutex<Vec<String>>>) -> AutoPlayHooks {
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        AutoPlayHooks::new()
            .on_round_start(move |round| a.lock().unwrap().push(format!("start {}", round)))
            .on_round_end(move |round, result| {
                let tag = match result {
                    Some(r) => format!("cashed {:.2}", r.payout),
                    None => "settled".to_string(),
                };
                b.lock().unwrap().push(format!("end {} {}", round, tag));
            })
            .on_complete(move |reason| c.lock().unwrap().push(format!("complete {}", reason)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_script_is_noop() {
        let session = mine_at_origin(100.0);
        let controller = AutoPlayController::new(session.clone());
        let log = event_log();

        let report = controller
            .start_auto_play(&AutoPlayConfig::new(3, vec![]), logging_hooks(&log))
            .await;

        assert!(report.is_none());
        assert!(!controller.is_running());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(lock_session(&session).balance(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_losing_script_completes() {
        let session = mine_at_origin(100.0);
        let controller = AutoPlayController::new(session.clone());
        let log = event_log();
        let config = AutoPlayConfig::from_cells(3, &[Position::new(0, 0), Position::new(4, 4)]);

        let report = controller
            .start_auto_play(&config, logging_hooks(&log))
            .await
            .unwrap();

        assert_eq!(report.reason, StopReason::Completed);
        assert_eq!(report.rounds_played, 3);
        assert_eq!(report.wins(), 0);

        let guard = lock_session(&session);
        let history = guard.game_history();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| !r.won && r.payout == 0.0));
        assert_eq!(guard.balance(), 97.0);
        drop(guard);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "start 1", "end 1 settled", "start 2", "end 2 settled", "start 3",
                "end 3 settled", "complete completed",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_surviving_script_cashes_out() {
        let session = mine_at_origin(100.0);
        lock_session(&session).set_bet(10.0);
        let controller = AutoPlayController::new(session.clone());
        let log = event_log();
        let config = AutoPlayConfig::from_cells(2, &[Position::new(4, 4), Position::new(3, 3)]);

        let report = controller
            .start_auto_play(&config, logging_hooks(&log))
            .await
            .unwrap();

        assert_eq!(report.reason, StopReason::Completed);
        assert_eq!(report.wins(), 2);
        let expected = crate::games::mines::payout::multiplier(25, 1, 2);
        assert!(report
            .results
            .iter()
            .all(|r| r.map(|r| r.multiplier) == Some(expected)));

        let balance = lock_session(&session).balance();
        assert!((balance - (100.0 + 2.0 * (10.0 * expected - 10.0))).abs() < 1e-9);
        assert_eq!(log.lock().unwrap()[1], format!("end 1 cashed {:.2}", 10.0 * expected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_stops_at_terminal_state() {
        let session = mine_at_origin(100.0);
        let controller = AutoPlayController::new(session.clone());
        let config = AutoPlayConfig::from_cells(
            1,
            &[Position::new(4, 4), Position::new(0, 0), Position::new(4, 3)],
        );

        let report = controller
            .start_auto_play(&config, AutoPlayHooks::new())
            .await
            .unwrap();

        let result = report.results[0].unwrap();
        assert!(!result.won);
        assert_eq!(result.multiplier, 1.04);
        assert_eq!(lock_session(&session).board().safe_revealed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_balance_ends_run() {
        let session = mine_at_origin(2.0);
        let controller = AutoPlayController::new(session.clone());
        let log = event_log();
        let config = AutoPlayConfig::from_cells(5, &[Position::new(0, 0)]);

        let report = controller
            .start_auto_play(&config, logging_hooks(&log))
            .await
            .unwrap();

        assert_eq!(report.reason, StopReason::InsufficientBalance);
        assert_eq!(report.rounds_played, 2);
        assert_eq!(lock_session(&session).game_history().len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "start 1", "end 1 settled", "start 2", "end 2 settled", "start 3",
                "complete insufficient_balance",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_hook_takes_effect_next_round() {
        let session = mine_at_origin(100.0);
        let controller = AutoPlayController::new(session.clone());
        let handle = controller.stop_handle();
        let config = AutoPlayConfig::from_cells(4, &[Position::new(4, 4)]);

        let hooks = AutoPlayHooks::new().on_round_end(move |round, _| {
            if round == 2 {
                handle.stop();
            }
        });
        let report = controller.start_auto_play(&config, hooks).await.unwrap();

        assert_eq!(report.reason, StopReason::Stopped);
        assert_eq!(report.rounds_played, 2);
        assert_eq!(lock_session(&session).game_history().len(), 2);
        assert!(!controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_steps() {
        let session = shared(GameSession::with_seed(100.0, 21));
        let controller = AutoPlayController::new(session.clone());
        let config = AutoPlayConfig::new(5, vec![RevealStep::Random; 3]).with_delays(0, 0);

        let report = controller
            .start_auto_play(&config, AutoPlayHooks::new())
            .await
            .unwrap();

        assert_eq!(report.rounds_played, 5);
        assert_eq!(report.results.iter().flatten().count(), 5);
        assert_eq!(lock_session(&session).game_history().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hooks_can_read_session() {
        let session = mine_at_origin(100.0);
        let controller = AutoPlayController::new(session.clone());
        let handle = controller.stop_handle();
        let seen = event_log();
        let seen_ref = seen.clone();
        let reader = session.clone();
        let config = AutoPlayConfig::from_cells(2, &[Position::new(0, 0)]);

        let hooks = AutoPlayHooks::new().on_round_end(move |_, _| {
            let s = lock_session(&reader);
            seen_ref
                .lock()
                .unwrap()
                .push(format!("{} {}", s.balance(), handle.is_running()));
        });
        controller.start_auto_play(&config, hooks).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["99 true", "98 true"]);
    }
}
