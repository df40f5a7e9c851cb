//! Batch simulation: many independent seeded sessions driven through the
//! autoplay controller with no delays, plus aggregate statistics.

use std::time::Instant;

use serde::Serialize;

use crate::engine::autoplay::{
    lock_session, shared, AutoPlayConfig, AutoPlayController, AutoPlayHooks,
};
use crate::engine::models::StopReason;
use crate::engine::profiles::SessionSettings;

/// How one simulated session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub seed: u64,
    pub reason: StopReason,
    pub rounds_played: u32,
    pub wins: usize,
    pub profit: f64,
    pub final_balance: f64,
}

/// Aggregated results from a simulation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationResult {
    pub sessions: Vec<SessionOutcome>,
    pub durations_ms: Vec<f64>,
}

impl SimulationResult {
    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_rounds(&self) -> usize {
        self.sessions.iter().map(|s| s.rounds_played as usize).sum()
    }

    pub fn total_wins(&self) -> usize {
        self.sessions.iter().map(|s| s.wins).sum()
    }

    /// Fraction of played rounds that paid out.
    pub fn win_rate(&self) -> f64 {
        self.total_wins() as f64 / self.total_rounds().max(1) as f64
    }

    pub fn avg_profit(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        self.sessions.iter().map(|s| s.profit).sum::<f64>() / self.sessions.len() as f64
    }

    pub fn profit_stddev(&self) -> f64 {
        if self.sessions.len() < 2 {
            return 0.0;
        }
        let avg = self.avg_profit();
        let variance = self
            .sessions
            .iter()
            .map(|s| (s.profit - avg).powi(2))
            .sum::<f64>()
            / (self.sessions.len() - 1) as f64;
        variance.sqrt()
    }

    /// Wilson score interval on the per-round win rate.
    pub fn confidence_interval_95(&self) -> (f64, f64) {
        let n = self.total_rounds();
        if n == 0 {
            return (0.0, 0.0);
        }
        let n = n as f64;
        let p = self.win_rate();
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n;
        let center = (p + z * z / (2.0 * n)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n)) / n).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn count_reason(&self, reason: StopReason) -> usize {
        self.sessions.iter().filter(|s| s.reason == reason).count()
    }

    /// Fraction of sessions that ran out of money before finishing.
    pub fn bust_rate(&self) -> f64 {
        self.count_reason(StopReason::InsufficientBalance) as f64
            / self.sessions.len().max(1) as f64
    }

    pub fn summary(&self) -> String {
        let (ci_lo, ci_hi) = self.confidence_interval_95();
        let mut lines = vec![format!(
            "Simulation Results ({} sessions, {} rounds)",
            self.num_sessions(),
            self.total_rounds()
        )];
        lines.push("=".repeat(60));
        lines.push(format!(
            "  {:>12}: {:5.1}%  [95% CI: {:.1}%-{:.1}%]",
            "Round wins",
            self.win_rate() * 100.0,
            ci_lo * 100.0,
            ci_hi * 100.0,
        ));
        lines.push(format!(
            "  {:>12}: {:+.2} +/- {:.2} per session",
            "Profit",
            self.avg_profit(),
            self.profit_stddev(),
        ));
        lines.push(format!(
            "  {:>12}: {} completed, {} busted ({:.1}%), {} stopped",
            "Endings",
            self.count_reason(StopReason::Completed),
            self.count_reason(StopReason::InsufficientBalance),
            self.bust_rate() * 100.0,
            self.count_reason(StopReason::Stopped),
        ));
        if !self.durations_ms.is_empty() {
            let total_ms = self.durations_ms.iter().sum::<f64>();
            lines.push(format!(
                "  Avg session: {:.2}ms  |  Total: {:.2}s",
                total_ms / self.durations_ms.len() as f64,
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }
}

/// Run `sessions` independent sessions (seed `base_seed + i`, wrapping) through
/// the same script. Configured delays are ignored.
pub async fn run_simulation(
    settings: &SessionSettings,
    config: &AutoPlayConfig,
    sessions: usize,
    base_seed: u64,
    progress_callback: Option<&dyn Fn(usize, usize)>,
) -> SimulationResult {
    let config = config.clone().with_delays(0, 0);
    let mut result = SimulationResult::default();

    for idx in 0..sessions {
        let seed = base_seed.wrapping_add(idx as u64);
        let session = shared(
            SessionSettings {
                seed: Some(seed),
                ..settings.clone()
            }
            .build_session(),
        );
        let controller = AutoPlayController::new(session.clone());

        let t0 = Instant::now();
        let report = controller.start_auto_play(&config, AutoPlayHooks::new()).await;
        result.durations_ms.push(t0.elapsed().as_secs_f64() * 1000.0);

        let outcome = {
            let guard = lock_session(&session);
            match report {
                Some(report) => SessionOutcome {
                    seed,
                    reason: report.reason,
                    rounds_played: report.rounds_played,
                    wins: report.wins(),
                    profit: guard.profit(),
                    final_balance: guard.balance(),
                },
                None => SessionOutcome {
                    seed,
                    reason: StopReason::Completed,
                    rounds_played: 0,
                    wins: 0,
                    profit: 0.0,
                    final_balance: guard.balance(),
                },
            }
        };
        tracing::debug!(
            seed,
            reason = %outcome.reason,
            rounds = outcome.rounds_played,
            profit = outcome.profit,
            "simulated session"
        );
        result.sessions.push(outcome);

        if let Some(cb) = progress_callback {
            cb(idx + 1, sessions);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::autoplay::RevealStep;
    use crate::engine::models::Position;
    use std::cell::Cell;

    fn outcome(reason: StopReason, rounds: u32, wins: usize, profit: f64) -> SessionOutcome {
        SessionOutcome {
            seed: 0,
            reason,
            rounds_played: rounds,
            wins,
            profit,
            final_balance: 100.0 + profit,
        }
    }

    #[test]
    fn test_statistics() {
        let result = SimulationResult {
            sessions: vec![
                outcome(StopReason::Completed, 10, 6, 4.0),
                outcome(StopReason::Completed, 10, 4, -2.0),
                outcome(StopReason::InsufficientBalance, 5, 0, -10.0),
                outcome(StopReason::Stopped, 5, 2, 0.0),
            ],
            durations_ms: vec![1.0, 1.0, 1.0, 1.0],
        };

        assert_eq!(result.total_rounds(), 30);
        assert_eq!(result.total_wins(), 12);
        assert!((result.win_rate() - 0.4).abs() < 1e-12);
        assert_eq!(result.avg_profit(), -2.0);
        // sample stddev of [4, -2, -10, 0] around -2
        assert!((result.profit_stddev() - (104.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(result.bust_rate(), 0.25);

        let (lo, hi) = result.confidence_interval_95();
        assert!(lo < 0.4 && 0.4 < hi);
        assert!(lo > 0.0 && hi < 1.0);

        let summary = result.summary();
        assert!(summary.contains("4 sessions, 30 rounds"));
        assert!(summary.contains("1 busted"));
    }

    #[test]
    fn test_empty_result() {
        let result = SimulationResult::default();
        assert_eq!(result.win_rate(), 0.0);
        assert_eq!(result.avg_profit(), 0.0);
        assert_eq!(result.profit_stddev(), 0.0);
        assert_eq!(result.confidence_interval_95(), (0.0, 0.0));
        assert_eq!(result.bust_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_run_simulation_is_reproducible() {
        let settings = SessionSettings {
            initial_balance: 20.0,
            bet: 1.0,
            mines: 5,
            seed: None,
        };
        let config = AutoPlayConfig::new(
            8,
            vec![RevealStep::At(Position::new(2, 2)), RevealStep::Random],
        );
        let calls = Cell::new(0);
        let progress = |done: usize, total: usize| {
            assert_eq!(total, 6);
            calls.set(done);
        };

        let a = run_simulation(&settings, &config, 6, 100, Some(&progress)).await;
        let b = run_simulation(&settings, &config, 6, 100, None).await;

        assert_eq!(calls.get(), 6);
        assert_eq!(a.num_sessions(), 6);
        assert_eq!(a.sessions, b.sessions);
        assert_eq!(a.sessions[3].seed, 103);
        for s in &a.sessions {
            assert_eq!(s.reason, StopReason::Completed);
            assert_eq!(s.rounds_played, 8);
            assert!((s.final_balance - (20.0 + s.profit)).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_run_simulation_seed_wraps_at_max() {
        let config = AutoPlayConfig::new(1, vec![RevealStep::Random]);

        let result = run_simulation(&SessionSettings::default(), &config, 3, u64::MAX, None).await;

        let seeds: Vec<u64> = result.sessions.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, vec![u64::MAX, 0, 1]);
    }

    #[tokio::test]
    async fn test_run_simulation_counts_busts() {
        let settings = SessionSettings {
            initial_balance: 3.0,
            bet: 1.0,
            mines: 20,
            seed: None,
        };
        // Clearing all 25 cells always ends on a mine or a full clear; with
        // 20 mines nearly every round is lost.
        let config = AutoPlayConfig::new(50, vec![RevealStep::Random; 25]);

        let result = run_simulation(&settings, &config, 10, 7, None).await;

        assert_eq!(result.num_sessions(), 10);
        assert!(result.bust_rate() > 0.5);
        for s in &result.sessions {
            assert!(s.final_balance >= 0.0);
            assert!(s.rounds_played >= 3);
        }
    }
}
