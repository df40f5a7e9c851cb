//! Named autoplay profiles and session defaults.
//! Loaded from TOML at runtime by the `mines` and `simulate` CLIs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::autoplay::{
    AutoPlayConfig, RevealStep, DEFAULT_DELAY_AFTER_REVEAL_MS, DEFAULT_DELAY_BETWEEN_ROUNDS_MS,
};
use crate::engine::error::ConfigError;
use crate::engine::models::Position;
use crate::games::mines::session::{DEFAULT_BALANCE, DEFAULT_BET, DEFAULT_MINES};
use crate::games::mines::GameSession;

/// How a session is set up before autoplay takes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub initial_balance: f64,
    pub bet: f64,
    pub mines: usize,
    /// Fixed seed for reproducible mine layouts; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_BALANCE,
            bet: DEFAULT_BET,
            mines: DEFAULT_MINES,
            seed: None,
        }
    }
}

impl SessionSettings {
    pub fn build_session(&self) -> GameSession {
        let mut session = match self.seed {
            Some(seed) => GameSession::with_seed(self.initial_balance, seed),
            None => GameSession::new(self.initial_balance),
        };
        session.set_mine_count(self.mines);
        if !session.set_bet(self.bet) {
            tracing::warn!(
                bet = self.bet,
                balance = self.initial_balance,
                fallback = session.current_bet(),
                "configured bet rejected, keeping default"
            );
        }
        session
    }
}

pub const DEFAULT_ROUNDS: u32 = 10;

/// A named autoplay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPlayProfile {
    pub description: Option<String>,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default)]
    pub cells: Vec<Position>,
    /// Random reveals appended after the scripted cells.
    #[serde(default)]
    pub random_picks: usize,
    #[serde(default = "default_delay_between_rounds")]
    pub delay_between_rounds_ms: u64,
    #[serde(default = "default_delay_after_reveal")]
    pub delay_after_reveal_ms: u64,
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

fn default_delay_between_rounds() -> u64 {
    DEFAULT_DELAY_BETWEEN_ROUNDS_MS
}

fn default_delay_after_reveal() -> u64 {
    DEFAULT_DELAY_AFTER_REVEAL_MS
}

impl Default for AutoPlayProfile {
    fn default() -> Self {
        Self {
            description: None,
            rounds: DEFAULT_ROUNDS,
            cells: Vec::new(),
            random_picks: 0,
            delay_between_rounds_ms: DEFAULT_DELAY_BETWEEN_ROUNDS_MS,
            delay_after_reveal_ms: DEFAULT_DELAY_AFTER_REVEAL_MS,
        }
    }
}

impl AutoPlayProfile {
    pub fn to_config(&self) -> AutoPlayConfig {
        let steps = self
            .cells
            .iter()
            .copied()
            .map(RevealStep::At)
            .chain(std::iter::repeat(RevealStep::Random).take(self.random_picks))
            .collect();
        AutoPlayConfig::new(self.rounds, steps)
            .with_delays(self.delay_between_rounds_ms, self.delay_after_reveal_ms)
    }
}

/// Command-line values layered on top of the file. Unset fields keep the
/// file's (or the built-in) value; a non-empty `cells` replaces the script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub balance: Option<f64>,
    pub bet: Option<f64>,
    pub mines: Option<usize>,
    pub seed: Option<u64>,
    pub rounds: Option<u32>,
    pub cells: Vec<Position>,
    pub random_picks: Option<usize>,
    pub delay_between_rounds_ms: Option<u64>,
    pub delay_after_reveal_ms: Option<u64>,
}

/// Top-level TOML file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilesFile {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub profiles: HashMap<String, AutoPlayProfile>,
}

impl ProfilesFile {
    pub fn profile(&self, name: &str) -> Result<&AutoPlayProfile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| {
            let mut available: Vec<String> = self.profiles.keys().cloned().collect();
            available.sort();
            ConfigError::UnknownProfile {
                name: name.to_string(),
                available,
            }
        })
    }

    /// Session settings and autoplay config for one run: the named profile
    /// (or built-in defaults) with CLI overrides on top.
    pub fn resolve(
        &self,
        profile_name: Option<&str>,
        overrides: &RunOverrides,
    ) -> Result<(SessionSettings, AutoPlayConfig), ConfigError> {
        let mut settings = self.session.clone();
        if let Some(v) = overrides.balance {
            settings.initial_balance = v;
        }
        if let Some(v) = overrides.bet {
            settings.bet = v;
        }
        if let Some(v) = overrides.mines {
            settings.mines = v;
        }
        if let Some(v) = overrides.seed {
            settings.seed = Some(v);
        }

        let mut profile = match profile_name {
            Some(name) => self.profile(name)?.clone(),
            None => AutoPlayProfile::default(),
        };
        if !overrides.cells.is_empty() {
            profile.cells = overrides.cells.clone();
        }
        if let Some(v) = overrides.rounds {
            profile.rounds = v;
        }
        if let Some(v) = overrides.random_picks {
            profile.random_picks = v;
        }
        if let Some(v) = overrides.delay_between_rounds_ms {
            profile.delay_between_rounds_ms = v;
        }
        if let Some(v) = overrides.delay_after_reveal_ms {
            profile.delay_after_reveal_ms = v;
        }

        Ok((settings, profile.to_config()))
    }
}

/// Load profiles from a TOML file at the given path.
pub fn load_profiles(path: &Path) -> Result<ProfilesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Try to load profiles from well-known paths, returning a default if none found.
pub fn load_default_profiles() -> ProfilesFile {
    let candidates = [
        "mines_profiles.toml",
        "../mines_profiles.toml",
        "/etc/mines/profiles.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_profiles(p) {
                Ok(profiles) => {
                    tracing::info!(
                        path = %p.display(),
                        count = profiles.profiles.len(),
                        "loaded autoplay profiles"
                    );
                    return profiles;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %p.display(),
                        error = %e,
                        "failed to load autoplay profiles"
                    );
                }
            }
        }
    }
    tracing::info!("no mines_profiles.toml found, using built-in defaults");
    ProfilesFile::default()
}
