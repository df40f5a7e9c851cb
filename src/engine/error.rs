//! Infrastructure errors. Gameplay itself never errors; see the bool/Option
//! returns on `Board` and `GameSession`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsePositionError {
    #[error("expected `row,col`, got `{0}`")]
    MissingSeparator(String),
    #[error("`{0}` is not a valid grid index")]
    InvalidNumber(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("profile `{name}` not found (available: {available:?})")]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },
}
