//! Errors raised while loading story rules data.

use thiserror::Error;

/// Failures when reading catalogs or positions.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate character profile: {0}")]
    DuplicateCharacter(String),

    #[error("invalid story position: {0}")]
    InvalidPosition(String),
}

pub type RulesResult<T> = Result<T, RulesError>;
