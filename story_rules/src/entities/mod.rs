//! Character definitions for the story world.

mod catalog;
mod character;
mod components;

pub use catalog::*;
pub use character::*;
pub use components::*;

use serde::{Deserialize, Serialize};

/// Stable identifier for a character, derived from the display name.
///
/// "Lady Macbeth" and "lady  macbeth" map to the same id (`lady_macbeth`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    /// Build an id from a display name.
    pub fn from_name(name: &str) -> Self {
        let slug = name
            .split_whitespace()
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join("_");
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of psychological profiles for characters.
///
/// Implemented by whatever holds character memory; `ProfileCatalog` is the
/// in-memory version.
pub trait ProfileSource: Send + Sync {
    /// Look up the profile for a character, if one is recorded.
    fn profile(&self, id: &CharacterId) -> Option<CharacterProfile>;
}
