//! In-memory profile catalog, loadable from TOML.

use serde::Deserialize;
use std::collections::HashMap;

use super::{CharacterId, CharacterProfile, EmotionalState, ProfileSource};
use crate::error::{RulesError, RulesResult};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    characters: Vec<ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    name: String,
    background: Option<String>,
    #[serde(default)]
    fears: Vec<String>,
    #[serde(default)]
    desires: Vec<String>,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    relationships: Vec<String>,
    #[serde(default)]
    flaws: Vec<String>,
    emotion: Option<EmotionalState>,
}

impl From<ProfileEntry> for CharacterProfile {
    fn from(entry: ProfileEntry) -> Self {
        let mut profile = CharacterProfile::new(entry.name);
        profile.background = entry.background;
        profile.fears = entry.fears;
        profile.desires = entry.desires;
        profile.values = entry.values;
        profile.relationships = entry.relationships;
        profile.flaws = entry.flaws;
        profile.current_emotion = entry
            .emotion
            .map(|e| EmotionalState::new(e.emotion, e.intensity));
        profile
    }
}

/// Character profiles held in memory.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: HashMap<CharacterId, CharacterProfile>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog of `[[characters]]` tables.
    ///
    /// ```toml
    /// [[characters]]
    /// name = "Hamlet"
    /// fears = ["death"]
    /// values = ["justice"]
    /// emotion = { emotion = "anger", intensity = 0.8 }
    /// ```
    pub fn from_toml_str(source: &str) -> RulesResult<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        let mut catalog = Self::new();
        for entry in file.characters {
            let profile = CharacterProfile::from(entry);
            if catalog.profiles.contains_key(&profile.id) {
                return Err(RulesError::DuplicateCharacter(profile.name));
            }
            catalog.insert(profile);
        }
        Ok(catalog)
    }

    /// Add or replace a profile. Returns the character id.
    pub fn insert(&mut self, profile: CharacterProfile) -> CharacterId {
        let id = profile.id.clone();
        self.profiles.insert(id.clone(), profile);
        id
    }

    pub fn get(&self, id: &CharacterId) -> Option<&CharacterProfile> {
        self.profiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileSource for ProfileCatalog {
    fn profile(&self, id: &CharacterId) -> Option<CharacterProfile> {
        self.profiles.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Emotion;

    const CATALOG: &str = r#"
        [[characters]]
        name = "Hamlet"
        background = "Prince of Denmark"
        fears = ["death", "madness"]
        values = ["justice"]
        relationships = ["Ophelia"]
        emotion = { emotion = "anger", intensity = 0.8 }

        [[characters]]
        name = "Ophelia"
        desires = ["love"]
    "#;

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ProfileCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let hamlet = catalog.profile(&CharacterId::from_name("Hamlet")).unwrap();
        assert_eq!(hamlet.fears.len(), 2);
        assert_eq!(hamlet.dominant_emotion(), Some(Emotion::Anger));
        assert_eq!(hamlet.background.as_deref(), Some("Prince of Denmark"));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let source = r#"
            [[characters]]
            name = "Hamlet"
            [[characters]]
            name = "hamlet"
        "#;
        let err = ProfileCatalog::from_toml_str(source).unwrap_err();
        assert!(matches!(err, RulesError::DuplicateCharacter(_)));
    }

    #[test]
    fn test_catalog_parse_error() {
        assert!(matches!(
            ProfileCatalog::from_toml_str("characters = 3"),
            Err(RulesError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_profile() {
        let catalog = ProfileCatalog::new();
        assert!(catalog.profile(&CharacterId::from_name("Yorick")).is_none());
    }
}
