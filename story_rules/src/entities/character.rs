//! Character psychological profiles.

use serde::{Deserialize, Serialize};

use super::{CharacterId, Emotion, EmotionalState, TraitCategory};

/// The psychological profile of a character, as recorded by story memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub id: CharacterId,
    pub name: String,
    pub background: Option<String>,

    pub fears: Vec<String>,
    pub desires: Vec<String>,
    pub values: Vec<String>,
    /// Names of the people this character is bound to.
    pub relationships: Vec<String>,
    pub flaws: Vec<String>,

    /// Emotion currently colouring the character's choices.
    pub current_emotion: Option<EmotionalState>,
}

impl CharacterProfile {
    /// Create an empty profile for the named character.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: CharacterId::from_name(&name),
            name,
            background: None,
            fears: Vec::new(),
            desires: Vec::new(),
            values: Vec::new(),
            relationships: Vec::new(),
            flaws: Vec::new(),
            current_emotion: None,
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    /// Record a trait in the given category.
    pub fn with_trait(mut self, category: TraitCategory, value: impl Into<String>) -> Self {
        self.traits_mut(category).push(value.into());
        self
    }

    pub fn with_emotion(mut self, emotion: Emotion, intensity: f64) -> Self {
        self.current_emotion = Some(EmotionalState::new(emotion, intensity));
        self
    }

    /// Traits recorded in one category.
    pub fn traits(&self, category: TraitCategory) -> &[String] {
        match category {
            TraitCategory::Fear => &self.fears,
            TraitCategory::Desire => &self.desires,
            TraitCategory::Value => &self.values,
            TraitCategory::Relationship => &self.relationships,
            TraitCategory::Flaw => &self.flaws,
        }
    }

    fn traits_mut(&mut self, category: TraitCategory) -> &mut Vec<String> {
        match category {
            TraitCategory::Fear => &mut self.fears,
            TraitCategory::Desire => &mut self.desires,
            TraitCategory::Value => &mut self.values,
            TraitCategory::Relationship => &mut self.relationships,
            TraitCategory::Flaw => &mut self.flaws,
        }
    }

    /// Number of motivational traits (flaws excluded).
    pub fn motivation_count(&self) -> usize {
        self.fears.len() + self.desires.len() + self.values.len() + self.relationships.len()
    }

    /// Traits of a category mentioned (case-insensitively) in `text`.
    pub fn mentioned_in<'a>(&'a self, category: TraitCategory, text: &str) -> Vec<&'a str> {
        let haystack = text.to_lowercase();
        self.traits(category)
            .iter()
            .filter(|t| !t.is_empty() && haystack.contains(&t.to_lowercase()))
            .map(String::as_str)
            .collect()
    }

    /// The dominant emotion, if one is strong enough to drive decisions.
    pub fn dominant_emotion(&self) -> Option<Emotion> {
        self.current_emotion
            .filter(EmotionalState::is_dominant)
            .map(|e| e.emotion)
    }
}
