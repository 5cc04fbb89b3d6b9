//! Psychological building blocks for character profiles.

use serde::{Deserialize, Serialize};

/// Broad emotions a character can be dominated by at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Fear,
    Joy,
    Anger,
    Sadness,
    Love,
    Trust,
    Shame,
    Calm,
}

/// Category a recorded trait belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCategory {
    Fear,
    Desire,
    Value,
    Relationship,
    Flaw,
}

/// A character's current emotional state with its intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub emotion: Emotion,
    /// Intensity from 0.0 to 1.0.
    pub intensity: f64,
}

impl EmotionalState {
    pub fn new(emotion: Emotion, intensity: f64) -> Self {
        Self {
            emotion,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Whether the emotion is strong enough to drive decisions.
    pub fn is_dominant(&self) -> bool {
        self.intensity >= 0.5
    }
}
