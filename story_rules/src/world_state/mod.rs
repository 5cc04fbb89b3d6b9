//! Story state - the opaque maps carried by narrative branches, plus story position.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::CharacterId;
use crate::error::{RulesError, RulesResult};
use crate::mechanics::StructuralPosition;

/// Flag value types for branch state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

/// Opaque key/value state owned by a single branch.
pub type StateMap = BTreeMap<String, FlagValue>;

/// Per-character state owned by a single branch.
pub type CharacterStates = BTreeMap<CharacterId, StateMap>;

/// Where a scene sits in the act/scene structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPosition {
    pub act: u32,
    pub scene: u32,
    pub total_acts: u32,
    pub scenes_per_act: u32,
}

impl StoryPosition {
    /// Create a position. Acts and scenes are 1-based.
    pub fn new(act: u32, scene: u32, total_acts: u32, scenes_per_act: u32) -> RulesResult<Self> {
        if total_acts == 0 || scenes_per_act == 0 {
            return Err(RulesError::InvalidPosition(
                "structure needs at least one act and one scene".to_string(),
            ));
        }
        if act == 0 || act > total_acts || scene == 0 || scene > scenes_per_act {
            return Err(RulesError::InvalidPosition(format!(
                "act {act} scene {scene} outside {total_acts}x{scenes_per_act}"
            )));
        }
        Ok(Self {
            act,
            scene,
            total_acts,
            scenes_per_act,
        })
    }

    /// Approximate position in the whole story, from 0.0 to 1.0.
    ///
    /// Fields may be set directly or deserialized, so out-of-range values are
    /// clamped instead of trusted.
    pub fn narrative_position(&self) -> f64 {
        let acts = self.total_acts.max(1) as f64;
        let scenes = self.scenes_per_act.max(1) as f64;
        let act_fraction = self.act.saturating_sub(1) as f64 / acts;
        let scene_fraction = self.scene.saturating_sub(1) as f64 / scenes / acts;
        (act_fraction + scene_fraction).clamp(0.0, 1.0)
    }

    pub fn structural_position(&self) -> StructuralPosition {
        StructuralPosition::from_narrative_position(self.narrative_position())
    }

    /// Whether this is the last scene of its act.
    pub fn is_act_ending(&self) -> bool {
        self.scene >= self.scenes_per_act
    }

    /// Whether the story is in its final act, past the opening scene.
    pub fn is_climax_approaching(&self) -> bool {
        self.act == self.total_acts && self.scene > 1
    }

    /// Move to the next scene, rolling into the next act. Returns false at the end.
    pub fn advance_scene(&mut self) -> bool {
        if self.scene < self.scenes_per_act {
            self.scene += 1;
            true
        } else if self.act < self.total_acts {
            self.act += 1;
            self.scene = 1;
            true
        } else {
            false
        }
    }
}

/// The context a story session starts from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialContext {
    pub setting: String,
    pub theme: String,
    pub participants: Vec<String>,
    pub position: Option<StoryPosition>,
}

impl InitialContext {
    pub fn new(setting: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            setting: setting.into(),
            theme: theme.into(),
            ..Default::default()
        }
    }

    pub fn with_participant(mut self, name: impl Into<String>) -> Self {
        self.participants.push(name.into());
        self
    }

    pub fn with_position(mut self, position: StoryPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// World state for the root branch.
    pub fn world_state(&self) -> StateMap {
        let mut state = StateMap::new();
        state.insert("setting".into(), self.setting.as_str().into());
        state.insert("thematic_tension".into(), self.theme.as_str().into());
        if let Some(position) = self.position {
            state.insert("act".into(), FlagValue::Int(position.act as i64));
            state.insert("scene".into(), FlagValue::Int(position.scene as i64));
            state.insert(
                "structural_position".into(),
                position.structural_position().label().into(),
            );
        }
        state
    }

    /// Character states for the root branch: one entry per participant.
    pub fn character_states(&self) -> CharacterStates {
        self.participants
            .iter()
            .map(|name| {
                let mut state = StateMap::new();
                state.insert("name".into(), name.as_str().into());
                state.insert("present_in_scene".into(), true.into());
                state.insert("emotional_state".into(), "initial".into());
                state.insert("arc_stage".into(), "beginning".into());
                (CharacterId::from_name(name), state)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_validation() {
        assert!(StoryPosition::new(1, 1, 3, 4).is_ok());
        assert!(StoryPosition::new(0, 1, 3, 4).is_err());
        assert!(StoryPosition::new(4, 1, 3, 4).is_err());
        assert!(StoryPosition::new(1, 5, 3, 4).is_err());
        assert!(StoryPosition::new(1, 1, 0, 4).is_err());
    }

    #[test]
    fn test_narrative_position() {
        let start = StoryPosition::new(1, 1, 3, 4).unwrap();
        assert_eq!(start.narrative_position(), 0.0);

        let midpoint = StoryPosition::new(2, 3, 3, 4).unwrap();
        assert!((midpoint.narrative_position() - 0.5).abs() < 1e-9);
        assert_eq!(midpoint.structural_position(), StructuralPosition::Midpoint);
    }

    #[test]
    fn test_narrative_position_out_of_range() {
        let zero_act: StoryPosition =
            toml::from_str("act = 0\nscene = 1\ntotal_acts = 3\nscenes_per_act = 4").unwrap();
        assert_eq!(zero_act.narrative_position(), 0.0);
        assert_eq!(zero_act.structural_position(), StructuralPosition::Opening);

        let empty = StoryPosition {
            act: 0,
            scene: 0,
            total_acts: 0,
            scenes_per_act: 0,
        };
        assert_eq!(empty.narrative_position(), 0.0);

        let overrun = StoryPosition {
            act: 9,
            scene: 9,
            total_acts: 3,
            scenes_per_act: 4,
        };
        assert_eq!(overrun.narrative_position(), 1.0);
    }

    #[test]
    fn test_advance_scene() {
        let mut position = StoryPosition::new(1, 2, 2, 2).unwrap();
        assert!(position.is_act_ending());

        assert!(position.advance_scene());
        assert_eq!((position.act, position.scene), (2, 1));
        assert!(!position.is_climax_approaching());

        assert!(position.advance_scene());
        assert!(position.is_climax_approaching());
        assert!(!position.advance_scene());
    }

    #[test]
    fn test_initial_context_state() {
        let context = InitialContext::new("Elsinore", "duty vs desire")
            .with_participant("Hamlet")
            .with_participant("Ophelia")
            .with_position(StoryPosition::new(1, 1, 5, 3).unwrap());

        let world = context.world_state();
        assert_eq!(world["setting"].as_str(), Some("Elsinore"));
        assert_eq!(world["act"].as_int(), Some(1));

        let characters = context.character_states();
        assert_eq!(characters.len(), 2);
        let hamlet = &characters[&CharacterId::from_name("Hamlet")];
        assert_eq!(hamlet["present_in_scene"].as_bool(), Some(true));
    }

    #[test]
    fn test_flag_value_untagged_serde() {
        let rendered = toml::to_string(&StateMap::from([("act".to_string(), FlagValue::Int(2))]))
            .unwrap();
        assert!(rendered.contains("act = 2"));
    }
}
