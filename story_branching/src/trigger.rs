//! Collapse triggers - named conditions that force the tree to commit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use story_rules::{FlagValue, StoryPosition};

/// Context flag: a character made a choice that cannot be undone.
pub const IRREVERSIBLE_CHOICE: &str = "character_makes_irreversible_choice";
/// Context flag: the current act is about to end.
pub const ACT_ENDING: &str = "act_ending_approaches";
/// Context flag: the climax is near.
pub const CLIMAX_APPROACHING: &str = "climax_approaching";
/// Context flag: the central theme must now be resolved.
pub const THEME_NEEDS_RESOLUTION: &str = "theme_needs_resolution";
/// Context integer: branches the caller is about to request.
pub const PENDING_BRANCHES: &str = "pending_branches";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    CharacterCommitment,
    DramaticNecessity,
    ResourceConstraint,
    ThematicResolution,
    /// Collapse requested directly by the caller.
    HumanDecision,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::CharacterCommitment => "character_commitment",
            TriggerType::DramaticNecessity => "dramatic_necessity",
            TriggerType::ResourceConstraint => "resource_constraint",
            TriggerType::ThematicResolution => "thematic_resolution",
            TriggerType::HumanDecision => "human_decision",
        }
    }

    pub fn urgency(&self) -> f64 {
        match self {
            TriggerType::CharacterCommitment => 0.9,
            TriggerType::DramaticNecessity => 0.8,
            TriggerType::ResourceConstraint => 0.7,
            TriggerType::ThematicResolution => 0.6,
            TriggerType::HumanDecision => 1.0,
        }
    }

    pub fn scope(&self) -> TriggerScope {
        match self {
            TriggerType::CharacterCommitment => TriggerScope::Scene,
            TriggerType::DramaticNecessity => TriggerScope::Act,
            TriggerType::ResourceConstraint => TriggerScope::Immediate,
            TriggerType::ThematicResolution => TriggerScope::Story,
            TriggerType::HumanDecision => TriggerScope::Immediate,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            TriggerType::CharacterCommitment => {
                "character has made a commitment that eliminates other possibilities"
            }
            TriggerType::DramaticNecessity => "story structure requires resolving the current tension",
            TriggerType::ResourceConstraint => "exploration budget requires branch reduction",
            TriggerType::ThematicResolution => "the central theme needs resolution",
            TriggerType::HumanDecision => "collapse requested",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far the consequences of a collapse reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerScope {
    Scene,
    Act,
    Story,
    Immediate,
}

impl TriggerScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerScope::Scene => "scene",
            TriggerScope::Act => "act",
            TriggerScope::Story => "story",
            TriggerScope::Immediate => "immediate",
        }
    }
}

/// A fired trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseTrigger {
    pub trigger_type: TriggerType,
    /// How immediately this forces collapse, in `[0, 1]`.
    pub urgency: f64,
    pub scope: TriggerScope,
    pub reason: String,
}

impl CollapseTrigger {
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            urgency: trigger_type.urgency(),
            scope: trigger_type.scope(),
            reason: trigger_type.reason().to_string(),
        }
    }

    /// A caller-forced collapse.
    pub fn forced(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::new(TriggerType::HumanDecision)
        }
    }
}

/// Caller-supplied facts about the story at evaluation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerContext {
    values: BTreeMap<String, FlagValue>,
}

impl TriggerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<FlagValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<FlagValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// A boolean flag; absent or non-boolean values read as false.
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(FlagValue::as_int)
    }

    /// Structural flags derived from where the scene sits.
    pub fn from_story_position(position: &StoryPosition) -> Self {
        Self::new()
            .with(ACT_ENDING, position.is_act_ending())
            .with(CLIMAX_APPROACHING, position.is_climax_approaching())
            .with(THEME_NEEDS_RESOLUTION, position.act == position.total_acts)
    }
}

/// The parts of a tree's state that triggers look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLoad {
    pub active: usize,
    pub max_active: usize,
    /// Deepest active branch, in generations below the committed tip.
    pub frontier_depth: u32,
    pub max_depth: u32,
}

/// Decide whether the tree must collapse now, and why.
///
/// Returns at most one trigger, the most urgent one, except that an over-capacity
/// tree always reports `ResourceConstraint`.
pub fn evaluate(load: &TreeLoad, context: &TriggerContext) -> Option<CollapseTrigger> {
    if load.active > load.max_active {
        return Some(CollapseTrigger::new(TriggerType::ResourceConstraint));
    }

    let pending = context.int(PENDING_BRANCHES).unwrap_or(0).max(0) as usize;
    let over_budget = load.active + pending > load.max_active
        || (load.active > 0 && load.frontier_depth >= load.max_depth);

    let candidates = [
        (TriggerType::CharacterCommitment, context.flag(IRREVERSIBLE_CHOICE)),
        (
            TriggerType::DramaticNecessity,
            context.flag(ACT_ENDING) || context.flag(CLIMAX_APPROACHING),
        ),
        (TriggerType::ResourceConstraint, over_budget),
        (TriggerType::ThematicResolution, context.flag(THEME_NEEDS_RESOLUTION)),
    ];

    candidates
        .into_iter()
        .filter(|(_, fired)| *fired)
        .map(|(trigger_type, _)| trigger_type)
        .max_by(|a, b| a.urgency().total_cmp(&b.urgency()))
        .map(CollapseTrigger::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(active: usize) -> TreeLoad {
        TreeLoad {
            active,
            max_active: 5,
            frontier_depth: 1,
            max_depth: 3,
        }
    }

    #[test]
    fn test_irreversible_choice() {
        let context = TriggerContext::new().with(IRREVERSIBLE_CHOICE, true);
        let trigger = evaluate(&load(2), &context).unwrap();
        assert_eq!(trigger.trigger_type.as_str(), "character_commitment");
        assert_eq!(trigger.urgency, 0.9);
        assert_eq!(trigger.scope.as_str(), "scene");
    }

    #[test]
    fn test_nothing_fires() {
        assert!(evaluate(&load(2), &TriggerContext::new()).is_none());
    }

    #[test]
    fn test_highest_urgency_wins() {
        let context = TriggerContext::new()
            .with(ACT_ENDING, true)
            .with(THEME_NEEDS_RESOLUTION, true);
        let trigger = evaluate(&load(2), &context).unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::DramaticNecessity);
        assert_eq!(trigger.scope, TriggerScope::Act);
    }

    #[test]
    fn test_over_capacity_always_wins() {
        let context = TriggerContext::new().with(IRREVERSIBLE_CHOICE, true);
        let trigger = evaluate(&load(6), &context).unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::ResourceConstraint);
        assert_eq!(trigger.urgency, 0.7);
    }

    #[test]
    fn test_pending_branches_would_overflow() {
        let context = TriggerContext::new().with(PENDING_BRANCHES, 4i64);
        let trigger = evaluate(&load(2), &context).unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::ResourceConstraint);
    }

    #[test]
    fn test_depth_budget_spent() {
        let spent = TreeLoad {
            frontier_depth: 3,
            ..load(1)
        };
        let trigger = evaluate(&spent, &TriggerContext::new()).unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::ResourceConstraint);

        let empty = TreeLoad {
            active: 0,
            ..spent
        };
        assert!(evaluate(&empty, &TriggerContext::new()).is_none());
    }

    #[test]
    fn test_non_bool_flag_reads_false() {
        let context = TriggerContext::new().with(IRREVERSIBLE_CHOICE, "yes");
        assert!(!context.flag(IRREVERSIBLE_CHOICE));
    }

    #[test]
    fn test_context_from_story_position() {
        let position = StoryPosition::new(3, 4, 3, 4).unwrap();
        let context = TriggerContext::from_story_position(&position);
        assert!(context.flag(ACT_ENDING));
        assert!(context.flag(CLIMAX_APPROACHING));
        assert!(context.flag(THEME_NEEDS_RESOLUTION));
    }

    #[test]
    fn test_forced_trigger() {
        let trigger = CollapseTrigger::forced("editor picked");
        assert_eq!(trigger.trigger_type, TriggerType::HumanDecision);
        assert_eq!(trigger.urgency, 1.0);
        assert_eq!(trigger.reason, "editor picked");
    }
}
