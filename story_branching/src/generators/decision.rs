//! Decision-driven generation: one child per response archetype.

use tracing::warn;

use story_rules::{CharacterId, ProfileSource, ResponseArchetype, TraitCategory};

use super::keyword_hits;
use crate::branch::{BranchDraft, BranchState, DivergenceKind, ScoreComponents};

/// Words that mark a situation as a genuine choice point.
const DECISION_INDICATORS: &[&str] = &[
    "should", "could", "must", "what if", "either", "choose", "decide", "dilemma", "conflict",
];

/// A character facing a decision.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub character: CharacterId,
    pub situation: String,
}

impl DecisionContext {
    pub fn new(character: CharacterId, situation: impl Into<String>) -> Self {
        Self {
            character,
            situation: situation.into(),
        }
    }
}

pub(super) fn generate(
    parent: &BranchState,
    context: &DecisionContext,
    profiles: &dyn ProfileSource,
) -> Vec<BranchDraft> {
    let Some(profile) = profiles.profile(&context.character) else {
        warn!(character = %context.character, "no profile recorded, skipping decision branches");
        return Vec::new();
    };

    let situation = context.situation.as_str();
    let is_choice_point = keyword_hits(situation, DECISION_INDICATORS) > 0;
    let values_at_stake = profile.mentioned_in(TraitCategory::Value, situation).len();
    let thematic = 0.25 + 0.5 * parent.scores.thematic_alignment + 0.1 * values_at_stake as f64;

    ResponseArchetype::ALL
        .iter()
        .map(|archetype| {
            let consistency = 0.25 + 0.75 * archetype.affinity(&profile);
            let tension = archetype.base_tension() + if is_choice_point { 0.1 } else { 0.0 };
            let keywords = archetype.emotional_keywords();
            let resonance = 0.5 + 0.5 * keyword_hits(situation, keywords) as f64 / keywords.len() as f64;

            let cause = format!("{} {} response to {}", profile.name, archetype.label(), situation);
            let mut draft = BranchDraft::child_of(parent, DivergenceKind::CharacterDecision, cause)
                .with_scores(ScoreComponents::new(consistency, tension, thematic, resonance));
            draft.set_character(&profile.id, "psychological_state", archetype.label());
            draft.set_character(&profile.id, "emotional_state", archetype.emotional_tone());
            draft.set_character(
                &profile.id,
                "decision_rationale",
                format!("acting from {}", archetype.label()),
            );
            draft
        })
        .collect()
}
