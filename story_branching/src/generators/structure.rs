//! Structure-driven generation: one child per dramatic pattern at a structural position.

use story_rules::{StoryPosition, StructuralPosition};

use crate::branch::{BranchDraft, BranchState, DivergenceKind, ScoreComponents};

/// Where the story stands in its act/scene structure.
#[derive(Debug, Clone, Copy)]
pub struct StructureContext {
    pub position: StructuralPosition,
}

impl StructureContext {
    pub fn new(position: StructuralPosition) -> Self {
        Self { position }
    }

    pub fn from_story_position(position: &StoryPosition) -> Self {
        Self::new(position.structural_position())
    }
}

pub(super) fn generate(parent: &BranchState, context: &StructureContext) -> Vec<BranchDraft> {
    let position = context.position;
    position
        .patterns()
        .iter()
        .map(|pattern| {
            let (tension, resonance) = pattern.seeds();
            let scores = ScoreComponents::new(
                parent.scores.character_consistency,
                tension,
                parent.scores.thematic_alignment,
                resonance,
            );
            let cause = format!("{} at {}", pattern.label(), position.label());
            let mut draft = BranchDraft::child_of(parent, DivergenceKind::DramaticStructure, cause)
                .with_scores(scores);
            draft.set_world("structural_focus", pattern.label());
            draft.set_world("structural_position", position.label());
            draft
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchId;
    use story_rules::InitialContext;

    #[test]
    fn test_midpoint_patterns() {
        let root = BranchState::root(BranchId(0), &InitialContext::new("Troy", "honour"));
        let drafts = generate(&root, &StructureContext::new(StructuralPosition::Midpoint));

        let causes: Vec<_> = drafts.iter().map(|d| d.divergence_cause.as_str()).collect();
        assert_eq!(
            causes,
            vec!["reversal at midpoint", "false victory at midpoint", "darkest moment at midpoint"]
        );
        assert_eq!(drafts[2].world_state["structural_focus"].as_str(), Some("darkest moment"));
        assert!(drafts[2].scores.dramatic_tension > drafts[1].scores.dramatic_tension);
    }

    #[test]
    fn test_from_story_position() {
        let position = StoryPosition::new(3, 3, 3, 3).unwrap();
        let context = StructureContext::from_story_position(&position);
        assert_eq!(context.position, StructuralPosition::Climax);
    }
}
