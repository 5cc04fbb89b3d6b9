//! Viability filter - the minimum-coherence gate for new candidates.

use tracing::debug;

use crate::branch::BranchDraft;

/// Rejects candidates whose character consistency falls below a threshold.
#[derive(Debug, Clone, Copy)]
pub struct ViabilityFilter {
    min_consistency: f64,
}

impl ViabilityFilter {
    pub const DEFAULT_MIN_CONSISTENCY: f64 = 0.3;

    pub fn new(min_consistency: f64) -> Self {
        Self { min_consistency }
    }

    pub fn min_consistency(&self) -> f64 {
        self.min_consistency
    }

    pub fn is_viable(&self, draft: &BranchDraft) -> bool {
        draft.scores.character_consistency >= self.min_consistency
    }

    /// Keep the viable candidates, preserving order. Rejected ones are dropped for good.
    pub fn filter(&self, candidates: Vec<BranchDraft>) -> Vec<BranchDraft> {
        candidates
            .into_iter()
            .filter(|draft| {
                let viable = self.is_viable(draft);
                if !viable {
                    debug!(
                        cause = %draft.divergence_cause,
                        consistency = draft.scores.character_consistency,
                        "rejected non-viable candidate"
                    );
                }
                viable
            })
            .collect()
    }
}

impl Default for ViabilityFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_CONSISTENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::{BranchId, DivergenceKind, ScoreComponents};
    use story_rules::{CharacterStates, StateMap};

    fn draft(cause: &str, consistency: f64) -> BranchDraft {
        BranchDraft {
            parent_id: BranchId(0),
            divergence_cause: cause.to_string(),
            kind: DivergenceKind::CharacterDecision,
            content: String::new(),
            character_states: CharacterStates::new(),
            world_state: StateMap::new(),
            scores: ScoreComponents::new(consistency, 0.5, 0.5, 0.5),
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let filter = ViabilityFilter::default();
        let kept = filter.filter(vec![
            draft("a", 0.9),
            draft("b", 0.1),
            draft("c", 0.3),
            draft("d", 0.29),
            draft("e", 0.5),
        ]);
        let causes: Vec<_> = kept.iter().map(|d| d.divergence_cause.as_str()).collect();
        assert_eq!(causes, vec!["a", "c", "e"]);
    }

    #[test]
    fn test_filter_can_reject_everything() {
        let filter = ViabilityFilter::new(0.8);
        assert!(filter.filter(vec![draft("a", 0.5), draft("b", 0.7)]).is_empty());
    }
}
