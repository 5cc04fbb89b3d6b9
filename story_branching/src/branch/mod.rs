//! Branch records - one narrative possibility each.

mod score;

pub use score::*;

use serde::{Deserialize, Serialize};

use story_rules::{CharacterId, CharacterStates, FlagValue, InitialContext, StateMap};

/// Identifier of a branch, unique within its tree and never reused.
///
/// Ids are handed out in creation order, so ascending id is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub u64);

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which generator family produced a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    Origin,
    CharacterDecision,
    ThematicExploration,
    DramaticStructure,
    GenreShift,
    NeutralContinuation,
}

/// A candidate child produced by a generator, not yet admitted to a tree.
#[derive(Debug, Clone)]
pub struct BranchDraft {
    pub parent_id: BranchId,
    pub divergence_cause: String,
    pub kind: DivergenceKind,
    pub content: String,
    pub character_states: CharacterStates,
    pub world_state: StateMap,
    pub scores: ScoreComponents,
    pub notes: Vec<String>,
}

impl BranchDraft {
    /// Start a child of `parent` with a full copy of its state and scores.
    pub fn child_of(
        parent: &BranchState,
        kind: DivergenceKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: parent.id,
            divergence_cause: cause.into(),
            kind,
            content: String::new(),
            character_states: parent.character_states.clone(),
            world_state: parent.world_state.clone(),
            scores: parent.scores,
            notes: Vec::new(),
        }
    }

    pub fn with_scores(mut self, scores: ScoreComponents) -> Self {
        self.scores = scores;
        self
    }

    /// Set a world-state key on this draft only.
    pub fn set_world(&mut self, key: &str, value: impl Into<FlagValue>) {
        self.world_state.insert(key.to_string(), value.into());
    }

    /// Set a character-state key on this draft only.
    pub fn set_character(&mut self, character: &CharacterId, key: &str, value: impl Into<FlagValue>) {
        self.character_states
            .entry(character.clone())
            .or_default()
            .insert(key.to_string(), value.into());
    }
}

/// One narrative possibility with its own scored state.
///
/// Immutable once admitted, apart from the derived `selection_weight` and the
/// audience `appeal` multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchState {
    pub id: BranchId,
    pub parent_id: Option<BranchId>,
    pub divergence_cause: String,
    pub kind: DivergenceKind,
    pub content: String,
    pub character_states: CharacterStates,
    pub world_state: StateMap,
    pub scores: ScoreComponents,
    /// Audience appeal multiplier, 1.0 until feedback says otherwise.
    pub appeal: f64,
    /// Normalized selection probability among the active set.
    pub selection_weight: f64,
    /// Generations below the root.
    pub generation: u32,
    pub notes: Vec<String>,
}

impl BranchState {
    /// The root of a story: no parent, no divergence cause.
    pub(crate) fn root(id: BranchId, context: &InitialContext) -> Self {
        Self {
            id,
            parent_id: None,
            divergence_cause: String::new(),
            kind: DivergenceKind::Origin,
            content: String::new(),
            character_states: context.character_states(),
            world_state: context.world_state(),
            scores: ScoreComponents::neutral(),
            appeal: 1.0,
            selection_weight: 0.0,
            generation: 0,
            notes: Vec::new(),
        }
    }

    /// Admit a draft under a fresh id.
    pub(crate) fn from_draft(id: BranchId, generation: u32, draft: BranchDraft) -> Self {
        Self {
            id,
            parent_id: Some(draft.parent_id),
            divergence_cause: draft.divergence_cause,
            kind: draft.kind,
            content: draft.content,
            character_states: draft.character_states,
            world_state: draft.world_state,
            scores: draft.scores,
            appeal: 1.0,
            selection_weight: 0.0,
            generation,
            notes: draft.notes,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Weighted quality score, before appeal and normalization.
    pub fn quality(&self) -> f64 {
        Scorer::score(&self.scores)
    }

    /// Weight before normalization: quality scaled by audience appeal.
    pub fn raw_weight(&self) -> f64 {
        self.quality() * self.appeal
    }

    /// First `limit` characters of the content, for summaries.
    pub fn preview(&self, limit: usize) -> String {
        let mut preview: String = self.content.chars().take(limit).collect();
        if self.content.chars().count() > limit {
            preview.push_str("...");
        }
        preview
    }

    pub fn character_state(&self, id: &CharacterId) -> Option<&StateMap> {
        self.character_states.get(id)
    }
}
