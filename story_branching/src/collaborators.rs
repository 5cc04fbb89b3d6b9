//! Interfaces to the collaborators around the branch core: content synthesis and
//! continuity tracking. Character profiles come from `story_rules::ProfileSource`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use story_rules::{CharacterStates, StateMap, StoryPosition};

use crate::branch::{BranchDraft, BranchId, BranchState, DivergenceKind, ScoreComponents};

/// Everything a synthesizer sees about one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub parent_id: BranchId,
    pub divergence_cause: String,
    pub kind: DivergenceKind,
    /// Content of the branch being continued.
    pub parent_content: String,
    pub character_states: CharacterStates,
    pub world_state: StateMap,
}

impl SynthesisRequest {
    pub fn for_draft(parent: &BranchState, draft: &BranchDraft) -> Self {
        Self {
            parent_id: parent.id,
            divergence_cause: draft.divergence_cause.clone(),
            kind: draft.kind,
            parent_content: parent.content.clone(),
            character_states: draft.character_states.clone(),
            world_state: draft.world_state.clone(),
        }
    }
}

/// Optional score seeds returned alongside synthesized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreHints {
    pub character_consistency: Option<f64>,
    pub dramatic_tension: Option<f64>,
    pub thematic_alignment: Option<f64>,
    pub emotional_resonance: Option<f64>,
}

impl ScoreHints {
    /// Average each hinted component with the generator's seed; unhinted ones keep the seed.
    pub fn blend_into(&self, seeds: ScoreComponents) -> ScoreComponents {
        let mix = |seed: f64, hint: Option<f64>| match hint {
            Some(hint) if hint.is_finite() => (seed + hint) / 2.0,
            _ => seed,
        };
        ScoreComponents::new(
            mix(seeds.character_consistency, self.character_consistency),
            mix(seeds.dramatic_tension, self.dramatic_tension),
            mix(seeds.thematic_alignment, self.thematic_alignment),
            mix(seeds.emotional_resonance, self.emotional_resonance),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub content: String,
    pub hints: Option<ScoreHints>,
}

impl Synthesis {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            hints: None,
        }
    }

    pub fn with_hints(mut self, hints: ScoreHints) -> Self {
        self.hints = Some(hints);
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("synthesis failed: {0}")]
    Failed(String),

    #[error("synthesizer unavailable: {0}")]
    Unavailable(String),
}

/// Produces narrative text for a candidate branch. May fail or hang; callers bound
/// each call with a timeout.
#[async_trait::async_trait]
pub trait ContentSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Synthesis, SynthesisError>;
}

/// Long-lived story memory outside the tree.
pub trait ContinuityTracker: Send + Sync {
    /// Thematic tensions the story is currently carrying.
    fn thematic_tensions(&self) -> Vec<String>;

    fn story_position(&self) -> Option<StoryPosition>;

    /// Called once for every committed branch.
    fn record_commit(&self, branch: &BranchState);
}

/// In-memory continuity tracker.
#[derive(Debug, Default)]
pub struct ContinuityLog {
    tensions: Vec<String>,
    position: Mutex<Option<StoryPosition>>,
    commits: Mutex<Vec<BranchState>>,
}

impl ContinuityLog {
    pub fn new(tensions: Vec<String>, position: Option<StoryPosition>) -> Self {
        Self {
            tensions,
            position: Mutex::new(position),
            commits: Mutex::new(Vec::new()),
        }
    }

    pub fn commits(&self) -> Vec<BranchState> {
        self.commits.lock().clone()
    }
}

impl ContinuityTracker for ContinuityLog {
    fn thematic_tensions(&self) -> Vec<String> {
        self.tensions.clone()
    }

    fn story_position(&self) -> Option<StoryPosition> {
        *self.position.lock()
    }

    /// Stores the branch and moves the story on by one scene.
    fn record_commit(&self, branch: &BranchState) {
        self.commits.lock().push(branch.clone());
        if let Some(position) = self.position.lock().as_mut() {
            position.advance_scene();
        }
    }
}
