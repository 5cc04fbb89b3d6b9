//! A lock-guarded branch tree with parallel content synthesis.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use story_rules::{InitialContext, ProfileSource};

use crate::branch::{BranchDraft, BranchId, BranchState};
use crate::collaborators::{ContentSynthesizer, ContinuityTracker, Synthesis, SynthesisRequest};
use crate::config::TreeConfig;
use crate::constraint::Constraint;
use crate::error::{BranchError, BranchResult};
use crate::generators::{GeneratorEnv, GeneratorKind, StructureContext, ThematicPole, ThemeContext, ThemeRegistry};
use crate::tree::{BranchTree, EvolveOutcome, ExplorationSummary, RandomSource, TreeSnapshot};
use crate::trigger::{CollapseTrigger, TriggerContext};

/// Unique identifier for a narrative session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One story's exploration state and the collaborators it works with.
///
/// Every mutation of the tree happens under a single lock. Content synthesis runs
/// outside it, so a slow synthesizer never blocks readers.
pub struct NarrativeSession {
    id: SessionId,
    tree: Mutex<BranchTree>,
    themes: RwLock<ThemeRegistry>,
    profiles: Arc<dyn ProfileSource>,
    synthesizer: Option<Arc<dyn ContentSynthesizer>>,
    continuity: Option<Arc<dyn ContinuityTracker>>,
}

impl NarrativeSession {
    pub fn new(
        context: &InitialContext,
        config: TreeConfig,
        profiles: Arc<dyn ProfileSource>,
    ) -> BranchResult<Self> {
        let tree = BranchTree::create_root(context, config)?;
        let id = SessionId::new();
        info!(session = %id, "started narrative session");
        Ok(Self {
            id,
            tree: Mutex::new(tree),
            themes: RwLock::new(ThemeRegistry::new()),
            profiles,
            synthesizer: None,
            continuity: None,
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn ContentSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_continuity(mut self, continuity: Arc<dyn ContinuityTracker>) -> Self {
        self.continuity = Some(continuity);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> TreeConfig {
        self.tree.lock().config().clone()
    }

    pub fn register_theme(&self, tension: &str, poles: Vec<ThematicPole>) {
        self.themes.write().register(tension, poles);
    }

    /// Run `f` against the tree under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&BranchTree) -> T) -> T {
        f(&self.tree.lock())
    }

    /// A copy of the active set.
    pub fn active_branches(&self) -> BTreeMap<BranchId, BranchState> {
        self.tree.lock().active_branches().clone()
    }

    pub fn committed_path(&self) -> Vec<BranchId> {
        self.tree.lock().committed_path().to_vec()
    }

    pub fn tip(&self) -> BranchState {
        self.tree.lock().tip().clone()
    }

    pub fn exploration_summary(&self) -> ExplorationSummary {
        self.tree.lock().exploration_summary()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.lock().snapshot()
    }

    /// Generators suggested by the continuity tracker: one per carried tension plus a
    /// structural one for the current story position.
    pub fn suggested_generators(&self) -> Vec<GeneratorKind> {
        let Some(continuity) = &self.continuity else {
            return Vec::new();
        };
        let mut kinds: Vec<GeneratorKind> = continuity
            .thematic_tensions()
            .into_iter()
            .map(|tension| GeneratorKind::Theme(ThemeContext::new(tension)))
            .collect();
        if let Some(position) = continuity.story_position() {
            kinds.push(GeneratorKind::Structure(StructureContext::from_story_position(&position)));
        }
        kinds
    }

    /// Trigger context for the tracker's story position, or an empty one.
    pub fn trigger_context(&self) -> TriggerContext {
        self.continuity
            .as_ref()
            .and_then(|c| c.story_position())
            .map(|position| TriggerContext::from_story_position(&position))
            .unwrap_or_default()
    }

    /// Evolve without content synthesis.
    pub fn evolve(&self, parent_id: BranchId, kind: &GeneratorKind) -> BranchResult<EvolveOutcome> {
        let themes = self.themes.read();
        let env = GeneratorEnv::new(self.profiles.as_ref(), &themes);
        self.tree.lock().evolve(parent_id, kind, &env)
    }

    /// Evolve, synthesizing content for every candidate in parallel before admission.
    ///
    /// Candidates whose synthesis fails or times out are dropped. Nothing reaches the
    /// tree until every call has finished, so dropping this future leaves the active
    /// set as it was.
    pub async fn evolve_with_synthesis(
        &self,
        parent_id: BranchId,
        kind: &GeneratorKind,
    ) -> BranchResult<EvolveOutcome> {
        let (parent, drafts, config) = self.stage(parent_id, kind)?;
        let drafts = match &self.synthesizer {
            Some(synthesizer) => {
                synthesize_all(Arc::clone(synthesizer), &parent, drafts, &config).await
            }
            None => drafts,
        };

        let mut tree = self.tree.lock();
        if let Err(BranchError::UnknownBranch(_)) = tree.open_parent(parent_id) {
            return Err(BranchError::StaleParent(parent_id));
        }
        tree.admit(parent_id, drafts)
    }

    /// Generate candidates from a copy of the parent, outside the tree lock.
    fn stage(
        &self,
        parent_id: BranchId,
        kind: &GeneratorKind,
    ) -> BranchResult<(BranchState, Vec<BranchDraft>, TreeConfig)> {
        let (parent, config) = {
            let tree = self.tree.lock();
            (tree.open_parent(parent_id)?.clone(), tree.config().clone())
        };
        let themes = self.themes.read();
        let env = GeneratorEnv::new(self.profiles.as_ref(), &themes);
        let drafts = kind.generate(&parent, &env);
        debug!(session = %self.id, parent = %parent_id, candidates = drafts.len(), "staged candidates");
        Ok((parent, drafts, config))
    }

    pub fn evaluate_trigger(&self, context: &TriggerContext) -> Option<CollapseTrigger> {
        self.tree.lock().evaluate_trigger(context)
    }

    /// Collapse and notify the continuity tracker of the committed branch.
    pub fn collapse<R: RandomSource + ?Sized>(
        &self,
        trigger: CollapseTrigger,
        rng: &mut R,
    ) -> BranchResult<BranchId> {
        let committed = {
            let mut tree = self.tree.lock();
            tree.collapse(trigger, rng)?;
            tree.tip().clone()
        };
        if let Some(continuity) = &self.continuity {
            continuity.record_commit(&committed);
        }
        Ok(committed.id)
    }

    /// Collapse only if a trigger fires for `context`. Evaluation and collapse happen
    /// under one lock.
    pub fn collapse_if_triggered<R: RandomSource + ?Sized>(
        &self,
        context: &TriggerContext,
        rng: &mut R,
    ) -> BranchResult<Option<CollapseTrigger>> {
        let (trigger, committed) = {
            let mut tree = self.tree.lock();
            let Some(trigger) = tree.evaluate_trigger(context) else {
                return Ok(None);
            };
            tree.collapse(trigger.clone(), rng)?;
            (trigger, tree.tip().clone())
        };
        if let Some(continuity) = &self.continuity {
            continuity.record_commit(&committed);
        }
        Ok(Some(trigger))
    }

    pub fn apply_constraint(&self, constraint: &Constraint) -> BranchResult<()> {
        self.tree.lock().apply_constraint(constraint)
    }

    pub fn apply_all(&self, constraints: &[Constraint]) -> BranchResult<()> {
        self.tree.lock().apply_all(constraints)
    }
}

impl std::fmt::Debug for NarrativeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeSession")
            .field("id", &self.id)
            .field("tree", &*self.tree.lock())
            .field("has_synthesizer", &self.synthesizer.is_some())
            .field("has_continuity", &self.continuity.is_some())
            .finish_non_exhaustive()
    }
}

/// Synthesize every draft on a bounded pool. Returns the successful drafts in their
/// original order, with content filled in and score hints blended into the seeds.
async fn synthesize_all(
    synthesizer: Arc<dyn ContentSynthesizer>,
    parent: &BranchState,
    drafts: Vec<BranchDraft>,
    config: &TreeConfig,
) -> Vec<BranchDraft> {
    let permits = Arc::new(Semaphore::new(config.worker_limit));
    let limit = config.synthesis_timeout();

    let mut tasks = JoinSet::new();
    for (index, draft) in drafts.into_iter().enumerate() {
        let request = SynthesisRequest::for_draft(parent, &draft);
        let synthesizer = Arc::clone(&synthesizer);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let result = synthesize_one(synthesizer.as_ref(), &permits, &request, limit).await;
            (index, draft, result)
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, mut draft, Ok(synthesis))) => {
                draft.content = synthesis.content;
                if let Some(hints) = synthesis.hints {
                    draft.scores = hints.blend_into(draft.scores);
                }
                finished.push((index, draft));
            }
            Ok((_, _, Err(error))) => warn!(error = %error, "dropped candidate"),
            Err(error) => warn!(error = %error, "synthesis task did not complete"),
        }
    }
    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, draft)| draft).collect()
}

async fn synthesize_one(
    synthesizer: &dyn ContentSynthesizer,
    permits: &Semaphore,
    request: &SynthesisRequest,
    limit: Duration,
) -> BranchResult<Synthesis> {
    let failure = |reason: String| BranchError::GenerationFailure {
        cause: request.divergence_cause.clone(),
        reason,
    };
    let _permit = permits.acquire().await.map_err(|e| failure(e.to_string()))?;
    match timeout(limit, synthesizer.synthesize(request)).await {
        Ok(Ok(synthesis)) => Ok(synthesis),
        Ok(Err(e)) => Err(failure(e.to_string())),
        Err(_) => Err(failure(format!("timed out after {}ms", limit.as_millis()))),
    }
}
