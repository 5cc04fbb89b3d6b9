//! The branch tree - a flat arena of active candidates over a committed timeline.
//!
//! The tree is the only mutator of branch state. Active branches live in an id-keyed
//! map; `parent_id` is a lookup key into it (or into the committed timeline), so
//! pruning a subtree is a matter of removing map entries.

mod collapse;
mod queue;
mod summary;

pub use collapse::*;
pub use queue::*;
pub use summary::*;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use story_rules::InitialContext;

use crate::branch::{BranchDraft, BranchId, BranchState, Scorer};
use crate::config::TreeConfig;
use crate::constraint::Constraint;
use crate::error::{BranchError, BranchResult};
use crate::filter::ViabilityFilter;
use crate::generators::{neutral_continuation, GeneratorEnv, GeneratorKind};
use crate::trigger::{self, CollapseTrigger, TreeLoad, TriggerContext};

/// What a single evolve step did to the active set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvolveOutcome {
    /// New branches still active after capacity pruning, ascending.
    pub admitted: Vec<BranchId>,
    /// Branches removed by capacity pruning, new or old.
    pub pruned: Vec<BranchId>,
    /// Every candidate was rejected and a neutral continuation was admitted instead.
    pub degraded: bool,
}

/// Bounded exploration state for one story.
#[derive(Debug, Clone)]
pub struct BranchTree {
    config: TreeConfig,
    filter: ViabilityFilter,
    active: BTreeMap<BranchId, BranchState>,
    /// Committed branches, in commit order. Never empty: the root is committed first.
    committed: Vec<BranchState>,
    committed_path: Vec<BranchId>,
    history: Vec<CollapseRecord>,
    discarded_total: usize,
    next_id: u64,
}

impl BranchTree {
    /// Create a tree whose root is built from `context` and committed immediately.
    pub fn create_root(context: &InitialContext, config: TreeConfig) -> BranchResult<Self> {
        config.validate()?;
        let root = BranchState::root(BranchId(0), context);
        info!(
            setting = %context.setting,
            max_active = config.max_active,
            max_depth = config.max_depth,
            "created branch tree"
        );
        Ok(Self {
            filter: ViabilityFilter::new(config.min_consistency),
            config,
            active: BTreeMap::new(),
            committed_path: vec![root.id],
            committed: vec![root],
            history: Vec::new(),
            discarded_total: 0,
            next_id: 1,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn max_active(&self) -> usize {
        self.config.max_active
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    pub fn filter(&self) -> &ViabilityFilter {
        &self.filter
    }

    /// Live candidates, keyed and ordered by id.
    pub fn active_branches(&self) -> &BTreeMap<BranchId, BranchState> {
        &self.active
    }

    pub fn active_branch(&self, id: BranchId) -> Option<&BranchState> {
        self.active.get(&id)
    }

    /// Committed ids, root first.
    pub fn committed_path(&self) -> &[BranchId] {
        &self.committed_path
    }

    /// Committed branch records, in commit order.
    pub fn committed_branches(&self) -> &[BranchState] {
        &self.committed
    }

    /// The most recently committed branch.
    pub fn tip(&self) -> &BranchState {
        &self.committed[self.committed.len() - 1]
    }

    /// Any branch still held by the tree, active or committed.
    pub fn get(&self, id: BranchId) -> Option<&BranchState> {
        self.active
            .get(&id)
            .or_else(|| self.committed.iter().rev().find(|b| b.id == id))
    }

    /// Generations between `branch` and the committed tip.
    pub fn depth_of(&self, branch: &BranchState) -> u32 {
        branch.generation.saturating_sub(self.tip().generation)
    }

    /// Deepest active branch below the tip, or 0 when nothing is active.
    pub fn frontier_depth(&self) -> u32 {
        self.active
            .values()
            .map(|b| self.depth_of(b))
            .max()
            .unwrap_or(0)
    }

    pub fn collapse_history(&self) -> &[CollapseRecord] {
        &self.history
    }

    /// Branches removed from the active set over the tree's lifetime.
    pub fn discarded_total(&self) -> usize {
        self.discarded_total
    }

    /// The tip or an active branch that still has depth budget left.
    pub fn open_parent(&self, id: BranchId) -> BranchResult<&BranchState> {
        let parent = if id == self.tip().id {
            self.tip()
        } else {
            self.active.get(&id).ok_or(BranchError::UnknownBranch(id))?
        };
        let depth = self.depth_of(parent);
        if depth >= self.config.max_depth {
            return Err(BranchError::DepthBudgetExhausted {
                parent: id,
                depth,
                max_depth: self.config.max_depth,
            });
        }
        Ok(parent)
    }

    /// Run one generator on `parent_id` and admit its viable output.
    pub fn evolve(
        &mut self,
        parent_id: BranchId,
        kind: &GeneratorKind,
        env: &GeneratorEnv<'_>,
    ) -> BranchResult<EvolveOutcome> {
        let parent = self.open_parent(parent_id)?;
        let drafts = kind.generate(parent, env);
        debug!(parent = %parent_id, candidates = drafts.len(), "generated candidates");
        self.admit(parent_id, drafts)
    }

    /// Filter `drafts`, assign ids to the survivors and insert them under `parent_id`,
    /// then enforce capacity.
    ///
    /// When candidates were offered but none is viable, a single neutral continuation of
    /// the parent is admitted instead. Drafts naming another parent are ignored, and
    /// drafts with a blank divergence cause are dropped.
    pub fn admit(
        &mut self,
        parent_id: BranchId,
        drafts: Vec<BranchDraft>,
    ) -> BranchResult<EvolveOutcome> {
        let parent = self.open_parent(parent_id)?;
        let offered = drafts.len();
        let drafts: Vec<BranchDraft> = drafts
            .into_iter()
            .filter(|d| d.parent_id == parent_id)
            .filter(|d| {
                let named = !d.divergence_cause.trim().is_empty();
                if !named {
                    let failure = BranchError::GenerationFailure {
                        cause: d.divergence_cause.clone(),
                        reason: "candidate has no divergence cause".to_string(),
                    };
                    warn!(parent = %parent_id, error = %failure, "dropped candidate");
                }
                named
            })
            .collect();

        let mut viable = self.filter.filter(drafts);
        let degraded = offered > 0 && viable.is_empty();
        if degraded {
            let exhausted = BranchError::ViabilityExhaustion { parent: parent_id };
            warn!(error = %exhausted, "falling back to a neutral continuation");
            viable.push(neutral_continuation(parent));
        }

        let (admitted, pruned) = self.insert_batch(viable);
        Ok(EvolveOutcome {
            admitted,
            pruned,
            degraded,
        })
    }

    /// Insert already-filtered drafts, renormalize and prune to capacity.
    /// Returns the surviving new ids and every pruned id.
    pub(crate) fn insert_batch(&mut self, drafts: Vec<BranchDraft>) -> (Vec<BranchId>, Vec<BranchId>) {
        let mut new_ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let generation = match self.get(draft.parent_id) {
                Some(parent) => parent.generation + 1,
                None => continue,
            };
            let id = BranchId(self.next_id);
            self.next_id += 1;
            info!(branch = %id, parent = %draft.parent_id, cause = %draft.divergence_cause, "admitted branch");
            self.active.insert(id, BranchState::from_draft(id, generation, draft));
            new_ids.push(id);
        }

        self.renormalize();
        let pruned = self.prune_to_capacity();
        new_ids.retain(|id| self.active.contains_key(id));
        (new_ids, pruned)
    }

    /// Recompute every active selection weight from quality and appeal.
    pub(crate) fn renormalize(&mut self) {
        let raw: Vec<(BranchId, f64)> = self
            .active
            .values()
            .map(|b| (b.id, b.raw_weight()))
            .collect();
        for (id, weight) in Scorer::normalize(&raw) {
            if let Some(branch) = self.active.get_mut(&id) {
                branch.selection_weight = weight;
            }
        }
    }

    /// Drop the lowest-weight branch (smallest id on ties), with its active descendants,
    /// until the active set fits.
    fn prune_to_capacity(&mut self) -> Vec<BranchId> {
        let mut pruned = Vec::new();
        while self.active.len() > self.config.max_active {
            let lowest = self
                .active
                .values()
                .min_by(|a, b| {
                    a.selection_weight
                        .total_cmp(&b.selection_weight)
                        .then(a.id.cmp(&b.id))
                })
                .map(|b| (b.id, b.selection_weight));
            let Some((lowest, weight)) = lowest else {
                break;
            };
            let removed = self.remove_subtree(lowest);
            debug!(branch = %lowest, weight, removed = removed.len(), "pruned for capacity");
            pruned.extend(removed);
            self.renormalize();
        }
        pruned
    }

    /// Remove `root` and every active branch descending from it.
    pub(crate) fn remove_subtree(&mut self, root: BranchId) -> Vec<BranchId> {
        let doomed = self.descendants(root);
        for id in &doomed {
            self.active.remove(id);
        }
        self.discarded_total += doomed.len();
        doomed.into_iter().collect()
    }

    /// `root` plus every active branch whose ancestry passes through it.
    ///
    /// Children always carry larger ids than their parents, so one ascending pass
    /// sees each parent before its children.
    fn descendants(&self, root: BranchId) -> BTreeSet<BranchId> {
        let mut found = BTreeSet::from([root]);
        for branch in self.active.values() {
            if let Some(parent) = branch.parent_id {
                if found.contains(&parent) {
                    found.insert(branch.id);
                }
            }
        }
        found.retain(|id| self.active.contains_key(id));
        found
    }

    /// Active branches with no active children.
    pub fn frontier(&self) -> Vec<BranchId> {
        let parents: BTreeSet<BranchId> = self.active.values().filter_map(|b| b.parent_id).collect();
        self.active
            .keys()
            .filter(|id| !parents.contains(id))
            .copied()
            .collect()
    }

    /// Whether the tree must collapse now, given the caller's context.
    pub fn evaluate_trigger(&self, context: &TriggerContext) -> Option<CollapseTrigger> {
        let load = TreeLoad {
            active: self.active.len(),
            max_active: self.config.max_active,
            frontier_depth: self.frontier_depth(),
            max_depth: self.config.max_depth,
        };
        trigger::evaluate(&load, context)
    }

    /// Commit one active branch, drawn by weight, and discard everything that does not
    /// descend from it.
    pub fn collapse<R: RandomSource + ?Sized>(
        &mut self,
        trigger: CollapseTrigger,
        rng: &mut R,
    ) -> BranchResult<BranchId> {
        if self.active.is_empty() {
            return Err(BranchError::CollapseOnEmptyTree);
        }

        let weighted: Vec<(BranchId, f64)> = self
            .active
            .values()
            .map(|b| (b.id, b.selection_weight))
            .collect();
        let (selected, probability) = if weighted.len() == 1 {
            (weighted[0].0, 1.0)
        } else {
            let draw = rng.next_unit();
            collapse::draw_weighted(&weighted, draw).ok_or(BranchError::CollapseOnEmptyTree)?
        };

        let keep = self.descendants(selected);
        let discarded: Vec<BranchId> = self
            .active
            .keys()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect();
        for id in &discarded {
            self.active.remove(id);
        }
        self.discarded_total += discarded.len();

        let committed = self
            .active
            .remove(&selected)
            .ok_or(BranchError::UnknownBranch(selected))?;
        self.committed_path.push(selected);
        self.committed.push(committed);
        self.renormalize();

        info!(
            branch = %selected,
            trigger = %trigger.trigger_type,
            probability,
            discarded = discarded.len(),
            remaining = self.active.len(),
            "collapsed"
        );
        self.history.push(CollapseRecord {
            trigger,
            selected,
            probability,
            candidates: weighted.len(),
            discarded,
        });
        Ok(selected)
    }

    /// Validate and apply one constraint. The tree is untouched when validation fails.
    pub fn apply_constraint(&mut self, constraint: &Constraint) -> BranchResult<()> {
        constraint.validate(self)?;
        constraint.apply(self);
        Ok(())
    }

    /// Apply constraints in order, each validated against the tree left by the ones
    /// before it. All or nothing: on the first invalid constraint the tree is unchanged.
    pub fn apply_all(&mut self, constraints: &[Constraint]) -> BranchResult<()> {
        let mut staged = self.clone();
        for constraint in constraints {
            constraint.validate(&staged)?;
            constraint.apply(&mut staged);
        }
        *self = staged;
        Ok(())
    }

    /// Lower the depth budget. Never raises it.
    pub(crate) fn lower_max_depth(&mut self, max_depth: u32) {
        if max_depth < self.config.max_depth {
            info!(from = self.config.max_depth, to = max_depth, "lowered depth budget");
            self.config.max_depth = max_depth;
        }
    }

    /// Multiply the appeal of listed branches and renormalize.
    pub(crate) fn scale_appeal(&mut self, appeal: &BTreeMap<BranchId, f64>) {
        for (id, factor) in appeal {
            if let Some(branch) = self.active.get_mut(id) {
                branch.appeal *= factor;
            }
        }
        self.renormalize();
    }

    /// Remove every active branch failing `keep`, with its descendants.
    pub(crate) fn retain_active(&mut self, keep: impl Fn(&BranchState) -> bool) -> Vec<BranchId> {
        let failing: Vec<BranchId> = self
            .active
            .values()
            .filter(|b| !keep(b))
            .map(|b| b.id)
            .collect();
        let mut removed = Vec::new();
        for id in failing {
            if self.active.contains_key(&id) {
                removed.extend(self.remove_subtree(id));
            }
        }
        self.renormalize();
        removed
    }
}
