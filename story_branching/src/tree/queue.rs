//! Explicit work list for multi-level exploration.

use std::collections::VecDeque;

use tracing::debug;

use crate::branch::{BranchId, BranchState};
use crate::error::{BranchError, BranchResult};
use crate::generators::{GeneratorEnv, GeneratorKind};

use super::{BranchTree, EvolveOutcome};

/// Breadth-first exploration below the committed tip.
///
/// Each popped branch is evolved once with whatever generator the planner picks for
/// it, and its surviving children are queued in turn. Branches pruned in the meantime
/// or already at the depth budget are skipped, so the work is bounded by
/// `max_active` and `max_depth`.
#[derive(Debug, Clone, Default)]
pub struct ExplorationQueue {
    pending: VecDeque<BranchId>,
}

impl ExplorationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue holding the tree's committed tip.
    pub fn from_tip(tree: &BranchTree) -> Self {
        let mut queue = Self::new();
        queue.push(tree.tip().id);
        queue
    }

    pub fn push(&mut self, id: BranchId) {
        self.pending.push_back(id);
    }

    pub fn pop(&mut self) -> Option<BranchId> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the queue. `plan` returns `None` to leave a branch unexpanded.
    pub fn run<F>(
        &mut self,
        tree: &mut BranchTree,
        env: &GeneratorEnv<'_>,
        mut plan: F,
    ) -> BranchResult<Vec<EvolveOutcome>>
    where
        F: FnMut(&BranchState) -> Option<GeneratorKind>,
    {
        let mut outcomes = Vec::new();
        while let Some(id) = self.pop() {
            let kind = match tree.open_parent(id) {
                Ok(parent) => match plan(parent) {
                    Some(kind) => kind,
                    None => continue,
                },
                Err(BranchError::UnknownBranch(_)) | Err(BranchError::DepthBudgetExhausted { .. }) => {
                    debug!(branch = %id, "skipping branch no longer open for expansion");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let outcome = tree.evolve(id, &kind, env)?;
            for child in &outcome.admitted {
                self.push(*child);
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::generators::{StructureContext, ThemeRegistry};
    use story_rules::{InitialContext, ProfileCatalog, StructuralPosition};

    fn tree(max_active: usize, max_depth: u32) -> BranchTree {
        let config = TreeConfig {
            max_active,
            max_depth,
            ..TreeConfig::default()
        };
        BranchTree::create_root(&InitialContext::new("Troy", "pride vs fate"), config).unwrap()
    }

    fn structure() -> GeneratorKind {
        GeneratorKind::Structure(StructureContext::new(StructuralPosition::Midpoint))
    }

    #[test]
    fn test_explores_to_depth_budget() {
        let mut tree = tree(20, 2);
        let profiles = ProfileCatalog::new();
        let themes = ThemeRegistry::new();
        let env = GeneratorEnv::new(&profiles, &themes);

        let mut queue = ExplorationQueue::from_tip(&tree);
        let outcomes = queue.run(&mut tree, &env, |_| Some(structure())).unwrap();

        assert!(queue.is_empty());
        assert!(tree.active_branches().len() <= 20);
        assert_eq!(tree.frontier_depth(), 2);
        // The root plus whichever depth-one branches were expanded.
        assert!(outcomes.len() >= 2);
    }

    #[test]
    fn test_capacity_holds_throughout() {
        let mut tree = tree(4, 3);
        let profiles = ProfileCatalog::new();
        let themes = ThemeRegistry::new();
        let env = GeneratorEnv::new(&profiles, &themes);

        let mut queue = ExplorationQueue::from_tip(&tree);
        queue.run(&mut tree, &env, |_| Some(structure())).unwrap();
        assert!(tree.active_branches().len() <= 4);
    }

    #[test]
    fn test_planner_can_stop() {
        let mut tree = tree(5, 3);
        let profiles = ProfileCatalog::new();
        let themes = ThemeRegistry::new();
        let env = GeneratorEnv::new(&profiles, &themes);

        let mut queue = ExplorationQueue::from_tip(&tree);
        let outcomes = queue
            .run(&mut tree, &env, |parent| parent.is_root().then(structure))
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(tree.frontier_depth(), 1);
    }
}
