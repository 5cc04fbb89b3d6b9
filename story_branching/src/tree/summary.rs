//! Read-only reports over a branch tree.

use serde::{Deserialize, Serialize};

use crate::branch::{BranchId, DivergenceKind};
use crate::error::BranchResult;

use super::BranchTree;

const PREVIEW_CHARS: usize = 100;

/// Counters describing the current exploration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSummary {
    pub active_branches: usize,
    pub discarded_branches: usize,
    pub max_depth_explored: u32,
    pub max_depth: u32,
    pub committed_decisions: usize,
    pub average_quality: f64,
    pub root: BranchId,
    pub tip: BranchId,
}

/// One branch in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: BranchId,
    pub parent_id: Option<BranchId>,
    pub kind: DivergenceKind,
    pub divergence_cause: String,
    pub content_preview: String,
    pub quality: f64,
    pub selection_weight: f64,
    /// Generations below the root.
    pub generation: u32,
    pub children: Vec<BranchId>,
    pub committed: bool,
}

/// Serializable export of the committed timeline and the active set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub committed_path: Vec<BranchId>,
    pub nodes: Vec<SnapshotNode>,
    pub summary: ExplorationSummary,
}

impl TreeSnapshot {
    pub fn to_json(&self) -> BranchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl BranchTree {
    pub fn exploration_summary(&self) -> ExplorationSummary {
        let active = self.active_branches();
        let average_quality = if active.is_empty() {
            0.0
        } else {
            active.values().map(|b| b.quality()).sum::<f64>() / active.len() as f64
        };
        ExplorationSummary {
            active_branches: active.len(),
            discarded_branches: self.discarded_total(),
            max_depth_explored: self.frontier_depth(),
            max_depth: self.max_depth(),
            committed_decisions: self.committed_path().len() - 1,
            average_quality,
            root: self.committed_path()[0],
            tip: self.tip().id,
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let committed = self.committed_branches().iter().map(|b| (b, true));
        let active = self.active_branches().values().map(|b| (b, false));
        let all: Vec<_> = committed.chain(active).collect();

        let nodes = all
            .iter()
            .map(|(branch, is_committed)| SnapshotNode {
                id: branch.id,
                parent_id: branch.parent_id,
                kind: branch.kind,
                divergence_cause: branch.divergence_cause.clone(),
                content_preview: branch.preview(PREVIEW_CHARS),
                quality: branch.quality(),
                selection_weight: branch.selection_weight,
                generation: branch.generation,
                children: all
                    .iter()
                    .filter(|(child, _)| child.parent_id == Some(branch.id))
                    .map(|(child, _)| child.id)
                    .collect(),
                committed: *is_committed,
            })
            .collect();

        TreeSnapshot {
            committed_path: self.committed_path().to_vec(),
            nodes,
            summary: self.exploration_summary(),
        }
    }
}
