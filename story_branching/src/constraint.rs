//! Creative constraints applied to the active set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::branch::{BranchDraft, BranchId, BranchState};
use crate::error::{BranchError, BranchResult};
use crate::generators::genre_variant;
use crate::tree::BranchTree;

/// Caller-supplied alignment test for `ArtisticVision`.
pub type AlignmentPredicate = Arc<dyn Fn(&BranchState) -> bool + Send + Sync>;

/// A constraint on the active set. None of them touch the committed path.
#[derive(Clone)]
pub enum Constraint {
    /// Add one variant per genre to every frontier branch, or to the tip when nothing
    /// is active.
    GenreBlend { genres: Vec<String> },
    /// Lower the depth budget for the rest of the session.
    TimePressure { max_depth: u32 },
    /// Multiply the appeal of the listed active branches.
    AudienceFeedback { appeal: BTreeMap<BranchId, f64> },
    /// Drop every active branch that fails the predicate, with its descendants.
    ArtisticVision { predicate: AlignmentPredicate },
}

impl Constraint {
    pub fn genre_blend<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::GenreBlend {
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }

    pub fn time_pressure(max_depth: u32) -> Self {
        Constraint::TimePressure { max_depth }
    }

    pub fn audience_feedback(appeal: impl IntoIterator<Item = (BranchId, f64)>) -> Self {
        Constraint::AudienceFeedback {
            appeal: appeal.into_iter().collect(),
        }
    }

    pub fn artistic_vision(predicate: impl Fn(&BranchState) -> bool + Send + Sync + 'static) -> Self {
        Constraint::ArtisticVision {
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::GenreBlend { .. } => "genre_blend",
            Constraint::TimePressure { .. } => "time_pressure",
            Constraint::AudienceFeedback { .. } => "audience_feedback",
            Constraint::ArtisticVision { .. } => "artistic_vision",
        }
    }

    /// Check parameters against the tree without changing anything.
    pub fn validate(&self, tree: &BranchTree) -> BranchResult<()> {
        match self {
            Constraint::GenreBlend { genres } => {
                if genres.is_empty() {
                    return Err(BranchError::InvalidConstraint("genre_blend needs at least one genre".into()));
                }
                if genres.iter().any(|g| g.trim().is_empty()) {
                    return Err(BranchError::InvalidConstraint("genre_blend has a blank genre".into()));
                }
            }
            Constraint::TimePressure { max_depth } => {
                if *max_depth == 0 {
                    return Err(BranchError::InvalidConstraint("time_pressure max_depth must be at least 1".into()));
                }
            }
            Constraint::AudienceFeedback { appeal } => {
                for (id, score) in appeal {
                    if tree.active_branch(*id).is_none() {
                        return Err(BranchError::InvalidConstraint(format!(
                            "audience_feedback names inactive branch {id}"
                        )));
                    }
                    if !score.is_finite() || *score < 0.0 {
                        return Err(BranchError::InvalidConstraint(format!(
                            "audience_feedback appeal {score} for {id} is not a non-negative number"
                        )));
                    }
                }
            }
            Constraint::ArtisticVision { .. } => {}
        }
        Ok(())
    }

    /// Apply an already validated constraint.
    pub(crate) fn apply(&self, tree: &mut BranchTree) {
        match self {
            Constraint::GenreBlend { genres } => {
                let drafts = genre_drafts(tree, genres);
                let drafts = tree.filter().filter(drafts);
                let (admitted, pruned) = tree.insert_batch(drafts);
                info!(
                    constraint = self.name(),
                    admitted = admitted.len(),
                    pruned = pruned.len(),
                    "applied constraint"
                );
            }
            Constraint::TimePressure { max_depth } => {
                tree.lower_max_depth(*max_depth);
                info!(constraint = self.name(), max_depth = tree.max_depth(), "applied constraint");
            }
            Constraint::AudienceFeedback { appeal } => {
                tree.scale_appeal(appeal);
                info!(constraint = self.name(), branches = appeal.len(), "applied constraint");
            }
            Constraint::ArtisticVision { predicate } => {
                let removed = tree.retain_active(|branch| predicate(branch));
                info!(constraint = self.name(), removed = removed.len(), "applied constraint");
            }
        }
    }
}

/// One variant per genre for each open frontier branch.
fn genre_drafts(tree: &BranchTree, genres: &[String]) -> Vec<BranchDraft> {
    let parents: Vec<BranchId> = if tree.active_branches().is_empty() {
        vec![tree.tip().id]
    } else {
        tree.frontier()
    };

    let mut drafts = Vec::new();
    for id in parents {
        match tree.open_parent(id) {
            Ok(parent) => drafts.extend(genres.iter().map(|genre| genre_variant(parent, genre))),
            Err(e) => debug!(branch = %id, error = %e, "no genre variants"),
        }
    }
    drafts
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::GenreBlend { genres } => f.debug_struct("GenreBlend").field("genres", genres).finish(),
            Constraint::TimePressure { max_depth } => {
                f.debug_struct("TimePressure").field("max_depth", max_depth).finish()
            }
            Constraint::AudienceFeedback { appeal } => {
                f.debug_struct("AudienceFeedback").field("appeal", appeal).finish()
            }
            Constraint::ArtisticVision { .. } => f.debug_struct("ArtisticVision").finish_non_exhaustive(),
        }
    }
}
