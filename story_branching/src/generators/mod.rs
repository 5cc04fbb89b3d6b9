//! Branch generators.
//!
//! Generator families are a closed set chosen by the caller at each decision point:
//! decision-driven, theme-driven and structure-driven. A generator never mutates its
//! parent; it returns drafts, and the tree assigns ids when it admits them.

mod decision;
mod genre;
mod structure;
mod theme;

pub use decision::*;
pub use genre::*;
pub use structure::*;
pub use theme::*;

use story_rules::ProfileSource;

use crate::branch::{BranchDraft, BranchState, DivergenceKind};

/// Which generator to run, with the context it needs.
#[derive(Debug, Clone)]
pub enum GeneratorKind {
    Decision(DecisionContext),
    Theme(ThemeContext),
    Structure(StructureContext),
}

impl GeneratorKind {
    /// Divergence kind carried by every branch this generator produces.
    pub fn divergence_kind(&self) -> DivergenceKind {
        match self {
            GeneratorKind::Decision(_) => DivergenceKind::CharacterDecision,
            GeneratorKind::Theme(_) => DivergenceKind::ThematicExploration,
            GeneratorKind::Structure(_) => DivergenceKind::DramaticStructure,
        }
    }

    /// Produce zero or more children of `parent`.
    pub fn generate(&self, parent: &BranchState, env: &GeneratorEnv<'_>) -> Vec<BranchDraft> {
        match self {
            GeneratorKind::Decision(context) => decision::generate(parent, context, env.profiles),
            GeneratorKind::Theme(context) => theme::generate(parent, context, env.themes),
            GeneratorKind::Structure(context) => structure::generate(parent, context),
        }
    }
}

/// Read-only collaborators the generators draw on.
#[derive(Clone, Copy)]
pub struct GeneratorEnv<'a> {
    pub profiles: &'a dyn ProfileSource,
    pub themes: &'a ThemeRegistry,
}

impl<'a> GeneratorEnv<'a> {
    pub fn new(profiles: &'a dyn ProfileSource, themes: &'a ThemeRegistry) -> Self {
        Self { profiles, themes }
    }
}

/// A single plain continuation of `parent`, used when no candidate was viable.
pub fn neutral_continuation(parent: &BranchState) -> BranchDraft {
    let mut draft = BranchDraft::child_of(parent, DivergenceKind::NeutralContinuation, "neutral continuation");
    draft.notes.push("degraded linear continuation".to_string());
    draft
}

/// Lowercased count of `keywords` found in `text`.
pub(crate) fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    let haystack = text.to_lowercase();
    keywords.iter().filter(|k| haystack.contains(*k)).count()
}
