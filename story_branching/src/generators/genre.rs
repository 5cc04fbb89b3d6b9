//! Genre variants, produced when a genre blend is applied to the active set.

use crate::branch::{BranchDraft, BranchState, DivergenceKind, ScoreComponents};

/// Score shifts `(dramatic_tension, thematic_alignment, emotional_resonance)` for a genre.
fn adjustments(genre: &str) -> (f64, f64, f64) {
    match genre.to_lowercase().as_str() {
        "thriller" | "noir" => (0.15, 0.0, 0.0),
        "mystery" => (0.1, 0.05, 0.0),
        "tragedy" => (0.1, 0.0, 0.1),
        "comedy" | "farce" => (-0.1, 0.0, 0.1),
        "romance" => (0.0, 0.0, 0.15),
        _ => (0.0, 0.05, 0.0),
    }
}

/// A variant of `parent` retold with the given genre's conventions.
pub fn genre_variant(parent: &BranchState, genre: &str) -> BranchDraft {
    let genre = genre.trim();
    let (tension, thematic, resonance) = adjustments(genre);
    let s = parent.scores;
    let scores = ScoreComponents::new(
        s.character_consistency,
        s.dramatic_tension + tension,
        s.thematic_alignment + thematic,
        s.emotional_resonance + resonance,
    );
    let mut draft = BranchDraft::child_of(parent, DivergenceKind::GenreShift, format!("{genre} blend"))
        .with_scores(scores);
    draft.set_world("genre", genre);
    draft
}
