//! Theme-driven generation: one child per pole of a thematic tension.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::branch::{BranchDraft, BranchState, DivergenceKind, ScoreComponents};

/// How a pole relates to the tension it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoleStance {
    /// Argues for one side.
    Emphasis,
    /// Looks for a way to reconcile both sides.
    Synthesis,
    /// Shows each side turning into the other.
    Paradox,
}

impl PoleStance {
    /// Seed values `(dramatic_tension, thematic_alignment, emotional_resonance)`.
    fn seeds(&self) -> (f64, f64, f64) {
        match self {
            PoleStance::Emphasis => (0.5, 0.7, 0.5),
            PoleStance::Synthesis => (0.45, 0.8, 0.6),
            PoleStance::Paradox => (0.7, 0.75, 0.65),
        }
    }

    fn describe(&self, pole: &str) -> String {
        match self {
            PoleStance::Emphasis => format!("prioritizing {pole}"),
            PoleStance::Synthesis => "seeking integration and balance".to_string(),
            PoleStance::Paradox => "embracing complexity and contradiction".to_string(),
        }
    }
}

/// One side (or reading) of a thematic tension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicPole {
    pub name: String,
    pub stance: PoleStance,
}

impl ThematicPole {
    pub fn new(name: impl Into<String>, stance: PoleStance) -> Self {
        Self {
            name: name.into(),
            stance,
        }
    }

    pub fn emphasis(name: impl Into<String>) -> Self {
        Self::new(name, PoleStance::Emphasis)
    }
}

/// Poles registered per thematic tension.
#[derive(Debug, Clone, Default)]
pub struct ThemeRegistry {
    tensions: BTreeMap<String, Vec<ThematicPole>>,
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the poles of a tension.
    pub fn register(&mut self, tension: &str, poles: Vec<ThematicPole>) {
        self.tensions.insert(normalize(tension), poles);
    }

    pub fn is_registered(&self, tension: &str) -> bool {
        self.tensions.contains_key(&normalize(tension))
    }
    /// Registered poles, or poles read from an "A vs B" name. Parsed poles are not stored.
    /// Registered poles, or poles read from an "A vs B" name.
    pub fn poles_for(&self, tension: &str) -> Vec<ThematicPole> {
        self.tensions
            .get(&normalize(tension))
            .cloned()
            .or_else(|| parse_tension(tension))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensions.is_empty()
    }
}

fn normalize(tension: &str) -> String {
    tension.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Read "freedom vs. security" as two emphasis poles plus a synthesis and a paradox.
pub fn parse_tension(tension: &str) -> Option<Vec<ThematicPole>> {
    let lowered = normalize(tension);
    let (a, b) = [" versus ", " vs. ", " vs "]
        .iter()
        .find_map(|sep| lowered.split_once(sep))?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() || b.contains(" vs") {
        return None;
    }
    Some(vec![
        ThematicPole::emphasis(a),
        ThematicPole::emphasis(b),
        ThematicPole::new(format!("synthesis of {a} and {b}"), PoleStance::Synthesis),
        ThematicPole::new(format!("paradox of {a} and {b}"), PoleStance::Paradox),
    ])
}

/// The tension to explore.
#[derive(Debug, Clone)]
pub struct ThemeContext {
    pub tension: String,
}

impl ThemeContext {
    pub fn new(tension: impl Into<String>) -> Self {
        Self {
            tension: tension.into(),
        }
    }
}

pub(super) fn generate(
    parent: &BranchState,
    context: &ThemeContext,
    registry: &ThemeRegistry,
) -> Vec<BranchDraft> {
    registry
        .poles_for(&context.tension)
        .into_iter()
        .filter(|pole| !pole.name.trim().is_empty())
        .map(|pole| {
            let (tension, thematic, resonance) = pole.stance.seeds();
            let scores = ScoreComponents::new(
                parent.scores.character_consistency,
                tension,
                thematic,
                0.5 * parent.scores.emotional_resonance + 0.5 * resonance,
            );
            let mut draft =
                BranchDraft::child_of(parent, DivergenceKind::ThematicExploration, pole.name.clone())
                    .with_scores(scores);
            draft.set_world("dominant_theme", pole.name.as_str());
            draft.set_world("thematic_tension", context.tension.as_str());
            draft.set_world("philosophical_stance", pole.stance.describe(&pole.name));
            draft
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchId;
    use story_rules::InitialContext;

    fn root() -> BranchState {
        BranchState::root(BranchId(0), &InitialContext::new("Thebes", "law vs conscience"))
    }

    #[test]
    fn test_parse_tension_variants() {
        for name in ["Freedom vs. Security", "freedom versus security", "freedom  vs security"] {
            let poles = parse_tension(name).unwrap();
            assert_eq!(poles[0].name, "freedom");
            assert_eq!(poles[1].name, "security");
            assert_eq!(poles[2].stance, PoleStance::Synthesis);
        }
        assert!(parse_tension("loneliness").is_none());
        assert!(parse_tension(" vs security").is_none());
    }

    #[test]
    fn test_registered_poles_win() {
        let mut registry = ThemeRegistry::new();
        registry.register(
            "Law vs Conscience",
            vec![ThematicPole::emphasis("law"), ThematicPole::emphasis("conscience")],
        );
        assert!(registry.is_registered("law  vs conscience"));

        let drafts = generate(&root(), &ThemeContext::new("law vs conscience"), &registry);
        let causes: Vec<_> = drafts.iter().map(|d| d.divergence_cause.as_str()).collect();
        assert_eq!(causes, vec!["law", "conscience"]);
    }

    #[test]
    fn test_world_state_delta() {
        let drafts = generate(&root(), &ThemeContext::new("freedom vs security"), &ThemeRegistry::new());
        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[0].world_state["dominant_theme"].as_str(), Some("freedom"));
        assert_eq!(
            drafts[1].world_state["philosophical_stance"].as_str(),
            Some("prioritizing security")
        );
        // Inherited keys survive.
        assert_eq!(drafts[0].world_state["setting"].as_str(), Some("Thebes"));
    }

    #[test]
    fn test_parsed_tension_is_not_stored() {
        let registry = ThemeRegistry::new();
        let drafts = generate(&root(), &ThemeContext::new("fate vs will"), &registry);
        assert_eq!(drafts.len(), 4);
        assert!(!registry.is_registered("fate vs will"));
        assert!(registry.is_empty());
        assert_eq!(registry.poles_for("fate vs will").len(), 4);
    }

    #[test]
    fn test_unknown_theme_yields_nothing() {
        let drafts = generate(&root(), &ThemeContext::new("entropy"), &ThemeRegistry::new());
        assert!(drafts.is_empty());
    }
}
