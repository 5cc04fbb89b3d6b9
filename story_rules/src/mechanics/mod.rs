//! Story mechanics: response archetypes, dramatic patterns and structural positions.

use serde::{Deserialize, Serialize};

use crate::entities::{CharacterProfile, Emotion, TraitCategory};

/// The fixed ways a character can respond at a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseArchetype {
    FearBased,
    DesireDriven,
    ValuesAligned,
    RelationshipPrioritizing,
}

impl ResponseArchetype {
    pub const ALL: [ResponseArchetype; 4] = [
        ResponseArchetype::FearBased,
        ResponseArchetype::DesireDriven,
        ResponseArchetype::ValuesAligned,
        ResponseArchetype::RelationshipPrioritizing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResponseArchetype::FearBased => "fear-based",
            ResponseArchetype::DesireDriven => "desire-driven",
            ResponseArchetype::ValuesAligned => "values-aligned",
            ResponseArchetype::RelationshipPrioritizing => "relationship-prioritizing",
        }
    }

    /// Trait category the archetype draws on.
    pub fn trait_category(&self) -> TraitCategory {
        match self {
            ResponseArchetype::FearBased => TraitCategory::Fear,
            ResponseArchetype::DesireDriven => TraitCategory::Desire,
            ResponseArchetype::ValuesAligned => TraitCategory::Value,
            ResponseArchetype::RelationshipPrioritizing => TraitCategory::Relationship,
        }
    }

    /// Whether a dominant emotion pushes the character toward this archetype.
    pub fn resonates_with(&self, emotion: Emotion) -> bool {
        matches!(
            (*self, emotion),
            (ResponseArchetype::FearBased, Emotion::Fear | Emotion::Shame)
                | (ResponseArchetype::DesireDriven, Emotion::Joy)
                | (ResponseArchetype::ValuesAligned, Emotion::Anger)
                | (
                    ResponseArchetype::RelationshipPrioritizing,
                    Emotion::Love | Emotion::Trust
                )
        )
    }

    /// Baseline dramatic tension of a response of this kind.
    pub fn base_tension(&self) -> f64 {
        match self {
            ResponseArchetype::FearBased => 0.7,
            ResponseArchetype::DesireDriven => 0.6,
            ResponseArchetype::ValuesAligned => 0.65,
            ResponseArchetype::RelationshipPrioritizing => 0.5,
        }
    }

    /// Emotional tone recorded in the character's state.
    pub fn emotional_tone(&self) -> &'static str {
        match self {
            ResponseArchetype::FearBased => "anxious and defensive",
            ResponseArchetype::DesireDriven => "passionate and vulnerable",
            ResponseArchetype::ValuesAligned => "determined and principled",
            ResponseArchetype::RelationshipPrioritizing => "seeking connection",
        }
    }

    /// Words that signal this archetype's emotional register.
    pub fn emotional_keywords(&self) -> &'static [&'static str] {
        match self {
            ResponseArchetype::FearBased => &[
                "afraid", "scared", "anxious", "worried", "trembling", "panic", "nervous",
            ],
            ResponseArchetype::DesireDriven => {
                &["want", "need", "passion", "love", "longing", "dream", "hope"]
            }
            ResponseArchetype::ValuesAligned => {
                &["right", "wrong", "principle", "believe", "stand", "moral", "duty"]
            }
            ResponseArchetype::RelationshipPrioritizing => {
                &["together", "alone", "friend", "connect", "family", "trust", "bond"]
            }
        }
    }

    /// How strongly the profile supports this archetype, from 0.0 to 1.0.
    ///
    /// The share of the profile's motivational traits in the archetype's category,
    /// plus 0.2 when the dominant emotion resonates. A profile with no recorded
    /// motivations is neutral (0.5).
    pub fn affinity(&self, profile: &CharacterProfile) -> f64 {
        let total = profile.motivation_count();
        let share = if total == 0 {
            0.5
        } else {
            profile.traits(self.trait_category()).len() as f64 / total as f64
        };
        let bonus = match profile.dominant_emotion() {
            Some(emotion) if self.resonates_with(emotion) => 0.2,
            _ => 0.0,
        };
        (share + bonus).clamp(0.0, 1.0)
    }
}

/// Registered dramatic patterns a scene can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DramaticPattern {
    Establishment,
    Foreshadowing,
    CallToAction,
    Refusal,
    Disruption,
    Escalation,
    Complication,
    Alliance,
    Reversal,
    FalseVictory,
    DarkestMoment,
    Betrayal,
    Sacrifice,
    Revelation,
    Confrontation,
    Catharsis,
    Reconciliation,
    NewEquilibrium,
}

impl DramaticPattern {
    pub fn label(&self) -> &'static str {
        match self {
            DramaticPattern::Establishment => "establishment",
            DramaticPattern::Foreshadowing => "foreshadowing",
            DramaticPattern::CallToAction => "call to action",
            DramaticPattern::Refusal => "refusal",
            DramaticPattern::Disruption => "disruption",
            DramaticPattern::Escalation => "escalation",
            DramaticPattern::Complication => "complication",
            DramaticPattern::Alliance => "alliance",
            DramaticPattern::Reversal => "reversal",
            DramaticPattern::FalseVictory => "false victory",
            DramaticPattern::DarkestMoment => "darkest moment",
            DramaticPattern::Betrayal => "betrayal",
            DramaticPattern::Sacrifice => "sacrifice",
            DramaticPattern::Revelation => "revelation",
            DramaticPattern::Confrontation => "confrontation",
            DramaticPattern::Catharsis => "catharsis",
            DramaticPattern::Reconciliation => "reconciliation",
            DramaticPattern::NewEquilibrium => "new equilibrium",
        }
    }

    /// Seed values `(dramatic_tension, emotional_resonance)` for a scene
    /// following this pattern.
    pub fn seeds(&self) -> (f64, f64) {
        match self {
            DramaticPattern::Establishment => (0.3, 0.4),
            DramaticPattern::Foreshadowing => (0.45, 0.4),
            DramaticPattern::CallToAction => (0.6, 0.5),
            DramaticPattern::Refusal => (0.55, 0.6),
            DramaticPattern::Disruption => (0.7, 0.5),
            DramaticPattern::Escalation => (0.75, 0.5),
            DramaticPattern::Complication => (0.65, 0.45),
            DramaticPattern::Alliance => (0.4, 0.65),
            DramaticPattern::Reversal => (0.8, 0.6),
            DramaticPattern::FalseVictory => (0.6, 0.7),
            DramaticPattern::DarkestMoment => (0.85, 0.8),
            DramaticPattern::Betrayal => (0.85, 0.75),
            DramaticPattern::Sacrifice => (0.75, 0.85),
            DramaticPattern::Revelation => (0.7, 0.7),
            DramaticPattern::Confrontation => (0.9, 0.7),
            DramaticPattern::Catharsis => (0.6, 0.9),
            DramaticPattern::Reconciliation => (0.35, 0.8),
            DramaticPattern::NewEquilibrium => (0.25, 0.6),
        }
    }
}

impl std::fmt::Display for DramaticPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Position within the overall dramatic structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralPosition {
    Opening,
    IncitingIncident,
    RisingAction,
    Midpoint,
    Crisis,
    Climax,
    Resolution,
}

impl StructuralPosition {
    /// Map a narrative position in `[0, 1]` onto the structure.
    pub fn from_narrative_position(position: f64) -> Self {
        let p = position.clamp(0.0, 1.0);
        if p < 0.1 {
            StructuralPosition::Opening
        } else if p < 0.25 {
            StructuralPosition::IncitingIncident
        } else if p < 0.45 {
            StructuralPosition::RisingAction
        } else if p < 0.55 {
            StructuralPosition::Midpoint
        } else if p < 0.75 {
            StructuralPosition::Crisis
        } else if p < 0.9 {
            StructuralPosition::Climax
        } else {
            StructuralPosition::Resolution
        }
    }

    /// Patterns applicable at this position. Static lookup, not inferred.
    pub fn patterns(&self) -> &'static [DramaticPattern] {
        use DramaticPattern::*;
        match self {
            StructuralPosition::Opening => &[Establishment, Foreshadowing],
            StructuralPosition::IncitingIncident => &[CallToAction, Refusal, Disruption],
            StructuralPosition::RisingAction => &[Escalation, Complication, Alliance],
            StructuralPosition::Midpoint => &[Reversal, FalseVictory, DarkestMoment],
            StructuralPosition::Crisis => &[Betrayal, Sacrifice, Revelation],
            StructuralPosition::Climax => &[Confrontation, Sacrifice, Catharsis],
            StructuralPosition::Resolution => &[Reconciliation, NewEquilibrium],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StructuralPosition::Opening => "opening",
            StructuralPosition::IncitingIncident => "inciting incident",
            StructuralPosition::RisingAction => "rising action",
            StructuralPosition::Midpoint => "midpoint",
            StructuralPosition::Crisis => "crisis",
            StructuralPosition::Climax => "climax",
            StructuralPosition::Resolution => "resolution",
        }
    }
}
