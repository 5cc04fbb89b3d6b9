//! Score components and the weighted scorer.

use serde::{Deserialize, Serialize};

use super::BranchId;

/// Four quality measures of a branch, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub character_consistency: f64,
    pub dramatic_tension: f64,
    pub thematic_alignment: f64,
    pub emotional_resonance: f64,
}

impl ScoreComponents {
    /// Create components, clamping each into `[0, 1]`.
    pub fn new(
        character_consistency: f64,
        dramatic_tension: f64,
        thematic_alignment: f64,
        emotional_resonance: f64,
    ) -> Self {
        Self {
            character_consistency: clamp_unit(character_consistency),
            dramatic_tension: clamp_unit(dramatic_tension),
            thematic_alignment: clamp_unit(thematic_alignment),
            emotional_resonance: clamp_unit(emotional_resonance),
        }
    }

    /// Every component set to the same value.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn neutral() -> Self {
        Self::uniform(0.5)
    }

    /// Move each component toward `other` by `ratio` (0.0 keeps self, 1.0 takes other).
    pub fn blend(&self, other: &ScoreComponents, ratio: f64) -> Self {
        let r = clamp_unit(ratio);
        let mix = |a: f64, b: f64| a * (1.0 - r) + b * r;
        Self::new(
            mix(self.character_consistency, other.character_consistency),
            mix(self.dramatic_tension, other.dramatic_tension),
            mix(self.thematic_alignment, other.thematic_alignment),
            mix(self.emotional_resonance, other.emotional_resonance),
        )
    }
}

impl Default for ScoreComponents {
    fn default() -> Self {
        Self::neutral()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fixed weighted sum over the score components.
pub struct Scorer;

impl Scorer {
    pub const CHARACTER_CONSISTENCY: f64 = 0.4;
    pub const DRAMATIC_TENSION: f64 = 0.3;
    pub const THEMATIC_ALIGNMENT: f64 = 0.2;
    pub const EMOTIONAL_RESONANCE: f64 = 0.1;

    /// Score in `[0, 1]`. Deterministic and side-effect free.
    pub fn score(scores: &ScoreComponents) -> f64 {
        Self::CHARACTER_CONSISTENCY * scores.character_consistency
            + Self::DRAMATIC_TENSION * scores.dramatic_tension
            + Self::THEMATIC_ALIGNMENT * scores.thematic_alignment
            + Self::EMOTIONAL_RESONANCE * scores.emotional_resonance
    }

    /// Normalize raw weights so they sum to 1.0.
    ///
    /// Negative or non-finite weights count as zero. When nothing carries weight the
    /// distribution is uniform.
    pub fn normalize(raw: &[(BranchId, f64)]) -> Vec<(BranchId, f64)> {
        if raw.is_empty() {
            return Vec::new();
        }
        let sanitized: Vec<(BranchId, f64)> = raw
            .iter()
            .map(|(id, w)| (*id, if w.is_finite() && *w > 0.0 { *w } else { 0.0 }))
            .collect();
        let total: f64 = sanitized.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            let uniform = 1.0 / sanitized.len() as f64;
            return sanitized.into_iter().map(|(id, _)| (id, uniform)).collect();
        }
        sanitized.into_iter().map(|(id, w)| (id, w / total)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum() {
        let scores = ScoreComponents::new(1.0, 0.0, 0.0, 0.0);
        assert!((Scorer::score(&scores) - 0.4).abs() < 1e-12);

        let scores = ScoreComponents::new(0.5, 1.0, 0.5, 1.0);
        assert!((Scorer::score(&scores) - 0.7).abs() < 1e-12);

        assert!((Scorer::score(&ScoreComponents::uniform(1.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_components_are_clamped() {
        let scores = ScoreComponents::new(1.4, -0.2, f64::NAN, 0.5);
        assert_eq!(scores.character_consistency, 1.0);
        assert_eq!(scores.dramatic_tension, 0.0);
        assert_eq!(scores.thematic_alignment, 0.0);
    }

    #[test]
    fn test_blend() {
        let a = ScoreComponents::uniform(0.2);
        let b = ScoreComponents::uniform(0.8);
        let mid = a.blend(&b, 0.5);
        assert!((mid.dramatic_tension - 0.5).abs() < 1e-12);
        assert_eq!(a.blend(&b, 0.0), a);
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let raw = vec![(BranchId(1), 0.3), (BranchId(2), 0.6), (BranchId(3), 0.9)];
        let normalized = Scorer::normalize(&raw);
        let total: f64 = normalized.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((normalized[2].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_all_zero_is_uniform() {
        let raw = vec![(BranchId(1), 0.0), (BranchId(2), f64::NAN)];
        let normalized = Scorer::normalize(&raw);
        assert_eq!(normalized, vec![(BranchId(1), 0.5), (BranchId(2), 0.5)]);
    }
}
