//! Weighted selection for collapse.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::branch::BranchId;
use crate::trigger::CollapseTrigger;

/// Source of the single uniform draw consumed by each collapse.
pub trait RandomSource {
    /// A value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible draws from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, repeating the last one when exhausted.
#[derive(Debug, Clone)]
pub struct FixedDraw {
    draws: Vec<f64>,
    position: usize,
}

impl FixedDraw {
    pub fn new(draw: f64) -> Self {
        Self::sequence(vec![draw])
    }

    pub fn sequence(draws: Vec<f64>) -> Self {
        Self { draws, position: 0 }
    }
}

impl RandomSource for FixedDraw {
    fn next_unit(&mut self) -> f64 {
        let draw = match self.draws.get(self.position) {
            Some(draw) => *draw,
            None => self.draws.last().copied().unwrap_or(0.0),
        };
        self.position += 1;
        draw.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Pick from `(id, weight)` pairs, already in ascending id order, as a cumulative
/// distribution. The first member whose cumulative upper bound exceeds `draw` wins;
/// rounding slack at the top end falls to the last member.
pub(crate) fn draw_weighted(weighted: &[(BranchId, f64)], draw: f64) -> Option<(BranchId, f64)> {
    let mut cumulative = 0.0;
    for &(id, weight) in weighted {
        cumulative += weight;
        if draw < cumulative {
            return Some((id, weight));
        }
    }
    weighted.last().copied()
}

/// One entry of the collapse history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapseRecord {
    pub trigger: CollapseTrigger,
    pub selected: BranchId,
    /// Normalized weight the selected branch held at the draw.
    pub probability: f64,
    /// Number of branches that were competing.
    pub candidates: usize,
    pub discarded: Vec<BranchId>,
}
