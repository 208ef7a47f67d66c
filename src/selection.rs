//! Parent selection.
//!
//! All operators minimise fitness and work on indices into an evaluated
//! population; [`SelectionMethod::select`] returns an owned copy of the
//! chosen genome.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evolution::Individual;
use crate::genome::Genome;

/// How parents are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Best of `size` uniform draws with replacement.
    Tournament {
        /// Number of draws.
        size: usize,
    },
    /// Fitness-proportionate on `max_fitness - fitness`.
    Roulette,
    /// Proportionate to rank, worst individual ranked 1.
    Rank,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::Tournament { size: 20 }
    }
}

impl SelectionMethod {
    /// Index of the chosen individual. `fitness` must not be empty.
    pub fn pick<R: Rng>(&self, fitness: &[usize], max_fitness: usize, rng: &mut R) -> usize {
        match *self {
            Self::Tournament { size } => tournament(fitness, size, rng),
            Self::Roulette => roulette(fitness, max_fitness, rng),
            Self::Rank => rank(fitness, rng),
        }
    }

    /// Copy of the chosen genome, or `None` for an empty population.
    pub fn select<G: Genome, R: Rng>(
        &self,
        population: &[Individual<G>],
        max_fitness: usize,
        rng: &mut R,
    ) -> Option<G> {
        if population.is_empty() {
            return None;
        }
        let fitness: Vec<usize> = population.iter().map(|i| i.fitness).collect();
        let idx = self.pick(&fitness, max_fitness, rng);
        population.get(idx).map(|i| i.genome.clone())
    }
}

/// Tournament selection. Ties go to the first individual drawn.
pub fn tournament<R: Rng>(fitness: &[usize], size: usize, rng: &mut R) -> usize {
    let mut best = rng.random_range(0..fitness.len());
    for _ in 1..size {
        let idx = rng.random_range(0..fitness.len());
        if fitness[idx] < fitness[best] {
            best = idx;
        }
    }
    best
}

/// Roulette-wheel selection with weights `max_fitness - fitness`.
///
/// Falls back to a uniform draw when every weight is zero.
pub fn roulette<R: Rng>(fitness: &[usize], max_fitness: usize, rng: &mut R) -> usize {
    let weights: Vec<f64> = fitness
        .iter()
        .map(|&f| max_fitness.saturating_sub(f) as f64)
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.random_range(0..fitness.len());
    }
    let draw = rng.random::<f64>();
    let mut cumulative = 0.0;
    let mut last = 0;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight > 0.0 {
            cumulative += weight / total;
            last = idx;
            if draw < cumulative {
                return idx;
            }
        }
    }
    // Rounding left the draw above the final cumulative share.
    last
}

/// Rank selection: worst individual gets rank 1, best gets rank `n`.
pub fn rank<R: Rng>(fitness: &[usize], rng: &mut R) -> usize {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].cmp(&fitness[a]));
    let n = order.len();
    let total = (n * (n + 1) / 2) as f64;
    let draw = rng.random_range(0.0..=total);
    let mut partial = 0.0;
    for (position, &idx) in order.iter().enumerate() {
        partial += (position + 1) as f64;
        if partial >= draw {
            return idx;
        }
    }
    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_large_tournament_finds_best() {
        let fitness = [40, 12, 89, 3, 55, 3, 70, 21];
        let mut rng = test_rng();
        for _ in 0..100 {
            let idx = tournament(&fitness, 200, &mut rng);
            assert_eq!(fitness[idx], 3);
        }
    }

    #[test]
    fn test_tournament_returns_sampled_minimum() {
        let fitness = [5, 5, 5, 5];
        let mut rng = test_rng();
        for size in 1..6 {
            let idx = tournament(&fitness, size, &mut rng);
            assert!(idx < fitness.len());
        }
    }

    #[test]
    fn test_roulette_ignores_zero_weight() {
        // Individual 1 has the maximum fitness and so zero weight.
        let fitness = [10, 89, 40];
        let mut rng = test_rng();
        for _ in 0..500 {
            assert_ne!(roulette(&fitness, 89, &mut rng), 1);
        }
    }

    #[test]
    fn test_roulette_uniform_when_all_worst() {
        let fitness = [89, 89, 89];
        let mut rng = test_rng();
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[roulette(&fitness, 89, &mut rng)] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_rank_prefers_better() {
        let fitness = [80, 10, 50];
        let mut rng = test_rng();
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            counts[rank(&fitness, &mut rng)] += 1;
        }
        // Expected shares 1/6, 3/6, 2/6.
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[0]);
    }

    #[test]
    fn test_single_individual() {
        let mut rng = test_rng();
        for method in [
            SelectionMethod::Tournament { size: 3 },
            SelectionMethod::Roulette,
            SelectionMethod::Rank,
        ] {
            assert_eq!(method.pick(&[7], 89, &mut rng), 0);
        }
    }
}
