//! Subtree crossover, regrowth mutation and depth control for trees.

use rand::Rng;

use super::program::{GrowParams, TreeGenome};
use crate::config::{BloatPolicy, TreeConfig};

/// Graft a random subtree of `donor` over a random node of a copy of `receiver`.
///
/// Both points are uniform over all nodes in pre-order, roots included.
pub fn exchange<R: Rng>(receiver: &TreeGenome, donor: &TreeGenome, rng: &mut R) -> TreeGenome {
    let graft = donor.subtree(donor.random_node(rng));
    let mut child = receiver.clone();
    let target = child.random_node(rng);
    child.replace_subtree(target, &graft);
    child
}

/// Produce one offspring, keeping it within `config.max_depth` according to
/// `config.bloat`.
pub fn crossover<R: Rng>(
    parent1: &TreeGenome,
    parent2: &TreeGenome,
    config: &TreeConfig,
    rng: &mut R,
) -> TreeGenome {
    match config.bloat {
        BloatPolicy::CutAndAlign => {
            let mut child = exchange(parent1, parent2, rng);
            if child.height() > config.max_depth {
                child.truncate(config.max_depth, &config.terminals(), rng);
            }
            child
        }
        BloatPolicy::RetryThenMutate => {
            for _ in 0..2 {
                let child = exchange(parent1, parent2, rng);
                if child.height() <= config.max_depth {
                    return child;
                }
            }
            tracing::trace!("tree crossover too deep twice, mutating parent instead");
            let mut child = parent1.clone();
            mutate(&mut child, config, rng);
            child
        }
    }
}

/// Replace a random node with a freshly grown subtree of at most
/// `config.mutation_depth + 1` levels, then truncate to `config.max_depth`.
pub fn mutate<R: Rng>(genome: &mut TreeGenome, config: &TreeConfig, rng: &mut R) {
    let terminals = config.terminals();
    let target = genome.random_node(rng);
    let sprout = TreeGenome::generate(
        GrowParams {
            min_height: 1,
            max_height: config.mutation_depth + 1,
            full: false,
            terminals: &terminals,
        },
        rng,
    );
    genome.replace_subtree(target, &sprout);
    if genome.height() > config.max_depth {
        genome.truncate(config.max_depth, &terminals, rng);
    }
}
