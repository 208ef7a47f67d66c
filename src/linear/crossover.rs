//! Recombination of linear genomes.
//!
//! Cut points lie inside each parent's main program and the offspring keep
//! everything after the cut, subroutines included. After the main programs
//! are spliced, one subroutine body is swapped between the offspring.

use rand::Rng;

use super::program::LinearGenome;
use crate::config::{LinearConfig, LinearCrossover};

/// A cut point in `1..=limit`, or `0` when `limit` is zero.
fn cut_point<R: Rng>(limit: usize, rng: &mut R) -> usize {
    if limit == 0 {
        0
    } else {
        rng.random_range(1..=limit)
    }
}

/// One-point crossover.
///
/// Each offspring is one parent's prefix up to its cut point, anywhere in
/// `1..=main_len`, followed by the other parent's remainder.
pub fn one_point<R: Rng>(
    parent1: &LinearGenome,
    parent2: &LinearGenome,
    rng: &mut R,
) -> (LinearGenome, LinearGenome) {
    let a = parent1.instructions();
    let b = parent2.instructions();
    let cut1 = cut_point(parent1.main_len(), rng);
    let cut2 = cut_point(parent2.main_len(), rng);

    let first = [&a[..cut1], &b[cut2..]].concat();
    let second = [&b[..cut2], &a[cut1..]].concat();
    (
        LinearGenome::from_instructions(first),
        LinearGenome::from_instructions(second),
    )
}

/// Two-point crossover.
///
/// Each parent's segment between a cut point in the first half of its main
/// program and a second point in `cut..main_len` is replaced by the other
/// parent's segment. Falls back to [`one_point`] when either main program is
/// shorter than two instructions.
pub fn two_point<R: Rng>(
    parent1: &LinearGenome,
    parent2: &LinearGenome,
    rng: &mut R,
) -> (LinearGenome, LinearGenome) {
    let (len1, len2) = (parent1.main_len(), parent2.main_len());
    if len1 < 2 || len2 < 2 {
        return one_point(parent1, parent2, rng);
    }
    let a = parent1.instructions();
    let b = parent2.instructions();
    let cut1 = cut_point(len1 / 2, rng);
    let cut2 = cut_point(len2 / 2, rng);
    let end1 = rng.random_range(cut1..len1);
    let end2 = rng.random_range(cut2..len2);

    let first = [&a[..cut1], &b[cut2..end2], &a[end1..]].concat();
    let second = [&b[..cut2], &a[cut1..end1], &b[end2..]].concat();
    (
        LinearGenome::from_instructions(first),
        LinearGenome::from_instructions(second),
    )
}

/// Swap one subroutine body between the offspring.
///
/// Picks subroutine `i` of `parent1` and `j` of `parent2`. Offspring `a`
/// receives `parent2`'s body `j` as its `i`-th subroutine and `b` receives
/// `parent1`'s body `i` as its `j`-th. An offspring lacking that subroutine
/// keeps its own. Nothing happens if either parent has no subroutines.
pub fn exchange_subroutines<R: Rng>(
    parent1: &LinearGenome,
    parent2: &LinearGenome,
    a: &mut LinearGenome,
    b: &mut LinearGenome,
    rng: &mut R,
) {
    let subs1 = parent1.subroutines();
    let subs2 = parent2.subroutines();
    if subs1.is_empty() || subs2.is_empty() {
        return;
    }
    let i = rng.random_range(0..subs1.len());
    let j = rng.random_range(0..subs2.len());
    let body1 = parent1.body(&subs1[i]).to_vec();
    let body2 = parent2.body(&subs2[j]).to_vec();
    a.replace_body(i, &body2);
    b.replace_body(j, &body1);
}

/// Full linear crossover: main-program recombination, truncation to the
/// maximum length, then subroutine exchange.
///
/// Returns the first offspring if its main program is longer than the
/// minimum, otherwise the second if it reaches the minimum. When neither
/// qualifies a copy of `parent1` is returned.
pub fn crossover<R: Rng>(
    parent1: &LinearGenome,
    parent2: &LinearGenome,
    config: &LinearConfig,
    rng: &mut R,
) -> LinearGenome {
    let (mut a, mut b) = match config.crossover {
        LinearCrossover::OnePoint => one_point(parent1, parent2, rng),
        LinearCrossover::TwoPoint => two_point(parent1, parent2, rng),
    };
    a.truncate_main(config.max_program_length);
    b.truncate_main(config.max_program_length);
    exchange_subroutines(parent1, parent2, &mut a, &mut b, rng);

    let min = config.min_program_length;
    let mut child = if a.main_len() > min {
        a
    } else if b.main_len() >= min {
        b
    } else if a.main_len() == min {
        a
    } else {
        tracing::trace!(
            first = a.main_len(),
            second = b.main_len(),
            "linear crossover produced no valid offspring, copying parent"
        );
        return parent1.clone();
    };
    child.repair_calls(&config.actions(), rng);
    child
}
