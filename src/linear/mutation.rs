//! Mutation of linear genomes.
//!
//! The main program and then each subroutine are walked position by position.
//! At each position at most one operator fires, tried in the order insertion,
//! deletion, substitution, micromutation, each gated by its own rate. Length
//! bounds are checked before inserting or deleting, so a genome inside its
//! bounds stays inside them.

use rand::Rng;

use super::instruction::{Instruction, Target};
use super::program::LinearGenome;
use crate::config::LinearConfig;

/// Mutate `genome` in place.
pub fn mutate<R: Rng>(genome: &mut LinearGenome, config: &LinearConfig, rng: &mut R) {
    mutate_main(genome, config, rng);
    for n in 0..genome.subroutines().len() {
        mutate_subroutine(genome, n, config, rng);
    }
}

fn mutate_main<R: Rng>(genome: &mut LinearGenome, config: &LinearConfig, rng: &mut R) {
    let actions = config.actions();
    let symbols = genome.symbols();
    let mut pos = 0;
    while pos < genome.main_len() {
        let len = genome.main_len();
        let instructions = genome.instructions_mut();
        if len < config.max_program_length && rng.random::<f32>() < config.insertion_rate {
            instructions.insert(pos, Instruction::random_main(&actions, &symbols, rng));
        } else if len > config.min_program_length && rng.random::<f32>() < config.deletion_rate {
            instructions.remove(pos);
        } else if rng.random::<f32>() < config.substitution_rate {
            instructions[pos] = Instruction::random_main(&actions, &symbols, rng);
        } else if let Instruction::IfFoodAhead { then, otherwise } = &mut instructions[pos] {
            if rng.random::<f32>() < config.micromutation_rate {
                match rng.random_range(0..3) {
                    0 => *then = Target::random(&actions, &symbols, rng),
                    1 => *otherwise = Target::random(&actions, &symbols, rng),
                    _ => {
                        *then = Target::random(&actions, &symbols, rng);
                        *otherwise = Target::random(&actions, &symbols, rng);
                    }
                }
            }
        }
        pos += 1;
    }
}

fn mutate_subroutine<R: Rng>(
    genome: &mut LinearGenome,
    n: usize,
    config: &LinearConfig,
    rng: &mut R,
) {
    let actions = config.actions();
    let mut offset = 0;
    while let Some(sub) = genome.nth_subroutine(n) {
        let len = sub.body.len();
        if offset >= len {
            break;
        }
        let pos = sub.body.start + offset;
        let instructions = genome.instructions_mut();
        if len < config.max_subroutine_length && rng.random::<f32>() < config.insertion_rate {
            instructions.insert(pos, Instruction::random_simple(&actions, rng));
        } else if len > config.min_subroutine_length
            && rng.random::<f32>() < config.deletion_rate
        {
            instructions.remove(pos);
        } else if rng.random::<f32>() < config.substitution_rate {
            instructions[pos] = Instruction::random_simple(&actions, rng);
        }
        offset += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Action;
    use crate::genome::Genome;
    use crate::linear::Symbol;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_mutation_respects_bounds() {
        let mut rng = test_rng();
        for extended_move in [false, true] {
            let config = LinearConfig {
                extended_move,
                ..LinearConfig::default()
            };
            for _ in 0..200 {
                let mut genome = LinearGenome::random(&config, &mut rng);
                for _ in 0..5 {
                    genome.mutate(&config, &mut rng);
                    genome.check(&config).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_zero_rates_leave_genome_unchanged() {
        let config = LinearConfig {
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            substitution_rate: 0.0,
            micromutation_rate: 0.0,
            ..LinearConfig::default()
        };
        let mut rng = test_rng();
        let original = LinearGenome::random(&config, &mut rng);
        let mut genome = original.clone();
        mutate(&mut genome, &config, &mut rng);
        assert_eq!(genome, original);
    }

    #[test]
    fn test_full_insertion_fills_to_max() {
        let config = LinearConfig {
            insertion_rate: 1.0,
            deletion_rate: 0.0,
            ..LinearConfig::default()
        };
        let mut rng = test_rng();
        let mut genome = LinearGenome::random(&config, &mut rng);
        mutate(&mut genome, &config, &mut rng);
        assert_eq!(genome.main_len(), config.max_program_length);
        for sub in genome.subroutines() {
            assert_eq!(sub.body.len(), config.max_subroutine_length);
        }
    }

    #[test]
    fn test_micromutation_keeps_conditional() {
        let config = LinearConfig {
            min_program_length: 1,
            max_program_length: 1,
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            substitution_rate: 0.0,
            micromutation_rate: 1.0,
            ..LinearConfig::default()
        };
        let a = Symbol::from_char('A').unwrap();
        let mut genome = LinearGenome::from_instructions(vec![
            Instruction::IfFoodAhead {
                then: Target::Call(a),
                otherwise: Target::Call(a),
            },
            Instruction::Label(a),
            Instruction::Act(Action::Move),
            Instruction::Act(Action::Move),
            Instruction::Act(Action::Move),
        ]);
        let mut rng = test_rng();
        for _ in 0..50 {
            mutate(&mut genome, &config, &mut rng);
            assert!(genome.instructions()[0].is_conditional());
            genome.check(&config).unwrap();
        }
    }
}
