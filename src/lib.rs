//! # Symbios Ant
//!
//! Genetic programming for the artificial-ant problem: evolve programs that
//! steer an ant over a grid so that it eats every piece of food on the
//! Santa Fe trail.
//!
//! ## Features
//!
//! - **Two Encodings**: a [`LinearGenome`] of instructions with callable
//!   subroutines, and an arena-allocated [`TreeGenome`]
//! - **One Driver**: both implement [`Genome`], so [`Evolution`] and
//!   [`Simulation`] are written once
//! - **Bloat Control**: cut-and-align truncation or retry-then-mutate for trees
//! - **Reproducible**: every run is driven by one seeded `ChaCha8Rng`
//!
//! ## Quick Start
//!
//! ```rust
//! use symbios_ant::{Evolution, GenerationBudget, RunConfig, TreeConfig, TreeGenome};
//!
//! let run = RunConfig {
//!     population_size: 50,
//!     generations: GenerationBudget::Fixed(3),
//!     seed: 42,
//!     ..RunConfig::default()
//! };
//! let report = Evolution::<TreeGenome>::new(run, TreeConfig::default())
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! println!("best fitness {} after {} generations", report.best.fitness, report.final_generation);
//! println!("{}", report.best.genome);
//! ```
//!
//! ## Evaluating a Hand-Written Program
//!
//! ```rust
//! use symbios_ant::{BoundaryPolicy, FoodGrid, LinearGenome, Simulation};
//!
//! let program: LinearGenome = "\
//! IF FOOD_AHEAD ? MOVE : A
//! * SR A:
//! RIGHT
//! MOVE
//! LEFT
//! "
//! .parse()
//! .unwrap();
//!
//! let grid = FoodGrid::santa_fe();
//! let eval = Simulation::new(&grid, BoundaryPolicy::Stay, 1000, 200).evaluate(&program);
//! println!("{} food left, stopped by {:?}", eval.fitness, eval.termination);
//! ```
//!
//! ## Architecture
//!
//! ### Grid and Agent
//!
//! The grid is a square of `(row, col)` cells with the origin in the north-west
//! corner. It never wraps. The ant starts at the origin facing east. A move
//! into the edge either does nothing or turns the ant 90° clockwise, per
//! [`BoundaryPolicy`].
//!
//! ### Evaluation
//!
//! A program is replayed pass after pass until a pass changes nothing, the
//! pass budget runs out, or the trail grows past its cap. Fitness is the
//! number of food cells the trail never touched.

pub mod agent;
pub mod config;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod linear;
pub mod selection;
pub mod simulation;
pub mod tree;
pub mod world;

// Re-exports for convenience
pub use agent::{Action, Agent, BoundaryPolicy, Trail};
pub use config::{
    BloatPolicy, GenerationBudget, InitLength, InitMethod, LinearConfig, LinearCrossover,
    RunConfig, Settings, TreeConfig,
};
pub use error::{ConfigError, Error, ProgramTextError, StructuralError};
pub use evolution::{BestOfRun, Evolution, GenerationStats, Individual, RunReport};
pub use genome::{Genome, GenomeConfig};
pub use linear::{parse_linear, Instruction, LinearGenome, Symbol, Target};
pub use selection::SelectionMethod;
pub use simulation::{fitness, Evaluation, Simulation, Termination};
pub use tree::{parse_tree, Opcode, TreeGenome};
pub use world::{FoodGrid, FoodLayout, Heading, Position, SANTA_FE_SIZE, SANTA_FE_TRAIL};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_genome_trait_implementations() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let linear_config = LinearConfig::default();
        let mut a = LinearGenome::random(&linear_config, &mut rng);
        let b = LinearGenome::random(&linear_config, &mut rng);
        a.mutate(&linear_config, &mut rng);
        let child = a.crossover(&b, &linear_config, &mut rng);
        assert!(child.check(&linear_config).is_ok());

        let tree_config = TreeConfig::default();
        let mut a = TreeGenome::random(&tree_config, &mut rng);
        let b = TreeGenome::random(&tree_config, &mut rng);
        a.mutate(&tree_config, &mut rng);
        let child = a.crossover(&b, &tree_config, &mut rng);
        assert!(child.check(&tree_config).is_ok());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let genome = LinearGenome::random(&LinearConfig::default(), &mut rng);

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: LinearGenome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome, restored);
        assert_eq!(genome.to_string(), restored.to_string());
    }

    #[test]
    fn test_report_serializes() {
        let run = RunConfig {
            population_size: 10,
            generations: GenerationBudget::Fixed(2),
            ..RunConfig::default()
        };
        let report = Evolution::<LinearGenome>::new(run, LinearConfig::default())
            .unwrap()
            .run()
            .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport<LinearGenome> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.best, report.best);
        assert_eq!(back.history.len(), report.history.len());
        assert_eq!(back.solved, report.solved);
    }
}
