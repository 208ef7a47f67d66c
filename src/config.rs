//! Run and genome configuration.
//!
//! Every value is read once before a run and threaded explicitly through the
//! operators; nothing here is mutated while evolution is in progress.
//! [`Settings`] bundles all three sections and loads them from TOML, with
//! every field defaulted so partial files are valid:
//!
//! ```toml
//! [run]
//! population_size = 200
//! seed = 7
//! selection = { method = "tournament", size = 10 }
//! generations = { fixed = 50 }
//!
//! [tree]
//! bloat = "retry_then_mutate"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::{Action, BoundaryPolicy};
use crate::error::ConfigError;
use crate::genome::GenomeConfig;
use crate::linear::Symbol;
use crate::selection::SelectionMethod;
use crate::world::FoodLayout;

fn check_rate(field: &'static str, rate: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, rate, "must lie in [0, 1]"))
    }
}

fn check_positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::invalid(field, value, "must be greater than zero"))
    } else {
        Ok(())
    }
}

/// How many generations a run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationBudget {
    /// A fixed number of generations.
    Fixed(usize),
    /// A fixed number of evaluations: `total / population_size` generations,
    /// at least one.
    Evaluations(usize),
}

impl Default for GenerationBudget {
    fn default() -> Self {
        Self::Evaluations(10_000)
    }
}

impl GenerationBudget {
    /// Number of generations for a population of `population_size`.
    #[must_use]
    pub fn generations(self, population_size: usize) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Evaluations(total) => (total / population_size.max(1)).max(1),
        }
    }
}

/// Parameters of one evolutionary run, independent of the genome encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of individuals per generation.
    pub population_size: usize,
    /// Generation budget.
    pub generations: GenerationBudget,
    /// Probability that a selected pair is recombined.
    pub crossover_rate: f32,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f32,
    /// Parent selection operator.
    pub selection: SelectionMethod,
    /// Behaviour of moves into the grid boundary.
    pub boundary: BoundaryPolicy,
    /// Maximum number of program passes per evaluation.
    pub step_budget: usize,
    /// Evaluation stops once the trail is longer than this.
    pub trail_cap: usize,
    /// Edge length of the square grid.
    pub grid_size: usize,
    /// Food layout.
    pub food: FoodLayout,
    /// Seed for the run's random number generator.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: GenerationBudget::default(),
            crossover_rate: 0.7,
            mutation_rate: 1.0,
            selection: SelectionMethod::Tournament { size: 20 },
            boundary: BoundaryPolicy::Stay,
            step_budget: 1000,
            trail_cap: 200,
            grid_size: 32,
            food: FoodLayout::SantaFe,
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("population_size", self.population_size)?;
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        check_positive("step_budget", self.step_budget)?;
        check_positive("trail_cap", self.trail_cap)?;
        check_positive("grid_size", self.grid_size)?;
        if let SelectionMethod::Tournament { size } = self.selection {
            check_positive("selection.size", size)?;
        }
        Ok(())
    }

    /// Number of generations this configuration allows.
    #[must_use]
    pub fn generation_limit(&self) -> usize {
        self.generations.generations(self.population_size)
    }
}

/// Recombination scheme for the main program of linear genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinearCrossover {
    /// Swap suffixes.
    #[default]
    OnePoint,
    /// Swap an interior segment.
    TwoPoint,
}

/// Main-program length of freshly generated linear genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitLength {
    /// Uniform in `[min_program_length, max_program_length]`.
    #[default]
    Range,
    /// Always `min_program_length`.
    Min,
    /// Always `max_program_length`.
    Max,
    /// A fixed length inside the program bounds.
    Constant(usize),
}

/// Configuration for linear genomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Shortest allowed main program.
    pub min_program_length: usize,
    /// Longest allowed main program.
    pub max_program_length: usize,
    /// Shortest allowed subroutine body.
    pub min_subroutine_length: usize,
    /// Longest allowed subroutine body.
    pub max_subroutine_length: usize,
    /// Number of subroutines in generated genomes, and the upper bound for any genome.
    pub max_subroutines: usize,
    /// Per-position probability of inserting an instruction.
    pub insertion_rate: f32,
    /// Per-position probability of deleting an instruction.
    pub deletion_rate: f32,
    /// Per-position probability of replacing an instruction.
    pub substitution_rate: f32,
    /// Per-conditional probability of replacing its branch targets.
    pub micromutation_rate: f32,
    /// Main-program recombination scheme.
    pub crossover: LinearCrossover,
    /// Initial main-program length.
    pub init_length: InitLength,
    /// Whether `2XMOVE` is part of the instruction set.
    pub extended_move: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            min_program_length: 6,
            max_program_length: 12,
            min_subroutine_length: 3,
            max_subroutine_length: 5,
            max_subroutines: 5,
            insertion_rate: 0.5,
            deletion_rate: 0.5,
            substitution_rate: 0.5,
            micromutation_rate: 0.5,
            crossover: LinearCrossover::OnePoint,
            init_length: InitLength::Range,
            extended_move: false,
        }
    }
}

impl LinearConfig {
    /// Actions that may appear as plain instructions or conditional targets.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Action::BASIC.to_vec();
        if self.extended_move {
            actions.push(Action::DoubleMove);
        }
        actions
    }
}

impl GenomeConfig for LinearConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_positive("min_program_length", self.min_program_length)?;
        if self.max_program_length < self.min_program_length {
            return Err(ConfigError::invalid(
                "max_program_length",
                self.max_program_length,
                "must not be below min_program_length",
            ));
        }
        check_positive("min_subroutine_length", self.min_subroutine_length)?;
        if self.max_subroutine_length < self.min_subroutine_length {
            return Err(ConfigError::invalid(
                "max_subroutine_length",
                self.max_subroutine_length,
                "must not be below min_subroutine_length",
            ));
        }
        check_positive("max_subroutines", self.max_subroutines)?;
        if self.max_subroutines > Symbol::ALPHABET.len() {
            return Err(ConfigError::invalid(
                "max_subroutines",
                self.max_subroutines,
                "exceeds the subroutine alphabet",
            ));
        }
        check_rate("insertion_rate", self.insertion_rate)?;
        check_rate("deletion_rate", self.deletion_rate)?;
        check_rate("substitution_rate", self.substitution_rate)?;
        check_rate("micromutation_rate", self.micromutation_rate)?;
        if let InitLength::Constant(len) = self.init_length {
            if !(self.min_program_length..=self.max_program_length).contains(&len) {
                return Err(ConfigError::invalid(
                    "init_length",
                    len,
                    "must lie within the program length bounds",
                ));
            }
        }
        Ok(())
    }
}

/// How the tree crossover keeps offspring within the depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BloatPolicy {
    /// Retry once, then fall back to mutating the first parent and truncating.
    RetryThenMutate,
    /// Truncate the offspring at the depth limit.
    #[default]
    CutAndAlign,
}

/// Tree construction method for the initial population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    /// Functions or terminals at intermediate depths.
    #[default]
    Grow,
    /// Functions everywhere above the target height.
    Full,
    /// Alternate grow and full.
    RampedHalfAndHalf,
}

/// Configuration for tree genomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Minimum height of initial trees.
    pub min_depth: usize,
    /// Maximum tree height after any operator.
    pub max_depth: usize,
    /// Depth control for crossover.
    pub bloat: BloatPolicy,
    /// Deepest 0-based level of a subtree regrown by mutation.
    pub mutation_depth: usize,
    /// Initialisation method.
    pub init: InitMethod,
    /// Whether the 45° turn terminals are available.
    pub half_turns: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_depth: 3,
            max_depth: 5,
            bloat: BloatPolicy::CutAndAlign,
            mutation_depth: 2,
            init: InitMethod::Grow,
            half_turns: false,
        }
    }
}

impl TreeConfig {
    /// The terminal set.
    #[must_use]
    pub fn terminals(&self) -> Vec<Action> {
        let mut terminals = Action::BASIC.to_vec();
        if self.half_turns {
            terminals.extend([Action::HalfLeft, Action::HalfRight]);
        }
        terminals
    }
}

impl GenomeConfig for TreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_positive("min_depth", self.min_depth)?;
        if self.max_depth < self.min_depth {
            return Err(ConfigError::invalid(
                "max_depth",
                self.max_depth,
                "must not be below min_depth",
            ));
        }
        Ok(())
    }
}

/// All configuration sections, as stored in a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Run parameters.
    pub run: RunConfig,
    /// Linear genome parameters.
    pub linear: LinearConfig,
    /// Tree genome parameters.
    pub tree: TreeConfig,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&text)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.linear.validate()?;
        self.tree.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_generation_budget() {
        assert_eq!(GenerationBudget::Fixed(7).generations(100), 7);
        assert_eq!(GenerationBudget::Evaluations(10_000).generations(100), 100);
        assert_eq!(GenerationBudget::Evaluations(10).generations(100), 1);
    }

    #[test]
    fn test_invalid_linear_bounds() {
        let config = LinearConfig {
            min_program_length: 0,
            ..LinearConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "min_program_length",
                ..
            })
        ));

        let config = LinearConfig {
            max_subroutines: 0,
            ..LinearConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LinearConfig {
            max_subroutines: 15,
            ..LinearConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LinearConfig {
            init_length: InitLength::Constant(5),
            ..LinearConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_run_rates() {
        let config = RunConfig {
            crossover_rate: 1.5,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunConfig {
            selection: SelectionMethod::Tournament { size: 0 },
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tree_depths() {
        let config = TreeConfig {
            min_depth: 6,
            max_depth: 5,
            ..TreeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml_str(
            r#"
            [run]
            population_size = 30
            seed = 9
            selection = { method = "rank" }
            generations = { fixed = 12 }
            boundary = "rotate"
            food = { kind = "cells", cells = [[0, 1], [0, 2]] }

            [linear]
            crossover = "two_point"
            init_length = { constant = 8 }

            [tree]
            bloat = "retry_then_mutate"
            "#,
        )
        .unwrap();

        assert_eq!(settings.run.population_size, 30);
        assert_eq!(settings.run.seed, 9);
        assert_eq!(settings.run.selection, SelectionMethod::Rank);
        assert_eq!(settings.run.generation_limit(), 12);
        assert_eq!(settings.run.boundary, BoundaryPolicy::Rotate);
        assert_eq!(
            settings.run.food,
            FoodLayout::Cells {
                cells: vec![(0, 1), (0, 2)]
            }
        );
        assert_eq!(settings.run.trail_cap, 200);
        assert_eq!(settings.linear.crossover, LinearCrossover::TwoPoint);
        assert_eq!(settings.linear.init_length, InitLength::Constant(8));
        assert_eq!(settings.tree.bloat, BloatPolicy::RetryThenMutate);
        settings.validate().unwrap();
    }

    #[test]
    fn test_bad_toml_reported() {
        let err = Settings::from_toml_str("[run]\npopulation_size = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
