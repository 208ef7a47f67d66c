//! The interface every genome encoding implements.
//!
//! The evolution loop, selection and simulation are generic over [`Genome`],
//! so the linear and tree encodings share one driver. Each encoding carries its
//! own configuration type, passed explicitly to every operator.

use std::fmt::{Debug, Display};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::agent::{Agent, BoundaryPolicy, Trail};
use crate::error::{ConfigError, StructuralError};
use crate::world::FoodGrid;

/// Configuration of a genome encoding.
pub trait GenomeConfig:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// Check the configuration before it is used.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid parameter.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// An evolvable ant program.
///
/// Operators never produce a genome that fails [`Genome::check`] for the
/// configuration they were given.
pub trait Genome: Clone + Debug + Display + Serialize + DeserializeOwned + Send + Sync {
    /// Encoding-specific configuration.
    type Config: GenomeConfig;

    /// Short name of the encoding, used in logs and reports.
    const ENCODING: &'static str;

    /// Generate a random genome within the configured bounds.
    fn random<R: Rng>(config: &Self::Config, rng: &mut R) -> Self;

    /// Run the program once from start to finish, moving `agent` and
    /// recording entered cells on `trail`.
    fn execute(
        &self,
        agent: &mut Agent,
        trail: &mut Trail,
        grid: &FoodGrid,
        boundary: BoundaryPolicy,
    );

    /// Number of instructions or nodes.
    fn size(&self) -> usize;

    /// Main-program length for linear genomes, tree height for trees.
    fn depth(&self) -> usize;

    /// Produce one offspring from `self` and `other`.
    fn crossover<R: Rng>(&self, other: &Self, config: &Self::Config, rng: &mut R) -> Self;

    /// Mutate in place.
    fn mutate<R: Rng>(&mut self, config: &Self::Config, rng: &mut R);

    /// Verify the structural invariants against `config`.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn check(&self, config: &Self::Config) -> Result<(), StructuralError>;
}
