//! The generational evolution loop.
//!
//! [`Evolution`] owns the population, the food grid and the run's random
//! number generator. Each [`Evolution::step`] copies the best individual
//! unchanged, fills the remaining slots with selected, recombined and mutated
//! offspring, and evaluates the new population. A run stops when the
//! generation budget is spent or an individual has collected all food.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::agent::{Agent, Trail};
use crate::config::RunConfig;
use crate::error::{ConfigError, Error};
use crate::genome::{Genome, GenomeConfig};
use crate::simulation::{Simulation, Termination};
use crate::world::FoodGrid;

/// An evaluated genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual<G> {
    /// The program.
    pub genome: G,
    /// Food cells left uncollected.
    pub fitness: usize,
    /// Cells visited during evaluation.
    pub trail: Trail,
    /// Final agent state.
    pub agent: Agent,
    /// Why evaluation stopped.
    pub termination: Termination,
}

impl<G: Genome> Individual<G> {
    /// Evaluate `genome` with `simulation`.
    #[must_use]
    pub fn evaluate(genome: G, simulation: &Simulation<'_>) -> Self {
        let eval = simulation.evaluate(&genome);
        Self {
            genome,
            fitness: eval.fitness,
            trail: eval.trail,
            agent: eval.agent,
            termination: eval.termination,
        }
    }
}

/// Fitness summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number; 0 is the initial population.
    pub generation: usize,
    /// Lowest fitness.
    pub best: usize,
    /// Mean fitness.
    pub average: f64,
    /// Highest fitness.
    pub worst: usize,
}

impl GenerationStats {
    fn of<G>(generation: usize, population: &[Individual<G>]) -> Self {
        let best = population.iter().map(|i| i.fitness).min().unwrap_or(0);
        let worst = population.iter().map(|i| i.fitness).max().unwrap_or(0);
        let total: usize = population.iter().map(|i| i.fitness).sum();
        let average = if population.is_empty() {
            0.0
        } else {
            total as f64 / population.len() as f64
        };
        Self {
            generation,
            best,
            average,
            worst,
        }
    }
}

/// Best individual seen during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOfRun<G> {
    /// Generation it first appeared in.
    pub generation: usize,
    /// Its fitness.
    pub fitness: usize,
    /// Its program.
    pub genome: G,
    /// Its trail as `(row, col)` pairs.
    pub trail: Vec<(usize, usize)>,
    /// Why its evaluation stopped.
    pub termination: Termination,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport<G> {
    /// Genome encoding used.
    pub encoding: String,
    /// Seed of the run.
    pub seed: u64,
    /// Total food on the grid.
    pub food: usize,
    /// Statistics per generation, starting with the initial population.
    pub history: Vec<GenerationStats>,
    /// Best individual found.
    pub best: BestOfRun<G>,
    /// Last generation evaluated.
    pub final_generation: usize,
    /// Whether all food was collected.
    pub solved: bool,
}

/// A running evolution of genomes of type `G`.
#[derive(Debug)]
pub struct Evolution<G: Genome> {
    run: RunConfig,
    genome_config: G::Config,
    grid: FoodGrid,
    rng: ChaCha8Rng,
    population: Vec<Individual<G>>,
    generation: usize,
    history: Vec<GenerationStats>,
    best: BestOfRun<G>,
}

impl<G: Genome> Evolution<G> {
    /// Validate the configuration, build the grid and evaluate a random
    /// initial population.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid parameters or an invalid food
    /// layout.
    pub fn new(run: RunConfig, genome_config: G::Config) -> Result<Self, Error> {
        run.validate()?;
        genome_config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(run.seed);
        let grid = run.food.build(run.grid_size, &mut rng)?;
        let genomes = (0..run.population_size)
            .map(|_| G::random(&genome_config, &mut rng))
            .collect();
        Self::start(run, genome_config, grid, rng, genomes)
    }

    /// Start from a given grid and initial population instead of random ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid parameters or an empty population,
    /// and [`Error::Structure`] if a genome violates `genome_config`.
    pub fn with_population(
        run: RunConfig,
        genome_config: G::Config,
        grid: FoodGrid,
        population: Vec<G>,
    ) -> Result<Self, Error> {
        run.validate()?;
        genome_config.validate()?;
        if population.is_empty() {
            return Err(ConfigError::invalid("population", 0, "must not be empty").into());
        }
        for genome in &population {
            genome.check(&genome_config)?;
        }
        let rng = ChaCha8Rng::seed_from_u64(run.seed);
        Self::start(run, genome_config, grid, rng, population)
    }

    fn start(
        run: RunConfig,
        genome_config: G::Config,
        grid: FoodGrid,
        rng: ChaCha8Rng,
        genomes: Vec<G>,
    ) -> Result<Self, Error> {
        let population = {
            let sim = Simulation::from_config(&grid, &run);
            evaluate_all(genomes, &sim)
        };
        let best = best_of(&population, 0).ok_or_else(|| {
            Error::from(ConfigError::invalid("population", 0, "must not be empty"))
        })?;
        let stats = GenerationStats::of(0, &population);
        info!(
            encoding = G::ENCODING,
            population = population.len(),
            food = grid.food_count(),
            seed = run.seed,
            best = stats.best,
            "evolution started"
        );
        Ok(Self {
            run,
            genome_config,
            grid,
            rng,
            population,
            generation: 0,
            history: vec![stats],
            best,
        })
    }

    /// The food grid.
    #[must_use]
    pub fn grid(&self) -> &FoodGrid {
        &self.grid
    }

    /// The current population.
    #[must_use]
    pub fn population(&self) -> &[Individual<G>] {
        &self.population
    }

    /// Number of generations evolved so far.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Statistics of every generation so far.
    #[must_use]
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Best individual seen so far.
    #[must_use]
    pub fn best(&self) -> &BestOfRun<G> {
        &self.best
    }

    /// Whether an individual has collected all food.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.best.fitness == 0
    }

    /// Evolve one generation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structure`] if an operator produced a genome outside
    /// its bounds.
    pub fn step(&mut self) -> Result<GenerationStats, Error> {
        let size = self.run.population_size;
        let max_fitness = self.grid.food_count();
        let fitness: Vec<usize> = self.population.iter().map(|i| i.fitness).collect();

        let mut next: Vec<G> = Vec::with_capacity(size);
        if let Some(elite) = elite_index(&fitness) {
            next.push(self.population[elite].genome.clone());
        }
        while next.len() < size {
            let first = self.run.selection.pick(&fitness, max_fitness, &mut self.rng);
            let second = self.run.selection.pick(&fitness, max_fitness, &mut self.rng);
            let parent1 = &self.population[first].genome;
            let parent2 = &self.population[second].genome;

            let mut child = if self.rng.random::<f32>() < self.run.crossover_rate {
                parent1.crossover(parent2, &self.genome_config, &mut self.rng)
            } else {
                parent1.clone()
            };
            if self.rng.random::<f32>() < self.run.mutation_rate {
                child.mutate(&self.genome_config, &mut self.rng);
            }
            child.check(&self.genome_config)?;
            trace!(size = child.size(), depth = child.depth(), "offspring");
            next.push(child);
        }

        self.generation += 1;
        self.population = {
            let sim = Simulation::from_config(&self.grid, &self.run);
            evaluate_all(next, &sim)
        };

        let stats = GenerationStats::of(self.generation, &self.population);
        if let Some(candidate) = best_of(&self.population, self.generation) {
            if candidate.fitness < self.best.fitness {
                info!(
                    generation = self.generation,
                    fitness = candidate.fitness,
                    "new best of run"
                );
                self.best = candidate;
            }
        }
        debug!(
            generation = stats.generation,
            best = stats.best,
            average = stats.average,
            worst = stats.worst,
            "generation evaluated"
        );
        self.history.push(stats);
        Ok(stats)
    }

    /// Evolve until the generation budget is spent or all food is collected.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Evolution::step`].
    pub fn run(mut self) -> Result<RunReport<G>, Error> {
        let limit = self.run.generation_limit();
        while self.generation < limit && !self.is_solved() {
            self.step()?;
        }
        info!(
            generations = self.generation,
            best = self.best.fitness,
            solved = self.is_solved(),
            "evolution finished"
        );
        Ok(self.into_report())
    }

    /// Summarise the run so far.
    #[must_use]
    pub fn into_report(self) -> RunReport<G> {
        let solved = self.is_solved();
        RunReport {
            encoding: G::ENCODING.to_string(),
            seed: self.run.seed,
            food: self.grid.food_count(),
            history: self.history,
            best: self.best,
            final_generation: self.generation,
            solved,
        }
    }
}

fn evaluate_all<G: Genome>(genomes: Vec<G>, sim: &Simulation<'_>) -> Vec<Individual<G>> {
    genomes
        .into_iter()
        .map(|genome| Individual::evaluate(genome, sim))
        .collect()
}

/// Index of the first individual with minimum fitness.
fn elite_index(fitness: &[usize]) -> Option<usize> {
    let best = *fitness.iter().min()?;
    fitness.iter().position(|&f| f == best)
}

fn best_of<G: Genome>(population: &[Individual<G>], generation: usize) -> Option<BestOfRun<G>> {
    let fitness: Vec<usize> = population.iter().map(|i| i.fitness).collect();
    let individual = &population[elite_index(&fitness)?];
    Some(BestOfRun {
        generation,
        fitness: individual.fitness,
        genome: individual.genome.clone(),
        trail: individual.trail.to_pairs(),
        termination: individual.termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Action;
    use crate::config::{GenerationBudget, LinearConfig, TreeConfig};
    use crate::linear::{Instruction, LinearGenome};
    use crate::selection::SelectionMethod;
    use crate::tree::TreeGenome;
    use crate::world::FoodLayout;

    fn small_run(seed: u64) -> RunConfig {
        RunConfig {
            population_size: 20,
            generations: GenerationBudget::Fixed(5),
            seed,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_elite_index_first_minimum() {
        assert_eq!(elite_index(&[5, 2, 9, 2]), Some(1));
        assert_eq!(elite_index(&[]), None);
    }

    #[test]
    fn test_stats_of_population() {
        let grid = FoodGrid::with_food(4, [(0, 1), (0, 2), (0, 3)]).unwrap();
        let run = RunConfig::default();
        let sim = Simulation::from_config(&grid, &run);
        let genomes = vec![
            LinearGenome::from_instructions(vec![Instruction::Act(Action::Move); 3]),
            LinearGenome::from_instructions(vec![Instruction::Act(Action::Right)]),
        ];
        let population = evaluate_all(genomes, &sim);
        let stats = GenerationStats::of(3, &population);
        assert_eq!(stats.best, 0);
        assert_eq!(stats.worst, 3);
        assert!((stats.average - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_best_never_worsens_linear() {
        let mut evo =
            Evolution::<LinearGenome>::new(small_run(7), LinearConfig::default()).unwrap();
        for _ in 0..5 {
            evo.step().unwrap();
        }
        let history = evo.history();
        assert_eq!(history.len(), 6);
        for pair in history.windows(2) {
            assert!(pair[1].best <= pair[0].best);
        }
    }

    #[test]
    fn test_best_never_worsens_tree() {
        let run = RunConfig {
            selection: SelectionMethod::Rank,
            ..small_run(11)
        };
        let mut evo = Evolution::<TreeGenome>::new(run, TreeConfig::default()).unwrap();
        for _ in 0..5 {
            evo.step().unwrap();
        }
        for pair in evo.history().windows(2) {
            assert!(pair[1].best <= pair[0].best);
        }
        assert_eq!(evo.population().len(), 20);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = Evolution::<TreeGenome>::new(small_run(3), TreeConfig::default())
            .unwrap()
            .run()
            .unwrap();
        let b = Evolution::<TreeGenome>::new(small_run(3), TreeConfig::default())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stops_when_solved() {
        let run = RunConfig {
            grid_size: 4,
            food: FoodLayout::Cells {
                cells: vec![(0, 1), (0, 2), (0, 3)],
            },
            population_size: 2,
            generations: GenerationBudget::Fixed(50),
            ..RunConfig::default()
        };
        let config = LinearConfig {
            min_program_length: 3,
            ..LinearConfig::default()
        };
        let solver = LinearGenome::from_instructions(vec![Instruction::Act(Action::Move); 3]);
        let evo = Evolution::with_population(
            run.clone(),
            config,
            run.food.build(4, &mut ChaCha8Rng::seed_from_u64(0)).unwrap(),
            vec![solver.clone(), solver],
        )
        .unwrap();
        assert!(evo.is_solved());
        let report = evo.run().unwrap();
        assert!(report.solved);
        assert_eq!(report.final_generation, 0);
        assert_eq!(report.best.trail, vec![(0, 0), (0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let run = RunConfig {
            population_size: 0,
            ..RunConfig::default()
        };
        assert!(matches!(
            Evolution::<TreeGenome>::new(run, TreeConfig::default()),
            Err(Error::Config(_))
        ));
        let bad = LinearConfig {
            max_subroutines: 0,
            ..LinearConfig::default()
        };
        assert!(Evolution::<LinearGenome>::new(RunConfig::default(), bad).is_err());
    }

    #[test]
    fn test_with_population_checks_genomes() {
        let short = LinearGenome::from_instructions(vec![Instruction::Act(Action::Move)]);
        let result = Evolution::with_population(
            RunConfig::default(),
            LinearConfig::default(),
            FoodGrid::santa_fe(),
            vec![short],
        );
        assert!(matches!(result, Err(Error::Structure(_))));
    }
}
