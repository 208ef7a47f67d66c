//! Evaluation of a genome on a food grid.
//!
//! A program is run repeatedly from the start, each pass continuing from the
//! agent state the previous one left behind, until one of three limits is hit.
//! Fitness is the amount of food the resulting trail did not cover; lower is
//! better and zero means every food cell was visited.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, BoundaryPolicy, Trail};
use crate::config::RunConfig;
use crate::error::StructuralError;
use crate::genome::Genome;
use crate::world::{FoodGrid, VisitMap};

/// Why an evaluation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A full pass left position, heading and trail unchanged, so further
    /// passes cannot change anything.
    ProgramCompleted,
    /// The configured number of passes ran.
    StepBudgetExhausted,
    /// The trail grew longer than the configured cap.
    TrailCapExceeded,
}

/// Outcome of running one genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Final agent state.
    pub agent: Agent,
    /// Cells visited, in order.
    pub trail: Trail,
    /// Visitation overlay, for display.
    pub visits: VisitMap,
    /// Food cells not visited.
    pub fitness: usize,
    /// Number of program passes executed.
    pub passes: usize,
    /// Stopping reason.
    pub termination: Termination,
}

/// Count the food cells `trail` never reached, marking visits on `overlay`.
#[must_use]
pub fn fitness(trail: &Trail, overlay: &mut VisitMap) -> usize {
    for &cell in trail.cells() {
        overlay.visit(cell);
    }
    overlay.remaining_food()
}

/// Runs genomes against a fixed grid under fixed limits.
#[derive(Debug, Clone, Copy)]
pub struct Simulation<'g> {
    grid: &'g FoodGrid,
    boundary: BoundaryPolicy,
    step_budget: usize,
    trail_cap: usize,
}

impl<'g> Simulation<'g> {
    /// A simulation over `grid`.
    #[must_use]
    pub fn new(
        grid: &'g FoodGrid,
        boundary: BoundaryPolicy,
        step_budget: usize,
        trail_cap: usize,
    ) -> Self {
        Self {
            grid,
            boundary,
            step_budget,
            trail_cap,
        }
    }

    /// A simulation using the limits from `config`.
    #[must_use]
    pub fn from_config(grid: &'g FoodGrid, config: &RunConfig) -> Self {
        Self::new(grid, config.boundary, config.step_budget, config.trail_cap)
    }

    /// The grid being simulated.
    #[must_use]
    pub fn grid(&self) -> &'g FoodGrid {
        self.grid
    }

    /// Run `genome` from the given state until a limit is reached.
    ///
    /// Returns the number of passes executed and why the run stopped.
    pub fn interpret<G: Genome>(
        &self,
        genome: &G,
        agent: &mut Agent,
        trail: &mut Trail,
    ) -> (usize, Termination) {
        let mut passes = 0;
        let termination = loop {
            if trail.len() > self.trail_cap {
                break Termination::TrailCapExceeded;
            }
            if passes >= self.step_budget {
                break Termination::StepBudgetExhausted;
            }
            let before = (*agent, trail.len());
            genome.execute(agent, trail, self.grid, self.boundary);
            passes += 1;
            if (*agent, trail.len()) == before {
                break Termination::ProgramCompleted;
            }
        };
        (passes, termination)
    }

    /// Evaluate `genome` from the starting state: origin, facing east.
    #[must_use]
    pub fn evaluate<G: Genome>(&self, genome: &G) -> Evaluation {
        let mut agent = Agent::default();
        let mut trail = Trail::default();
        let (passes, termination) = self.interpret(genome, &mut agent, &mut trail);
        let mut visits = self.grid.overlay();
        let fitness = fitness(&trail, &mut visits);
        Evaluation {
            agent,
            trail,
            visits,
            fitness,
            passes,
            termination,
        }
    }

    /// Evaluate a genome from outside the evolution loop, such as parsed
    /// program text, after checking it against `config`.
    ///
    /// Tree interpretation recurses once per level, so the height limit must
    /// hold before the program runs.
    ///
    /// # Errors
    ///
    /// Returns the [`StructuralError`] from [`Genome::check`]; the program is
    /// not run.
    pub fn verify<G: Genome>(
        &self,
        genome: &G,
        config: &G::Config,
    ) -> Result<Evaluation, StructuralError> {
        genome.check(config)?;
        Ok(self.evaluate(genome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Action;
    use crate::config::LinearConfig;
    use crate::linear::{Instruction, LinearGenome};
    use crate::world::{Heading, Position};

    fn program(actions: &[Action]) -> LinearGenome {
        LinearGenome::from_instructions(actions.iter().map(|&a| Instruction::Act(a)).collect())
    }

    #[test]
    fn test_straight_line_collects_row() {
        let grid = FoodGrid::with_food(4, [(0, 1), (0, 2), (0, 3)]).unwrap();
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 1000, 200);
        let eval = sim.evaluate(&program(&[Action::Move, Action::Move, Action::Move]));
        assert_eq!(eval.trail.to_pairs(), vec![(0, 0), (0, 1), (0, 2), (0, 3)]);
        assert_eq!(eval.fitness, 0);
        // Second pass runs into the east edge without changing anything.
        assert_eq!(eval.termination, Termination::ProgramCompleted);
        assert_eq!(eval.passes, 2);
    }

    #[test]
    fn test_blocked_north_stay() {
        let grid = FoodGrid::empty(4);
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 1, 200);
        let eval = sim.evaluate(&program(&[Action::Left, Action::Move]));
        assert_eq!(eval.agent, Agent::new(Position::ORIGIN, Heading::North));
        assert_eq!(eval.trail.len(), 1);
        assert_eq!(eval.termination, Termination::StepBudgetExhausted);

        // Later passes turn west, then south, and finally leave the corner.
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 3, 200);
        let eval = sim.evaluate(&program(&[Action::Left, Action::Move]));
        assert_eq!(eval.agent, Agent::new(Position::new(1, 0), Heading::South));
    }

    #[test]
    fn test_blocked_north_rotate() {
        let grid = FoodGrid::empty(4);
        let sim = Simulation::new(&grid, BoundaryPolicy::Rotate, 1, 200);
        let eval = sim.evaluate(&program(&[Action::Left, Action::Move]));
        assert_eq!(eval.agent, Agent::new(Position::ORIGIN, Heading::East));
        assert_eq!(eval.trail.len(), 1);
    }

    #[test]
    fn test_turn_only_program_hits_step_budget() {
        let grid = FoodGrid::santa_fe();
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 25, 200);
        let eval = sim.evaluate(&program(&[Action::Right]));
        assert_eq!(eval.passes, 25);
        assert_eq!(eval.termination, Termination::StepBudgetExhausted);
        assert_eq!(eval.fitness, 89);
    }

    #[test]
    fn test_trail_cap_stops_evaluation() {
        let grid = FoodGrid::empty(32);
        let sim = Simulation::new(&grid, BoundaryPolicy::Rotate, 1000, 10);
        let eval = sim.evaluate(&program(&[Action::Move, Action::Move, Action::Move]));
        assert_eq!(eval.termination, Termination::TrailCapExceeded);
        assert!(eval.trail.len() > 10);
        // The cap is checked between passes, so at most one pass overshoots.
        assert!(eval.trail.len() <= 10 + 3);
    }

    #[test]
    fn test_fitness_counts_unvisited_food() {
        let grid = FoodGrid::with_food(4, [(0, 1), (2, 2)]).unwrap();
        let mut trail = Trail::default();
        trail.record(Position::new(0, 1));
        let mut overlay = grid.overlay();
        assert_eq!(fitness(&trail, &mut overlay), 1);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let grid = FoodGrid::santa_fe();
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 1000, 200);
        let genome = program(&[Action::Move, Action::Right, Action::Move, Action::Left]);
        assert_eq!(sim.evaluate(&genome), sim.evaluate(&genome));
    }

    #[test]
    fn test_verify_checks_before_running() {
        let grid = FoodGrid::santa_fe();
        let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 1000, 200);
        let config = LinearConfig::default();

        let short = program(&[Action::Move, Action::Move]);
        assert!(matches!(
            sim.verify(&short, &config),
            Err(StructuralError::MainLength { len: 2, .. })
        ));

        let genome = program(&[Action::Move; 8]);
        assert_eq!(sim.verify(&genome, &config).unwrap(), sim.evaluate(&genome));
    }
}
