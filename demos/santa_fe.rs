//! Santa Fe trail example.
//!
//! Evolves linear and tree programs for the artificial ant and prints the
//! progress of each run, then replays the best linear program.
//!
//! Run with: `cargo run --example santa_fe`

use symbios_ant::{
    Evolution, FoodGrid, GenerationBudget, Genome, LinearConfig, LinearGenome, RunConfig,
    SelectionMethod, Simulation, TreeConfig, TreeGenome,
};

fn evolve<G: Genome>(run: RunConfig, config: G::Config) -> Option<G> {
    let generations = run.generation_limit();
    let mut evolution = match Evolution::<G>::new(run, config) {
        Ok(evolution) => evolution,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return None;
        }
    };

    while evolution.generation() < generations && !evolution.is_solved() {
        let stats = match evolution.step() {
            Ok(stats) => stats,
            Err(err) => {
                eprintln!("generation failed: {err}");
                return None;
            }
        };

        // Print progress every 10 generations
        if stats.generation % 10 == 0 || evolution.is_solved() {
            println!(
                "Gen {:3}: best={:2}, avg={:6.2}, worst={:2}",
                stats.generation, stats.best, stats.average, stats.worst
            );
        }
    }

    let report = evolution.into_report();
    println!();
    println!(
        "{} run complete: {} food left, found at generation {}",
        report.encoding, report.best.fitness, report.best.generation
    );
    if report.solved {
        println!("Trail solved!");
    }
    println!("{}", report.best.genome);
    Some(report.best.genome)
}

fn main() {
    println!("Santa Fe Ant Trail Example");
    println!("==========================\n");

    let run = RunConfig {
        population_size: 200,
        generations: GenerationBudget::Fixed(50),
        selection: SelectionMethod::Tournament { size: 7 },
        seed: 42,
        ..RunConfig::default()
    };

    println!("Population: {}", run.population_size);
    println!("Generations: {}", run.generation_limit());
    println!("Food on trail: {}", FoodGrid::santa_fe().food_count());
    println!();

    println!("Linear genome");
    println!("-------------");
    let linear = evolve::<LinearGenome>(run.clone(), LinearConfig::default());
    println!();

    println!("Tree genome");
    println!("-----------");
    evolve::<TreeGenome>(run.clone(), TreeConfig::default());

    // Replay the linear champion with a longer budget
    if let Some(best) = linear {
        let grid = FoodGrid::santa_fe();
        let eval = Simulation::new(&grid, run.boundary, 5000, 600).evaluate(&best);
        println!(
            "\nLinear champion replay: {} food left after {} passes ({:?})",
            eval.fitness, eval.passes, eval.termination
        );
    }
}
