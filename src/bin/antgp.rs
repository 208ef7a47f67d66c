//! antgp - evolve or evaluate Santa Fe ant programs from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use symbios_ant::{
    Evolution, GenerationBudget, Genome, LinearGenome, RunConfig, Settings, Simulation,
    Termination, TreeGenome,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "antgp")]
#[command(author, version, long_about = None)]
#[command(about = "Genetic programming for the Santa Fe ant trail")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML settings file (defaults are used for anything it leaves out)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population and report the best program
    Run {
        /// Genome encoding
        #[arg(short, long, value_enum, default_value = "linear")]
        encoding: Encoding,

        /// Random seed (overrides the settings file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Population size (overrides the settings file)
        #[arg(short, long)]
        population: Option<usize>,

        /// Number of generations (overrides the settings file)
        #[arg(short, long)]
        generations: Option<usize>,
    },

    /// Evaluate a program text file on the configured grid
    Verify {
        /// Program file
        program: PathBuf,

        /// Genome encoding of the program
        #[arg(short, long, value_enum, default_value = "linear")]
        encoding: Encoding,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    Linear,
    Tree,
}

#[derive(Serialize)]
struct Verification {
    fitness: usize,
    food: usize,
    passes: usize,
    termination: Termination,
    trail: Vec<(usize, usize)>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Run {
            encoding,
            seed,
            population,
            generations,
        } => {
            if let Some(seed) = seed {
                settings.run.seed = seed;
            }
            if let Some(population) = population {
                settings.run.population_size = population;
            }
            if let Some(generations) = generations {
                settings.run.generations = GenerationBudget::Fixed(generations);
            }
            match encoding {
                Encoding::Linear => evolve::<LinearGenome>(settings.run, settings.linear, cli.json),
                Encoding::Tree => evolve::<TreeGenome>(settings.run, settings.tree, cli.json),
            }
        }
        Commands::Verify { program, encoding } => {
            let text = std::fs::read_to_string(&program)
                .with_context(|| format!("reading {}", program.display()))?;
            match encoding {
                Encoding::Linear => {
                    let genome: LinearGenome = text.parse()?;
                    verify(&genome, &settings.linear, &settings.run, cli.json)
                }
                Encoding::Tree => {
                    let genome: TreeGenome = text.parse()?;
                    verify(&genome, &settings.tree, &settings.run, cli.json)
                }
            }
        }
    }
}

fn evolve<G: Genome>(run: RunConfig, config: G::Config, json: bool) -> Result<()> {
    let report = Evolution::<G>::new(run, config)?.run()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Generation | Best | Average | Worst");
    for stats in &report.history {
        println!(
            "{:>10} | {:>4} | {:>7.2} | {:>5}",
            stats.generation, stats.best, stats.average, stats.worst
        );
    }
    println!();
    println!(
        "Best fitness: {} of {} food left (generation {})",
        report.best.fitness, report.food, report.best.generation
    );
    println!("Solved: {}", report.solved);
    println!("Termination: {:?}", report.best.termination);
    println!("Trail: {:?}", report.best.trail);
    println!();
    print!("{}", report.best.genome);
    Ok(())
}

fn verify<G: Genome>(
    genome: &G,
    config: &G::Config,
    run: &RunConfig,
    json: bool,
) -> Result<()> {
    run.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(run.seed);
    let grid = run.food.build(run.grid_size, &mut rng)?;
    let eval = Simulation::from_config(&grid, run)
        .verify(genome, config)
        .context("program does not satisfy the configured bounds")?;
    let result = Verification {
        fitness: eval.fitness,
        food: grid.food_count(),
        passes: eval.passes,
        termination: eval.termination,
        trail: eval.trail.to_pairs(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Fitness: {} of {} food left", result.fitness, result.food);
        println!("Passes: {}", result.passes);
        println!("Termination: {:?}", result.termination);
        println!("Trail: {:?}", result.trail);
    }
    Ok(())
}
