//! Benchmarks for symbios-ant.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use symbios_ant::{
    BoundaryPolicy, Evolution, FoodGrid, GenerationBudget, Genome, LinearConfig, LinearGenome,
    RunConfig, Simulation, TreeConfig, TreeGenome,
};

fn bench_genome_creation(c: &mut Criterion) {
    let linear = LinearConfig::default();
    let tree = TreeConfig::default();

    c.bench_function("linear_random", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            black_box(LinearGenome::random(&linear, &mut rng));
        });
    });

    c.bench_function("tree_random", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            black_box(TreeGenome::random(&tree, &mut rng));
        });
    });
}

fn bench_evaluation(c: &mut Criterion) {
    let grid = FoodGrid::santa_fe();
    let sim = Simulation::new(&grid, BoundaryPolicy::Stay, 1000, 200);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let linear = LinearGenome::random(&LinearConfig::default(), &mut rng);
    let tree = TreeGenome::random(&TreeConfig::default(), &mut rng);

    c.bench_function("linear_evaluate_santa_fe", |b| {
        b.iter(|| {
            black_box(sim.evaluate(&linear));
        });
    });

    c.bench_function("tree_evaluate_santa_fe", |b| {
        b.iter(|| {
            black_box(sim.evaluate(&tree));
        });
    });
}

fn bench_crossover(c: &mut Criterion) {
    let linear = LinearConfig::default();
    let tree = TreeConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let l1 = LinearGenome::random(&linear, &mut rng);
    let l2 = LinearGenome::random(&linear, &mut rng);
    let t1 = TreeGenome::random(&tree, &mut rng);
    let t2 = TreeGenome::random(&tree, &mut rng);

    c.bench_function("linear_crossover", |b| {
        b.iter(|| {
            black_box(l1.crossover(&l2, &linear, &mut rng));
        });
    });

    c.bench_function("tree_crossover", |b| {
        b.iter(|| {
            black_box(t1.crossover(&t2, &tree, &mut rng));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let linear = LinearConfig::default();
    let tree = TreeConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let l = LinearGenome::random(&linear, &mut rng);
    let t = TreeGenome::random(&tree, &mut rng);

    c.bench_function("linear_mutation", |b| {
        let mut g = l.clone();
        b.iter(|| {
            g.mutate(&linear, &mut rng);
            black_box(&g);
        });
    });

    c.bench_function("tree_mutation", |b| {
        let mut g = t.clone();
        b.iter(|| {
            g.mutate(&tree, &mut rng);
            black_box(&g);
        });
    });
}

fn bench_generation(c: &mut Criterion) {
    let run = RunConfig {
        population_size: 100,
        generations: GenerationBudget::Fixed(1),
        ..RunConfig::default()
    };

    c.bench_function("linear_generation_100", |b| {
        let mut evolution = Evolution::<LinearGenome>::new(run.clone(), LinearConfig::default())
            .expect("valid benchmark configuration");
        b.iter(|| {
            black_box(evolution.step().ok());
        });
    });
}

criterion_group!(
    benches,
    bench_genome_creation,
    bench_evaluation,
    bench_crossover,
    bench_mutation,
    bench_generation,
);
criterion_main!(benches);
