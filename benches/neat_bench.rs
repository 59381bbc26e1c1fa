//! Benchmarks for speciated-neat.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use speciated_neat::{Genome, InnovationRegistry, NeatConfig, Population};

/// A genome with some evolved structure, plus the registry it was grown in.
fn evolved_genome(rng: &mut ChaCha8Rng) -> (Genome, InnovationRegistry) {
    let config = NeatConfig {
        mutate_neuron_prob: 0.3,
        mutate_gene_prob: 0.5,
        ..NeatConfig::with_shape(4, 2)
    };
    let mut registry = InnovationRegistry::new();
    let mut genome = Genome::minimal_fully_connected(0, 4, 2);
    registry.reserve_for(&genome);

    for _ in 0..20 {
        let _ = genome.mutate(&config, &mut registry, rng);
    }
    (genome, registry)
}

fn bench_genome_creation(c: &mut Criterion) {
    c.bench_function("genome_minimal_fully_connected", |b| {
        b.iter(|| {
            black_box(Genome::minimal_fully_connected(0, 8, 4));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let config = NeatConfig {
        mutate_neuron_prob: 0.1,
        mutate_gene_prob: 0.3,
        ..NeatConfig::with_shape(4, 2)
    };
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (genome, registry) = evolved_genome(&mut rng);

    c.bench_function("genome_mutation", |b| {
        let mut g = genome.clone();
        let mut registry = registry.clone();
        b.iter(|| {
            let _ = g.mutate(&config, &mut registry, &mut rng);
            black_box(&g);
        });
    });
}

fn bench_crossover(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (parent1, mut registry) = evolved_genome(&mut rng);
    let (parent2, _) = evolved_genome(&mut rng);

    c.bench_function("genome_crossover", |b| {
        b.iter(|| {
            black_box(parent1.crossover(&parent2, 1.0, 0.5, &mut registry, &mut rng));
        });
    });
}

fn bench_activation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (genome, _) = evolved_genome(&mut rng);
    let mut network = genome.genesis();

    c.bench_function("genesis", |b| {
        b.iter(|| {
            black_box(genome.genesis());
        });
    });

    c.bench_function("network_activate", |b| {
        let mut outputs = [0.0; 2];
        b.iter(|| {
            network.activate_into(black_box(&[0.5, -0.5, 0.25, 1.0]), &mut outputs);
            black_box(&outputs);
        });
    });
}

fn bench_compatibility_distance(c: &mut Criterion) {
    let config = NeatConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (genome1, _) = evolved_genome(&mut rng);
    let (genome2, _) = evolved_genome(&mut rng);

    c.bench_function("compatibility_distance", |b| {
        b.iter(|| {
            black_box(genome1.compatibility_distance(&config, &genome2));
        });
    });
}

fn bench_epoch(c: &mut Criterion) {
    let config = NeatConfig::with_shape(3, 1);

    c.bench_function("population_epoch_150", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            let mut population = Population::new(config.clone()).unwrap();
            population
                .spawn(&Genome::minimal_fully_connected(0, 3, 1), &mut rng)
                .unwrap();
            for organism in population.organisms_mut() {
                organism.fitness = rng.random::<f32>();
            }
            population.epoch(&mut rng).unwrap();
            black_box(population.len());
        });
    });
}

criterion_group!(
    benches,
    bench_genome_creation,
    bench_mutation,
    bench_crossover,
    bench_activation,
    bench_compatibility_distance,
    bench_epoch,
);
criterion_main!(benches);
