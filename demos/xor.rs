//! XOR example for speciated-neat.
//!
//! Evolves a recurrent network that solves XOR, the classic neuroevolution
//! benchmark. The third input is held at 1.0 as a bias.
//!
//! Run with: `RUST_LOG=info cargo run --example xor [events.jsonl]`
//!
//! When a path is given, every run event is also written there as JSON lines.

use std::fs::File;
use std::io::BufWriter;

use speciated_neat::{
    Activation, Evaluation, Evaluator, Experiment, LoggingObserver, NeatConfig, ObserverSet,
    PersistenceObserver, RecurrentNetwork,
};

const CASES: [([f32; 3], f32); 4] = [
    ([0.0, 0.0, 1.0], 0.0),
    ([0.0, 1.0, 1.0], 1.0),
    ([1.0, 0.0, 1.0], 1.0),
    ([1.0, 1.0, 1.0], 0.0),
];

/// XOR fitness evaluator.
///
/// Fitness is `(4 - total error)^2`, so the maximum is 16.0. A network wins
/// when every output lands on the correct side of 0.5.
struct XorFitness;

impl Evaluator for XorFitness {
    fn evaluate(&self, network: &mut RecurrentNetwork) -> Evaluation {
        network.set_activation(Activation::Sigmoid);
        let mut total_error = 0.0;
        let mut correct = 0;
        for (inputs, expected) in &CASES {
            network.reset();
            let output = network.activate(inputs)[0];
            total_error += (output - expected).abs();
            if (output >= 0.5) == (*expected >= 0.5) {
                correct += 1;
            }
        }

        let fitness = (4.0 - total_error).max(0.0).powi(2);
        Evaluation::new(fitness, correct == CASES.len())
    }
}

fn main() -> speciated_neat::Result<()> {
    env_logger::init();

    println!("NEAT XOR Example");
    println!("================\n");

    let config = NeatConfig {
        pop_size: 150,
        generations: 100,
        runs: 5,
        ..NeatConfig::with_shape(3, 1)
    };
    println!("Population: {}", config.pop_size);
    println!("Generations: {}", config.generations);
    println!("Runs: {}", config.runs);
    println!();

    let mut observers = ObserverSet::new().with(LoggingObserver);
    if let Some(path) = std::env::args().nth(1) {
        let file = File::create(&path)?;
        observers.add(PersistenceObserver::new(BufWriter::new(file)));
        println!("Writing events to {path}\n");
    }

    let experiment = Experiment::new("xor", config)?;
    let summary = experiment.run(&XorFitness, &mut observers, 42)?;

    println!("Evolution Complete!");
    println!("==================");
    for run in &summary.runs {
        match run.winner_generation {
            Some(generation) => println!(
                "Run {}: solved at generation {generation}, best fitness {:.4}, {} species",
                run.run, run.best_fitness, run.species_count
            ),
            None => println!(
                "Run {}: unsolved after {} generations, best fitness {:.4}",
                run.run, run.generations, run.best_fitness
            ),
        }
    }
    println!("{} of {} runs solved XOR", summary.winners(), summary.runs.len());

    let Some(champion) = summary
        .runs
        .iter()
        .filter_map(|r| r.champion.as_ref().map(|g| (r.best_fitness, g)))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, genome)| genome)
    else {
        return Ok(());
    };

    println!(
        "\nChampion: {} hidden neurons, {} enabled genes",
        champion.neurons().hidden,
        champion.enabled_gene_count()
    );
    println!("Champion XOR outputs:");
    let mut network = champion.genesis_with(Activation::Sigmoid);
    for (inputs, expected) in &CASES {
        network.reset();
        let output = network.activate(inputs)[0];
        let status = if (output >= 0.5) == (*expected >= 0.5) {
            "✓"
        } else {
            "✗"
        };
        println!(
            "  {} XOR {} = {:.4} (expected {}) {}",
            inputs[0] as i32, inputs[1] as i32, output, *expected as i32, status
        );
    }

    Ok(())
}
