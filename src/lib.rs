//! # Speciated NEAT
//!
//! A `NeuroEvolution` of Augmenting Topologies (NEAT) engine with explicit
//! speciation, historical innovation markers and recurrent phenotypes.
//!
//! ## Features
//!
//! - **Run-Scoped Innovations**: an [`InnovationRegistry`] gives every
//!   structural mutation a historical marker, and re-invented mutations
//!   within a run get the same markers and neuron ids
//! - **Speciation**: organisms are grouped by compatibility distance; species
//!   compete for offspring by mean fitness rank and are pruned when they stagnate
//! - **Recurrent Phenotypes**: genomes compile into a [`RecurrentNetwork`] whose
//!   hidden and output state carries across activations
//! - **Reproducible Runs**: all randomness flows through caller-supplied `R: Rng`
//!   generators
//!
//! ## Quick Start
//!
//! ```rust
//! use speciated_neat::{Evaluation, Experiment, NeatConfig, NullObserver, RecurrentNetwork};
//!
//! let config = NeatConfig {
//!     pop_size: 50,
//!     generations: 10,
//!     ..NeatConfig::with_shape(2, 1)
//! };
//! let experiment = Experiment::new("sum", config).unwrap();
//!
//! // Reward networks whose output tracks the input sum
//! let evaluator = |network: &mut RecurrentNetwork| {
//!     let out = network.activate(&[0.5, 0.25])[0];
//!     let error = (out - 0.75).abs();
//!     Evaluation::new(1.0 / (1.0 + error), error < 0.01)
//! };
//!
//! let summary = experiment.run(&evaluator, &mut NullObserver, 42).unwrap();
//! println!("best fitness: {}", summary.runs[0].best_fitness);
//! ```
//!
//! ## Driving a Population Directly
//!
//! ```rust
//! use speciated_neat::{Genome, NeatConfig, Population};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let config = NeatConfig { pop_size: 30, ..NeatConfig::with_shape(3, 1) };
//! let mut population = Population::new(config).unwrap();
//! population
//!     .spawn(&Genome::minimal_fully_connected(0, 3, 1), &mut rng)
//!     .unwrap();
//!
//! for _ in 0..5 {
//!     for organism in population.organisms_mut() {
//!         let mut network = organism.genome.genesis();
//!         organism.fitness = network.activate(&[1.0, 0.0, 1.0])[0].abs();
//!     }
//!     population.epoch(&mut rng).unwrap();
//! }
//! assert_eq!(population.len(), 30);
//! ```
//!
//! ## Architecture
//!
//! ### Neuron Addressing
//!
//! Neuron ids are partitioned into bands: inputs occupy `[0, num_inputs)`,
//! hidden neurons `[num_inputs, MAX_HIDDEN)`, and output `o` is
//! `MAX_HIDDEN + o`. The band of any id is therefore known without a lookup.
//!
//! ### Generational Transition
//!
//! [`Population::epoch`] culls each species to its fittest fraction, removes
//! stagnant species, ranks every survivor population-wide, allocates offspring
//! in proportion to each species' mean rank, breeds, and re-speciates the
//! children. The population size is preserved exactly.

pub mod activation;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod experiment;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod observer;
pub mod organism;
pub mod population;
pub mod species;

// Re-exports for convenience
pub use activation::Activation;
pub use config::NeatConfig;
pub use error::{NeatError, Result, StructuralMutation};
pub use evaluator::{evaluate_population, Evaluation, Evaluator};
pub use experiment::{Experiment, ExperimentSummary, RunSummary};
pub use gene::{output_id, Gene, NeuronBand, NeuronCounts, NeuronId, MAX_HIDDEN};
pub use genome::{Genome, Mutation};
pub use innovation::{InnovationRegistry, LinkInnovation, SplitInnovation};
pub use network::RecurrentNetwork;
pub use observer::{
    LoggingObserver, NullObserver, ObserverSet, OrganismSnapshot, PersistenceObserver, Progress,
    RunObserver, SpeciesSnapshot,
};
pub use organism::Organism;
pub use population::Population;
pub use species::Species;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::minimal_fully_connected(0, 3, 2);
        registry.reserve_for(&genome);

        genome.split_gene(0, &mut registry).unwrap();
        let _ = genome.add_link_mutation(&mut registry, &mut rng);

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome, restored);
        assert_eq!(genome.neurons(), restored.neurons());
    }

    #[test]
    fn test_reinvented_mutation_shares_markers() {
        let mut registry = InnovationRegistry::new();
        let seed = Genome::minimal_fully_connected(0, 2, 1);
        registry.reserve_for(&seed);

        let mut a = seed.duplicate(registry.next_genome());
        let mut b = seed.duplicate(registry.next_genome());
        let neuron_a = a.split_gene(1, &mut registry).unwrap();
        let neuron_b = b.split_gene(1, &mut registry).unwrap();

        assert_eq!(neuron_a, neuron_b);
        let markers = |g: &Genome| g.genes().iter().map(|g| g.innovation).collect::<Vec<_>>();
        assert_eq!(markers(&a), markers(&b));
        assert_eq!(registry.split_count(), 1);
    }

    #[test]
    fn test_phenotype_of_evolved_genome() {
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::minimal_fully_connected(0, 2, 1);
        registry.reserve_for(&genome);
        genome.split_gene(0, &mut registry).unwrap();

        let mut network = genome.genesis_with(Activation::Tanh);
        assert_eq!(network.dims(), NeuronCounts::new(2, 1, 1));
        let outputs = network.activate(&[1.0, -1.0]);
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0].is_finite());
    }
}
