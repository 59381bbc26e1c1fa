//! Fitness evaluation.
//!
//! The engine never scores organisms itself. An [`Evaluator`] runs the
//! phenotype of each organism and reports an [`Evaluation`]; the driver copies
//! it back onto the organism before calling [`Population::epoch`].

use serde::{Deserialize, Serialize};

use crate::network::RecurrentNetwork;
use crate::population::Population;

/// Result of scoring one network.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// Higher is better.
    pub fitness: f32,
    /// Whether the network solves the task.
    pub winner: bool,
}

impl Evaluation {
    #[must_use]
    pub const fn new(fitness: f32, winner: bool) -> Self {
        Self { fitness, winner }
    }
}

/// Scores a phenotype network.
///
/// The network is freshly built with zeroed state; implementations may
/// [`reset`](RecurrentNetwork::reset) it between trials.
pub trait Evaluator {
    fn evaluate(&self, network: &mut RecurrentNetwork) -> Evaluation;
}

impl<F> Evaluator for F
where
    F: Fn(&mut RecurrentNetwork) -> Evaluation,
{
    fn evaluate(&self, network: &mut RecurrentNetwork) -> Evaluation {
        self(network)
    }
}

/// Build and score every organism, storing fitness and winner flags.
///
/// Non-finite fitness is stored as `0.0`. Returns whether any organism won.
pub fn evaluate_population<E: Evaluator + ?Sized>(
    population: &mut Population,
    evaluator: &E,
) -> bool {
    let mut any_winner = false;
    for organism in population.organisms_mut() {
        let mut network = organism.genome.genesis();
        let Evaluation { fitness, winner } = evaluator.evaluate(&mut network);

        organism.fitness = if fitness.is_finite() {
            fitness
        } else {
            log::warn!(
                "genome {} scored non-finite fitness {fitness}; storing 0",
                organism.id()
            );
            0.0
        };
        organism.winner = winner;
        any_winner |= winner;
    }
    any_winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;
    use crate::genome::Genome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn spawned(pop_size: usize) -> Population {
        let config = NeatConfig {
            pop_size,
            ..NeatConfig::with_shape(2, 1)
        };
        let mut population = Population::new(config).unwrap();
        population
            .spawn(&Genome::minimal_fully_connected(0, 2, 1), &mut test_rng())
            .unwrap();
        population
    }

    #[test]
    fn test_closure_evaluator() {
        let evaluator = |network: &mut RecurrentNetwork| {
            let out = network.activate(&[1.0, 1.0]);
            Evaluation::new(out.len() as f32, false)
        };
        let mut population = spawned(10);

        assert!(!evaluate_population(&mut population, &evaluator));
        assert!(population
            .organisms()
            .all(|o| (o.fitness - 1.0).abs() < 1e-6 && !o.winner));
    }

    #[test]
    fn test_winner_reported() {
        let mut population = spawned(10);
        let evaluator = |_: &mut RecurrentNetwork| Evaluation::new(2.0, true);

        assert!(evaluate_population(&mut population, &evaluator));
        assert!(population.winner().is_some());
    }

    #[test]
    fn test_non_finite_fitness_zeroed() {
        let mut population = spawned(5);
        let evaluator = |_: &mut RecurrentNetwork| Evaluation::new(f32::NAN, false);

        evaluate_population(&mut population, &evaluator);
        assert!(population.organisms().all(|o| o.fitness == 0.0));
    }

    struct Constant(f32);

    impl Evaluator for Constant {
        fn evaluate(&self, _network: &mut RecurrentNetwork) -> Evaluation {
            Evaluation::new(self.0, false)
        }
    }

    #[test]
    fn test_trait_object_evaluator() {
        let mut population = spawned(5);
        let evaluator: Box<dyn Evaluator> = Box::new(Constant(3.5));

        evaluate_population(&mut population, evaluator.as_ref());
        assert!(population
            .organisms()
            .all(|o| (o.fitness - 3.5).abs() < 1e-6));
    }
}
