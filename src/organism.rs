//! An evaluated individual.

use serde::{Deserialize, Serialize};

use crate::genome::Genome;

/// A genome together with its run-time evaluation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    pub genome: Genome,
    /// Fitness assigned by the external evaluator. Higher is better.
    pub fitness: f32,
    /// Population-wide fitness rank, 1 = worst. Assigned during `epoch`.
    pub rank: usize,
    /// Set when culling removes this organism from its species.
    pub marked_for_death: bool,
    /// Set by the evaluator when this organism solves the task.
    pub winner: bool,
}

impl Organism {
    #[must_use]
    pub const fn new(genome: Genome) -> Self {
        Self {
            genome,
            fitness: 0.0,
            rank: 0,
            marked_for_death: false,
            winner: false,
        }
    }

    /// The id of this organism's genome.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.genome.id()
    }
}
