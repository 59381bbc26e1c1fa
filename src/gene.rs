//! Gene and neuron addressing types.
//!
//! Neurons are addressed by plain integer ids split into three bands:
//! - inputs: `[0, num_inputs)`
//! - hidden: `[num_inputs, MAX_HIDDEN)`
//! - outputs: `[MAX_HIDDEN, MAX_HIDDEN + num_outputs)`
//!
//! The fixed output offset lets the hidden band grow without ever colliding
//! with output ids.
//!
//! Hidden ids are drawn from the run's innovation registry, so the hidden ids
//! of a single genome need not be contiguous. [`NeuronCounts::from_ids`]
//! counts neurons per band and does not derive counts from the largest id.

use serde::{Deserialize, Serialize};

/// Identifier of a neuron within a run.
pub type NeuronId = usize;

/// First id of the output band. Hidden ids stay strictly below this.
pub const MAX_HIDDEN: NeuronId = 1 << 16;

/// The address band a neuron id falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronBand {
    Input,
    Hidden,
    Output,
}

impl NeuronBand {
    /// Classify a neuron id given the number of input neurons.
    #[inline]
    #[must_use]
    pub const fn of(id: NeuronId, num_inputs: usize) -> Self {
        if id < num_inputs {
            Self::Input
        } else if id < MAX_HIDDEN {
            Self::Hidden
        } else {
            Self::Output
        }
    }
}

/// Output neuron id for the `index`-th output.
#[inline]
#[must_use]
pub const fn output_id(index: usize) -> NeuronId {
    MAX_HIDDEN + index
}

/// Neuron counts of a genome, one per address band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NeuronCounts {
    pub inputs: usize,
    pub hidden: usize,
    pub outputs: usize,
}

impl NeuronCounts {
    #[must_use]
    pub const fn new(inputs: usize, hidden: usize, outputs: usize) -> Self {
        Self {
            inputs,
            hidden,
            outputs,
        }
    }

    /// Total neurons across all bands.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inputs + self.hidden + self.outputs
    }

    /// Partition a set of distinct neuron ids by band.
    pub fn from_ids<I>(ids: I, num_inputs: usize) -> Self
    where
        I: IntoIterator<Item = NeuronId>,
    {
        let mut counts = Self::default();
        for id in ids {
            match NeuronBand::of(id, num_inputs) {
                NeuronBand::Input => counts.inputs += 1,
                NeuronBand::Hidden => counts.hidden += 1,
                NeuronBand::Output => counts.outputs += 1,
            }
        }
        counts
    }
}

/// A link gene: one directed, weighted connection between two neurons.
///
/// Genes are compared across genomes by `innovation` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Source neuron.
    pub inode: NeuronId,
    /// Target neuron.
    pub onode: NeuronId,
    pub weight: f32,
    /// Historical marker assigned by the [`InnovationRegistry`](crate::InnovationRegistry).
    pub innovation: u64,
    /// Disabled genes are kept for compatibility and crossover but never expressed.
    pub enabled: bool,
}

impl Gene {
    /// Create a new enabled gene.
    #[must_use]
    pub const fn new(inode: NeuronId, onode: NeuronId, weight: f32, innovation: u64) -> Self {
        Self {
            inode,
            onode,
            weight,
            innovation,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_classification() {
        assert_eq!(NeuronBand::of(0, 3), NeuronBand::Input);
        assert_eq!(NeuronBand::of(2, 3), NeuronBand::Input);
        assert_eq!(NeuronBand::of(3, 3), NeuronBand::Hidden);
        assert_eq!(NeuronBand::of(MAX_HIDDEN - 1, 3), NeuronBand::Hidden);
        assert_eq!(NeuronBand::of(output_id(0), 3), NeuronBand::Output);
    }

    #[test]
    fn test_counts_from_ids() {
        let ids = [0, 1, 2, 3, 7, output_id(0), output_id(1)];
        let counts = NeuronCounts::from_ids(ids, 3);
        assert_eq!(counts, NeuronCounts::new(3, 2, 2));
        assert_eq!(counts.total(), 7);
    }

    #[test]
    fn test_gene_creation() {
        let gene = Gene::new(0, output_id(0), 0.5, 12);
        assert!(gene.enabled);
        assert_eq!(gene.innovation, 12);
        assert!((gene.weight - 0.5).abs() < 1e-6);
    }
}
