//! Run-scoped innovation tracking.
//!
//! Every structural mutation is recorded in an [`InnovationRegistry`] so that
//! independent occurrences of the same mutation within one run receive the same
//! historical markers:
//!
//! - add-link records are keyed by `(inode, onode)`
//! - add-neuron records are keyed by `(inode, onode, replaced_innovation)` and
//!   store the new neuron id plus the innovations of both replacement genes
//!
//! A registry is owned by one population. Independent runs use independent
//! registries and share nothing.

use std::collections::HashMap;

use crate::gene::{NeuronBand, NeuronId, MAX_HIDDEN};
use crate::genome::Genome;

/// Record of a link created by an add-link mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkInnovation {
    pub innovation: u64,
    /// Weight the link was first created with; replayed on re-invention.
    pub weight: f32,
}

/// Record of a link split by an add-neuron mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitInnovation {
    /// The hidden neuron inserted into the link.
    pub neuron: NeuronId,
    /// Innovation of the `inode -> neuron` gene.
    pub incoming: u64,
    /// Innovation of the `neuron -> onode` gene.
    pub outgoing: u64,
}

/// Ledger of historical markers and id counters for one run.
#[derive(Debug, Clone, Default)]
pub struct InnovationRegistry {
    next_innovation: u64,
    next_neuron: NeuronId,
    next_genome: u64,
    next_species: u64,
    links: HashMap<(NeuronId, NeuronId), LinkInnovation>,
    splits: HashMap<(NeuronId, NeuronId, u64), SplitInnovation>,
}

impl InnovationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counters past every id already used by `genome` and record
    /// its links.
    ///
    /// Must be called with the seed genome before any mutation so that fresh
    /// innovations and genome ids cannot collide with pre-assigned ones.
    pub fn reserve_for(&mut self, genome: &Genome) {
        for gene in genome.genes() {
            self.record_link(
                gene.inode,
                gene.onode,
                LinkInnovation {
                    innovation: gene.innovation,
                    weight: gene.weight,
                },
            );
        }
        if let Some(max) = genome.max_innovation() {
            self.next_innovation = self.next_innovation.max(max + 1);
        }
        self.next_genome = self.next_genome.max(genome.id() + 1);

        let num_inputs = genome.neurons().inputs;
        let highest_non_output = genome
            .genes()
            .iter()
            .flat_map(|g| [g.inode, g.onode])
            .filter(|&id| NeuronBand::of(id, num_inputs) != NeuronBand::Output)
            .max()
            .map_or(0, |id| id + 1);
        self.next_neuron = self
            .next_neuron
            .max(highest_non_output)
            .max(num_inputs + genome.neurons().hidden);
    }

    /// Mint a fresh innovation number.
    pub fn next_innovation(&mut self) -> u64 {
        let id = self.next_innovation;
        self.next_innovation += 1;
        id
    }

    /// Mint a fresh hidden neuron id, or `None` once the hidden band is full.
    pub fn next_neuron(&mut self) -> Option<NeuronId> {
        if self.next_neuron >= MAX_HIDDEN {
            return None;
        }
        let id = self.next_neuron;
        self.next_neuron += 1;
        Some(id)
    }

    /// Mint a fresh genome id.
    pub fn next_genome(&mut self) -> u64 {
        let id = self.next_genome;
        self.next_genome += 1;
        id
    }

    /// Mint a fresh species id.
    pub fn next_species(&mut self) -> u64 {
        let id = self.next_species;
        self.next_species += 1;
        id
    }

    /// Previously recorded add-link mutation for this edge, if any.
    #[must_use]
    pub fn find_link(&self, inode: NeuronId, onode: NeuronId) -> Option<LinkInnovation> {
        self.links.get(&(inode, onode)).copied()
    }

    /// Record an add-link mutation. An existing record for the edge is kept.
    pub fn record_link(&mut self, inode: NeuronId, onode: NeuronId, record: LinkInnovation) {
        self.links.entry((inode, onode)).or_insert(record);
    }

    /// Previously recorded split of the gene `(inode, onode, replaced)`, if any.
    #[must_use]
    pub fn find_split(
        &self,
        inode: NeuronId,
        onode: NeuronId,
        replaced: u64,
    ) -> Option<SplitInnovation> {
        self.splits.get(&(inode, onode, replaced)).copied()
    }

    /// Record an add-neuron mutation. An existing record for the split is kept.
    pub fn record_split(
        &mut self,
        inode: NeuronId,
        onode: NeuronId,
        replaced: u64,
        record: SplitInnovation,
    ) {
        self.splits
            .entry((inode, onode, replaced))
            .or_insert(record);
    }

    /// Number of distinct add-link mutations recorded this run.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of distinct add-neuron mutations recorded this run.
    #[must_use]
    pub fn split_count(&self) -> usize {
        self.splits.len()
    }

    /// The innovation number the next fresh mutation would receive.
    #[must_use]
    pub const fn peek_innovation(&self) -> u64 {
        self.next_innovation
    }

    /// The id the next fresh genome would receive.
    #[must_use]
    pub const fn peek_genome(&self) -> u64 {
        self.next_genome
    }
}
