//! Genome representation and its genetic operators.
//!
//! A [`Genome`] is an ordered list of link [`Gene`]s plus the neuron counts of
//! each address band. Genes are matched across genomes by innovation number, so
//! crossover and compatibility never need to compare graph topology.
//!
//! Structural mutations take the run's [`InnovationRegistry`] explicitly; there
//! is no process-wide innovation state.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::config::NeatConfig;
use crate::error::{NeatError, Result, StructuralMutation};
use crate::gene::{output_id, Gene, NeuronBand, NeuronCounts, NeuronId};
use crate::innovation::{InnovationRegistry, LinkInnovation, SplitInnovation};
use crate::network::RecurrentNetwork;

/// Which mutation [`Genome::mutate`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    AddNeuron,
    AddLink,
    Weights,
}

/// The genotype of one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    id: u64,
    neurons: NeuronCounts,
    genes: Vec<Gene>,
}

impl Genome {
    /// Assemble a genome from parts. The caller is responsible for `neurons`
    /// matching the ids referenced by `genes`.
    #[must_use]
    pub const fn new(id: u64, neurons: NeuronCounts, genes: Vec<Gene>) -> Self {
        Self { id, neurons, genes }
    }

    /// One enabled gene per (input, output) pair with weight 1.0 and local
    /// innovation numbers starting at 0.
    ///
    /// The run's registry must be advanced past these numbers with
    /// [`InnovationRegistry::reserve_for`] before any mutation.
    #[must_use]
    pub fn minimal_fully_connected(id: u64, num_inputs: usize, num_outputs: usize) -> Self {
        let mut genes = Vec::with_capacity(num_inputs * num_outputs);
        let mut innovation = 0;
        for input in 0..num_inputs {
            for output in 0..num_outputs {
                genes.push(Gene::new(input, output_id(output), 1.0, innovation));
                innovation += 1;
            }
        }

        Self {
            id,
            neurons: NeuronCounts::new(num_inputs, 0, num_outputs),
            genes,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn neurons(&self) -> NeuronCounts {
        self.neurons
    }

    #[must_use]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Highest innovation number carried by any gene.
    #[must_use]
    pub fn max_innovation(&self) -> Option<u64> {
        self.genes.iter().map(|g| g.innovation).max()
    }

    #[must_use]
    pub fn enabled_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.enabled).count()
    }

    /// Hidden neuron ids referenced by the genes, ascending.
    #[must_use]
    pub fn hidden_ids(&self) -> Vec<NeuronId> {
        self.referenced_neurons()
            .into_iter()
            .filter(|&id| NeuronBand::of(id, self.neurons.inputs) == NeuronBand::Hidden)
            .collect()
    }

    fn referenced_neurons(&self) -> BTreeSet<NeuronId> {
        self.genes.iter().flat_map(|g| [g.inode, g.onode]).collect()
    }

    fn has_link(&self, inode: NeuronId, onode: NeuronId) -> bool {
        self.genes
            .iter()
            .any(|g| g.inode == inode && g.onode == onode)
    }

    fn has_neuron(&self, id: NeuronId) -> bool {
        match NeuronBand::of(id, self.neurons.inputs) {
            NeuronBand::Input => true,
            NeuronBand::Output => id < output_id(self.neurons.outputs),
            NeuronBand::Hidden => self.genes.iter().any(|g| g.inode == id || g.onode == id),
        }
    }

    /// Independent copy of this genome under a new id.
    #[must_use]
    pub fn duplicate(&self, new_id: u64) -> Self {
        Self {
            id: new_id,
            ..self.clone()
        }
    }

    /// Perturb every weight by up to `power`, or with probability
    /// `replace_prob` replace it with a fresh value in `[-power, power]`.
    pub fn mutate_weights<R: Rng>(&mut self, power: f32, replace_prob: f32, rng: &mut R) {
        for gene in &mut self.genes {
            let delta = (rng.random::<f32>() * 2.0 - 1.0) * power;
            if rng.random::<f32>() < replace_prob {
                gene.weight = delta;
            } else {
                gene.weight += delta;
            }
        }
    }

    /// Weight mutation as configured, clamped to the configured limit.
    pub(crate) fn perturb<R: Rng>(&mut self, config: &NeatConfig, rng: &mut R) {
        self.mutate_weights(config.mutate_power, config.weight_replace_prob, rng);
        let limit = config.weight_limit;
        for gene in &mut self.genes {
            gene.weight = gene.weight.clamp(-limit, limit);
        }
    }

    /// Add a link between two randomly sampled neurons.
    ///
    /// The source is an input or hidden neuron, the target a hidden or output
    /// neuron. A single attempt is made; see [`add_link`](Self::add_link).
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::StructuralMutationRejected`] if the sampled edge
    /// already exists. The genome is left unchanged.
    pub fn add_link_mutation<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<u64> {
        let hidden = self.hidden_ids();
        let num_inputs = self.neurons.inputs;
        let num_sources = num_inputs + hidden.len();
        let num_targets = hidden.len() + self.neurons.outputs;
        if num_sources == 0 || num_targets == 0 {
            return Err(NeatError::rejected(
                StructuralMutation::AddLink,
                "no candidate neurons",
            ));
        }

        let pick = rng.random_range(0..num_sources);
        let source = if pick < num_inputs {
            pick
        } else {
            hidden[pick - num_inputs]
        };

        let pick = rng.random_range(0..num_targets);
        let target = if pick < hidden.len() {
            hidden[pick]
        } else {
            output_id(pick - hidden.len())
        };

        self.add_link(source, target, registry, rng)
    }

    /// Add the link `inode -> onode` and return its innovation number.
    ///
    /// If this edge was already invented during the run its recorded innovation
    /// and weight are reused; otherwise a fresh innovation is minted with a
    /// random weight in `[-1, 1]` and recorded.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::StructuralMutationRejected`] if the edge already
    /// exists, targets an input, leaves an output, or names a neuron this
    /// genome does not have.
    pub fn add_link<R: Rng>(
        &mut self,
        inode: NeuronId,
        onode: NeuronId,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<u64> {
        let num_inputs = self.neurons.inputs;
        if NeuronBand::of(onode, num_inputs) == NeuronBand::Input {
            return Err(NeatError::rejected(
                StructuralMutation::AddLink,
                "target is an input neuron",
            ));
        }
        if NeuronBand::of(inode, num_inputs) == NeuronBand::Output {
            return Err(NeatError::rejected(
                StructuralMutation::AddLink,
                "source is an output neuron",
            ));
        }
        if !self.has_neuron(inode) || !self.has_neuron(onode) {
            return Err(NeatError::rejected(
                StructuralMutation::AddLink,
                "unknown neuron",
            ));
        }
        if self.has_link(inode, onode) {
            return Err(NeatError::rejected(
                StructuralMutation::AddLink,
                "link already exists",
            ));
        }

        let record = match registry.find_link(inode, onode) {
            Some(record) => record,
            None => {
                let record = LinkInnovation {
                    innovation: registry.next_innovation(),
                    weight: rng.random::<f32>() * 2.0 - 1.0,
                };
                registry.record_link(inode, onode, record);
                record
            }
        };

        self.genes
            .push(Gene::new(inode, onode, record.weight, record.innovation));
        Ok(record.innovation)
    }

    /// Split a uniformly chosen gene with a new hidden neuron.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::StructuralMutationRejected`] if the chosen gene is
    /// already disabled or no hidden neuron can be added.
    pub fn add_neuron_mutation<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<NeuronId> {
        if self.genes.is_empty() {
            return Err(NeatError::rejected(
                StructuralMutation::AddNeuron,
                "genome has no genes",
            ));
        }
        let index = rng.random_range(0..self.genes.len());
        self.split_gene(index, registry)
    }

    /// Disable the gene at `index` and route it through a new hidden neuron.
    ///
    /// Appends `inode -> neuron` with weight 1.0 and `neuron -> onode` with the
    /// disabled gene's weight. A split already recorded in the registry replays
    /// its neuron id and innovations.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::StructuralMutationRejected`] if there is no such
    /// gene, it is disabled, the replayed split is already present in this
    /// genome, or the hidden band is exhausted.
    pub fn split_gene(
        &mut self,
        index: usize,
        registry: &mut InnovationRegistry,
    ) -> Result<NeuronId> {
        let Some(gene) = self.genes.get(index) else {
            return Err(NeatError::rejected(
                StructuralMutation::AddNeuron,
                "no such gene",
            ));
        };
        if !gene.enabled {
            return Err(NeatError::rejected(
                StructuralMutation::AddNeuron,
                "gene already disabled",
            ));
        }
        let (inode, onode, weight, replaced) =
            (gene.inode, gene.onode, gene.weight, gene.innovation);

        let split = match registry.find_split(inode, onode, replaced) {
            Some(split) => {
                if self
                    .genes
                    .iter()
                    .any(|g| g.innovation == split.incoming || g.innovation == split.outgoing)
                {
                    return Err(NeatError::rejected(
                        StructuralMutation::AddNeuron,
                        "split already present",
                    ));
                }
                split
            }
            None => {
                let Some(neuron) = registry.next_neuron() else {
                    return Err(NeatError::rejected(
                        StructuralMutation::AddNeuron,
                        "hidden band exhausted",
                    ));
                };
                let split = SplitInnovation {
                    neuron,
                    incoming: registry.next_innovation(),
                    outgoing: registry.next_innovation(),
                };
                registry.record_split(inode, onode, replaced, split);
                registry.record_link(
                    inode,
                    neuron,
                    LinkInnovation {
                        innovation: split.incoming,
                        weight: 1.0,
                    },
                );
                registry.record_link(
                    neuron,
                    onode,
                    LinkInnovation {
                        innovation: split.outgoing,
                        weight,
                    },
                );
                split
            }
        };

        self.genes[index].enabled = false;
        self.genes
            .push(Gene::new(inode, split.neuron, 1.0, split.incoming));
        self.genes
            .push(Gene::new(split.neuron, onode, weight, split.outgoing));
        self.neurons.hidden += 1;
        Ok(split.neuron)
    }

    /// Apply one mutation chosen by fixed priority: add-neuron, else add-link,
    /// else weights.
    ///
    /// # Errors
    ///
    /// Propagates structural rejections; these are not retried.
    pub fn mutate<R: Rng>(
        &mut self,
        config: &NeatConfig,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<Mutation> {
        if rng.random::<f32>() < config.mutate_neuron_prob {
            self.add_neuron_mutation(registry, rng)?;
            Ok(Mutation::AddNeuron)
        } else if rng.random::<f32>() < config.mutate_gene_prob {
            self.add_link_mutation(registry, rng)?;
            Ok(Mutation::AddLink)
        } else {
            self.perturb(config, rng);
            Ok(Mutation::Weights)
        }
    }

    /// Produce a child aligned on innovation numbers.
    ///
    /// The fitter parent is primary; on a tie `self` is primary. Every primary
    /// gene is inherited. Where the other parent carries a matching enabled
    /// gene, either copy is taken with equal probability. Disjoint and excess
    /// genes of the weaker parent are never inherited.
    #[must_use]
    pub fn crossover<R: Rng>(
        &self,
        other: &Self,
        self_fitness: f32,
        other_fitness: f32,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Self {
        let (primary, secondary) = if other_fitness > self_fitness {
            (other, self)
        } else {
            (self, other)
        };

        let matching: HashMap<u64, &Gene> = secondary
            .genes
            .iter()
            .filter(|g| g.enabled)
            .map(|g| (g.innovation, g))
            .collect();

        let genes: Vec<Gene> = primary
            .genes
            .iter()
            .map(|gene| match matching.get(&gene.innovation) {
                Some(&theirs) if rng.random_bool(0.5) => theirs.clone(),
                _ => gene.clone(),
            })
            .collect();

        let referenced: BTreeSet<NeuronId> =
            genes.iter().flat_map(|g| [g.inode, g.onode]).collect();
        let neurons = NeuronCounts::from_ids(referenced, primary.neurons.inputs);

        Self {
            id: registry.next_genome(),
            neurons,
            genes,
        }
    }

    /// Compatibility distance: non-matching gene count weighted by
    /// `coef_disjoint` plus mean absolute weight difference of matching genes
    /// weighted by `coef_matching`.
    ///
    /// With no matching genes the mean weight difference is taken as 0.
    #[must_use]
    pub fn compatibility_distance(&self, config: &NeatConfig, other: &Self) -> f32 {
        let theirs: HashMap<u64, f32> = other
            .genes
            .iter()
            .map(|g| (g.innovation, g.weight))
            .collect();
        let ours: HashSet<u64> = self.genes.iter().map(|g| g.innovation).collect();

        let mut matching = 0usize;
        let mut disjoint = 0usize;
        let mut weight_diff = 0.0f32;

        for gene in &self.genes {
            if let Some(&weight) = theirs.get(&gene.innovation) {
                matching += 1;
                weight_diff += (gene.weight - weight).abs();
            } else {
                disjoint += 1;
            }
        }
        disjoint += other
            .genes
            .iter()
            .filter(|g| !ours.contains(&g.innovation))
            .count();

        let mean_weight_diff = if matching > 0 {
            weight_diff / matching as f32
        } else {
            0.0
        };

        (disjoint as f32).mul_add(config.coef_disjoint, mean_weight_diff * config.coef_matching)
    }

    /// Whether the two genomes are closer than the configured threshold.
    #[must_use]
    pub fn compatible(&self, config: &NeatConfig, other: &Self) -> bool {
        self.compatibility_distance(config, other) < config.compat_threshold
    }

    /// Build the phenotype with identity activation.
    #[must_use]
    pub fn genesis(&self) -> RecurrentNetwork {
        self.genesis_with(Activation::Identity)
    }

    /// Build the phenotype network.
    ///
    /// Neuron ids are mapped to dense indices band by band: inputs keep their
    /// id, referenced hidden ids follow in ascending order, then outputs. Each
    /// enabled gene becomes one link carrying the gene's evolved weight.
    #[must_use]
    pub fn genesis_with(&self, activation: Activation) -> RecurrentNetwork {
        let NeuronCounts {
            inputs, outputs, ..
        } = self.neurons;
        let hidden: HashMap<NeuronId, usize> = self
            .hidden_ids()
            .into_iter()
            .enumerate()
            .map(|(rank, id)| (id, inputs + rank))
            .collect();
        let dims = NeuronCounts::new(inputs, hidden.len(), outputs);
        let dense = |id: NeuronId| match NeuronBand::of(id, inputs) {
            NeuronBand::Input => id,
            NeuronBand::Hidden => hidden[&id],
            NeuronBand::Output => inputs + hidden.len() + (id - output_id(0)),
        };

        let mut network = RecurrentNetwork::new(dims, activation);
        for gene in self.genes.iter().filter(|g| g.enabled) {
            if !network.add_link(dense(gene.inode), dense(gene.onode), gene.weight) {
                log::debug!(
                    "genome {}: gene {} ({} -> {}) has no phenotype link",
                    self.id,
                    gene.innovation,
                    gene.inode,
                    gene.onode
                );
            }
        }
        network
    }
}
