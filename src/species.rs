//! Species: clusters of mutually compatible organisms.
//!
//! A species is represented by its first member. It owns intra-species
//! selection and reproduction; the population decides how many offspring each
//! species gets.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::organism::Organism;

/// A cluster of compatible organisms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: u64,
    organisms: Vec<Organism>,
    /// Best fitness any member has reached.
    pub max_fitness_seen: f32,
    /// Mean population rank of the members, set during `epoch`.
    pub avg_fitness: f32,
    /// Generations since `max_fitness_seen` last improved.
    pub stagnation_age: usize,
    /// Offspring slots assigned for the next generation.
    pub offspring_quota: usize,
}

impl Species {
    /// Found a species with a single member.
    #[must_use]
    pub fn new(id: u64, founder: Organism) -> Self {
        Self {
            id,
            organisms: vec![founder],
            max_fitness_seen: f32::MIN,
            avg_fitness: 0.0,
            stagnation_age: 0,
            offspring_quota: 0,
        }
    }

    #[must_use]
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn organisms_mut(&mut self) -> &mut [Organism] {
        &mut self.organisms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// The member new genomes are compared against.
    #[must_use]
    pub fn representative(&self) -> Option<&Organism> {
        self.organisms.first()
    }

    /// The fittest member.
    #[must_use]
    pub fn champion(&self) -> Option<&Organism> {
        self.organisms
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Whether `genome` is compatible with the representative.
    #[must_use]
    pub fn accepts(&self, config: &NeatConfig, genome: &Genome) -> bool {
        self.representative()
            .is_some_and(|rep| rep.genome.compatible(config, genome))
    }

    pub fn add(&mut self, organism: Organism) {
        self.organisms.push(organism);
    }

    /// Sort members by fitness, best first, and keep
    /// `floor(len * survival_rate) + 1` of them. Returns how many were removed.
    pub(crate) fn cull(&mut self, survival_rate: f32) -> usize {
        self.organisms
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let len = self.organisms.len();
        let keep = ((len as f32 * survival_rate).floor() as usize + 1).min(len);
        for organism in &mut self.organisms[keep..] {
            organism.marked_for_death = true;
        }
        self.organisms.retain(|o| !o.marked_for_death);
        len - self.organisms.len()
    }

    /// Track improvement of the best member. Returns the new stagnation age.
    pub(crate) fn update_stagnation(&mut self) -> usize {
        let best = self
            .organisms
            .iter()
            .map(|o| o.fitness)
            .fold(f32::NEG_INFINITY, f32::max);

        if best > self.max_fitness_seen {
            self.max_fitness_seen = best;
            self.stagnation_age = 0;
        } else {
            self.stagnation_age += 1;
        }
        self.stagnation_age
    }

    /// Set `avg_fitness` to the mean rank of the members.
    pub(crate) fn update_average_rank(&mut self) -> f32 {
        let total: usize = self.organisms.iter().map(|o| o.rank).sum();
        self.avg_fitness = if self.organisms.is_empty() {
            0.0
        } else {
            total as f32 / self.organisms.len() as f32
        };
        self.avg_fitness
    }

    /// Drop every member except the highest ranked one.
    pub(crate) fn retain_champion(&mut self) {
        if let Some(best) = self
            .organisms
            .iter()
            .enumerate()
            .max_by_key(|(_, o)| o.rank)
            .map(|(i, _)| i)
        {
            self.organisms.swap(0, best);
            self.organisms.truncate(1);
        }
    }

    /// Breed offspring from the current members.
    ///
    /// Produces exactly `count` organisms, or `offspring_quota - 1` when `count`
    /// is `None` (one slot stays with the carried-over champion).
    ///
    /// Parents are drawn by roulette over rank. With probability
    /// `mutate_only_prob` a child is a mutated copy of one parent; otherwise it
    /// is the crossover of two independently drawn parents, mutated unless a
    /// `mate_only_prob` draw suppresses it. Mutation is forced when both parents
    /// are the same genome or are compatible with each other.
    pub fn reproduce<R: Rng>(
        &self,
        config: &NeatConfig,
        registry: &mut InnovationRegistry,
        rng: &mut R,
        count: Option<usize>,
    ) -> Vec<Organism> {
        let count = count.unwrap_or_else(|| self.offspring_quota.saturating_sub(1));
        if count == 0 || self.organisms.is_empty() {
            return Vec::new();
        }

        let roulette = self.rank_roulette();
        (0..count)
            .map(|_| self.breed(config, registry, rng, &roulette))
            .collect()
    }

    /// Cumulative selection probabilities over members sorted by rank ascending,
    /// weighted `rank / sum(ranks)`. Falls back to uniform when no ranks are set.
    fn rank_roulette(&self) -> Vec<(f64, usize)> {
        let mut order: Vec<usize> = (0..self.organisms.len()).collect();
        order.sort_by_key(|&i| self.organisms[i].rank);

        let total: usize = self.organisms.iter().map(|o| o.rank).sum();
        let mut cumulative = 0.0;
        order
            .into_iter()
            .map(|i| {
                cumulative += if total == 0 {
                    1.0 / self.organisms.len() as f64
                } else {
                    self.organisms[i].rank as f64 / total as f64
                };
                (cumulative, i)
            })
            .collect()
    }

    fn select<'a, R: Rng>(&'a self, roulette: &[(f64, usize)], rng: &mut R) -> &'a Organism {
        let draw: f64 = rng.random();
        let index = roulette
            .iter()
            .find(|(cumulative, _)| *cumulative > draw)
            .or_else(|| roulette.last())
            .map_or(0, |&(_, i)| i);
        &self.organisms[index]
    }

    fn breed<R: Rng>(
        &self,
        config: &NeatConfig,
        registry: &mut InnovationRegistry,
        rng: &mut R,
        roulette: &[(f64, usize)],
    ) -> Organism {
        if rng.random::<f32>() < config.mutate_only_prob {
            let parent = self.select(roulette, rng);
            let mut genome = parent.genome.duplicate(registry.next_genome());
            mutate_offspring(&mut genome, config, registry, rng);
            return Organism::new(genome);
        }

        let mom = self.select(roulette, rng);
        let dad = self.select(roulette, rng);
        mate(mom, dad, config, registry, rng)
    }
}

/// Cross two parents, then mutate unless a `mate_only_prob` draw suppresses
/// it. Parents that are the same genome or compatible always mutate.
fn mate<R: Rng>(
    mom: &Organism,
    dad: &Organism,
    config: &NeatConfig,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) -> Organism {
    let mut genome = mom
        .genome
        .crossover(&dad.genome, mom.fitness, dad.fitness, registry, rng);

    let mate_only = rng.random::<f32>() < config.mate_only_prob;
    let forced = mom.id() == dad.id() || mom.genome.compatible(config, &dad.genome);
    if !mate_only || forced {
        mutate_offspring(&mut genome, config, registry, rng);
    }
    Organism::new(genome)
}

fn mutate_offspring<R: Rng>(
    genome: &mut Genome,
    config: &NeatConfig,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) {
    if let Err(err) = genome.mutate(config, registry, rng) {
        log::debug!("genome {}: {err}", genome.id());
    }
}
