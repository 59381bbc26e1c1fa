//! The population and its generational transition.
//!
//! A [`Population`] owns every [`Species`], the run's [`InnovationRegistry`] and
//! the generation counter. The driver spawns it once from a seed genome, then
//! alternates between assigning fitness to each organism and calling
//! [`Population::epoch`].

use rand::Rng;

use crate::config::NeatConfig;
use crate::error::{NeatError, Result};
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::observer::SpeciesSnapshot;
use crate::organism::Organism;
use crate::species::Species;

/// All organisms of one run, grouped into species.
#[derive(Debug, Clone)]
pub struct Population {
    config: NeatConfig,
    species: Vec<Species>,
    registry: InnovationRegistry,
    generation: usize,
    last_generation: Vec<SpeciesSnapshot>,
}

impl Population {
    /// Create an empty population.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Configuration`] if `config` fails validation.
    pub fn new(config: NeatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            species: Vec::new(),
            registry: InnovationRegistry::new(),
            generation: 0,
            last_generation: Vec::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &NeatConfig {
        &self.config
    }

    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    #[must_use]
    pub const fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    /// Number of completed generational transitions.
    #[must_use]
    pub const fn generation(&self) -> usize {
        self.generation
    }

    /// Species of the last evaluated generation as they stood after ranking
    /// and offspring allocation, before reproduction replaced their members.
    /// Empty until the first [`epoch`](Self::epoch).
    #[must_use]
    pub fn last_generation(&self) -> &[SpeciesSnapshot] {
        &self.last_generation
    }

    /// Every organism, species by species.
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.species.iter().flat_map(Species::organisms)
    }

    /// Every organism, for fitness assignment.
    pub fn organisms_mut(&mut self) -> impl Iterator<Item = &mut Organism> {
        self.species.iter_mut().flat_map(Species::organisms_mut)
    }

    /// Total number of organisms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fittest organism.
    #[must_use]
    pub fn champion(&self) -> Option<&Organism> {
        self.organisms()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// The first organism flagged as a winner, if any.
    #[must_use]
    pub fn winner(&self) -> Option<&Organism> {
        self.organisms().find(|o| o.winner)
    }

    /// Fill the population with `pop_size` weight-perturbed copies of `seed`.
    ///
    /// The registry is first advanced past the seed's innovation numbers and
    /// genome id so later mutations cannot collide with them.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Configuration`] if the population was already
    /// spawned or the seed's shape disagrees with the configuration.
    pub fn spawn<R: Rng>(&mut self, seed: &Genome, rng: &mut R) -> Result<()> {
        if !self.species.is_empty() {
            return Err(NeatError::Configuration(
                "population already spawned".to_owned(),
            ));
        }
        let neurons = seed.neurons();
        if neurons.inputs != self.config.num_inputs || neurons.outputs != self.config.num_outputs
        {
            return Err(NeatError::Configuration(format!(
                "seed genome has {} inputs and {} outputs, config expects {} and {}",
                neurons.inputs, neurons.outputs, self.config.num_inputs, self.config.num_outputs
            )));
        }

        self.registry.reserve_for(seed);
        for _ in 0..self.config.pop_size {
            let mut genome = seed.duplicate(self.registry.next_genome());
            genome.perturb(&self.config, rng);
            self.speciate(Organism::new(genome));
        }

        log::debug!(
            "spawned {} organisms in {} species",
            self.len(),
            self.species.len()
        );
        Ok(())
    }

    /// Place `organism` in the first species (in creation order) whose
    /// representative it is compatible with, or found a new species.
    pub fn speciate(&mut self, organism: Organism) {
        if let Some(species) = self
            .species
            .iter_mut()
            .find(|s| s.accepts(&self.config, &organism.genome))
        {
            species.add(organism);
            return;
        }

        let id = self.registry.next_species();
        log::debug!("genome {} founded species {id}", organism.id());
        self.species.push(Species::new(id, organism));
    }

    /// Advance one generation.
    ///
    /// Culls each species, drops stagnant ones, ranks all survivors, assigns
    /// offspring quotas by mean rank, drops species with no quota, breeds the
    /// next generation (topping up until `pop_size` is reached) and speciates
    /// every child.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::PopulationExtinct`] if every species is pruned, and
    /// [`NeatError::Configuration`] if offspring allocation would divide by a
    /// zero total. The population is not usable after either error.
    pub fn epoch<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let pop_size = self.config.pop_size;

        for species in &mut self.species {
            species.cull(self.config.survival_rate);
        }

        let threshold = self.config.stagnation_threshold;
        self.species.retain_mut(|species| {
            let stagnant = species.update_stagnation() >= threshold;
            if stagnant {
                log::debug!(
                    "species {} dropped after {} stagnant generations",
                    species.id,
                    species.stagnation_age
                );
            }
            !stagnant
        });
        self.ensure_alive()?;

        self.assign_ranks();

        let num_species = self.species.len();
        let total_average: f32 = self
            .species
            .iter_mut()
            .map(Species::update_average_rank)
            .sum();
        if total_average <= 0.0 || !total_average.is_finite() {
            return Err(NeatError::Configuration(format!(
                "total average fitness is {total_average}; cannot allocate offspring"
            )));
        }

        let slots = pop_size.saturating_sub(num_species) as f32;
        for species in &mut self.species {
            let quota = (species.avg_fitness * slots / total_average).floor() as i64 + 1;
            species.offspring_quota = usize::try_from(quota).unwrap_or(0);
        }
        self.last_generation = self.species.iter().map(SpeciesSnapshot::from).collect();
        self.species.retain(|s| s.offspring_quota > 0);
        self.ensure_alive()?;

        let mut children = Vec::with_capacity(pop_size);
        for species in &mut self.species {
            children.extend(species.reproduce(&self.config, &mut self.registry, rng, None));
            species.retain_champion();
        }
        while children.len() + self.species.len() < pop_size {
            let index = rng.random_range(0..self.species.len());
            children.extend(self.species[index].reproduce(
                &self.config,
                &mut self.registry,
                rng,
                Some(1),
            ));
        }

        for child in children {
            self.speciate(child);
        }

        self.generation += 1;
        log::debug!(
            "generation {}: {} organisms in {} species",
            self.generation,
            self.len(),
            self.species.len()
        );
        Ok(())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.species.is_empty() {
            log::warn!("population extinct at generation {}", self.generation);
            return Err(NeatError::PopulationExtinct {
                generation: self.generation,
            });
        }
        Ok(())
    }

    /// Rank every organism by fitness across the whole population, 1 = worst.
    fn assign_ranks(&mut self) {
        let mut pool: Vec<(f32, usize, usize)> = self
            .species
            .iter()
            .enumerate()
            .flat_map(|(s, species)| {
                species
                    .organisms()
                    .iter()
                    .enumerate()
                    .map(move |(o, organism)| (organism.fitness, s, o))
            })
            .collect();
        pool.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (position, &(_, s, o)) in pool.iter().enumerate() {
            self.species[s].organisms_mut()[o].rank = position + 1;
        }
    }
}
