//! Run observers.
//!
//! An [`Experiment`](crate::Experiment) reports its lifecycle to a
//! [`RunObserver`]: experiment start, each population (run) start, every
//! generation's per-organism progress and species state, and the final summary.
//! Observers are passive; they never influence the evolutionary process.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::error::Result;
use crate::experiment::ExperimentSummary;
use crate::species::Species;

/// Statistics for one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub run: usize,
    pub generation: usize,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub species_count: usize,
    pub winner: bool,
}

/// Fitness and rank of one organism at the end of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismSnapshot {
    pub id: u64,
    pub fitness: f32,
    pub rank: usize,
}

/// State of one species at the end of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSnapshot {
    pub id: u64,
    pub avg_fitness: f32,
    pub max_fitness: f32,
    pub offspring_quota: usize,
    pub stagnation_age: usize,
    pub organisms: Vec<OrganismSnapshot>,
}

impl From<&Species> for SpeciesSnapshot {
    fn from(species: &Species) -> Self {
        Self {
            id: species.id,
            avg_fitness: species.avg_fitness,
            max_fitness: species.max_fitness_seen,
            offspring_quota: species.offspring_quota,
            stagnation_age: species.stagnation_age,
            organisms: species
                .organisms()
                .iter()
                .map(|o| OrganismSnapshot {
                    id: o.id(),
                    fitness: o.fitness,
                    rank: o.rank,
                })
                .collect(),
        }
    }
}

/// Receives experiment lifecycle events. Every method defaults to a no-op.
pub trait RunObserver {
    fn experiment_started(&mut self, _name: &str, _config: &NeatConfig) -> Result<()> {
        Ok(())
    }

    /// A fresh population for run `run` (0-based) was spawned.
    fn population_started(&mut self, _run: usize) -> Result<()> {
        Ok(())
    }

    /// `generation` of run `run` completed its epoch. `species` holds every
    /// species as ranked and allotted offspring, before reproduction.
    fn generation_ended(
        &mut self,
        _run: usize,
        _generation: usize,
        _species: &[SpeciesSnapshot],
    ) -> Result<()> {
        Ok(())
    }

    /// A generation was evaluated.
    fn progress(&mut self, _progress: &Progress) -> Result<()> {
        Ok(())
    }

    fn experiment_ended(&mut self, _summary: &ExperimentSummary) -> Result<()> {
        Ok(())
    }
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// Reports events through `log::info!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl RunObserver for LoggingObserver {
    fn experiment_started(&mut self, name: &str, config: &NeatConfig) -> Result<()> {
        log::info!(
            "experiment '{name}': {} runs x {} generations, population {}",
            config.runs,
            config.generations,
            config.pop_size
        );
        Ok(())
    }

    fn population_started(&mut self, run: usize) -> Result<()> {
        log::info!("run {run} started");
        Ok(())
    }

    fn progress(&mut self, progress: &Progress) -> Result<()> {
        log::info!(
            "run {} generation {}: best {:.4}, mean {:.4}, {} species{}",
            progress.run,
            progress.generation,
            progress.best_fitness,
            progress.mean_fitness,
            progress.species_count,
            if progress.winner { ", winner found" } else { "" }
        );
        Ok(())
    }

    fn experiment_ended(&mut self, summary: &ExperimentSummary) -> Result<()> {
        log::info!(
            "experiment '{}' finished: {} of {} runs found a winner",
            summary.name,
            summary.winners(),
            summary.runs.len()
        );
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    ExperimentStarted {
        name: &'a str,
        config: &'a NeatConfig,
    },
    PopulationStarted {
        run: usize,
    },
    GenerationEnded {
        run: usize,
        generation: usize,
        species: &'a [SpeciesSnapshot],
    },
    Progress {
        progress: &'a Progress,
    },
    ExperimentEnded {
        summary: &'a ExperimentSummary,
    },
}

/// Writes every event as one JSON object per line.
#[derive(Debug)]
pub struct PersistenceObserver<W: Write> {
    writer: W,
}

impl<W: Write> PersistenceObserver<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, record: &Record<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> RunObserver for PersistenceObserver<W> {
    fn experiment_started(&mut self, name: &str, config: &NeatConfig) -> Result<()> {
        self.write(&Record::ExperimentStarted { name, config })
    }

    fn population_started(&mut self, run: usize) -> Result<()> {
        self.write(&Record::PopulationStarted { run })
    }

    fn generation_ended(
        &mut self,
        run: usize,
        generation: usize,
        species: &[SpeciesSnapshot],
    ) -> Result<()> {
        self.write(&Record::GenerationEnded {
            run,
            generation,
            species,
        })
    }

    fn progress(&mut self, progress: &Progress) -> Result<()> {
        self.write(&Record::Progress { progress })
    }

    fn experiment_ended(&mut self, summary: &ExperimentSummary) -> Result<()> {
        self.write(&Record::ExperimentEnded { summary })?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards every event to each registered observer in order.
///
/// Stops at the first observer that returns an error.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn RunObserver>>,
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: impl RunObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    #[must_use]
    pub fn with(mut self, observer: impl RunObserver + 'static) -> Self {
        self.add(observer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for ObserverSet {
    fn experiment_started(&mut self, name: &str, config: &NeatConfig) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.experiment_started(name, config))
    }

    fn population_started(&mut self, run: usize) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.population_started(run))
    }

    fn generation_ended(
        &mut self,
        run: usize,
        generation: usize,
        species: &[SpeciesSnapshot],
    ) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.generation_ended(run, generation, species))
    }

    fn progress(&mut self, progress: &Progress) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.progress(progress))
    }

    fn experiment_ended(&mut self, summary: &ExperimentSummary) -> Result<()> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.experiment_ended(summary))
    }
}
