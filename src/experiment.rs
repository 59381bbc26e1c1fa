//! Experiment driver.
//!
//! An [`Experiment`] repeats independent evolutionary runs. Each run gets a
//! fresh [`Population`], its own innovation registry and its own seeded RNG,
//! so runs share nothing and a given `(config, seed)` pair is reproducible.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::error::Result;
use crate::evaluator::{evaluate_population, Evaluator};
use crate::genome::Genome;
use crate::observer::{Progress, RunObserver};
use crate::population::Population;

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: usize,
    /// Generations evaluated, including the one that produced a winner.
    pub generations: usize,
    pub best_fitness: f32,
    /// Generation (0-based) in which a winner was found.
    pub winner_generation: Option<usize>,
    /// Species alive when the run stopped.
    pub species_count: usize,
    /// Genome of the fittest organism seen in the run, which need not be the
    /// winner that stopped it.
    pub champion: Option<Genome>,
}

/// Outcome of every run of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub runs: Vec<RunSummary>,
}

impl ExperimentSummary {
    /// Number of runs that found a winner.
    #[must_use]
    pub fn winners(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.winner_generation.is_some())
            .count()
    }
}

/// A named configuration to evolve against an evaluator.
#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    config: NeatConfig,
}

impl Experiment {
    /// # Errors
    ///
    /// Returns [`NeatError::Configuration`](crate::NeatError::Configuration) if
    /// `config` fails validation.
    pub fn new(name: impl Into<String>, config: NeatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Run `config.runs` independent runs of up to `config.generations`
    /// generations each. Run `r` uses an RNG seeded with `seed + r`.
    ///
    /// A run stops early once any organism is flagged as a winner; no epoch is
    /// performed on that generation.
    ///
    /// # Errors
    ///
    /// Propagates [`NeatError::PopulationExtinct`](crate::NeatError::PopulationExtinct)
    /// from a run and any error returned by `observer`.
    pub fn run<E, O>(&self, evaluator: &E, observer: &mut O, seed: u64) -> Result<ExperimentSummary>
    where
        E: Evaluator + ?Sized,
        O: RunObserver + ?Sized,
    {
        observer.experiment_started(&self.name, &self.config)?;

        let seed_genome =
            Genome::minimal_fully_connected(0, self.config.num_inputs, self.config.num_outputs);
        let runs = (0..self.config.runs)
            .map(|run| self.run_once(run, &seed_genome, evaluator, observer, seed))
            .collect::<Result<Vec<_>>>()?;

        let summary = ExperimentSummary {
            name: self.name.clone(),
            runs,
        };
        observer.experiment_ended(&summary)?;
        Ok(summary)
    }

    fn run_once<E, O>(
        &self,
        run: usize,
        seed_genome: &Genome,
        evaluator: &E,
        observer: &mut O,
        seed: u64,
    ) -> Result<RunSummary>
    where
        E: Evaluator + ?Sized,
        O: RunObserver + ?Sized,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(run as u64));
        let mut population = Population::new(self.config.clone())?;
        population.spawn(seed_genome, &mut rng)?;
        observer.population_started(run)?;

        let mut summary = RunSummary {
            run,
            generations: 0,
            best_fitness: f32::MIN,
            winner_generation: None,
            species_count: population.species().len(),
            champion: None,
        };

        for generation in 0..self.config.generations {
            let won = evaluate_population(&mut population, evaluator);
            summary.generations = generation + 1;

            let progress = progress(&population, run, generation, won);
            if progress.best_fitness > summary.best_fitness {
                summary.best_fitness = progress.best_fitness;
                summary.champion = population.champion().map(|o| o.genome.clone());
            }
            observer.progress(&progress)?;

            if won {
                summary.winner_generation = Some(generation);
                log::info!("run {run}: winner found in generation {generation}");
                break;
            }

            population.epoch(&mut rng)?;
            observer.generation_ended(
                run,
                population.generation(),
                population.last_generation(),
            )?;
        }

        summary.species_count = population.species().len();
        Ok(summary)
    }
}

fn progress(population: &Population, run: usize, generation: usize, winner: bool) -> Progress {
    let (total, best) = population
        .organisms()
        .fold((0.0_f32, f32::MIN), |(total, best), o| {
            (total + o.fitness, best.max(o.fitness))
        });
    let count = population.len().max(1);
    Progress {
        run,
        generation,
        best_fitness: best,
        mean_fitness: total / count as f32,
        species_count: population.species().len(),
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NeatError;
    use crate::evaluator::Evaluation;
    use crate::network::RecurrentNetwork;
    use crate::observer::{NullObserver, PersistenceObserver};

    fn small_config() -> NeatConfig {
        NeatConfig {
            pop_size: 20,
            generations: 5,
            runs: 2,
            ..NeatConfig::with_shape(2, 1)
        }
    }

    fn output_sum(network: &mut RecurrentNetwork) -> Evaluation {
        let out = network.activate(&[1.0, 1.0])[0];
        Evaluation::new(out.abs(), false)
    }

    #[test]
    fn test_new_validates_config() {
        let config = NeatConfig {
            runs: 0,
            ..Default::default()
        };
        assert!(matches!(
            Experiment::new("bad", config),
            Err(NeatError::Configuration(_))
        ));
    }

    #[test]
    fn test_runs_all_generations_without_winner() {
        let experiment = Experiment::new("sum", small_config()).unwrap();
        let summary = experiment.run(&output_sum, &mut NullObserver, 7).unwrap();

        assert_eq!(summary.name, "sum");
        assert_eq!(summary.runs.len(), 2);
        assert_eq!(summary.winners(), 0);
        for (i, run) in summary.runs.iter().enumerate() {
            assert_eq!(run.run, i);
            assert_eq!(run.generations, 5);
            assert!(run.best_fitness >= 0.0);
            assert!(run.champion.is_some());
            assert!(run.species_count >= 1);
        }
    }

    #[test]
    fn test_winner_stops_run() {
        let experiment = Experiment::new("instant", small_config()).unwrap();
        let always = |_: &mut RecurrentNetwork| Evaluation::new(1.0, true);
        let summary = experiment.run(&always, &mut NullObserver, 0).unwrap();

        assert_eq!(summary.winners(), 2);
        for run in &summary.runs {
            assert_eq!(run.generations, 1);
            assert_eq!(run.winner_generation, Some(0));
        }
    }

    #[test]
    fn test_same_seed_reproduces_summary() {
        let experiment = Experiment::new("repeat", small_config()).unwrap();
        let first = experiment.run(&output_sum, &mut NullObserver, 11).unwrap();
        let second = experiment.run(&output_sum, &mut NullObserver, 11).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_observer_receives_every_event() {
        let config = NeatConfig {
            runs: 1,
            generations: 3,
            ..small_config()
        };
        let experiment = Experiment::new("events", config).unwrap();
        let mut observer = PersistenceObserver::new(Vec::new());
        experiment.run(&output_sum, &mut observer, 3).unwrap();

        let text = String::from_utf8(observer.into_inner()).unwrap();
        let events: Vec<String> = text
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["event"].as_str().unwrap().to_owned()
            })
            .collect();

        // started, population, 3 x (progress, generation_ended), ended
        assert_eq!(events.len(), 9);
        assert_eq!(events[0], "experiment_started");
        assert_eq!(events[1], "population_started");
        assert_eq!(events[2], "progress");
        assert_eq!(events[3], "generation_ended");
        assert_eq!(events[8], "experiment_ended");
    }

    #[test]
    fn test_champion_is_fittest_even_with_winner() {
        let experiment = Experiment::new("fittest", small_config()).unwrap();
        // Every organism wins; fitness still separates them
        let all_win = |network: &mut RecurrentNetwork| {
            let out = network.activate(&[1.0, 1.0])[0];
            Evaluation::new(out.abs(), true)
        };
        let summary = experiment.run(&all_win, &mut NullObserver, 5).unwrap();

        for run in &summary.runs {
            let champion = run.champion.as_ref().unwrap();
            let rescored = all_win(&mut champion.genesis());
            assert!((rescored.fitness - run.best_fitness).abs() < 1e-6);
        }
    }

    #[test]
    fn test_generation_records_carry_ranked_organisms() {
        let config = NeatConfig {
            pop_size: 30,
            generations: 2,
            runs: 1,
            ..small_config()
        };
        let experiment = Experiment::new("ranks", config).unwrap();
        let offset = |network: &mut RecurrentNetwork| {
            let out = network.activate(&[1.0, 1.0])[0];
            Evaluation::new(1.0 + out.abs(), false)
        };
        let mut observer = PersistenceObserver::new(Vec::new());
        experiment.run(&offset, &mut observer, 9).unwrap();

        let text = String::from_utf8(observer.into_inner()).unwrap();
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .filter(|v: &serde_json::Value| v["event"] == "generation_ended")
            .collect();
        assert_eq!(records.len(), 2);

        for record in &records {
            let organisms: Vec<&serde_json::Value> = record["species"]
                .as_array()
                .unwrap()
                .iter()
                .flat_map(|s| s["organisms"].as_array().unwrap())
                .collect();
            assert!(!organisms.is_empty());
            for organism in organisms {
                assert!(organism["rank"].as_u64().unwrap() >= 1);
                assert!(organism["fitness"].as_f64().unwrap() >= 1.0);
            }
        }
    }
}
