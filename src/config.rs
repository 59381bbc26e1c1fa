//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{NeatError, Result};
use crate::gene::MAX_HIDDEN;

/// Every tunable used by the engine and the experiment driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeatConfig {
    /// Number of organisms kept alive each generation.
    pub pop_size: usize,
    /// Fraction of each species that survives culling (one more is always kept).
    pub survival_rate: f32,
    /// Generations without improvement after which a species is dropped.
    pub stagnation_threshold: usize,
    /// Probability that an offspring is produced asexually.
    pub mutate_only_prob: f32,
    /// Probability that a sexual offspring skips post-mate mutation.
    pub mate_only_prob: f32,
    /// Probability of an add-neuron mutation.
    pub mutate_neuron_prob: f32,
    /// Probability of an add-link mutation (checked after add-neuron).
    pub mutate_gene_prob: f32,
    /// Magnitude of weight perturbations and replacements.
    pub mutate_power: f32,
    /// Per-gene probability that a weight mutation replaces instead of perturbing.
    pub weight_replace_prob: f32,
    /// Weights are clamped to `[-weight_limit, weight_limit]` after mutation.
    pub weight_limit: f32,
    /// Coefficient on the mean weight difference of matching genes.
    pub coef_matching: f32,
    /// Coefficient on the count of non-matching genes.
    pub coef_disjoint: f32,
    /// Genomes closer than this are compatible.
    pub compat_threshold: f32,
    pub num_inputs: usize,
    pub num_outputs: usize,
    /// Generations per run.
    pub generations: usize,
    /// Independent runs per experiment.
    pub runs: usize,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            pop_size: 150,
            survival_rate: 0.2,
            stagnation_threshold: 15,
            mutate_only_prob: 0.25,
            mate_only_prob: 0.2,
            mutate_neuron_prob: 0.03,
            mutate_gene_prob: 0.05,
            mutate_power: 2.5,
            weight_replace_prob: 0.1,
            weight_limit: 10.0,
            coef_matching: 0.4,
            coef_disjoint: 2.0,
            compat_threshold: 1.0,
            num_inputs: 3,
            num_outputs: 1,
            generations: 100,
            runs: 1,
        }
    }
}

impl NeatConfig {
    /// Default config for a network of the given shape.
    #[must_use]
    pub fn with_shape(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Default::default()
        }
    }

    /// Parse a JSON document and validate it. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Json`] on malformed input and
    /// [`NeatError::Configuration`] if the values fail [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can sustain a population.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.pop_size == 0 {
            return Err(invalid("pop_size must be positive"));
        }
        if self.num_inputs == 0 || self.num_outputs == 0 {
            return Err(invalid("num_inputs and num_outputs must be positive"));
        }
        if self.num_inputs >= MAX_HIDDEN {
            return Err(invalid("num_inputs leaves no room for hidden neurons"));
        }
        if self.stagnation_threshold == 0 {
            return Err(invalid("stagnation_threshold must be positive"));
        }
        if self.runs == 0 {
            return Err(invalid("runs must be positive"));
        }

        let probabilities = [
            ("survival_rate", self.survival_rate),
            ("mutate_only_prob", self.mutate_only_prob),
            ("mate_only_prob", self.mate_only_prob),
            ("mutate_neuron_prob", self.mutate_neuron_prob),
            ("mutate_gene_prob", self.mutate_gene_prob),
            ("weight_replace_prob", self.weight_replace_prob),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(NeatError::Configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        let positives = [
            ("compat_threshold", self.compat_threshold),
            ("mutate_power", self.mutate_power),
            ("weight_limit", self.weight_limit),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(NeatError::Configuration(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if !self.coef_matching.is_finite() || !self.coef_disjoint.is_finite() {
            return Err(invalid("compatibility coefficients must be finite"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> NeatError {
    NeatError::Configuration(reason.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = NeatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pop_size, 150);
        assert!((config.coef_disjoint - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_population_rejected() {
        let config = NeatConfig {
            pop_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NeatError::Configuration(_))
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let config = NeatConfig {
            mutate_gene_prob: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mutate_gene_prob"));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = NeatConfig::from_json(r#"{ "pop_size": 50, "num_inputs": 2 }"#).unwrap();
        assert_eq!(config.pop_size, 50);
        assert_eq!(config.num_inputs, 2);
        assert_eq!(config.num_outputs, 1);
        assert_eq!(config.stagnation_threshold, 15);
    }

    #[test]
    fn test_from_json_validates() {
        let result = NeatConfig::from_json(r#"{ "compat_threshold": -1.0 }"#);
        assert!(matches!(result, Err(NeatError::Configuration(_))));

        let result = NeatConfig::from_json("not json");
        assert!(matches!(result, Err(NeatError::Json(_))));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = NeatConfig::with_shape(4, 2);
        let json = serde_json::to_string(&config).unwrap();
        let restored: NeatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
