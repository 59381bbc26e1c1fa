//! Error types for the evolutionary engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NeatError>;

/// The structural mutation that was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralMutation {
    /// A new link between two existing neurons.
    AddLink,
    /// A new hidden neuron splitting an existing link.
    AddNeuron,
}

impl std::fmt::Display for StructuralMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddLink => f.write_str("add-link"),
            Self::AddNeuron => f.write_str("add-neuron"),
        }
    }
}

/// Errors raised by the engine.
#[derive(Error, Debug)]
pub enum NeatError {
    /// A structural mutation found nothing legal to do. The genome is unchanged.
    #[error("{mutation} mutation rejected: {reason}")]
    StructuralMutationRejected {
        mutation: StructuralMutation,
        reason: &'static str,
    },

    /// The configuration cannot sustain a population.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Every species was pruned during one generational transition.
    #[error("population went extinct during epoch at generation {generation}")]
    PopulationExtinct { generation: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NeatError {
    pub(crate) fn rejected(mutation: StructuralMutation, reason: &'static str) -> Self {
        Self::StructuralMutationRejected { mutation, reason }
    }

    /// Whether this error is a local, non-fatal mutation rejection.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::StructuralMutationRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        let err = NeatError::rejected(StructuralMutation::AddLink, "link already exists");
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "add-link mutation rejected: link already exists"
        );
    }

    #[test]
    fn test_extinction_is_not_rejection() {
        let err = NeatError::PopulationExtinct { generation: 3 };
        assert!(!err.is_rejection());
        assert!(err.to_string().contains("generation 3"));
    }
}
