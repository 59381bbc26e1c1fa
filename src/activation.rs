//! Activation functions for phenotype networks.
//!
//! The engine never picks an activation on its own; the caller chooses one when
//! building a phenotype with [`Genome::genesis_with`](crate::Genome::genesis_with).

use serde::{Deserialize, Serialize};

/// Activation function applied to hidden and output neurons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// `x`; the phenotype stays linear.
    #[default]
    Identity,
    /// Logistic curve into `(0, 1)`.
    Sigmoid,
    Tanh,
    /// `max(0, x)`
    ReLU,
    /// 1 for positive input, otherwise 0.
    Step,
}

impl Activation {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Identity,
        Self::Sigmoid,
        Self::Tanh,
        Self::ReLU,
        Self::Step,
    ];

    /// Evaluate at `x`.
    ///
    /// NaN propagates. Infinite inputs saturate where the function has a limit.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::Identity => x,
            Self::Sigmoid => {
                if x == f32::INFINITY {
                    return 1.0;
                }
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                // sigmoid(-88) underflows to 0 in f32
                let clamped = x.clamp(-88.0, 88.0);
                1.0 / (1.0 + (-clamped).exp())
            }
            Self::Tanh => x.tanh(),
            Self::ReLU => x.max(0.0),
            Self::Step => f32::from(u8::from(x > 0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert!((Activation::Identity.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Activation::Identity.apply(-2.0) - -2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid() {
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-6);
        assert!(Activation::Sigmoid.apply(10.0) > 0.99);
        assert!(Activation::Sigmoid.apply(-10.0) < 0.01);
        assert!((Activation::Sigmoid.apply(f32::INFINITY) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tanh() {
        assert!(Activation::Tanh.apply(0.0).abs() < 1e-6);
        assert!(Activation::Tanh.apply(10.0) > 0.99);
        assert!((Activation::Tanh.apply(f32::NEG_INFINITY) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_relu_and_step() {
        assert!((Activation::ReLU.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Activation::ReLU.apply(-0.5).abs() < 1e-6);
        assert!((Activation::Step.apply(0.1) - 1.0).abs() < 1e-6);
        assert!(Activation::Step.apply(-0.1).abs() < 1e-6);
    }

    #[test]
    fn test_nan_propagates() {
        for activation in Activation::ALL {
            assert!(activation.apply(f32::NAN).is_nan(), "{activation:?}");
        }
    }
}
