//! Errors raised while configuring, fitting or applying a GLM
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::Distribution;

/// Simplified `Result` using [`GlmError`] as error type
pub type Result<T> = std::result::Result<T, GlmError>;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Error, Debug, Clone)]
pub enum GlmError {
    #[error("penalty should be positive and finite, but is {0}")]
    InvalidPenalty(f32),
    #[error("l1 ratio should be in range [0, 1], but is {0}")]
    InvalidL1Ratio(f32),
    #[error("learning rate should be positive and finite, but is {0}")]
    InvalidLearningRate(f32),
    #[error("tolerance should be positive and finite, but is {0}")]
    InvalidTolerance(f32),
    #[error("linearization threshold eta should be finite, but is {0}")]
    InvalidEta(f32),
    /// The dataset does not contain a single sample
    #[error("at least one sample needed")]
    NotEnoughSamples,
    #[error("expected `x` and `y` to have same number of rows, got {0} != {1}")]
    MismatchedShapes(usize, usize),
    #[error("values must be finite and not `Inf`, `-Inf` or `NaN`")]
    InvalidValues,
    /// Targets outside of the support of the distribution family
    #[error("targets are outside of the support of the {0} distribution")]
    InvalidTargetRange(Distribution),
    #[error("initial weights have length {1}, but the data has {0} features")]
    InvalidInitialWeightsSize(usize, usize),
    #[error("model was fitted with {expected} features, but the data has {got}")]
    FeatureMismatch { expected: usize, got: usize },
    /// Only the Poisson family is computed, every other family ends here
    #[error("distribution type {0} not implemented")]
    NotImplemented(Distribution),
    #[error("parameters became non-finite in iteration {iteration}")]
    Diverged { iteration: usize },
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}
