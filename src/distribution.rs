//! Distribution families of the target variable
use std::fmt;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use linfa::Float;
use ndarray::{ArrayBase, Data, Ix1};

/// Distribution family of the target variable
///
/// The family selects the non-linearity which maps the linear score to the mean of the
/// target and the log-likelihood whose gradient drives the optimization.
///
/// | Family   | Targets            | Implemented |
/// | -------- | ------------------ | ----------- |
/// | Poisson  | counts, `y >= 0`   | yes         |
/// | Gaussian | real values        | no          |
/// | Binomial | `y` in `[0, 1]`    | no          |
/// | Gamma    | `y > 0`            | no          |
/// | Softplus | `y >= 0`           | no          |
/// | Probit   | `y` in `[0, 1]`    | no          |
///
/// Evaluating a family that is not implemented returns
/// [`NotImplemented`](crate::GlmError::NotImplemented).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Distribution {
    Gaussian,
    Binomial,
    Gamma,
    Softplus,
    Probit,
    Poisson,
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Poisson
    }
}

impl Distribution {
    /// Returns `true` if the solver can evaluate this family
    pub fn is_implemented(&self) -> bool {
        matches!(self, Distribution::Poisson)
    }

    /// Returns `true` if every target lies in the support of the family
    ///
    /// Families without an implementation accept every finite target, the error is raised once
    /// the cost function is evaluated.
    pub fn in_range<F: Float, D: Data<Elem = F>>(&self, y: &ArrayBase<D, Ix1>) -> bool {
        match self {
            Distribution::Poisson => y.iter().all(|&v| v >= F::zero()),
            _ => true,
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distribution::Gaussian => "gaussian",
            Distribution::Binomial => "binomial",
            Distribution::Gamma => "gamma",
            Distribution::Softplus => "softplus",
            Distribution::Probit => "probit",
            Distribution::Poisson => "poisson",
        };
        f.write_str(name)
    }
}
