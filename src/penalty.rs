//! Elastic-net penalty
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Elastic-net penalty blending L1 and L2 regularization
///
/// ```ignore
/// penalty * (l1_ratio * ||w||_1 + 0.5 * (1 - l1_ratio) * ||w||^2_2)
/// ```
///
/// The smooth L2 part enters the gradient through [`subgradient`](Self::subgradient), the L1
/// part is handled by the [`proximal_update`](Self::proximal_update) after each gradient step.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElasticNetPenalty<F> {
    penalty: F,
    l1_ratio: F,
}

impl<F: Float> ElasticNetPenalty<F> {
    pub fn new(penalty: F, l1_ratio: F) -> Self {
        ElasticNetPenalty { penalty, l1_ratio }
    }

    pub fn penalty(&self) -> F {
        self.penalty
    }

    pub fn l1_ratio(&self) -> F {
        self.l1_ratio
    }

    /// Value of the penalty term for the weights `w`
    pub fn value<D: Data<Elem = F>>(&self, w: &ArrayBase<D, Ix1>) -> F {
        let l1 = w.iter().map(|v| num_traits::Float::abs(*v)).sum::<F>();
        let l2 = w.dot(w);
        self.penalty * (self.l1_ratio * l1 + F::cast(0.5) * (F::one() - self.l1_ratio) * l2)
    }

    /// Adds the ridge contribution of `weight` to `gradient`
    pub fn subgradient(&self, weight: F, gradient: F) -> F {
        gradient + self.penalty * (F::one() - self.l1_ratio) * weight
    }

    /// Soft-thresholding level applied after a gradient step
    pub fn proximal_threshold(&self) -> F {
        self.penalty * self.l1_ratio
    }

    /// Shrinks every weight towards zero by `threshold`
    ///
    /// Weights whose magnitude does not exceed `threshold` become exactly zero.
    pub fn proximal_update(&self, weights: &mut Array1<F>, threshold: F) {
        weights.mapv_inplace(|w| soft_threshold(w, threshold));
    }
}

fn soft_threshold<F: Float>(w: F, threshold: F) -> F {
    let shrunk = num_traits::Float::abs(w) - threshold;
    if shrunk > F::zero() {
        num_traits::Float::signum(w) * shrunk
    } else {
        F::zero()
    }
}
