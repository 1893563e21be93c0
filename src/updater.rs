//! Learning rate schedules and gradient updates
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Provides the step size used in a given iteration
pub trait LearningRate<F> {
    fn learning_rate(&self, iteration: usize) -> F;
}

/// Learning rate which stays the same for every iteration
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantLearningRate<F>(F);

impl<F: Float> ConstantLearningRate<F> {
    pub fn new(rate: F) -> Self {
        ConstantLearningRate(rate)
    }
}

impl<F: Float> LearningRate<F> for ConstantLearningRate<F> {
    fn learning_rate(&self, _iteration: usize) -> F {
        self.0
    }
}

/// Applies a step to a parameter vector given its gradient
pub trait GradientUpdater<F> {
    fn update<D: Data<Elem = F>>(
        &self,
        variable: &mut Array1<F>,
        gradient: &ArrayBase<D, Ix1>,
        rate: F,
    );

    /// Update of a single scalar parameter, such as the bias
    fn update_scalar(&self, variable: F, gradient: F, rate: F) -> F;
}

/// Plain gradient descent, `w <- w - rate * gradient`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradientDescent;

impl<F: Float> GradientUpdater<F> for GradientDescent {
    fn update<D: Data<Elem = F>>(
        &self,
        variable: &mut Array1<F>,
        gradient: &ArrayBase<D, Ix1>,
        rate: F,
    ) {
        assert_eq!(
            variable.len(),
            gradient.len(),
            "The gradient must have the same length as the updated variable."
        );
        variable.scaled_add(-rate, gradient);
    }

    fn update_scalar(&self, variable: F, gradient: F, rate: F) -> F {
        variable - rate * gradient
    }
}
