use ndarray::{Array1, ArrayView1, Zip};

use crate::{
    error::{ensure_len, Result},
    vector,
};

/// Predicted probabilities are clamped into `[EPSILON, 1 - EPSILON]` before the logarithm.
pub const EPSILON: f64 = 1e-15;

/// A loss over one prediction/target pair, holding its value and its gradient with respect
/// to the prediction.
pub trait LossCriterion: Sized {
    fn compute(predicted: ArrayView1<f64>, target: ArrayView1<f64>) -> Result<Self>;

    fn value(&self) -> f64;

    fn grad(&self) -> &Array1<f64>;

    fn into_parts(self) -> (f64, Array1<f64>);

    /// Factor `s` such that `grad` is the gradient of `s * value` for `outputs` elements.
    fn grad_scale(_outputs: usize) -> f64 {
        1.0
    }
}

/// Mean squared error over the elements of one sample.
///
/// The gradient is `2 * (predicted - target)`, the gradient of the summed squared error
/// rather than of its mean, so it is `outputs` times the gradient of [`value`](Self::value).
#[derive(Debug, Clone)]
pub struct MeanSquaredError {
    value: f64,
    grad: Array1<f64>,
}

impl LossCriterion for MeanSquaredError {
    fn compute(predicted: ArrayView1<f64>, target: ArrayView1<f64>) -> Result<Self> {
        let diff = vector::subtract(predicted, target)?;
        let value = vector::mean(diff.mapv(|d| d * d).view())?;
        let grad = diff.mapv(|d| 2.0 * d);
        Ok(Self { value, grad })
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn grad(&self) -> &Array1<f64> {
        &self.grad
    }

    fn into_parts(self) -> (f64, Array1<f64>) {
        (self.value, self.grad)
    }

    fn grad_scale(outputs: usize) -> f64 {
        outputs as f64
    }
}

/// Cross entropy against a softmax output.
///
/// The gradient is `predicted - target`, the gradient with respect to the softmax
/// *input*. It is only correct when `predicted` comes from a softmax layer, which passes it
/// through unchanged. Pairing this loss with any other output activation silently yields a
/// wrong gradient.
#[derive(Debug, Clone)]
pub struct CrossEntropy {
    value: f64,
    grad: Array1<f64>,
}

impl LossCriterion for CrossEntropy {
    fn compute(predicted: ArrayView1<f64>, target: ArrayView1<f64>) -> Result<Self> {
        ensure_len(predicted.len(), target.len())?;

        let value = -Zip::from(&predicted)
            .and(&target)
            .fold(0.0, |loss, &p, &t| {
                loss + t * p.clamp(EPSILON, 1.0 - EPSILON).ln()
            });
        let grad = vector::subtract(predicted, target)?;
        Ok(Self { value, grad })
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn grad(&self) -> &Array1<f64> {
        &self.grad
    }

    fn into_parts(self) -> (f64, Array1<f64>) {
        (self.value, self.grad)
    }
}

/// `(loss, gradient)` of [`CrossEntropy`].
pub fn cross_entropy_loss(
    predicted: ArrayView1<f64>,
    target: ArrayView1<f64>,
) -> Result<(f64, Array1<f64>)> {
    CrossEntropy::compute(predicted, target).map(CrossEntropy::into_parts)
}

/// `(loss, gradient)` of [`MeanSquaredError`].
pub fn mse_loss(predicted: ArrayView1<f64>, target: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
    MeanSquaredError::compute(predicted, target).map(MeanSquaredError::into_parts)
}
