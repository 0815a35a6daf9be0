//! Finite-difference verification of backpropagated gradients.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::Result;
use crate::loss::LossCriterion;
use crate::network::{output_of, Network};

/// Largest disagreement between backprop and central differences over every parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheck {
    pub max_abs_error: f64,
    /// `|analytic - numeric| / max(1, |analytic|, |numeric|)`.
    pub max_rel_error: f64,
    pub parameters: usize,
}

impl GradientCheck {
    fn record(&mut self, analytic: f64, numeric: f64) {
        let abs_error = (analytic - numeric).abs();
        let scale = 1f64.max(analytic.abs()).max(numeric.abs());
        self.max_abs_error = self.max_abs_error.max(abs_error);
        self.max_rel_error = self.max_rel_error.max(abs_error / scale);
        self.parameters += 1;
    }
}

enum Parameter {
    Weight(usize, usize),
    Bias(usize),
}

/// Compare the gradient backprop computes for `(input, target)` under loss `L` with the
/// central difference `(L(θ + ε) - L(θ - ε)) / 2ε` of every weight and bias, scaled by
/// [`LossCriterion::grad_scale`].
///
/// `network` is left untouched.
pub fn gradient_check<L: LossCriterion>(
    network: &Network,
    input: ArrayView1<f64>,
    target: ArrayView1<f64>,
    epsilon: f64,
) -> Result<GradientCheck> {
    let analytic = backprop_gradients::<L>(network, input, target)?;

    let loss_at = |perturbed: &Network| -> Result<f64> {
        let output = perturbed.forward(input)?;
        Ok(L::compute(output.view(), target)?.value())
    };

    let mut report = GradientCheck {
        max_abs_error: 0.0,
        max_rel_error: 0.0,
        parameters: 0,
    };
    let scale = L::grad_scale(network.output_size());
    let mut perturbed = network.clone();
    for (index, (weights, biases)) in analytic.iter().enumerate() {
        let parameters = weights
            .indexed_iter()
            .map(|((i, j), &g)| (Parameter::Weight(i, j), g))
            .chain(biases.indexed_iter().map(|(i, &g)| (Parameter::Bias(i), g)));

        for (parameter, analytic) in parameters {
            let layer = &perturbed.layers()[index];
            let original = match parameter {
                Parameter::Weight(i, j) => layer.weights()[[i, j]],
                Parameter::Bias(i) => layer.biases()[i],
            };

            set(&mut perturbed, index, &parameter, original + epsilon);
            let plus = loss_at(&perturbed)?;
            set(&mut perturbed, index, &parameter, original - epsilon);
            let minus = loss_at(&perturbed)?;
            set(&mut perturbed, index, &parameter, original);

            report.record(analytic, scale * (plus - minus) / (2.0 * epsilon));
        }
    }
    Ok(report)
}

fn set(network: &mut Network, index: usize, parameter: &Parameter, value: f64) {
    let layer = &mut network.layers_mut()[index];
    match *parameter {
        Parameter::Weight(i, j) => layer.weights_mut()[[i, j]] = value,
        Parameter::Bias(i) => layer.biases_mut()[i] = value,
    }
}

/// Per-layer `(weight, bias)` gradients from one backward pass without updating.
fn backprop_gradients<L: LossCriterion>(
    network: &Network,
    input: ArrayView1<f64>,
    target: ArrayView1<f64>,
) -> Result<Vec<(Array2<f64>, Array1<f64>)>> {
    let passes = network.forward_trace(input)?;
    let (_, mut error) = L::compute(output_of(&passes), target)?.into_parts();

    let mut scratch = network.clone();
    let mut gradients = Vec::with_capacity(passes.len());
    for (layer, pass) in scratch.layers_mut().iter_mut().zip(&passes).rev() {
        let gradient = layer.backward(pass, error.view(), 0.0)?;
        error = gradient.input_error;
        gradients.push((gradient.weights, gradient.biases));
    }
    gradients.reverse();
    Ok(gradients)
}
