use ndarray::{Array, Array1, Array2, ArrayView1};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::activation::Activation;
use crate::error::{ensure_len, Result};

/// Fully connected layer: `output = activation(weights · input + biases)`.
///
/// `weights` has shape `(output_size, input_size)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

/// Values cached by [`Layer::forward`] and consumed by [`Layer::backward`].
#[derive(Debug, Clone)]
pub struct ForwardPass {
    input: Array1<f64>,
    pre_activation: Array1<f64>,
    output: Array1<f64>,
}

impl ForwardPass {
    pub fn input(&self) -> ArrayView1<'_, f64> {
        self.input.view()
    }

    pub fn pre_activation(&self) -> ArrayView1<'_, f64> {
        self.pre_activation.view()
    }

    pub fn output(&self) -> ArrayView1<'_, f64> {
        self.output.view()
    }

    pub fn into_output(self) -> Array1<f64> {
        self.output
    }
}

/// Gradients produced by one backward step through a [`Layer`].
#[derive(Debug, Clone)]
pub struct LayerGradient {
    /// `delta ⊗ input`, same shape as the weights.
    pub weights: Array2<f64>,
    /// The layer's delta, which is also the bias gradient.
    pub biases: Array1<f64>,
    /// Gradient with respect to the layer input, computed with the pre-update weights.
    pub input_error: Array1<f64>,
}

impl Layer {
    /// Weights are drawn uniformly from `[-0.1, 0.1)`, biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let weights =
            Array::random_using((output_size, input_size), Uniform::new(-0.1, 0.1), rng);
        let biases = Array1::zeros(output_size);
        Self {
            weights,
            biases,
            activation,
        }
    }

    pub fn with_parameters(
        weights: Array2<f64>,
        biases: Array1<f64>,
        activation: Activation,
    ) -> Result<Self> {
        activation.validate()?;
        ensure_len(weights.nrows(), biases.len())?;
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn biases(&self) -> &Array1<f64> {
        &self.biases
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Array2<f64> {
        &mut self.weights
    }

    pub(crate) fn biases_mut(&mut self) -> &mut Array1<f64> {
        &mut self.biases
    }

    pub fn forward(&self, input: ArrayView1<f64>) -> Result<ForwardPass> {
        ensure_len(self.input_size(), input.len())?;

        let pre_activation = self.weights.dot(&input) + &self.biases;
        let output = self.activation.apply(pre_activation.view());
        Ok(ForwardPass {
            input: input.to_owned(),
            pre_activation,
            output,
        })
    }

    /// Backpropagate `error_grad`, the loss gradient with respect to this layer's output.
    ///
    /// Parameters are updated in place only when `learning_rate > 0`; with a learning rate of
    /// zero the call just reports gradients.
    pub fn backward(
        &mut self,
        pass: &ForwardPass,
        error_grad: ArrayView1<f64>,
        learning_rate: f64,
    ) -> Result<LayerGradient> {
        ensure_len(self.output_size(), error_grad.len())?;
        ensure_len(self.output_size(), pass.output.len())?;
        ensure_len(self.input_size(), pass.input.len())?;

        let delta = if self.activation.is_vector_wide() {
            // Softmax paired with cross entropy: the loss gradient is already taken with
            // respect to the softmax input.
            error_grad.to_owned()
        } else {
            let at = if self.activation.derives_from_output() {
                &pass.output
            } else {
                &pass.pre_activation
            };
            let mut delta = error_grad.to_owned();
            delta.zip_mut_with(at, |d, &v| *d *= self.activation.derivative(v));
            delta
        };

        let input_error = self.weights.t().dot(&delta);
        let weights = Array2::from_shape_fn(self.weights.raw_dim(), |(i, j)| {
            delta[i] * pass.input[j]
        });
        let gradient = LayerGradient {
            weights,
            biases: delta,
            input_error,
        };

        if learning_rate > 0.0 {
            self.apply_gradient(&gradient.weights, &gradient.biases, learning_rate);
        }
        Ok(gradient)
    }

    /// `parameters -= learning_rate * gradient`.
    pub(crate) fn apply_gradient(
        &mut self,
        weights: &Array2<f64>,
        biases: &Array1<f64>,
        learning_rate: f64,
    ) {
        self.weights.scaled_add(-learning_rate, weights);
        self.biases.scaled_add(-learning_rate, biases);
    }
}

#[cfg(test)]
mod tests {
    use crate::{assert_rel_eq_arr1, assert_rel_eq_arr2};

    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use ndarray_rand::rand::{rngs::StdRng, SeedableRng};

    fn sigmoid_layer() -> Layer {
        let weights = arr2(&[[1.0, -1.0, 0.5], [2.0, -1.0, 2.0]]);
        let biases = arr1(&[-2.0, -0.5]);
        Layer::with_parameters(weights, biases, Activation::Sigmoid).unwrap()
    }

    #[test]
    fn layer_forward_backward() {
        let mut layer = sigmoid_layer();
        let pass = layer.forward(arr1(&[1.0, 0.5, -0.5]).view()).unwrap();
        assert_rel_eq_arr1!(pass.output().to_owned(), arr1(&[0.1480471980316895, 0.5]));
        assert_rel_eq_arr1!(pass.pre_activation().to_owned(), arr1(&[-1.75, 0.0]));

        let train = arr1(&[1.0, 0.0]);
        let error = &train - &pass.output();
        let gradient = layer.backward(&pass, error.view(), 0.0).unwrap();

        assert_rel_eq_arr1!(
            gradient.input_error,
            arr1(&[
                -0.1425438531921371,
                0.0175438531921371,
                -0.1962719265960686
            ])
        );
        assert_rel_eq_arr2!(
            gradient.weights,
            arr2(&[
                [0.1074561468078629, 0.0537280734039314, -0.0537280734039314],
                [-0.125, -0.0625, 0.0625],
            ])
        );
        assert_rel_eq_arr1!(gradient.biases, arr1(&[0.1074561468078629, -0.125]));
    }

    #[test]
    fn zero_learning_rate_keeps_parameters() {
        let mut layer = sigmoid_layer();
        let before = layer.clone();
        let pass = layer.forward(arr1(&[1.0, 0.5, -0.5]).view()).unwrap();
        layer.backward(&pass, arr1(&[0.3, -0.2]).view(), 0.0).unwrap();
        assert_eq!(before, layer);
    }

    #[test]
    fn update_uses_delta_and_input() {
        let weights = arr2(&[[0.5, -0.5]]);
        let biases = arr1(&[0.1]);
        let mut layer = Layer::with_parameters(weights, biases, Activation::Linear).unwrap();
        let pass = layer.forward(arr1(&[2.0, 1.0]).view()).unwrap();
        assert_rel_eq_arr1!(pass.output().to_owned(), arr1(&[0.6]));

        let gradient = layer.backward(&pass, arr1(&[1.0]).view(), 0.5).unwrap();
        // Computed with the weights before the update.
        assert_rel_eq_arr1!(gradient.input_error, arr1(&[0.5, -0.5]));
        assert_rel_eq_arr2!(layer.weights().clone(), arr2(&[[-0.5, -1.0]]));
        assert_rel_eq_arr1!(layer.biases().clone(), arr1(&[-0.4]));
    }

    #[test]
    fn softmax_passes_error_through() {
        let weights = arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let mut layer =
            Layer::with_parameters(weights, Array1::zeros(3), Activation::Softmax).unwrap();
        let pass = layer.forward(arr1(&[0.5, -0.5]).view()).unwrap();
        assert_relative_eq!(pass.output().sum(), 1.0, epsilon = 1e-12);

        let error = arr1(&[0.2, -0.3, 0.1]);
        let gradient = layer.backward(&pass, error.view(), 0.0).unwrap();
        assert_rel_eq_arr1!(gradient.biases, error);
    }

    #[test]
    fn random_weights_are_small_and_biases_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::new(5, 3, Activation::Relu, &mut rng);
        assert_eq!(layer.weights().dim(), (3, 5));
        assert!(layer.weights().iter().all(|w| (-0.1..0.1).contains(w)));
        assert!(layer.biases().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = Layer::new(4, 4, Activation::Tanh, &mut StdRng::seed_from_u64(3));
        let b = Layer::new(4, 4, Activation::Tanh, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_input_length_fails() {
        let layer = sigmoid_layer();
        assert!(matches!(
            layer.forward(arr1(&[1.0, 2.0]).view()),
            Err(Error::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn wrong_error_length_fails() {
        let mut layer = sigmoid_layer();
        let pass = layer.forward(arr1(&[1.0, 0.5, -0.5]).view()).unwrap();
        assert!(layer.backward(&pass, arr1(&[1.0]).view(), 0.1).is_err());
    }

    #[test]
    fn invalid_activation_parameter_is_rejected() {
        let result = Layer::with_parameters(
            Array2::zeros((2, 3)),
            Array1::zeros(2),
            Activation::LeakyRelu(-0.5),
        );
        assert!(matches!(result, Err(Error::InvalidActivationParameter(_))));
    }

    #[test]
    fn bias_length_must_match_rows() {
        let result =
            Layer::with_parameters(Array2::zeros((2, 3)), Array1::zeros(3), Activation::Relu);
        assert!(result.is_err());
    }
}
