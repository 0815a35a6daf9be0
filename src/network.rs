use ndarray::{Array1, Array2, ArrayView1};
use ndarray_rand::rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, trace};

use crate::activation::Activation;
use crate::error::{ensure_len, Error, Result};
use crate::layer::{ForwardPass, Layer};
use crate::loss::{CrossEntropy, LossCriterion};

/// Feed-forward network: an ordered chain of fully connected [`Layer`]s where each layer's
/// output size is the next layer's input size.
///
/// Training mutates the parameters in place. A network has no internal synchronization, so
/// concurrent training needs external locking.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Build `sizes.len() - 1` layers, layer `i` mapping `sizes[i]` inputs to `sizes[i + 1]`
    /// outputs through `activations[i]`.
    pub fn new<R: Rng + ?Sized>(
        sizes: &[usize],
        activations: &[Activation],
        rng: &mut R,
    ) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::TooFewLayers { sizes: sizes.len() });
        }
        if activations.len() != sizes.len() - 1 {
            return Err(Error::ActivationCount {
                expected: sizes.len() - 1,
                actual: activations.len(),
            });
        }
        if let Some(index) = sizes.iter().position(|&size| size == 0) {
            return Err(Error::ZeroWidth { index });
        }
        for activation in activations {
            activation.validate()?;
        }

        let layers = sizes
            .windows(2)
            .zip(activations)
            .map(|(pair, &activation)| Layer::new(pair[0], pair[1], activation, rng))
            .collect::<Vec<_>>();
        debug!(?sizes, ?activations, "built network");
        Ok(Self { layers })
    }

    /// [`Network::new`] with a [`StdRng`] seeded from `seed`.
    pub fn seeded(sizes: &[usize], activations: &[Activation], seed: u64) -> Result<Self> {
        Self::new(sizes, activations, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::TooFewLayers { sizes: 1 });
        }
        for pair in layers.windows(2) {
            ensure_len(pair[0].output_size(), pair[1].input_size())?;
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    pub fn forward(&self, input: ArrayView1<f64>) -> Result<Array1<f64>> {
        let mut signal = input.to_owned();
        for layer in &self.layers {
            signal = layer.forward(signal.view())?.into_output();
        }
        Ok(signal)
    }

    /// Inference only, same as [`Network::forward`].
    pub fn predict(&self, input: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.forward(input)
    }

    /// Forward pass keeping every layer's cache for a following backward pass.
    pub(crate) fn forward_trace(&self, input: ArrayView1<f64>) -> Result<Vec<ForwardPass>> {
        let mut passes: Vec<ForwardPass> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let pass = match passes.last() {
                Some(previous) => layer.forward(previous.output())?,
                None => layer.forward(input)?,
            };
            passes.push(pass);
        }
        Ok(passes)
    }

    /// One step of SGD on a single example with cross entropy loss. Returns the loss before
    /// the update.
    pub fn train(
        &mut self,
        input: ArrayView1<f64>,
        target: ArrayView1<f64>,
        learning_rate: f64,
    ) -> Result<f64> {
        self.train_with::<CrossEntropy>(input, target, learning_rate)
    }

    pub fn train_with<L: LossCriterion>(
        &mut self,
        input: ArrayView1<f64>,
        target: ArrayView1<f64>,
        learning_rate: f64,
    ) -> Result<f64> {
        let passes = self.forward_trace(input)?;
        let (loss, mut error) = L::compute(output_of(&passes), target)?.into_parts();

        for (layer, pass) in self.layers.iter_mut().zip(&passes).rev() {
            error = layer.backward(pass, error.view(), learning_rate)?.input_error;
        }
        Ok(loss)
    }

    /// One step of mini-batch SGD with cross entropy loss: per-sample gradients are summed and
    /// a single averaged update is applied. Returns the mean loss over the batch.
    ///
    /// A batch of one sample updates the parameters exactly like [`Network::train`].
    pub fn train_batch(
        &mut self,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
        learning_rate: f64,
    ) -> Result<f64> {
        self.train_batch_with::<CrossEntropy>(inputs, targets, learning_rate)
    }

    pub fn train_batch_with<L: LossCriterion>(
        &mut self,
        inputs: &[Array1<f64>],
        targets: &[Array1<f64>],
        learning_rate: f64,
    ) -> Result<f64> {
        ensure_len(inputs.len(), targets.len())?;
        if inputs.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut weight_grads = self
            .layers
            .iter()
            .map(|layer| Array2::<f64>::zeros(layer.weights().raw_dim()))
            .collect::<Vec<_>>();
        let mut bias_grads = self
            .layers
            .iter()
            .map(|layer| Array1::<f64>::zeros(layer.output_size()))
            .collect::<Vec<_>>();

        let mut total_loss = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            let passes = self.forward_trace(input.view())?;
            let (loss, mut error) = L::compute(output_of(&passes), target.view())?.into_parts();
            total_loss += loss;

            let layers = self
                .layers
                .iter_mut()
                .zip(&passes)
                .zip(weight_grads.iter_mut().zip(bias_grads.iter_mut()));
            for ((layer, pass), (weight_grad, bias_grad)) in layers.rev() {
                let gradient = layer.backward(pass, error.view(), 0.0)?;
                *weight_grad += &gradient.weights;
                *bias_grad += &gradient.biases;
                error = gradient.input_error;
            }
        }

        let batch_size = inputs.len() as f64;
        if learning_rate > 0.0 {
            for ((layer, weight_grad), bias_grad) in
                self.layers.iter_mut().zip(weight_grads).zip(bias_grads)
            {
                layer.apply_gradient(
                    &(weight_grad / batch_size),
                    &(bias_grad / batch_size),
                    learning_rate,
                );
            }
        }

        let mean_loss = total_loss / batch_size;
        trace!(batch_size = inputs.len(), mean_loss, "trained batch");
        Ok(mean_loss)
    }
}

pub(crate) fn output_of(passes: &[ForwardPass]) -> ArrayView1<'_, f64> {
    // A network always has at least one layer.
    passes[passes.len() - 1].output()
}
