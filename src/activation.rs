use std::{fmt, str::FromStr};

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};

/// Nonlinearity applied by a [`Layer`](crate::layer::Layer) after its affine transform.
///
/// Every variant except [`Activation::Softmax`] works elementwise. Softmax is vector-wide:
/// its scalar [`activate`](Activation::activate) and [`derivative`](Activation::derivative)
/// are identity placeholders and a layer routes its output through [`softmax`] instead.
///
/// Derivatives are written in terms of the activation's own output, because the layer keeps
/// the output around for the backward pass. Swish is the one exception (its output does not
/// determine its input), see [`Activation::derives_from_output`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Sigmoid,
    Relu,
    /// Leaky ReLU with slope `alpha` for non-positive inputs. `alpha` must be finite and
    /// non-negative, see [`Activation::validate`].
    LeakyRelu(f64),
    Tanh,
    Linear,
    /// Exponential linear unit saturating at `-alpha`, with the same bounds on `alpha` as
    /// [`Activation::LeakyRelu`].
    Elu(f64),
    Swish,
    Softmax,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Activation {
    pub fn leaky_relu(alpha: f64) -> Result<Self> {
        let activation = Self::LeakyRelu(alpha);
        activation.validate()?;
        Ok(activation)
    }

    pub fn elu(alpha: f64) -> Result<Self> {
        let activation = Self::Elu(alpha);
        activation.validate()?;
        Ok(activation)
    }

    /// Reject parameters under which the output no longer determines the derivative.
    ///
    /// A negative `alpha` maps negative inputs to positive outputs, where the output-based
    /// [`derivative`](Self::derivative) would report a slope of 1.
    pub fn validate(&self) -> Result<()> {
        let alpha = match *self {
            Self::LeakyRelu(alpha) | Self::Elu(alpha) => alpha,
            _ => return Ok(()),
        };
        if alpha.is_finite() && alpha >= 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidActivationParameter(self.to_string()))
        }
    }

    /// Apply to one pre-activation value.
    pub fn activate(&self, x: f64) -> f64 {
        match *self {
            Self::Sigmoid => sigmoid(x),
            Self::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Self::LeakyRelu(alpha) => {
                if x > 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            Self::Tanh => x.tanh(),
            Self::Linear => x,
            Self::Elu(alpha) => {
                if x > 0.0 {
                    x
                } else {
                    alpha * x.exp_m1()
                }
            }
            Self::Swish => x * sigmoid(x),
            Self::Softmax => x,
        }
    }

    /// Derivative of [`activate`](Self::activate).
    ///
    /// `v` is the activation's output when [`derives_from_output`](Self::derives_from_output)
    /// is true and the pre-activation input otherwise.
    pub fn derivative(&self, v: f64) -> f64 {
        match *self {
            Self::Sigmoid => v * (1.0 - v),
            Self::Relu => {
                if v > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::LeakyRelu(alpha) => {
                if v > 0.0 {
                    1.0
                } else {
                    alpha
                }
            }
            Self::Tanh => 1.0 - v * v,
            Self::Linear => 1.0,
            Self::Elu(alpha) => {
                if v > 0.0 {
                    1.0
                } else {
                    v + alpha
                }
            }
            Self::Swish => {
                let s = sigmoid(v);
                s + v * s * (1.0 - s)
            }
            // Folded into the cross-entropy gradient.
            Self::Softmax => 1.0,
        }
    }

    /// Whether [`derivative`](Self::derivative) expects the output rather than the
    /// pre-activation value.
    pub fn derives_from_output(&self) -> bool {
        !matches!(self, Self::Swish)
    }

    /// Whether the activation works on the whole output vector at once.
    pub fn is_vector_wide(&self) -> bool {
        matches!(self, Self::Softmax)
    }

    /// Apply to a full pre-activation vector.
    pub fn apply(&self, z: ArrayView1<f64>) -> Array1<f64> {
        if self.is_vector_wide() {
            softmax(z)
        } else {
            z.mapv(|v| self.activate(v))
        }
    }

    /// Name used in persisted models.
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

/// Numerically stable softmax: the maximum is subtracted before exponentiating.
pub fn softmax(x: ArrayView1<f64>) -> Array1<f64> {
    let max_element = x.iter().fold(f64::NEG_INFINITY, |v, &w| v.max(w));
    let exp_each = x.mapv(|v| (v - max_element).exp());
    let exp_sum = exp_each.sum();
    exp_each / exp_sum
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sigmoid => write!(f, "sigmoid"),
            Self::Relu => write!(f, "relu"),
            Self::LeakyRelu(alpha) => write!(f, "leaky_relu({})", alpha),
            Self::Tanh => write!(f, "tanh"),
            Self::Linear => write!(f, "linear"),
            Self::Elu(alpha) => write!(f, "elu({})", alpha),
            Self::Swish => write!(f, "swish"),
            Self::Softmax => write!(f, "softmax"),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    /// Parse a tag written by [`Activation::tag`]. Case is ignored; anything unrecognized
    /// is an error rather than a fallback.
    fn from_str(tag: &str) -> Result<Self> {
        let normalized = tag.trim().to_lowercase();
        let (name, parameter) = match normalized.split_once('(') {
            Some((name, rest)) => {
                let value = rest
                    .strip_suffix(')')
                    .ok_or_else(|| Error::InvalidActivationParameter(tag.to_string()))?;
                (name.trim(), Some(value.trim()))
            }
            None => (normalized.as_str(), None),
        };

        let alpha = |parameter: Option<&str>| -> Result<f64> {
            parameter
                .and_then(|p| p.parse::<f64>().ok())
                .filter(|a| a.is_finite())
                .ok_or_else(|| Error::InvalidActivationParameter(tag.to_string()))
        };

        let activation = match (name, parameter) {
            ("sigmoid", None) => Self::Sigmoid,
            ("relu", None) => Self::Relu,
            ("softmax", None) => Self::Softmax,
            ("tanh", None) => Self::Tanh,
            ("linear", None) => Self::Linear,
            ("swish", None) => Self::Swish,
            ("leaky_relu", parameter) => Self::LeakyRelu(alpha(parameter)?),
            ("elu", parameter) => Self::Elu(alpha(parameter)?),
            _ => return Err(Error::UnknownActivation(tag.to_string())),
        };
        activation
            .validate()
            .map_err(|_| Error::InvalidActivationParameter(tag.to_string()))?;
        Ok(activation)
    }
}
