//! Persisted model format.
//!
//! A model is stored as JSON, one record per layer:
//!
//! ```json
//! {"layers": [{"weights": [[0.1, -0.2]], "biases": [0.0], "activation": "relu"}]}
//! ```
//!
//! `weights` has one row per output unit. Loading rejects unknown activation tags instead of
//! falling back to a default.

use std::{fs, path::Path};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub activation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub layers: Vec<LayerRecord>,
}

impl From<&Layer> for LayerRecord {
    fn from(layer: &Layer) -> Self {
        Self {
            weights: layer.weights().rows().into_iter().map(|row| row.to_vec()).collect(),
            biases: layer.biases().to_vec(),
            activation: layer.activation().tag(),
        }
    }
}

impl From<&Network> for ModelRecord {
    fn from(network: &Network) -> Self {
        Self {
            layers: network.layers().iter().map(LayerRecord::from).collect(),
        }
    }
}

impl LayerRecord {
    fn into_layer(self, index: usize) -> Result<Layer> {
        let invalid = |reason: String| Error::InvalidModel {
            layer: index,
            reason,
        };

        let activation = self.activation.parse::<Activation>()?;
        let rows = self.weights.len();
        if rows == 0 {
            return Err(invalid("weights have no rows".to_string()));
        }
        let cols = self.weights[0].len();
        if let Some(row) = self.weights.iter().position(|row| row.len() != cols) {
            return Err(invalid(format!(
                "weight row {} has {} columns, expected {}",
                row,
                self.weights[row].len(),
                cols
            )));
        }
        if cols == 0 {
            return Err(invalid("weights have no columns".to_string()));
        }
        if self.biases.len() != rows {
            return Err(invalid(format!(
                "{} biases for {} weight rows",
                self.biases.len(),
                rows
            )));
        }

        let weights = Array2::from_shape_vec((rows, cols), self.weights.concat())
            .map_err(|e| invalid(e.to_string()))?;
        Layer::with_parameters(weights, Array1::from(self.biases), activation)
    }
}

impl TryFrom<ModelRecord> for Network {
    type Error = Error;

    fn try_from(record: ModelRecord) -> Result<Self> {
        if record.layers.is_empty() {
            return Err(Error::InvalidModel {
                layer: 0,
                reason: "model has no layers".to_string(),
            });
        }
        let layers = record
            .layers
            .into_iter()
            .enumerate()
            .map(|(index, layer)| layer.into_layer(index))
            .collect::<Result<Vec<_>>>()?;
        Network::from_layers(layers)
    }
}

impl Network {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ModelRecord::from(self))?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: ModelRecord = serde_json::from_str(json)?;
        Network::try_from(record)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), layers = self.layers().len(), "saved model");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let network = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), layers = network.layers().len(), "loaded model");
        Ok(network)
    }
}
