use std::{fs, path::Path};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::DataLoader;
use crate::error::{Error, Result};
use crate::loss::{CrossEntropy, LossCriterion};
use crate::network::Network;

/// Hyperparameters of a training run.
///
/// Every field has a default, so a config file only needs the values it changes:
///
/// ```json
/// {"epochs": 500, "learning_rate": 0.05, "batch_size": 16, "shuffle": true}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Samples per update; `None` trains on the whole set at once.
    pub batch_size: Option<usize>,
    pub shuffle: bool,
    pub seed: u64,
    /// Log progress every this many epochs, `0` disables it.
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 1000,
            learning_rate: 0.1,
            batch_size: None,
            shuffle: false,
            seed: 0,
            log_every: 100,
        }
    }
}

impl TrainerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == Some(0) {
            return Err(Error::InvalidConfig("batch size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Mean batch loss of every epoch of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub epoch_losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Runs mini-batch SGD over a [`DataLoader`] for a configured number of epochs.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Builds the loader for `inputs`/`targets`, shuffled when configured.
    pub fn loader(
        &self,
        inputs: Vec<Array1<f64>>,
        targets: Vec<Array1<f64>>,
    ) -> Result<DataLoader> {
        let loader = DataLoader::new(inputs, targets)?;
        Ok(if self.config.shuffle {
            loader.shuffle(self.config.seed)
        } else {
            loader
        })
    }

    /// Train with cross entropy loss.
    pub fn fit(&self, network: &mut Network, loader: &mut DataLoader) -> Result<TrainingHistory> {
        self.fit_with::<CrossEntropy>(network, loader)
    }

    pub fn fit_with<L: LossCriterion>(
        &self,
        network: &mut Network,
        loader: &mut DataLoader,
    ) -> Result<TrainingHistory> {
        if loader.size() == 0 {
            return Err(Error::EmptyInput);
        }
        let batch_size = self.config.batch_size.unwrap_or_else(|| loader.size());

        let mut history = TrainingHistory::default();
        for epoch in 0..self.config.epochs {
            let mut total_loss = 0.0;
            let mut batches = 0;
            for (inputs, targets) in loader.batch(batch_size) {
                total_loss +=
                    network.train_batch_with::<L>(&inputs, &targets, self.config.learning_rate)?;
                batches += 1;
            }
            let epoch_loss = total_loss / batches as f64;

            if !epoch_loss.is_finite() {
                warn!(epoch, epoch_loss, "loss is not finite");
            }
            if self.config.log_every > 0 && epoch % self.config.log_every == 0 {
                info!(epoch, epoch_loss, "training");
            }
            history.epoch_losses.push(epoch_loss);
        }
        Ok(history)
    }
}
