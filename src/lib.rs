use std::{collections::HashMap, fmt::Debug, hash::Hash};

use ndarray::Array1;

pub mod activation;
pub mod data;
pub mod error;
pub mod gradcheck;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod serialize;
pub mod trainer;
pub mod vector;

pub use activation::Activation;
pub use error::{Error, Result};
pub use layer::Layer;
pub use network::Network;

#[macro_export]
macro_rules! assert_rel_eq_arr1 {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual.shape(), $expected.shape());
        ndarray::Zip::from(&$actual)
            .and(&$expected)
            .for_each(|v, w| {
                assert_relative_eq!(v, w);
            });
    };
}

#[macro_export]
macro_rules! assert_rel_eq_arr2 {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual.shape(), $expected.shape());
        ndarray::Zip::from(&$actual)
            .and(&$expected)
            .for_each(|v, w| {
                assert_relative_eq!(v, w);
            });
    };
}

/// Encode labels to one-hot vectors and decode them.
pub struct OneHotEncoder<Label>
where
    Label: Hash + Eq + Clone + Debug,
{
    label_to_id: HashMap<Label, usize>,
    id_to_label: Vec<Label>,
}

impl<Label> OneHotEncoder<Label>
where
    Label: Hash + Eq + Clone + Debug,
{
    /// Record labels to convert.
    pub fn new(label_kinds: Vec<Label>) -> Self {
        let label_to_id = label_kinds
            .iter()
            .cloned()
            .enumerate()
            .map(|(id, label)| (label, id))
            .collect();
        Self {
            label_to_id,
            id_to_label: label_kinds,
        }
    }

    pub fn classes(&self) -> usize {
        self.id_to_label.len()
    }

    fn encode_label(&self, label: &Label) -> Result<Array1<f64>> {
        let id = self
            .label_to_id
            .get(label)
            .ok_or_else(|| Error::UnknownLabel(format!("{:?}", label)))?;
        let mut one_hot = Array1::zeros(self.classes());
        one_hot[*id] = 1.0;
        Ok(one_hot)
    }

    /// Encode labels to one-hot vectors, one per label.
    pub fn encode(&self, labels: &[Label]) -> Result<Vec<Array1<f64>>> {
        labels
            .iter()
            .map(|label| self.encode_label(label))
            .collect()
    }

    /// Decode network outputs to labels.
    /// Decoded label is determined by an argmax of each vector; `None` for an empty vector.
    pub fn decode(&self, outputs: &[Array1<f64>]) -> Vec<Option<Label>> {
        outputs
            .iter()
            .map(|output| {
                metrics::argmax(output.view())
                    .and_then(|id| self.id_to_label.get(id))
                    .cloned()
            })
            .collect()
    }
}
