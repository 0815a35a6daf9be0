use std::vec;

use ndarray::Array1;
use ndarray_rand::rand::{rngs::StdRng, seq::index::sample, seq::SliceRandom, Rng, SeedableRng};

use crate::error::{ensure_len, Result};

/// Sampler produces a vector of indices in a dataset.
pub enum Sampler {
    Sequential(usize),
    Random(usize, StdRng),
}

impl Sampler {
    pub fn sample(&mut self) -> Vec<usize> {
        match self {
            Self::Sequential(size) => (0..*size).collect(),
            Self::Random(size, rng) => sample(rng, *size, *size).into_vec(),
        }
    }
}

/// Batch yields a minibatch each time `Iterator::next()` is called.
/// This struct is created in each epoch in a train phase.
pub struct Batch<'a> {
    // `indices` should be an `Iterator` because we have to keep track of the current batch
    // indices.
    indices: vec::IntoIter<usize>,
    batch_size: usize,
    drop_last: bool,
    inputs: &'a [Array1<f64>],
    targets: &'a [Array1<f64>],
}

impl<'a> Batch<'a> {
    pub fn new(
        indices: Vec<usize>,
        batch_size: usize,
        inputs: &'a [Array1<f64>],
        targets: &'a [Array1<f64>],
    ) -> Self {
        Self {
            indices: indices.into_iter(),
            batch_size: batch_size.max(1),
            drop_last: false,
            inputs,
            targets,
        }
    }

    /// If `drop_last` is true, discard last minibatch whose size is smaller than
    /// `self.batch_size`.
    pub fn drop_last(self, drop_last: bool) -> Self {
        Self { drop_last, ..self }
    }

    fn should_drop_last(&self, indices: &[usize]) -> bool {
        self.drop_last && indices.len() != self.batch_size
    }
}

impl<'a> Iterator for Batch<'a> {
    type Item = (Vec<Array1<f64>>, Vec<Array1<f64>>);

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self
            .indices
            .by_ref()
            .take(self.batch_size)
            .collect::<Vec<_>>();

        if indices.is_empty() || self.should_drop_last(&indices) {
            None
        } else {
            Some((
                indices.iter().map(|&i| self.inputs[i].clone()).collect(),
                indices.iter().map(|&i| self.targets[i].clone()).collect(),
            ))
        }
    }
}

/// DataLoader wraps a training set of `(input, target)` samples.
pub struct DataLoader {
    sampler: Sampler,
    inputs: Vec<Array1<f64>>,
    targets: Vec<Array1<f64>>,
}

impl DataLoader {
    pub fn new(inputs: Vec<Array1<f64>>, targets: Vec<Array1<f64>>) -> Result<Self> {
        ensure_len(inputs.len(), targets.len())?;
        Ok(Self {
            sampler: Sampler::Sequential(inputs.len()),
            inputs,
            targets,
        })
    }

    pub fn size(&self) -> usize {
        self.inputs.len()
    }

    pub fn inputs(&self) -> &[Array1<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Array1<f64>] {
        &self.targets
    }

    /// If enabled, generate minibatches in a random order, reproducible from `seed`.
    pub fn shuffle(mut self, seed: u64) -> Self {
        self.sampler = Sampler::Random(self.size(), StdRng::seed_from_u64(seed));
        self
    }

    /// Create a minibatch generator. This is intended to be called each epoch.
    pub fn batch(&mut self, batch_size: usize) -> Batch<'_> {
        Batch::new(
            self.sampler.sample(),
            batch_size,
            &self.inputs,
            &self.targets,
        )
    }
}

/// Split a dataset into train and test data.
/// `test_ratio` is a ratio of the number of test data to the whole dataset.
/// Returns `(x_train, y_train, x_test, y_test)`.
pub fn train_test_split<X, Y, R>(
    x: Vec<X>,
    y: Vec<Y>,
    test_ratio: f64,
    rng: &mut R,
) -> Result<(Vec<X>, Vec<Y>, Vec<X>, Vec<Y>)>
where
    R: Rng + ?Sized,
{
    ensure_len(x.len(), y.len())?;

    let n_trains = (x.len() as f64 * (1.0 - test_ratio.clamp(0.0, 1.0))) as usize;

    let mut zipped = x.into_iter().zip(y).collect::<Vec<_>>();
    zipped.shuffle(rng);
    let (mut x_train, mut y_train): (Vec<_>, Vec<_>) = zipped.into_iter().unzip();

    let x_test = x_train.split_off(n_trains);
    let y_test = y_train.split_off(n_trains);

    Ok((x_train, y_train, x_test, y_test))
}
