use backprop::{
    data::train_test_split,
    metrics::{accuracy, confusion_matrix},
    trainer::{Trainer, TrainerConfig},
    Activation, Network, OneHotEncoder,
};
use ndarray::{arr1, Array1};
use ndarray_rand::{
    rand::{rngs::StdRng, Rng, SeedableRng},
    rand_distr::Normal,
};

const CENTERS: [(f64, f64); 3] = [(0.0, 0.0), (3.0, 3.0), (-3.0, 3.0)];

fn labels() -> Vec<String> {
    vec!["origin", "east", "west"]
        .into_iter()
        .map(String::from)
        .collect()
}

// Three well separated gaussian blobs, one per label.
fn generate_blobs(samples: usize, rng: &mut impl Rng) -> (Vec<Array1<f64>>, Vec<String>) {
    let noise = Normal::new(0.0, 0.5).unwrap();
    let labels = labels();
    let mut xs = Vec::with_capacity(samples);
    let mut ys = Vec::with_capacity(samples);
    for i in 0..samples {
        let class = i % CENTERS.len();
        let (cx, cy) = CENTERS[class];
        xs.push(arr1(&[cx + rng.sample(&noise), cy + rng.sample(&noise)]));
        ys.push(labels[class].clone());
    }
    (xs, ys)
}

#[test]
fn classify_blobs() {
    let mut rng = StdRng::seed_from_u64(42);
    let (xs, ys) = generate_blobs(150, &mut rng);
    let encoder = OneHotEncoder::new(labels());

    let (x_train, y_train, x_test, y_test) = train_test_split(xs, ys, 0.25, &mut rng).unwrap();
    assert_eq!(38, x_test.len());
    let y_train = encoder.encode(&y_train).unwrap();
    let y_test_one_hot = encoder.encode(&y_test).unwrap();

    let trainer = Trainer::new(TrainerConfig {
        epochs: 200,
        learning_rate: 0.1,
        batch_size: Some(10),
        shuffle: true,
        seed: 1,
        log_every: 50,
    })
    .unwrap();
    let mut loader = trainer.loader(x_train, y_train).unwrap();
    let mut network = Network::new(
        &[2, 8, encoder.classes()],
        &[Activation::Tanh, Activation::Softmax],
        &mut rng,
    )
    .unwrap();
    let history = trainer.fit(&mut network, &mut loader).unwrap();
    assert!(history.final_loss().unwrap() < history.epoch_losses[0]);

    let predictions = x_test
        .iter()
        .map(|x| network.predict(x.view()).unwrap())
        .collect::<Vec<_>>();
    let test_accuracy = accuracy(&predictions, &y_test_one_hot);
    assert!(test_accuracy >= 0.9, "test accuracy {}", test_accuracy);

    let decoded = encoder.decode(&predictions);
    let matches = decoded
        .iter()
        .zip(&y_test)
        .filter(|(predicted, actual)| predicted.as_ref() == Some(*actual))
        .count();
    assert_eq!(test_accuracy, matches as f64 / y_test.len() as f64);

    let matrix = confusion_matrix(&predictions, &y_test_one_hot, encoder.classes());
    let total = matrix.iter().flatten().sum::<usize>();
    let diagonal = (0..encoder.classes()).map(|i| matrix[i][i]).sum::<usize>();
    assert_eq!(y_test.len(), total);
    assert_eq!(matches, diagonal);
}
