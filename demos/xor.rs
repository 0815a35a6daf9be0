use backprop::{metrics::accuracy, Activation, Network};
use ndarray::arr1;
use tracing_subscriber::EnvFilter;

fn main() -> backprop::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut model = Network::seeded(&[2, 4, 2], &[Activation::Relu, Activation::Softmax], 0)?;

    let inputs = vec![
        arr1(&[0.0, 0.0]),
        arr1(&[0.0, 1.0]),
        arr1(&[1.0, 0.0]),
        arr1(&[1.0, 1.0]),
    ];
    let targets = vec![
        arr1(&[1.0, 0.0]),
        arr1(&[0.0, 1.0]),
        arr1(&[0.0, 1.0]),
        arr1(&[1.0, 0.0]),
    ];

    for epoch in 0..1000 {
        let loss = model.train_batch(&inputs, &targets, 0.1)?;
        if epoch % 100 == 0 {
            println!("Epoch {}: loss={:.4}", epoch, loss);
        }
    }

    let preds = inputs
        .iter()
        .map(|input| model.predict(input.view()))
        .collect::<backprop::Result<Vec<_>>>()?;
    println!("Accuracy: {:.2}%", accuracy(&preds, &targets) * 100.0);

    let path = std::env::temp_dir().join("xor_model.json");
    model.save(&path)?;
    println!("Saved model to {}", path.display());
    Ok(())
}
