use ndarray::{Array1, ArrayView1};

/// Index of the largest element, the first one on ties. `None` for an empty vector.
pub fn argmax(v: ArrayView1<f64>) -> Option<usize> {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, &value)| match best {
            Some((_, max)) if value <= max => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}

/// Fraction of `predictions` whose argmax matches the argmax of the corresponding target.
///
/// Empty or mismatched sets give `0.0` rather than an error.
pub fn accuracy(predictions: &[Array1<f64>], targets: &[Array1<f64>]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return 0.0;
    }
    let n_corrects = predictions
        .iter()
        .zip(targets)
        .filter(|(p, t)| {
            let predicted = argmax(p.view());
            predicted.is_some() && predicted == argmax(t.view())
        })
        .count();
    n_corrects as f64 / predictions.len() as f64
}

/// Construct a confusion matrix over `classes` classes from one-hot style vectors.
/// An item in i-th row and j-th column is the number of samples of true class i predicted as
/// class j. Samples whose argmax falls outside `0..classes` are skipped.
pub fn confusion_matrix(
    predictions: &[Array1<f64>],
    targets: &[Array1<f64>],
    classes: usize,
) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; classes]; classes];
    for (p, t) in predictions.iter().zip(targets) {
        if let (Some(predicted), Some(actual)) = (argmax(p.view()), argmax(t.view())) {
            if predicted < classes && actual < classes {
                matrix[actual][predicted] += 1;
            }
        }
    }
    matrix
}
