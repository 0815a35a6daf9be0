//! Shape-checked vector helpers. Length mismatches and empty inputs are reported as errors,
//! never truncated or padded.

use ndarray::{Array1, ArrayView1, Zip};

use crate::error::{ensure_len, Error, Result};

pub fn dot(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    ensure_len(a.len(), b.len())?;
    Ok(Zip::from(&a).and(&b).fold(0.0, |sum, &x, &y| sum + x * y))
}

pub fn add(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<Array1<f64>> {
    ensure_len(a.len(), b.len())?;
    Ok(&a + &b)
}

/// `a - b` elementwise.
pub fn subtract(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<Array1<f64>> {
    ensure_len(a.len(), b.len())?;
    Ok(&a - &b)
}

pub fn mean(a: ArrayView1<f64>) -> Result<f64> {
    a.mean().ok_or(Error::EmptyInput)
}

/// Scale `a` to unit Euclidean norm.
pub fn normalize(a: ArrayView1<f64>) -> Result<Array1<f64>> {
    if a.is_empty() {
        return Err(Error::EmptyInput);
    }
    let norm = dot(a, a)?.sqrt();
    if norm == 0.0 {
        return Err(Error::ZeroNorm);
    }
    Ok(a.mapv(|v| v / norm))
}
