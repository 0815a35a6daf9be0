use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("a network needs at least 2 layer sizes, got {sizes}")]
    TooFewLayers { sizes: usize },

    #[error("expected {expected} activations (one per layer), got {actual}")]
    ActivationCount { expected: usize, actual: usize },

    #[error("layer size at index {index} is zero")]
    ZeroWidth { index: usize },

    #[error("shape mismatch: expected length {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("input is empty")]
    EmptyInput,

    #[error("cannot normalize a vector with zero norm")]
    ZeroNorm,

    #[error("unknown activation `{0}`")]
    UnknownActivation(String),

    #[error("invalid activation parameter in `{0}`")]
    InvalidActivationParameter(String),

    #[error("invalid model at layer {layer}: {reason}")]
    InvalidModel { layer: usize, reason: String },

    #[error("unknown label {0}")]
    UnknownLabel(String),

    #[error("invalid trainer config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Fail with [`Error::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { expected, actual })
    }
}
