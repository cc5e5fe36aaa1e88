use studio_core::ModelError;
use thiserror::Error;

/// Fatal import failures. No partial project is produced.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed Lottie document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Lottie document is missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}
