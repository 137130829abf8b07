//! Error types for adaptdim-sim

use adaptdim_core::AdaptError;
use thiserror::Error;

/// Errors raised while building environments or driving a run
#[derive(Debug, Error)]
pub enum SimError {
    /// Environment parameters are inconsistent
    #[error("Invalid environment setup: {0}")]
    InvalidSetup(String),

    /// The learner rejected a context or feedback
    #[error("Learner error: {0}")]
    Learner(#[from] AdaptError),
}

pub type Result<T> = std::result::Result<T, SimError>;
