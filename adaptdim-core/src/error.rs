//! Error types for adaptdim-core

use thiserror::Error;

/// Errors raised while configuring or driving a controller
#[derive(Debug, Error)]
pub enum AdaptError {
    /// A required parameter key was not supplied
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    /// A parameter was supplied with an unusable value
    #[error("Invalid parameter {key}: {reason}")]
    InvalidParam { key: &'static str, reason: String },

    /// The `base` tag does not name a known policy
    #[error("Unknown base policy: {0}")]
    UnknownPolicy(String),

    /// Requested dimension is zero or wider than the feature matrix
    #[error("Dimension {requested} out of range 1..={max}")]
    DimensionOutOfRange { requested: usize, max: usize },

    /// Context width does not match the controller's feature dimension
    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    /// A chosen action index does not exist in the context
    #[error("Action {action} out of range for {num_actions} actions")]
    ActionOutOfRange { action: usize, num_actions: usize },

    /// Reward vector length differs from the composite action length
    #[error("Expected {expected} rewards, got {actual}")]
    RewardLengthMismatch { expected: usize, actual: usize },

    /// Linear algebra failure
    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),
}

/// Errors from the pseudo-inverse helper
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinalgError {
    #[error("Matrix contains non-finite entries")]
    NonFinite,

    #[error("SVD did not converge")]
    NoConvergence,

    #[error("Pseudo-inverse failed: {0}")]
    PseudoInverse(&'static str),
}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, AdaptError>;
