//! Base online-learning policies
//!
//! The controller drives one [`BasePolicy`] at a time, always on a view
//! truncated to the current working dimension. Policies are built through
//! the [`PolicyKind`] factory and rebuilt from scratch whenever the working
//! dimension changes.

mod linucb;
mod randomized;

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::config::{ControllerConfig, check_delta, check_mu};
use crate::context::ContextView;
use crate::error::AdaptError;

pub use linucb::LinUcb;
pub use randomized::Randomized;

/// Indices of the actions chosen in one round.
pub type CompositeAction = Vec<usize>;

/// Capability set shared by every base policy.
pub trait BasePolicy: Send {
    /// Short tag used in logs and result names.
    fn name(&self) -> &'static str;

    /// Dimension the policy was built for.
    fn dim(&self) -> usize;

    /// Choose a composite action for the given view.
    fn select_action(&mut self, view: &ContextView<'_>) -> CompositeAction;

    /// Fold the observed rewards for `action` into the policy state.
    fn ingest(
        &mut self,
        view: &ContextView<'_>,
        action: &[usize],
        rewards: &[f64],
        realized: f64,
    );

    /// Number of the policy's own decisions drawn uniformly at random.
    ///
    /// Only policies that randomize internally report a count.
    fn uniform_draws(&self) -> Option<u64> {
        None
    }

    /// Current regression state.
    fn regression(&self) -> RegressionState<'_>;
}

/// Borrowed view of a policy's ridge regression state.
#[derive(Debug, Clone, Copy)]
pub struct RegressionState<'a> {
    pub covariance: &'a DMatrix<f64>,
    pub target: &'a DVector<f64>,
}

impl RegressionState<'_> {
    /// True when the state equals a freshly initialized ridge regression.
    pub fn is_fresh(&self) -> bool {
        let d = self.target.len();
        *self.covariance == DMatrix::identity(d, d) && self.target.iter().all(|v| *v == 0.0)
    }
}

/// Everything needed to (re)build a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySpec {
    pub dim: usize,
    pub horizon: u64,
    pub seed: u64,
    pub delta: f64,
    pub mu: f64,
}

impl PolicySpec {
    pub fn from_config(dim: usize, horizon: u64, config: &ControllerConfig) -> Self {
        Self {
            dim,
            horizon,
            seed: config.seed,
            delta: config.delta,
            mu: config.mu,
        }
    }

    /// Reject hyperparameters no policy can run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        check_mu(self.mu)?;
        check_delta(self.delta)
    }
}

/// Enumerated base policy tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Deterministic upper-confidence-bound policy.
    #[serde(rename = "linucb")]
    LinUcb,
    /// Randomized policy with importance-weighted regression.
    #[serde(rename = "randomized", alias = "minimonster")]
    Randomized,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinUcb => "linucb",
            Self::Randomized => "randomized",
        }
    }

    /// Name of the hyperparameter this policy is tuned by.
    pub fn hyperparameter(&self) -> &'static str {
        match self {
            Self::LinUcb => "delta",
            Self::Randomized => "mu",
        }
    }

    /// Build a fresh policy instance.
    pub fn build(&self, spec: &PolicySpec) -> Box<dyn BasePolicy> {
        match self {
            Self::LinUcb => Box::new(LinUcb::new(spec.dim, spec.horizon, spec.delta)),
            Self::Randomized => Box::new(Randomized::new(spec.dim, spec.mu, spec.seed)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = AdaptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linucb" => Ok(Self::LinUcb),
            "randomized" | "minimonster" => Ok(Self::Randomized),
            other => Err(AdaptError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Ridge regression with an identity prior.
#[derive(Debug, Clone)]
pub(crate) struct Ridge {
    covariance: DMatrix<f64>,
    target: DVector<f64>,
}

impl Ridge {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            covariance: DMatrix::identity(dim, dim),
            target: DVector::zeros(dim),
        }
    }

    /// Add a weighted observation.
    pub(crate) fn add(&mut self, x: &DVector<f64>, reward: f64, weight: f64) {
        self.covariance.ger(weight, x, x, 1.0);
        self.target.axpy(weight * reward, x, 1.0);
    }

    pub(crate) fn inverse(&self) -> DMatrix<f64> {
        let dim = self.target.len();
        self.covariance
            .clone()
            .cholesky()
            .map(|c| c.inverse())
            .unwrap_or_else(|| DMatrix::identity(dim, dim))
    }

    /// Inverse covariance and the current weight estimate.
    pub(crate) fn solve(&self) -> (DMatrix<f64>, DVector<f64>) {
        let inv = self.inverse();
        let theta = &inv * &self.target;
        (inv, theta)
    }

    pub(crate) fn state(&self) -> RegressionState<'_> {
        RegressionState {
            covariance: &self.covariance,
            target: &self.target,
        }
    }
}

/// Index of the largest score, ties going to the lowest index.
pub(crate) fn argmax(scores: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, s) in scores.into_iter().enumerate() {
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}
