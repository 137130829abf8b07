//! Full-dimension sufficient statistics for the dimension-switch test.
//!
//! Two accumulators run side by side, always at the full feature width:
//!
//! 1. `covariance` sums the outer product of every presented feature row,
//!    every round, whatever action was played.
//! 2. `cross_moment` sums `reward × feature` only for pairs produced by
//!    uniformly random play, so it stays an unbiased estimate.
//!
//! `explore_samples` counts exactly the pairs folded into `cross_moment`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, Result};

/// Compact, serializable description of the accumulated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub dim: usize,
    pub rounds_observed: u64,
    pub explore_samples: u64,
    pub covariance_trace: f64,
    pub cross_moment_norm: f64,
}

/// Global second-moment and reward cross-moment accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalStats {
    covariance: DMatrix<f64>,
    cross_moment: DVector<f64>,
    explore_samples: u64,
    rounds_observed: u64,
}

impl GlobalStats {
    /// Zeroed statistics for `dim` features.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            covariance: DMatrix::zeros(dim, dim),
            cross_moment: DVector::zeros(dim),
            explore_samples: 0,
            rounds_observed: 0,
        }
    }

    /// Rebuild statistics from previously accumulated parts.
    pub fn from_parts(
        covariance: DMatrix<f64>,
        cross_moment: DVector<f64>,
        explore_samples: u64,
    ) -> Result<Self> {
        if covariance.nrows() != covariance.ncols() || covariance.nrows() != cross_moment.len() {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: covariance.nrows(),
                actual: cross_moment.len(),
            });
        }
        Ok(Self {
            covariance,
            cross_moment,
            explore_samples,
            rounds_observed: 0,
        })
    }

    pub fn dim(&self) -> usize {
        self.cross_moment.len()
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn cross_moment(&self) -> &DVector<f64> {
        &self.cross_moment
    }

    pub fn explore_samples(&self) -> u64 {
        self.explore_samples
    }

    pub fn rounds_observed(&self) -> u64 {
        self.rounds_observed
    }

    /// Add the outer product of every row of a `K × dim` feature matrix.
    pub fn observe_features(&mut self, features: &DMatrix<f64>) -> Result<()> {
        self.check_width(features)?;
        // Sum over rows of x xᵀ is Xᵀ X.
        self.covariance += features.tr_mul(features);
        self.rounds_observed += 1;
        Ok(())
    }

    /// Fold `reward × feature_row(action)` for every chosen action.
    pub fn observe_rewards(
        &mut self,
        features: &DMatrix<f64>,
        action: &[usize],
        rewards: &[f64],
    ) -> Result<()> {
        self.check_width(features)?;
        if action.len() != rewards.len() {
            return Err(AdaptError::RewardLengthMismatch {
                expected: action.len(),
                actual: rewards.len(),
            });
        }
        for (&a, &r) in action.iter().zip(rewards) {
            if a >= features.nrows() {
                return Err(AdaptError::ActionOutOfRange {
                    action: a,
                    num_actions: features.nrows(),
                });
            }
            self.cross_moment += features.row(a).transpose() * r;
            self.explore_samples += 1;
        }
        Ok(())
    }

    #[must_use]
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            dim: self.dim(),
            rounds_observed: self.rounds_observed,
            explore_samples: self.explore_samples,
            covariance_trace: self.covariance.trace(),
            cross_moment_norm: self.cross_moment.norm(),
        }
    }

    fn check_width(&self, features: &DMatrix<f64>) -> Result<()> {
        if features.ncols() != self.dim() {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: self.dim(),
                actual: features.ncols(),
            });
        }
        Ok(())
    }
}
