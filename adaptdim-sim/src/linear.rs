//! Sparse linear bandit simulator.
//!
//! Features are drawn i.i.d. `N(0, 1)`. The weight vector has `sparsity`
//! non-zero leading coordinates, drawn `N(0, 1)` and scaled to unit norm; the
//! remaining coordinates are zero. Rewards are `θᵀx_a + N(0, noise²)`.

use adaptdim_core::{AdaptError, Context};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, StandardNormal};
use tracing::debug;

use crate::environment::{Environment, Feedback};
use crate::error::{Result, SimError};

pub struct LinearBandit {
    weights: DVector<f64>,
    arms: usize,
    noise: Normal<f64>,
    rng: StdRng,
    rounds: u64,
}

impl LinearBandit {
    /// Random sparse problem with `dim` features and `arms` actions.
    pub fn new(dim: usize, arms: usize, noise: f64, sparsity: usize, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(SimError::InvalidSetup("dimension must be at least 1".into()));
        }
        if sparsity == 0 || sparsity > dim {
            return Err(SimError::InvalidSetup(format!(
                "sparsity must lie in 1..={dim}, got {sparsity}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut weights = DVector::zeros(dim);
        for w in weights.rows_mut(0, sparsity).iter_mut() {
            *w = StandardNormal.sample(&mut rng);
        }
        let norm = weights.norm();
        if norm > 0.0 {
            weights /= norm;
        }
        debug!(dim, arms, sparsity, noise, seed, "sampled sparse weights");

        Self::build(weights, arms, noise, rng)
    }

    /// Problem with a fixed weight vector.
    pub fn with_weights(weights: DVector<f64>, arms: usize, noise: f64, seed: u64) -> Result<Self> {
        if weights.is_empty() {
            return Err(SimError::InvalidSetup("weights must not be empty".into()));
        }
        Self::build(weights, arms, noise, StdRng::seed_from_u64(seed))
    }

    fn build(weights: DVector<f64>, arms: usize, noise: f64, rng: StdRng) -> Result<Self> {
        if arms == 0 {
            return Err(SimError::InvalidSetup("need at least one action".into()));
        }
        let noise = Normal::new(0.0, noise)
            .map_err(|e| SimError::InvalidSetup(format!("noise {noise}: {e}")))?;
        Ok(Self {
            weights,
            arms,
            noise,
            rng,
            rounds: 0,
        })
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    /// Number of leading non-zero weights.
    pub fn sparsity(&self) -> usize {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(i, _)| i + 1)
            .last()
            .unwrap_or(0)
    }

    fn mean(&self, ctx: &Context, a: usize) -> Result<f64> {
        if a >= ctx.num_actions() {
            return Err(AdaptError::ActionOutOfRange {
                action: a,
                num_actions: ctx.num_actions(),
            }
            .into());
        }
        if ctx.dim() != self.weights.len() {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: self.weights.len(),
                actual: ctx.dim(),
            }
            .into());
        }
        Ok(ctx.features().row(a).transpose().dot(&self.weights))
    }
}

impl Environment for LinearBandit {
    fn name(&self) -> &str {
        "linear"
    }

    fn num_actions(&self) -> usize {
        self.arms
    }

    fn dim(&self) -> usize {
        self.weights.len()
    }

    fn next_context(&mut self) -> Context {
        self.rounds += 1;
        let rng = &mut self.rng;
        let features =
            DMatrix::from_fn(self.arms, self.weights.len(), |_, _| StandardNormal.sample(&mut *rng));
        Context::new(self.rounds.to_string(), features)
    }

    fn play(&mut self, ctx: &Context, action: &[usize]) -> Result<Feedback> {
        let mut rewards = Vec::with_capacity(action.len());
        for &a in action {
            let mean = self.mean(ctx, a)?;
            rewards.push(mean + self.noise.sample(&mut self.rng));
        }
        let realized = rewards.iter().sum();
        Ok(Feedback { rewards, realized })
    }

    fn expected_reward(&self, ctx: &Context, action: &[usize]) -> Result<f64> {
        action.iter().map(|&a| self.mean(ctx, a)).sum()
    }

    fn best_reward(&self, ctx: &Context) -> f64 {
        (0..ctx.num_actions())
            .filter_map(|a| self.mean(ctx, a).ok())
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
