//! Randomized policy with importance-weighted ridge regression.
//!
//! Each decision plays uniformly at random with probability
//! `p_n = min(1, mu * sqrt(K / n))`, where `n` counts the policy's own
//! decisions, and greedily otherwise. Observed rewards are folded into the
//! regression weighted by the inverse propensity of the played action.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::{BasePolicy, CompositeAction, RegressionState, Ridge, argmax};
use crate::context::ContextView;

#[derive(Debug, Clone, Copy)]
struct Pending {
    action: usize,
    propensity: f64,
}

pub struct Randomized {
    dim: usize,
    mu: f64,
    rng: StdRng,
    ridge: Ridge,
    decisions: u64,
    uniform_draws: u64,
    pending: Option<Pending>,
}

impl Randomized {
    pub fn new(dim: usize, mu: f64, seed: u64) -> Self {
        Self {
            dim,
            mu,
            rng: StdRng::seed_from_u64(seed),
            ridge: Ridge::new(dim),
            decisions: 0,
            uniform_draws: 0,
            pending: None,
        }
    }

    /// Uniform-play probability for the `n`-th decision over `k` actions.
    pub fn uniform_probability(&self, n: u64, k: usize) -> f64 {
        if n == 0 {
            return self.mu.clamp(0.0, 1.0);
        }
        (self.mu * (k as f64 / n as f64).sqrt()).clamp(0.0, 1.0)
    }

    /// Total decisions taken so far.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }
}

impl BasePolicy for Randomized {
    fn name(&self) -> &'static str {
        "randomized"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn select_action(&mut self, view: &ContextView<'_>) -> CompositeAction {
        let k = view.num_actions();
        self.decisions += 1;
        let p = self.uniform_probability(self.decisions, k);

        let (_, theta) = self.ridge.solve();
        let greedy = argmax((0..k).map(|i| theta.dot(&view.row(i))));

        let action = if k > 0 && self.rng.gen_bool(p) {
            self.uniform_draws += 1;
            self.rng.gen_range(0..k)
        } else {
            greedy
        };

        let mut propensity = p / k.max(1) as f64;
        if action == greedy {
            propensity += 1.0 - p;
        }
        self.pending = Some(Pending { action, propensity });
        trace!(action, greedy, p, "randomized selected action");
        vec![action]
    }

    fn ingest(
        &mut self,
        view: &ContextView<'_>,
        action: &[usize],
        rewards: &[f64],
        _realized: f64,
    ) {
        let weight = match self.pending.take() {
            Some(p) if action.first() == Some(&p.action) && p.propensity > 0.0 => {
                1.0 / p.propensity
            }
            _ => 1.0,
        };
        for (&a, &r) in action.iter().zip(rewards) {
            self.ridge.add(&view.row(a), r, weight);
        }
    }

    fn uniform_draws(&self) -> Option<u64> {
        Some(self.uniform_draws)
    }

    fn regression(&self) -> RegressionState<'_> {
        self.ridge.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn two_arm_context() -> Context {
        Context::from_rows("r", &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_uniform_probability_decays() {
        let policy = Randomized::new(2, 0.5, 0);
        let early = policy.uniform_probability(1, 4);
        let late = policy.uniform_probability(400, 4);
        assert_eq!(early, 1.0);
        assert!(late < early);
        assert!((late - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_zero_mu_never_draws_uniformly() {
        let ctx = two_arm_context();
        let mut policy = Randomized::new(2, 0.0, 9);
        for _ in 0..100 {
            policy.select_action(&ctx.view());
        }
        assert_eq!(policy.uniform_draws(), Some(0));
        assert_eq!(policy.decisions(), 100);
    }

    #[test]
    fn test_full_mu_draws_uniformly_at_first() {
        let ctx = two_arm_context();
        let mut policy = Randomized::new(2, 1.0, 9);
        policy.select_action(&ctx.view());
        assert_eq!(policy.uniform_draws(), Some(1));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let ctx = two_arm_context();
        let mut a = Randomized::new(2, 0.3, 42);
        let mut b = Randomized::new(2, 0.3, 42);
        for _ in 0..50 {
            assert_eq!(a.select_action(&ctx.view()), b.select_action(&ctx.view()));
        }
        assert_eq!(a.uniform_draws(), b.uniform_draws());
    }

    #[test]
    fn test_ingest_weights_by_inverse_propensity() {
        let ctx = two_arm_context();
        let view = ctx.view();
        let mut policy = Randomized::new(2, 0.0, 1);
        // mu = 0 makes the greedy choice certain, so the weight is one.
        let action = policy.select_action(&view);
        policy.ingest(&view, &action, &[2.0], 2.0);
        let state = policy.regression();
        assert_eq!(state.target[action[0]], 2.0);
    }

    #[test]
    fn test_learns_rewarding_direction() {
        let ctx = two_arm_context();
        let view = ctx.view();
        let mut policy = Randomized::new(2, 0.2, 5);
        for _ in 0..300 {
            let action = policy.select_action(&view);
            let reward = if action[0] == 1 { 1.0 } else { -1.0 };
            policy.ingest(&view, &action, &[reward], reward);
        }
        let (_, theta) = policy.ridge.solve();
        assert!(theta[1] > theta[0]);
    }
}
