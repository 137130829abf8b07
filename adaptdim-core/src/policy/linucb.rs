//! Deterministic upper-confidence-bound policy over a shared linear model.

use tracing::trace;

use super::{BasePolicy, CompositeAction, RegressionState, Ridge, argmax};
use crate::context::ContextView;

/// LinUCB with a single ridge regression shared across actions.
///
/// The confidence width is fixed for the whole horizon:
/// `beta = 1 + sqrt(2 ln(1/delta) + d ln(1 + T/d))`.
pub struct LinUcb {
    dim: usize,
    beta: f64,
    ridge: Ridge,
}

impl LinUcb {
    pub fn new(dim: usize, horizon: u64, delta: f64) -> Self {
        let d = dim.max(1) as f64;
        let log_term = 2.0 * (1.0 / delta).ln() + d * (1.0 + horizon as f64 / d).ln();
        Self {
            dim,
            beta: 1.0 + log_term.max(0.0).sqrt(),
            ridge: Ridge::new(dim),
        }
    }

    /// Confidence width multiplier.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl BasePolicy for LinUcb {
    fn name(&self) -> &'static str {
        "linucb"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn select_action(&mut self, view: &ContextView<'_>) -> CompositeAction {
        let (inv, theta) = self.ridge.solve();
        let scores = (0..view.num_actions()).map(|i| {
            let x = view.row(i);
            let width = x.dot(&(&inv * &x)).max(0.0).sqrt();
            theta.dot(&x) + self.beta * width
        });
        let action = argmax(scores);
        trace!(action, "linucb selected action");
        vec![action]
    }

    fn ingest(
        &mut self,
        view: &ContextView<'_>,
        action: &[usize],
        rewards: &[f64],
        _realized: f64,
    ) {
        for (&a, &r) in action.iter().zip(rewards) {
            self.ridge.add(&view.row(a), r, 1.0);
        }
    }

    fn regression(&self) -> RegressionState<'_> {
        self.ridge.state()
    }
}
