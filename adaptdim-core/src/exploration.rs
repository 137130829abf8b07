//! Explore/exploit decisions for the controller.
//!
//! Exploration rounds play an action drawn uniformly at random. Rewards from
//! those rounds are unbiased with respect to the feature distribution, which
//! is what the dimension-switch test relies on.
//!
//! ## Schedule
//!
//! ```text
//! mu_t = min(1, min(mu, mu * sqrt(K) / sqrt(L * t)))
//! ```
//!
//! Flat at `mu` for the first `K / L` rounds, then decaying as `1/sqrt(t)`.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Outcome of the explore/exploit draw for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    /// Uniformly random action.
    Explore { action: usize },
    /// Defer to the base policy.
    Exploit,
}

impl RoundKind {
    pub fn is_explore(&self) -> bool {
        matches!(self, Self::Explore { .. })
    }
}

impl std::fmt::Display for RoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explore { .. } => write!(f, "explore"),
            Self::Exploit => write!(f, "exploit"),
        }
    }
}

/// Time-decaying exploration probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    pub mu: f64,
}

impl ExplorationSchedule {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }

    /// Exploration probability `mu_t` for round `t` with `k` actions and slate size `l`.
    pub fn probability(&self, t: u64, k: usize, l: usize) -> f64 {
        let decayed = self.mu * (k as f64).sqrt() / ((l.max(1) as u64 * t.max(1)) as f64).sqrt();
        1.0_f64.min(self.mu.min(decayed)).max(0.0)
    }
}

/// Seeded explore/exploit sampler.
pub struct Explorer {
    schedule: ExplorationSchedule,
    rng: StdRng,
}

impl Explorer {
    pub fn new(schedule: ExplorationSchedule, seed: u64) -> Self {
        Self {
            schedule,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn schedule(&self) -> &ExplorationSchedule {
        &self.schedule
    }

    /// Draw this round's decision.
    pub fn decide(&mut self, t: u64, k: usize, l: usize) -> RoundKind {
        let p = self.schedule.probability(t, k, l);
        let kind = if k > 0 && self.rng.gen_bool(p) {
            RoundKind::Explore {
                action: self.rng.gen_range(0..k),
            }
        } else {
            RoundKind::Exploit
        };
        trace!(t, p, %kind, "exploration draw");
        kind
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("mu", &self.schedule.mu)
            .finish()
    }
}
