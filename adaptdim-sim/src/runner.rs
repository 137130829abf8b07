//! Round driver: plays a learner against an environment.

use std::time::{Duration, Instant};

use adaptdim_core::Learner;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::environment::Environment;
use crate::error::{Result, SimError};

/// Cumulative reward and regret sampled along a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Round index of each sample.
    pub rounds: Vec<u64>,
    pub rewards: Vec<f64>,
    pub regrets: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn final_reward(&self) -> Option<f64> {
        self.rewards.last().copied()
    }

    pub fn final_regret(&self) -> Option<f64> {
        self.regrets.last().copied()
    }

    fn record(&mut self, round: u64, reward: f64, regret: f64) {
        self.rounds.push(round);
        self.rewards.push(reward);
        self.regrets.push(regret);
    }
}

/// Outcome of [`play`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trajectory: Trajectory,
    pub elapsed: Duration,
}

/// Run `horizon` rounds, sampling the running totals every `record_every`
/// rounds and at the last round.
///
/// Regret is measured against the noiseless best action.
pub fn play<L, E>(
    learner: &mut L,
    env: &mut E,
    horizon: u64,
    record_every: u64,
) -> Result<RunReport>
where
    L: Learner + ?Sized,
    E: Environment + ?Sized,
{
    if record_every == 0 {
        return Err(SimError::InvalidSetup("record_every must be at least 1".into()));
    }

    let start = Instant::now();
    let mut trajectory = Trajectory::default();
    let mut reward = 0.0;
    let mut regret = 0.0;

    for t in 1..=horizon {
        let ctx = env.next_context();
        let action = learner.select_action(&ctx)?;
        let feedback = env.play(&ctx, &action)?;
        regret += env.best_reward(&ctx) - env.expected_reward(&ctx, &action)?;
        reward += feedback.realized;
        learner.update(&ctx, &action, &feedback.rewards, feedback.realized)?;

        if t % record_every == 0 || t == horizon {
            trajectory.record(t, reward, regret);
            debug!(
                t,
                reward,
                regret,
                dim = learner.dimension(),
                "checkpoint"
            );
        }
    }

    let elapsed = start.elapsed();
    info!(
        learner = %learner.name(),
        env = env.name(),
        horizon,
        reward,
        regret,
        dim = learner.dimension(),
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );
    Ok(RunReport {
        trajectory,
        elapsed,
    })
}
