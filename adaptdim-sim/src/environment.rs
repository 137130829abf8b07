//! The environment side of the per-round protocol.

use adaptdim_core::Context;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the environment reports after an action is played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// One reward per chosen action.
    pub rewards: Vec<f64>,
    /// Total reward credited to the learner this round.
    pub realized: f64,
}

/// Source of contexts and rewards for a bandit run.
pub trait Environment {
    fn name(&self) -> &str;

    /// Candidate actions per round (`K`).
    fn num_actions(&self) -> usize;

    /// Feature width of every context (`max_d`).
    fn dim(&self) -> usize;

    /// Draw the next round's context.
    fn next_context(&mut self) -> Context;

    /// Play `action` against `ctx` and report the noisy rewards.
    fn play(&mut self, ctx: &Context, action: &[usize]) -> Result<Feedback>;

    /// Noiseless reward of `action` on `ctx`.
    fn expected_reward(&self, ctx: &Context, action: &[usize]) -> Result<f64>;

    /// Noiseless reward of the best action on `ctx`.
    fn best_reward(&self, ctx: &Context) -> f64;
}
