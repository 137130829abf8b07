//! Adaptive-dimension controller.
//!
//! Owns the per-round protocol:
//!
//! 1. draw explore/exploit ([`Explorer`])
//! 2. play a uniform action, or delegate to the base policy on the view
//!    truncated to the working dimension
//! 3. after the environment answers, feed the base policy (exploit rounds
//!    only) and the full-dimension statistics
//! 4. every `schedule` rounds run the [`SwitchTest`] and, on a switch,
//!    rebuild the base policy from scratch at the new dimension
//!
//! All state is owned by the controller value, so independent runs never
//! share statistics.

use tracing::info;

use crate::config::ControllerConfig;
use crate::context::Context;
use crate::error::{AdaptError, Result};
use crate::exploration::{ExplorationSchedule, Explorer, RoundKind};
use crate::policy::{BasePolicy, CompositeAction, PolicySpec};
use crate::stats::GlobalStats;
use crate::switch::{SwitchDecision, SwitchEvent, SwitchTest, candidate_dimensions};

pub struct AdaptiveController {
    config: ControllerConfig,
    max_d: usize,
    horizon: u64,
    test: SwitchTest,
    d: usize,
    policy: Box<dyn BasePolicy>,
    explorer: Explorer,
    stats: GlobalStats,
    t: u64,
    last_round: Option<RoundKind>,
    uniform_snapshot: Option<u64>,
    switches: Vec<SwitchEvent>,
}

impl AdaptiveController {
    /// Wire up a controller for `max_d` features over `horizon` rounds.
    pub fn new(max_d: usize, horizon: u64, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        if max_d == 0 {
            return Err(AdaptError::DimensionOutOfRange {
                requested: 0,
                max: 0,
            });
        }

        let candidates = match config.dimension_override {
            Some(d) if d > max_d => {
                return Err(AdaptError::DimensionOutOfRange {
                    requested: d,
                    max: max_d,
                });
            }
            Some(d) => vec![d],
            None => candidate_dimensions(max_d),
        };
        let d = candidates[0];

        let policy = config
            .base
            .build(&PolicySpec::from_config(d, horizon, &config));
        let explorer = Explorer::new(ExplorationSchedule::new(config.mu), config.seed);

        info!(
            max_d,
            d,
            base = %config.base,
            mu = config.mu,
            schedule = config.schedule,
            candidates = ?candidates,
            "adaptive controller initialized"
        );

        Ok(Self {
            config,
            max_d,
            horizon,
            test: SwitchTest::new(candidates),
            d,
            policy,
            explorer,
            stats: GlobalStats::new(max_d),
            t: 1,
            last_round: None,
            uniform_snapshot: None,
            switches: Vec::new(),
        })
    }

    /// Current working dimension.
    pub fn dimension(&self) -> usize {
        self.d
    }

    pub fn max_dimension(&self) -> usize {
        self.max_d
    }

    /// Round clock; starts at 1 and advances once per update.
    pub fn round(&self) -> u64 {
        self.t
    }

    pub fn candidates(&self) -> &[usize] {
        self.test.candidates()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn policy(&self) -> &dyn BasePolicy {
        self.policy.as_ref()
    }

    pub fn switch_events(&self) -> &[SwitchEvent] {
        &self.switches
    }

    /// Decision taken by the most recent `select_action`.
    pub fn last_round(&self) -> Option<RoundKind> {
        self.last_round
    }

    /// Choose this round's composite action.
    pub fn select_action(&mut self, ctx: &Context) -> Result<CompositeAction> {
        self.check_width(ctx)?;
        let kind = self
            .explorer
            .decide(self.t, ctx.num_actions(), ctx.slate_len());
        self.last_round = Some(kind);

        match kind {
            RoundKind::Explore { action } => Ok(vec![action]),
            RoundKind::Exploit => {
                self.uniform_snapshot = self.policy.uniform_draws();
                let view = ctx.truncate(self.d)?;
                Ok(self.policy.select_action(&view))
            }
        }
    }

    /// Feed back the outcome of the round and possibly switch dimension.
    ///
    /// Returns the switch event when this round's test pass committed one.
    pub fn update(
        &mut self,
        ctx: &Context,
        action: &[usize],
        rewards: &[f64],
        realized: f64,
    ) -> Result<Option<SwitchEvent>> {
        self.check_width(ctx)?;
        if rewards.len() != action.len() {
            return Err(AdaptError::RewardLengthMismatch {
                expected: action.len(),
                actual: rewards.len(),
            });
        }
        if let Some(&bad) = action.iter().find(|&&a| a >= ctx.num_actions()) {
            return Err(AdaptError::ActionOutOfRange {
                action: bad,
                num_actions: ctx.num_actions(),
            });
        }

        let explored = self.last_round.is_some_and(|k| k.is_explore());
        if !explored {
            let view = ctx.truncate(self.d)?;
            self.policy.ingest(&view, action, rewards, realized);
        }

        self.stats.observe_features(ctx.features())?;
        let internal_draw = match (self.policy.uniform_draws(), self.uniform_snapshot) {
            (Some(now), Some(before)) => now > before,
            _ => false,
        };
        if explored || internal_draw {
            self.stats.observe_rewards(ctx.features(), action, rewards)?;
        }

        self.t += 1;
        if self.t % self.config.schedule == 0 {
            return Ok(self.run_switch_test());
        }
        Ok(None)
    }

    fn run_switch_test(&mut self) -> Option<SwitchEvent> {
        let pass = self.test.evaluate(self.d, &self.stats);
        let SwitchDecision::Switch {
            to,
            score,
            threshold,
        } = pass.decision
        else {
            return None;
        };

        let event = SwitchEvent {
            round: self.t,
            from: self.d,
            to,
            score,
            threshold,
            explore_samples: self.stats.explore_samples(),
        };
        info!(
            round = event.round,
            from = event.from,
            to = event.to,
            score = event.score,
            threshold = event.threshold,
            samples = event.explore_samples,
            "switching working dimension"
        );

        self.d = to;
        self.policy = self
            .config
            .base
            .build(&PolicySpec::from_config(to, self.horizon, &self.config));
        self.uniform_snapshot = None;
        self.switches.push(event.clone());
        Some(event)
    }

    fn check_width(&self, ctx: &Context) -> Result<()> {
        if ctx.dim() != self.max_d {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: self.max_d,
                actual: ctx.dim(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdaptiveController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveController")
            .field("max_d", &self.max_d)
            .field("d", &self.d)
            .field("t", &self.t)
            .field("base", &self.config.base)
            .field("switches", &self.switches.len())
            .finish()
    }
}
