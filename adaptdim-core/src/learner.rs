//! Common seam for anything the experiment driver can run.

use crate::context::Context;
use crate::controller::AdaptiveController;
use crate::error::{AdaptError, Result};
use crate::policy::{BasePolicy, CompositeAction, PolicyKind, PolicySpec};
use crate::stats::StatsSummary;
use crate::switch::SwitchEvent;

/// A learner playing the full per-round protocol on full-width contexts.
pub trait Learner {
    /// Tag used in logs and result file names.
    fn name(&self) -> String;

    /// Dimension currently used for decisions.
    fn dimension(&self) -> usize;

    fn select_action(&mut self, ctx: &Context) -> Result<CompositeAction>;

    fn update(
        &mut self,
        ctx: &Context,
        action: &[usize],
        rewards: &[f64],
        realized: f64,
    ) -> Result<()>;

    /// Dimension changes committed so far.
    fn switch_events(&self) -> &[SwitchEvent] {
        &[]
    }

    fn stats_summary(&self) -> Option<StatsSummary> {
        None
    }
}

impl Learner for AdaptiveController {
    fn name(&self) -> String {
        format!("adaptive-{}", self.config().base)
    }

    fn dimension(&self) -> usize {
        AdaptiveController::dimension(self)
    }

    fn select_action(&mut self, ctx: &Context) -> Result<CompositeAction> {
        AdaptiveController::select_action(self, ctx)
    }

    fn update(
        &mut self,
        ctx: &Context,
        action: &[usize],
        rewards: &[f64],
        realized: f64,
    ) -> Result<()> {
        AdaptiveController::update(self, ctx, action, rewards, realized).map(|_| ())
    }

    fn switch_events(&self) -> &[SwitchEvent] {
        AdaptiveController::switch_events(self)
    }

    fn stats_summary(&self) -> Option<StatsSummary> {
        Some(self.stats().summary())
    }
}

/// A base policy run directly on every feature, without exploration or
/// dimension adaptation.
pub struct Baseline {
    dim: usize,
    policy: Box<dyn BasePolicy>,
}

impl Baseline {
    pub fn new(kind: PolicyKind, spec: &PolicySpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            dim: spec.dim,
            policy: kind.build(spec),
        })
    }

    pub fn policy(&self) -> &dyn BasePolicy {
        self.policy.as_ref()
    }

    fn check_width(&self, ctx: &Context) -> Result<()> {
        if ctx.dim() != self.dim {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: self.dim,
                actual: ctx.dim(),
            });
        }
        Ok(())
    }
}

impl Learner for Baseline {
    fn name(&self) -> String {
        self.policy.name().to_string()
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn select_action(&mut self, ctx: &Context) -> Result<CompositeAction> {
        self.check_width(ctx)?;
        Ok(self.policy.select_action(&ctx.view()))
    }

    fn update(
        &mut self,
        ctx: &Context,
        action: &[usize],
        rewards: &[f64],
        realized: f64,
    ) -> Result<()> {
        self.check_width(ctx)?;
        if let Some(&bad) = action.iter().find(|&&a| a >= ctx.num_actions()) {
            return Err(AdaptError::ActionOutOfRange {
                action: bad,
                num_actions: ctx.num_actions(),
            });
        }
        self.policy.ingest(&ctx.view(), action, rewards, realized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DMatrix;

    use super::*;
    use crate::config::ControllerConfig;

    fn spec(dim: usize) -> PolicySpec {
        PolicySpec {
            dim,
            horizon: 100,
            seed: 0,
            delta: 0.05,
            mu: 0.0,
        }
    }

    #[test]
    fn baseline_uses_full_width() {
        let mut learner = Baseline::new(PolicyKind::LinUcb, &spec(3)).unwrap();
        let ctx = Context::new("c", DMatrix::from_element(2, 3, 1.0));
        let action = learner.select_action(&ctx).unwrap();
        learner.update(&ctx, &action, &[1.0], 1.0).unwrap();

        assert_eq!(learner.name(), "linucb");
        assert_eq!(learner.dimension(), 3);
        assert_eq!(learner.policy().dim(), 3);
        assert!(!learner.policy().regression().is_fresh());
        assert!(learner.switch_events().is_empty());
        assert!(learner.stats_summary().is_none());
    }

    #[test]
    fn baseline_rejects_narrow_context() {
        let mut learner = Baseline::new(PolicyKind::LinUcb, &spec(3)).unwrap();
        let ctx = Context::new("c", DMatrix::from_element(2, 2, 1.0));
        assert!(learner.select_action(&ctx).is_err());
    }

    #[test]
    fn baseline_rejects_delta_outside_unit_interval() {
        for delta in [0.0, 1.0, 1.5, -1.0, f64::NAN] {
            let spec = PolicySpec { delta, ..spec(3) };
            let err = Baseline::new(PolicyKind::LinUcb, &spec)
                .err()
                .unwrap_or_else(|| panic!("delta {delta} accepted"));
            assert!(matches!(err, AdaptError::InvalidParam { key: "delta", .. }));
        }
    }

    #[test]
    fn baseline_rejects_mu_outside_unit_interval() {
        let spec = PolicySpec { mu: 2.0, ..spec(3) };
        assert!(matches!(
            Baseline::new(PolicyKind::Randomized, &spec),
            Err(AdaptError::InvalidParam { key: "mu", .. })
        ));
    }

    #[test]
    fn controller_behind_trait_object() {
        let controller =
            AdaptiveController::new(4, 100, ControllerConfig::new(PolicyKind::Randomized, 1))
                .unwrap();
        let mut learner: Box<dyn Learner> = Box::new(controller);
        let ctx = Context::new("c", DMatrix::from_element(3, 4, 0.5));
        for _ in 0..5 {
            let action = learner.select_action(&ctx).unwrap();
            learner.update(&ctx, &action, &[0.5], 0.5).unwrap();
        }
        assert_eq!(learner.name(), "adaptive-randomized");
        assert_eq!(learner.dimension(), 2);
        assert_eq!(learner.stats_summary().unwrap().rounds_observed, 5);
    }
}
