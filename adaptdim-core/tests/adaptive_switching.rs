//! End-to-end behaviour of the adaptive controller on a sparse linear problem
//!
//! The environment here is deliberately tiny and lives in the test: Gaussian
//! features, a fixed weight vector, Gaussian reward noise.

use adaptdim_core::{
    AdaptiveController, Context, ControllerConfig, PolicyKind, RoundKind, SwitchEvent,
};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, StandardNormal};

const K: usize = 5;
const MAX_D: usize = 8;

struct Problem {
    theta: DVector<f64>,
    noise: Normal<f64>,
    rng: StdRng,
}

impl Problem {
    fn new(theta: &[f64], seed: u64) -> Self {
        Self {
            theta: DVector::from_column_slice(theta),
            noise: Normal::new(0.0, 0.1).unwrap(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn context(&mut self) -> Context {
        let rng = &mut self.rng;
        let features = DMatrix::from_fn(K, self.theta.len(), |_, _| StandardNormal.sample(&mut *rng));
        Context::new("sim", features)
    }

    fn rewards(&mut self, ctx: &Context, action: &[usize]) -> Vec<f64> {
        action
            .iter()
            .map(|&a| {
                ctx.features().row(a).transpose().dot(&self.theta) + self.noise.sample(&mut self.rng)
            })
            .collect()
    }
}

/// Run `horizon` rounds, returning every switch event in order.
fn run(controller: &mut AdaptiveController, problem: &mut Problem, horizon: u64) -> Vec<SwitchEvent> {
    let mut events = Vec::new();
    for _ in 0..horizon {
        let ctx = problem.context();
        let action = controller.select_action(&ctx).unwrap();
        let rewards = problem.rewards(&ctx, &action);
        let realized = rewards.iter().sum();
        if let Some(event) = controller.update(&ctx, &action, &rewards, realized).unwrap() {
            // A switch always leaves a freshly built policy at the new width.
            assert_eq!(controller.policy().dim(), event.to);
            assert!(controller.policy().regression().is_fresh());
            events.push(event);
        }
    }
    events
}

/// Signal on features 3 and 4 only: the controller should move from 2 to 4
/// once it has more than 20 exploration samples, and never on to 8.
#[test]
fn test_switches_once_to_signal_width() {
    let config = ControllerConfig::new(PolicyKind::LinUcb, 3).with_mu(0.1);
    let mut controller = AdaptiveController::new(MAX_D, 12_000, config).unwrap();
    assert_eq!(controller.candidates(), &[2, 4, 8]);

    let mut problem = Problem::new(&[1.0, 1.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.0], 3);
    let events = run(&mut controller, &mut problem, 12_000);

    assert_eq!(events.len(), 1, "switches: {events:?}");
    let event = &events[0];
    assert_eq!((event.from, event.to), (2, 4));
    assert!(event.explore_samples > 20);
    assert!(event.score > event.threshold);
    assert_eq!(event.round % 10, 0);

    assert_eq!(controller.dimension(), 4);
    assert_eq!(controller.switch_events(), events.as_slice());
    assert_eq!(controller.round(), 12_001);
}

#[test]
fn test_dimension_never_decreases() {
    let config = ControllerConfig::new(PolicyKind::Randomized, 5).with_mu(0.3);
    let mut controller = AdaptiveController::new(MAX_D, 3_000, config).unwrap();
    let mut problem = Problem::new(&[0.5, 0.5, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0], 5);

    let mut last = controller.dimension();
    for _ in 0..3_000 {
        let ctx = problem.context();
        let action = controller.select_action(&ctx).unwrap();
        let rewards = problem.rewards(&ctx, &action);
        controller.update(&ctx, &action, &rewards, rewards[0]).unwrap();
        assert!(controller.dimension() >= last);
        assert!(controller.candidates().contains(&controller.dimension()));
        last = controller.dimension();
    }
    for pair in controller.switch_events().windows(2) {
        assert!(pair[0].to <= pair[1].from);
        assert!(pair[0].round < pair[1].round);
    }
}

/// Cross-moment samples come from explore rounds plus the randomized
/// policy's own uniform draws, nothing else.
#[test]
fn test_selective_accumulation_counts_uniform_play() {
    let config = ControllerConfig::new(PolicyKind::Randomized, 9).with_mu(0.2);
    let mut controller = AdaptiveController::new(MAX_D, 2_000, config).unwrap();
    let mut problem = Problem::new(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 9);

    let mut explore_rounds = 0;
    let mut internal_draws = 0;
    let mut covariance = DMatrix::<f64>::zeros(MAX_D, MAX_D);
    for _ in 0..2_000 {
        let ctx = problem.context();
        let before = controller.policy().uniform_draws().unwrap();
        let action = controller.select_action(&ctx).unwrap();
        match controller.last_round().unwrap() {
            RoundKind::Explore { .. } => explore_rounds += 1,
            RoundKind::Exploit => {
                let after = controller.policy().uniform_draws().unwrap();
                internal_draws += after - before;
            }
        }
        covariance += ctx.features().tr_mul(ctx.features());

        let rewards = problem.rewards(&ctx, &action);
        controller.update(&ctx, &action, &rewards, rewards[0]).unwrap();
    }

    assert!(explore_rounds > 0);
    assert!(internal_draws > 0);
    assert_eq!(controller.stats().explore_samples(), explore_rounds + internal_draws);
    assert_eq!(controller.stats().rounds_observed(), 2_000);

    let diff = (controller.stats().covariance() - &covariance).abs().max();
    assert!(diff < 1e-6);
}

#[test]
fn test_same_seed_same_run() {
    let make = || {
        let config = ControllerConfig::new(PolicyKind::Randomized, 21).with_mu(0.2);
        AdaptiveController::new(MAX_D, 1_500, config).unwrap()
    };
    let theta = [1.0, 1.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0];

    let mut a = make();
    let mut b = make();
    let mut pa = Problem::new(&theta, 21);
    let mut pb = Problem::new(&theta, 21);
    for _ in 0..1_500 {
        let ca = pa.context();
        let cb = pb.context();
        let xa = a.select_action(&ca).unwrap();
        let xb = b.select_action(&cb).unwrap();
        assert_eq!(xa, xb);
        let ra = pa.rewards(&ca, &xa);
        let rb = pb.rewards(&cb, &xb);
        a.update(&ca, &xa, &ra, ra[0]).unwrap();
        b.update(&cb, &xb, &rb, rb[0]).unwrap();
    }
    assert_eq!(a.switch_events(), b.switch_events());
    assert_eq!(a.stats(), b.stats());
}

#[test]
fn test_oracle_override_never_switches() {
    let config = ControllerConfig::new(PolicyKind::LinUcb, 4)
        .with_mu(0.1)
        .with_dimension_override(4);
    let mut controller = AdaptiveController::new(MAX_D, 2_000, config).unwrap();
    let mut problem = Problem::new(&[1.0, 1.0, 4.0, 4.0, 3.0, 3.0, 3.0, 3.0], 4);

    let events = run(&mut controller, &mut problem, 2_000);
    assert!(events.is_empty());
    assert_eq!(controller.dimension(), 4);
}
