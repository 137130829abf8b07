use std::path::PathBuf;
use std::time::Instant;

use adaptdim_core::{
    AdaptiveController, Baseline, ControllerConfig, Learner, PolicyKind, PolicySpec,
};
use adaptdim_sim::{LinearBandit, play};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::config::{AdaptdimConfig, AlgorithmKind, ConfigLoader, RawAdaptdimConfig};
use crate::results::{self, IterationSummary, RunSummary};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Extra config file layered over the user and project files
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rounds per iteration
    #[arg(short = 'T', long)]
    pub horizon: Option<u64>,

    /// Independent repetitions
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Feature dimension
    #[arg(short, long)]
    pub dim: Option<usize>,

    /// Non-zero leading weights of the simulator
    #[arg(short, long)]
    pub sparsity: Option<usize>,

    /// Actions per round
    #[arg(short = 'K', long)]
    pub arms: Option<usize>,

    /// Reward noise standard deviation
    #[arg(long)]
    pub noise: Option<f64>,

    #[arg(short, long, value_enum)]
    pub algorithm: Option<AlgorithmKind>,

    /// Base policy: linucb or randomized (alias minimonster)
    #[arg(short, long)]
    pub base: Option<PolicyKind>,

    /// delta for LinUCB, mu for the adaptive controller
    #[arg(short, long)]
    pub param: Option<f64>,

    /// Rounds between dimension-switch tests
    #[arg(long)]
    pub schedule: Option<u64>,

    /// Rounds between trajectory samples
    #[arg(long)]
    pub record_every: Option<u64>,

    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

impl RunArgs {
    fn overrides(&self) -> RawAdaptdimConfig {
        let mut raw = RawAdaptdimConfig::default();
        raw.experiment.horizon = self.horizon;
        raw.experiment.iterations = self.iterations;
        raw.experiment.dim = self.dim;
        raw.experiment.sparsity = self.sparsity;
        raw.experiment.arms = self.arms;
        raw.experiment.noise = self.noise;
        raw.learner.algorithm = self.algorithm;
        raw.learner.base = self.base;
        raw.learner.param = self.param;
        raw.learner.schedule = self.schedule;
        raw.output.record_every = self.record_every;
        raw.output.results_dir = self.results_dir.clone();
        raw
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = ConfigLoader::load_with(args.config.as_deref(), args.overrides())?;
    let summary = execute(&config)?;
    let last = summary.iterations.last();
    println!(
        "{} finished {} iteration(s); final regret {:?}",
        summary.learner,
        summary.iterations.len(),
        last.and_then(|i| i.final_regret)
    );
    Ok(())
}

/// Run every iteration of the configured experiment and persist the results.
pub fn execute(config: &AdaptdimConfig) -> Result<RunSummary> {
    let Some(param) = config.learner.param else {
        bail!("No tuning parameter given; pass --param or set learner.param");
    };
    let e = &config.experiment;
    if e.sparsity > e.dim {
        bail!("sparsity {} exceeds dimension {}", e.sparsity, e.dim);
    }
    if e.iterations == 0 {
        bail!("iterations must be at least 1");
    }

    let started_at = Utc::now();
    let mut rewards = Vec::new();
    let mut regrets = Vec::new();
    let mut iterations = Vec::new();
    let mut learner_name = String::new();

    for seed in 0..e.iterations {
        let mut env = LinearBandit::new(e.dim, e.arms, e.noise, e.sparsity, seed)
            .context("Failed to build simulator")?;
        let mut learner = build_learner(config, param, seed)?;
        learner_name = learner.name();
        info!(seed, learner = %learner_name, "starting iteration");

        let start = Instant::now();
        let report = play(
            learner.as_mut(),
            &mut env,
            e.horizon,
            config.output.record_every,
        )?;
        let wall_time_secs = start.elapsed().as_secs_f64();

        iterations.push(IterationSummary {
            seed,
            final_dim: learner.dimension(),
            final_reward: report.trajectory.final_reward(),
            final_regret: report.trajectory.final_regret(),
            wall_time_secs,
            switches: learner.switch_events().to_vec(),
            stats: learner.stats_summary(),
        });
        rewards.push(report.trajectory.rewards);
        regrets.push(report.trajectory.regrets);
    }

    let summary = RunSummary {
        started_at,
        learner: learner_name,
        param,
        config: config.clone(),
        iterations,
    };
    let dir = results::output_dir(config);
    let files = results::save(
        &dir,
        &results::file_stem(config, param),
        &rewards,
        &regrets,
        &summary,
    )?;
    info!(
        rewards = %files.rewards.display(),
        regrets = %files.regrets.display(),
        summary = %files.summary.display(),
        "results written"
    );
    Ok(summary)
}

/// Build the learner for one iteration; `param` is `delta` or `mu` depending
/// on the algorithm and base policy.
fn build_learner(config: &AdaptdimConfig, param: f64, seed: u64) -> Result<Box<dyn Learner>> {
    let e = &config.experiment;
    let l = &config.learner;
    let learner: Box<dyn Learner> = match l.algorithm {
        AlgorithmKind::Linucb => {
            let spec = PolicySpec {
                dim: e.dim,
                horizon: e.horizon,
                seed,
                delta: param,
                mu: adaptdim_core::config::DEFAULT_MU,
            };
            Box::new(Baseline::new(PolicyKind::LinUcb, &spec)?)
        }
        AlgorithmKind::Adaptive => {
            let controller_config = ControllerConfig::new(l.base, seed)
                .with_mu(param)
                .with_schedule(l.schedule);
            Box::new(AdaptiveController::new(e.dim, e.horizon, controller_config)?)
        }
        AlgorithmKind::Oracle => {
            let controller_config = ControllerConfig::new(l.base, seed)
                .with_schedule(l.schedule)
                .with_dimension_override(e.sparsity);
            let controller_config = match l.base {
                PolicyKind::LinUcb => controller_config.with_delta(param),
                PolicyKind::Randomized => controller_config.with_mu(param),
            };
            Box::new(AdaptiveController::new(e.dim, e.horizon, controller_config)?)
        }
    };
    Ok(learner)
}
