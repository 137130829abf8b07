//! Result files for one experiment.
//!
//! Layout under the results root:
//!
//! ```text
//! T=<horizon>_d=<dim>_s=<sparsity>_K=<arms>_sig=<noise>/
//!     <alg>_<base>_<param>_rewards.out
//!     <alg>_<base>_<param>_regrets.out
//!     <alg>_<base>_<param>_summary.json
//! ```
//!
//! The `.out` files hold one whitespace-separated row per iteration in
//! `%.18e` notation.

use std::io::Write;
use std::path::{Path, PathBuf};

use adaptdim_core::{StatsSummary, SwitchEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AdaptdimConfig;

/// Per-experiment directory for the given configuration.
pub fn output_dir(config: &AdaptdimConfig) -> PathBuf {
    let e = &config.experiment;
    config.output.results_dir.join(format!(
        "T={}_d={}_s={}_K={}_sig={:.1}",
        e.horizon, e.dim, e.sparsity, e.arms, e.noise
    ))
}

/// File name prefix shared by every output of one run.
pub fn file_stem(config: &AdaptdimConfig, param: f64) -> String {
    format!(
        "{}_{}_{:.5}",
        config.learner.algorithm, config.learner.base, param
    )
}

/// Scientific notation with 18 fractional digits and a signed two-digit exponent.
pub fn format_sci(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() {
            "nan".to_string()
        } else if x > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let raw = format!("{x:.18e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

/// Write one row per entry of `rows`.
pub fn write_rows(path: &Path, rows: &[Vec<f64>]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        let line: Vec<String> = row.iter().copied().map(format_sci).collect();
        writeln!(file, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Outcome of one seeded iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub seed: u64,
    pub final_dim: usize,
    pub final_reward: Option<f64>,
    pub final_regret: Option<f64>,
    pub wall_time_secs: f64,
    pub switches: Vec<SwitchEvent>,
    pub stats: Option<StatsSummary>,
}

/// Everything recorded about one experiment besides the trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub learner: String,
    pub param: f64,
    pub config: AdaptdimConfig,
    pub iterations: Vec<IterationSummary>,
}

/// Paths written by [`save`].
#[derive(Debug, Clone)]
pub struct SavedFiles {
    pub rewards: PathBuf,
    pub regrets: PathBuf,
    pub summary: PathBuf,
}

/// Persist trajectories and the summary, creating the directory if needed.
pub fn save(
    dir: &Path,
    stem: &str,
    rewards: &[Vec<f64>],
    regrets: &[Vec<f64>],
    summary: &RunSummary,
) -> Result<SavedFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let files = SavedFiles {
        rewards: dir.join(format!("{stem}_rewards.out")),
        regrets: dir.join(format!("{stem}_regrets.out")),
        summary: dir.join(format!("{stem}_summary.json")),
    };
    write_rows(&files.rewards, rewards)?;
    write_rows(&files.regrets, regrets)?;
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&files.summary, json)
        .with_context(|| format!("Failed to write {}", files.summary.display()))?;
    Ok(files)
}
