use adaptdim_core::PolicyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAdaptdimConfig {
    #[serde(default)]
    pub experiment: RawExperimentSection,

    #[serde(default)]
    pub learner: RawLearnerSection,

    #[serde(default)]
    pub output: RawOutputSection,
}

/// Simulated problem as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawExperimentSection {
    pub horizon: Option<u64>,
    pub iterations: Option<u64>,
    pub dim: Option<usize>,
    pub sparsity: Option<usize>,
    pub arms: Option<usize>,
    pub noise: Option<f64>,
}

/// Learner choice as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLearnerSection {
    pub algorithm: Option<AlgorithmKind>,
    pub base: Option<PolicyKind>,
    pub param: Option<f64>,
    pub schedule: Option<u64>,
}

/// Result persistence as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOutputSection {
    pub record_every: Option<u64>,
    pub results_dir: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AdaptdimConfig {
    #[serde(default)]
    pub experiment: ExperimentSection,

    #[serde(default)]
    pub learner: LearnerSection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentSection {
    /// Rounds per iteration
    pub horizon: u64,

    /// Independent repetitions, seeded 0, 1, ...
    pub iterations: u64,

    /// Feature dimension of the simulator
    pub dim: usize,

    /// Non-zero leading weights in the simulator
    pub sparsity: usize,

    /// Actions per round
    pub arms: usize,

    /// Standard deviation of the reward noise
    pub noise: f64,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            iterations: 1,
            dim: DEFAULT_DIM,
            sparsity: DEFAULT_DIM,
            arms: DEFAULT_ARMS,
            noise: DEFAULT_NOISE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearnerSection {
    pub algorithm: AlgorithmKind,

    /// Base policy inside the controller
    pub base: PolicyKind,

    /// Tuning parameter: `delta` for LinUCB, `mu` for the controller
    pub param: Option<f64>,

    /// Rounds between dimension-switch tests
    pub schedule: u64,
}

impl Default for LearnerSection {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::Adaptive,
            base: PolicyKind::Randomized,
            param: None,
            schedule: adaptdim_core::config::DEFAULT_SCHEDULE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    /// Rounds between trajectory samples
    pub record_every: u64,

    /// Root directory for result files
    pub results_dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            record_every: DEFAULT_RECORD_EVERY,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }
}

/// Which learner an experiment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// LinUCB on every feature
    Linucb,
    /// Adaptive-dimension controller
    #[serde(alias = "limecb")]
    #[value(alias = "limecb")]
    Adaptive,
    /// Controller pinned to the true sparsity
    Oracle,
}

impl AlgorithmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linucb => "linucb",
            Self::Adaptive => "adaptive",
            Self::Oracle => "oracle",
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_HORIZON: u64 = 50_000;
pub const DEFAULT_DIM: usize = 20;
pub const DEFAULT_ARMS: usize = 5;
pub const DEFAULT_NOISE: f64 = 0.1;
pub const DEFAULT_RECORD_EVERY: u64 = 100;
pub const DEFAULT_RESULTS_DIR: &str = "./results";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AdaptdimConfig::default();
        assert_eq!(config.experiment.horizon, 50_000);
        assert_eq!(config.experiment.dim, 20);
        assert_eq!(config.experiment.sparsity, 20);
        assert_eq!(config.experiment.arms, 5);
        assert_eq!(config.learner.algorithm, AlgorithmKind::Adaptive);
        assert_eq!(config.learner.base, PolicyKind::Randomized);
        assert!(config.learner.param.is_none());
        assert_eq!(config.learner.schedule, 10);
        assert_eq!(config.output.results_dir, PathBuf::from("./results"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AdaptdimConfig::default();
        config.learner.algorithm = AlgorithmKind::Oracle;
        config.learner.base = PolicyKind::LinUcb;
        config.learner.param = Some(0.05);
        config.experiment.noise = 0.5;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AdaptdimConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[learner]
algorithm = "limecb"
base = "minimonster"
"#;
        let raw: RawAdaptdimConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.learner.algorithm, Some(AlgorithmKind::Adaptive));
        assert_eq!(raw.learner.base, Some(PolicyKind::Randomized));
        assert!(raw.learner.param.is_none());
        assert!(raw.experiment.horizon.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawAdaptdimConfig = toml::from_str("").unwrap();
        assert!(raw.experiment.dim.is_none());
        assert!(raw.output.results_dir.is_none());
    }
}
