use super::types::{
    AdaptdimConfig, AlgorithmKind, DEFAULT_ARMS, DEFAULT_DIM, DEFAULT_HORIZON, DEFAULT_NOISE,
    DEFAULT_RECORD_EVERY, DEFAULT_RESULTS_DIR, ExperimentSection, LearnerSection, OutputSection,
    RawAdaptdimConfig, RawExperimentSection, RawLearnerSection, RawOutputSection,
};
use adaptdim_core::PolicyKind;
use adaptdim_core::config::DEFAULT_SCHEDULE;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + explicit file)
    pub fn load(explicit: Option<&Path>) -> Result<AdaptdimConfig> {
        Self::load_with(explicit, RawAdaptdimConfig::default())
    }

    /// Load merged configuration with command-line values layered on top
    pub fn load_with(
        explicit: Option<&Path>,
        overrides: RawAdaptdimConfig,
    ) -> Result<AdaptdimConfig> {
        let mut raw = RawAdaptdimConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && let Some(user_config) = Self::read_layer(&user_path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_layer(&Self::project_config_path())? {
            raw = Self::merge_raw(raw, project_config);
        }

        // Layer 3: Explicit --config file, which must exist
        if let Some(path) = explicit {
            let config = Self::read_layer(path)?
                .with_context(|| format!("Config file not found: {}", path.display()))?;
            raw = Self::merge_raw(raw, config);
        }

        // Layer 4: Command-line flags
        raw = Self::merge_raw(raw, overrides);

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("adaptdim").join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with ADAPTDIM_PROJECT_CONFIG env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ADAPTDIM_PROJECT_CONFIG") {
            PathBuf::from(path)
        } else {
            PathBuf::from("adaptdim.toml")
        }
    }

    fn read_layer(path: &Path) -> Result<Option<RawAdaptdimConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(Some(config))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawAdaptdimConfig, overlay: RawAdaptdimConfig) -> RawAdaptdimConfig {
        RawAdaptdimConfig {
            experiment: RawExperimentSection {
                horizon: overlay.experiment.horizon.or(base.experiment.horizon),
                iterations: overlay.experiment.iterations.or(base.experiment.iterations),
                dim: overlay.experiment.dim.or(base.experiment.dim),
                sparsity: overlay.experiment.sparsity.or(base.experiment.sparsity),
                arms: overlay.experiment.arms.or(base.experiment.arms),
                noise: overlay.experiment.noise.or(base.experiment.noise),
            },
            learner: RawLearnerSection {
                algorithm: overlay.learner.algorithm.or(base.learner.algorithm),
                base: overlay.learner.base.or(base.learner.base),
                param: overlay.learner.param.or(base.learner.param),
                schedule: overlay.learner.schedule.or(base.learner.schedule),
            },
            output: RawOutputSection {
                record_every: overlay.output.record_every.or(base.output.record_every),
                results_dir: overlay.output.results_dir.or(base.output.results_dir),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawAdaptdimConfig) -> AdaptdimConfig {
        let dim = raw.experiment.dim.unwrap_or(DEFAULT_DIM);
        AdaptdimConfig {
            experiment: ExperimentSection {
                horizon: raw.experiment.horizon.unwrap_or(DEFAULT_HORIZON),
                iterations: raw.experiment.iterations.unwrap_or(1),
                dim,
                // Dense problem unless told otherwise
                sparsity: raw.experiment.sparsity.unwrap_or(dim),
                arms: raw.experiment.arms.unwrap_or(DEFAULT_ARMS),
                noise: raw.experiment.noise.unwrap_or(DEFAULT_NOISE),
            },
            learner: LearnerSection {
                algorithm: raw.learner.algorithm.unwrap_or(AlgorithmKind::Adaptive),
                base: raw.learner.base.unwrap_or(PolicyKind::Randomized),
                param: raw.learner.param,
                schedule: raw.learner.schedule.unwrap_or(DEFAULT_SCHEDULE),
            },
            output: OutputSection {
                record_every: raw.output.record_every.unwrap_or(DEFAULT_RECORD_EVERY),
                results_dir: raw
                    .output
                    .results_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            },
        }
    }
}
