//! Controller configuration.
//!
//! Experiments hand the controller an opaque [`Params`] mapping. Only a few
//! keys are recognized:
//!
//! | Key | Meaning | Default |
//! |-----|---------|---------|
//! | `base` | base policy tag (`linucb` or `randomized`) | required |
//! | `seed` | seed for the exploration random source | required |
//! | `delta` | confidence parameter of the UCB policy | `0.05` |
//! | `mu` | exploration rate | `0.0` |
//! | `schedule` | rounds between dimension-switch tests | `10` |
//! | `override` | force a single working dimension | none |
//!
//! Unrecognized keys are ignored so experiment drivers can pass their full
//! parameter set through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, Result};
use crate::policy::PolicyKind;

/// Default confidence parameter for the UCB policy.
pub const DEFAULT_DELTA: f64 = 0.05;

/// Default exploration rate.
pub const DEFAULT_MU: f64 = 0.0;

/// Default number of rounds between dimension-switch tests.
pub const DEFAULT_SCHEDULE: u64 = 10;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Opaque string-keyed parameter mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn float(&self, key: &'static str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(ParamValue::Text(s)) => s.trim().parse().map(Some).map_err(|_| {
                AdaptError::InvalidParam {
                    key,
                    reason: format!("expected a number, got {s:?}"),
                }
            }),
        }
    }

    fn unsigned(&self, key: &'static str) -> Result<Option<u64>> {
        let invalid = |reason: String| AdaptError::InvalidParam { key, reason };
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Int(v)) => u64::try_from(*v)
                .map(Some)
                .map_err(|_| invalid(format!("expected a non-negative integer, got {v}"))),
            Some(ParamValue::Float(v)) if v.fract() == 0.0 && *v >= 0.0 => Ok(Some(*v as u64)),
            Some(ParamValue::Float(v)) => {
                Err(invalid(format!("expected a non-negative integer, got {v}")))
            }
            Some(ParamValue::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(format!("expected a non-negative integer, got {s:?}"))),
        }
    }

    fn text(&self, key: &'static str) -> Option<String> {
        match self.get(key)? {
            ParamValue::Text(s) => Some(s.clone()),
            ParamValue::Int(v) => Some(v.to_string()),
            ParamValue::Float(v) => Some(v.to_string()),
        }
    }
}

/// Typed controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Base policy variant.
    pub base: PolicyKind,
    /// Seed for the exploration random source.
    pub seed: u64,
    /// Confidence parameter of the UCB policy.
    #[serde(default = "default_delta")]
    pub delta: f64,
    /// Exploration rate, shared by the controller and the randomized policy.
    #[serde(default = "default_mu")]
    pub mu: f64,
    /// Rounds between dimension-switch tests.
    #[serde(default = "default_schedule")]
    pub schedule: u64,
    /// Force a single working dimension (oracle baseline).
    #[serde(default, rename = "override")]
    pub dimension_override: Option<usize>,
}

fn default_delta() -> f64 {
    DEFAULT_DELTA
}

fn default_mu() -> f64 {
    DEFAULT_MU
}

fn default_schedule() -> u64 {
    DEFAULT_SCHEDULE
}

impl ControllerConfig {
    /// Configuration with defaults for everything but the required keys.
    pub fn new(base: PolicyKind, seed: u64) -> Self {
        Self {
            base,
            seed,
            delta: DEFAULT_DELTA,
            mu: DEFAULT_MU,
            schedule: DEFAULT_SCHEDULE,
            dimension_override: None,
        }
    }

    #[must_use]
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: u64) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_dimension_override(mut self, d: usize) -> Self {
        self.dimension_override = Some(d);
        self
    }

    /// Parse the recognized keys out of a parameter mapping and validate them.
    pub fn from_params(params: &Params) -> Result<Self> {
        let base = params
            .text("base")
            .ok_or(AdaptError::MissingParam("base"))?
            .parse::<PolicyKind>()?;
        let seed = params
            .unsigned("seed")?
            .ok_or(AdaptError::MissingParam("seed"))?;

        let config = Self {
            base,
            seed,
            delta: params.float("delta")?.unwrap_or(DEFAULT_DELTA),
            mu: params.float("mu")?.unwrap_or(DEFAULT_MU),
            schedule: params.unsigned("schedule")?.unwrap_or(DEFAULT_SCHEDULE),
            dimension_override: params.unsigned("override")?.map(|d| d as usize),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        check_mu(self.mu)?;
        check_delta(self.delta)?;
        if self.schedule == 0 {
            return Err(AdaptError::InvalidParam {
                key: "schedule",
                reason: "must be at least 1".into(),
            });
        }
        if self.dimension_override == Some(0) {
            return Err(AdaptError::InvalidParam {
                key: "override",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Exploration rates live in `[0, 1]`.
pub(crate) fn check_mu(mu: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&mu) {
        return Err(AdaptError::InvalidParam {
            key: "mu",
            reason: format!("must lie in [0, 1], got {mu}"),
        });
    }
    Ok(())
}

/// Confidence levels live in the open interval `(0, 1)`.
pub(crate) fn check_delta(delta: f64) -> Result<()> {
    if !(delta > 0.0 && delta < 1.0) {
        return Err(AdaptError::InvalidParam {
            key: "delta",
            reason: format!("must lie in (0, 1), got {delta}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params_applies_defaults() {
        let params = Params::new().with("base", "linucb").with("seed", 7_i64);
        let config = ControllerConfig::from_params(&params).unwrap();

        assert_eq!(config.base, PolicyKind::LinUcb);
        assert_eq!(config.seed, 7);
        assert_eq!(config.delta, DEFAULT_DELTA);
        assert_eq!(config.mu, DEFAULT_MU);
        assert_eq!(config.schedule, DEFAULT_SCHEDULE);
        assert!(config.dimension_override.is_none());
    }

    #[test]
    fn test_from_params_reads_recognized_keys() {
        let params = Params::new()
            .with("base", "randomized")
            .with("seed", 3_i64)
            .with("mu", 0.25)
            .with("schedule", 20_i64)
            .with("override", 4_i64)
            .with("unrelated", "ignored");
        let config = ControllerConfig::from_params(&params).unwrap();

        assert_eq!(config.base, PolicyKind::Randomized);
        assert_eq!(config.mu, 0.25);
        assert_eq!(config.schedule, 20);
        assert_eq!(config.dimension_override, Some(4));
    }

    #[test]
    fn test_missing_base_is_fatal() {
        let params = Params::new().with("seed", 1_i64);
        let err = ControllerConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, AdaptError::MissingParam("base")));
    }

    #[test]
    fn test_missing_seed_is_fatal() {
        let params = Params::new().with("base", "linucb");
        let err = ControllerConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, AdaptError::MissingParam("seed")));
    }

    #[test]
    fn test_unknown_base_is_rejected() {
        let params = Params::new().with("base", "epsilon").with("seed", 1_i64);
        let err = ControllerConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, AdaptError::UnknownPolicy(tag) if tag == "epsilon"));
    }

    #[test]
    fn test_mu_out_of_range_is_rejected() {
        let params = Params::new()
            .with("base", "randomized")
            .with("seed", 1_i64)
            .with("mu", 1.5);
        let err = ControllerConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidParam { key: "mu", .. }));
    }

    #[test]
    fn test_zero_schedule_is_rejected() {
        let config = ControllerConfig::new(PolicyKind::LinUcb, 0).with_schedule(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let params = Params::new()
            .with("base", "linucb")
            .with("seed", "11")
            .with("delta", "0.1");
        let config = ControllerConfig::from_params(&params).unwrap();
        assert_eq!(config.seed, 11);
        assert_eq!(config.delta, 0.1);
    }

    #[test]
    fn test_params_deserialize_from_json() {
        let params: Params =
            serde_json::from_str(r#"{"base": "linucb", "seed": 2, "delta": 0.2}"#).unwrap();
        assert_eq!(params.get("seed"), Some(&ParamValue::Int(2)));
        assert_eq!(params.get("delta"), Some(&ParamValue::Float(0.2)));
        assert!(params.contains("base"));
    }

    #[test]
    fn test_config_deserialize_from_toml() {
        let config: ControllerConfig = toml::from_str(
            r#"
base = "randomized"
seed = 5
mu = 0.1
override = 8
"#,
        )
        .unwrap();
        assert_eq!(config.base, PolicyKind::Randomized);
        assert_eq!(config.mu, 0.1);
        assert_eq!(config.delta, DEFAULT_DELTA);
        assert_eq!(config.dimension_override, Some(8));
    }
}
