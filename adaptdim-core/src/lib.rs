//! adaptdim-core - Adaptive-dimension contextual bandits
//!
//! The [`AdaptiveController`] runs a base online-learning policy on the first
//! `d` features of each context, collects unbiased statistics from uniformly
//! random rounds, and periodically tests whether a larger working dimension
//! would remove measurable bias. When the test fires it moves to the larger
//! dimension and rebuilds the base policy from scratch.

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod exploration;
pub mod learner;
pub mod linalg;
pub mod policy;
pub mod stats;
pub mod switch;

pub use config::{ControllerConfig, ParamValue, Params};
pub use context::{Context, ContextView};
pub use controller::AdaptiveController;
pub use error::{AdaptError, LinalgError, Result};
pub use exploration::{ExplorationSchedule, Explorer, RoundKind};
pub use learner::{Baseline, Learner};
pub use policy::{BasePolicy, CompositeAction, PolicyKind, PolicySpec, RegressionState};
pub use stats::{GlobalStats, StatsSummary};
pub use switch::{CandidateOutcome, SwitchDecision, SwitchEvent, SwitchTest, TestPass};
