//! adaptdim-sim - Simulated bandit environments
//!
//! Provides the [`Environment`] protocol, a sparse [`LinearBandit`]
//! simulator, and the [`play`] driver that runs any
//! [`adaptdim_core::Learner`] for a fixed horizon.

pub mod environment;
pub mod error;
pub mod linear;
pub mod runner;

pub use environment::{Environment, Feedback};
pub use error::{Result, SimError};
pub use linear::LinearBandit;
pub use runner::{RunReport, Trajectory, play};
