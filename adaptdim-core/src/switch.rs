//! Dimension-switch hypothesis test.
//!
//! Each pass walks the candidate dimensions in order and asks whether moving
//! from the working dimension `d` to a larger `d'` would remove measurable
//! bias. The test statistic compares the pseudo-inverse of the full `d'`
//! covariance block against one constrained to its top-left `d × d` block:
//!
//! ```text
//! R     = pinv(T) - pinv(S)
//! score = bᵀ R S R b / N²
//! ```
//!
//! A candidate is accepted when `score > 0.01 · sqrt(d') / N` and
//! `N > 5 · d'`. At most one switch is committed per pass.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::linalg::pinv;
use crate::stats::GlobalStats;

/// Candidates at or beyond this multiple of the working dimension are skipped.
pub const MAX_JUMP_FACTOR: usize = 16;

/// Scale of the significance threshold `SIGNIFICANCE · sqrt(d') / N`.
pub const SIGNIFICANCE: f64 = 0.01;

/// Minimum exploration samples per candidate feature.
pub const MIN_SAMPLES_PER_DIM: u64 = 5;

/// Powers of two below `max_d`, followed by `max_d`.
///
/// Exponents run over `1..floor(log2(max_d))`, so `8` gives `[2, 4, 8]` and
/// `20` gives `[2, 4, 8, 20]`.
pub fn candidate_dimensions(max_d: usize) -> Vec<usize> {
    if max_d == 0 {
        return Vec::new();
    }
    let floor_log2 = usize::BITS - 1 - max_d.leading_zeros();
    let mut dims: Vec<usize> = (1..floor_log2).map(|i| 1usize << i).collect();
    dims.push(max_d);
    dims
}

/// A committed dimension change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchEvent {
    /// Round at which the switch was committed.
    pub round: u64,
    pub from: usize,
    pub to: usize,
    pub score: f64,
    pub threshold: f64,
    /// Exploration samples available when the test fired.
    pub explore_samples: u64,
}

/// What happened to one candidate during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    /// Not larger than the working dimension.
    NotLarger,
    /// At least `MAX_JUMP_FACTOR` times the working dimension.
    TooLarge,
    /// A switch was already committed earlier in this pass.
    AfterSwitch,
    /// A pseudo-inverse failed; the candidate was skipped.
    Degenerate,
    /// Tested and rejected.
    Rejected { score: f64, threshold: f64 },
    /// Tested and accepted.
    Accepted { score: f64, threshold: f64 },
}

/// Result of one test pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchDecision {
    Stable,
    Switch { to: usize, score: f64, threshold: f64 },
}

/// Full record of a test pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPass {
    pub decision: SwitchDecision,
    pub outcomes: Vec<(usize, CandidateOutcome)>,
}

/// Periodic dimension-switch test over a fixed candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchTest {
    candidates: Vec<usize>,
}

impl SwitchTest {
    pub fn new(candidates: Vec<usize>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Run one pass against the accumulated statistics.
    pub fn evaluate(&self, d: usize, stats: &GlobalStats) -> TestPass {
        let mut decision = SwitchDecision::Stable;
        let mut outcomes = Vec::with_capacity(self.candidates.len());

        for &candidate in &self.candidates {
            let outcome = if candidate <= d {
                CandidateOutcome::NotLarger
            } else if candidate >= MAX_JUMP_FACTOR * d {
                CandidateOutcome::TooLarge
            } else if decision != SwitchDecision::Stable {
                CandidateOutcome::AfterSwitch
            } else {
                match score(d, candidate, stats) {
                    None => {
                        warn!(d, candidate, "pseudo-inverse failed, skipping candidate");
                        CandidateOutcome::Degenerate
                    }
                    Some(score) => {
                        let n = stats.explore_samples();
                        let threshold = SIGNIFICANCE * (candidate as f64).sqrt() / n as f64;
                        debug!(d, candidate, score, threshold, samples = n, "switch test");
                        if score > threshold && n > MIN_SAMPLES_PER_DIM * candidate as u64 {
                            decision = SwitchDecision::Switch {
                                to: candidate,
                                score,
                                threshold,
                            };
                            CandidateOutcome::Accepted { score, threshold }
                        } else {
                            CandidateOutcome::Rejected { score, threshold }
                        }
                    }
                }
            };
            outcomes.push((candidate, outcome));
        }

        TestPass { decision, outcomes }
    }
}

/// Test statistic for moving from `d` to `candidate`; `None` if a pinv fails.
///
/// With no exploration samples the score is not finite; the sample-count
/// condition rejects it regardless.
fn score(d: usize, candidate: usize, stats: &GlobalStats) -> Option<f64> {
    let sigma = stats.covariance();
    let s = sigma.view((0, 0), (candidate, candidate)).clone_owned();

    let mut t = DMatrix::zeros(candidate, candidate);
    t.view_mut((0, 0), (d, d))
        .copy_from(&sigma.view((0, 0), (d, d)));

    let r = pinv(&t).ok()? - pinv(&s).ok()?;
    let b = stats.cross_moment().rows(0, candidate).clone_owned();
    let rb = &r * &b;
    let n = stats.explore_samples() as f64;
    Some(rb.dot(&(&s * &rb)) / (n * n))
}
