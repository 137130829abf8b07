//! Per-round contexts and dimension-truncated views.
//!
//! A [`Context`] owns the `K × max_d` feature matrix for one round, one row
//! per candidate action. Policies never see the owned matrix directly; they
//! receive a [`ContextView`] that exposes only the leading `d` columns.

use nalgebra::{DMatrix, DMatrixView, DVector};

use crate::error::{AdaptError, Result};

/// Number of actions in a composite action. Plain contextual bandits play one.
pub const SLATE_LEN: usize = 1;

/// Feature matrix for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    name: String,
    features: DMatrix<f64>,
}

impl Context {
    /// Create a context from a `K × max_d` feature matrix.
    pub fn new(name: impl Into<String>, features: DMatrix<f64>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }

    /// Build a context from row-major action features. Every row must have
    /// the same length.
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = rows.iter().find(|r| r.len() != ncols) {
            return Err(AdaptError::FeatureWidthMismatch {
                expected: ncols,
                actual: row.len(),
            });
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Ok(Self::new(name, DMatrix::from_row_slice(rows.len(), ncols, &data)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of candidate actions (`K`).
    pub fn num_actions(&self) -> usize {
        self.features.nrows()
    }

    /// Composite action size (`L`).
    pub fn slate_len(&self) -> usize {
        SLATE_LEN
    }

    /// Full feature dimensionality (`max_d`).
    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    /// The full `K × max_d` feature matrix.
    pub fn features(&self) -> &DMatrix<f64> {
        &self.features
    }

    /// Read-only view over the first `d` feature columns.
    ///
    /// Row count and name are preserved. Fails unless `0 < d <= max_d`.
    pub fn truncate(&self, d: usize) -> Result<ContextView<'_>> {
        if d == 0 || d > self.dim() {
            return Err(AdaptError::DimensionOutOfRange {
                requested: d,
                max: self.dim(),
            });
        }
        Ok(ContextView {
            name: &self.name,
            features: self.features.columns(0, d),
        })
    }

    /// View over every feature column.
    pub fn view(&self) -> ContextView<'_> {
        ContextView {
            name: &self.name,
            features: self.features.columns(0, self.dim()),
        }
    }
}

/// Borrowed view of a context restricted to its leading columns.
#[derive(Debug, Clone, Copy)]
pub struct ContextView<'a> {
    name: &'a str,
    features: DMatrixView<'a, f64>,
}

impl<'a> ContextView<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn num_actions(&self) -> usize {
        self.features.nrows()
    }

    pub fn slate_len(&self) -> usize {
        SLATE_LEN
    }

    /// Visible dimensionality `d`.
    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &DMatrixView<'a, f64> {
        &self.features
    }

    /// Feature vector of action `i` as an owned column vector.
    pub fn row(&self, i: usize) -> DVector<f64> {
        self.features.row(i).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> Context {
        Context::from_rows(
            "round-1",
            &[
                vec![1.0, 2.0, 3.0, 4.0],
                vec![5.0, 6.0, 7.0, 8.0],
                vec![9.0, 10.0, 11.0, 12.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_accessors() {
        let ctx = sample_context();
        assert_eq!(ctx.num_actions(), 3);
        assert_eq!(ctx.dim(), 4);
        assert_eq!(ctx.slate_len(), 1);
        assert_eq!(ctx.name(), "round-1");
    }

    #[test]
    fn test_truncate_keeps_leading_columns() {
        let ctx = sample_context();
        for d in 1..=ctx.dim() {
            let view = ctx.truncate(d).unwrap();
            assert_eq!(view.num_actions(), 3);
            assert_eq!(view.dim(), d);
            assert_eq!(view.name(), "round-1");
            for i in 0..ctx.num_actions() {
                for j in 0..d {
                    assert_eq!(view.features()[(i, j)], ctx.features()[(i, j)]);
                }
            }
        }
    }

    #[test]
    fn test_truncate_rejects_zero_and_too_wide() {
        let ctx = sample_context();
        assert!(matches!(
            ctx.truncate(0),
            Err(AdaptError::DimensionOutOfRange { requested: 0, max: 4 })
        ));
        assert!(matches!(
            ctx.truncate(5),
            Err(AdaptError::DimensionOutOfRange { requested: 5, max: 4 })
        ));
    }

    #[test]
    fn test_row_returns_action_features() {
        let ctx = sample_context();
        let view = ctx.truncate(2).unwrap();
        assert_eq!(view.row(1), DVector::from_vec(vec![5.0, 6.0]));
    }

    #[test]
    fn test_full_view_matches_features() {
        let ctx = sample_context();
        let view = ctx.view();
        assert_eq!(view.dim(), 4);
        assert_eq!(view.features().clone_owned(), *ctx.features());
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let err = Context::from_rows("r", &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            AdaptError::FeatureWidthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }
}
