//! Cholesky factorization of packed cross-spectral matrices
//!
//! Every frequency bin needs a lower-triangular `H` with `H·Hᵗ = C`. Two
//! interchangeable backends implement the same contract:
//!
//! - [`DenseFactorizer`]: expands to a full `nalgebra` matrix and runs a
//!   row-oriented Cholesky. Straightforward reference implementation.
//! - [`PackedFactorizer`]: right-looking column Cholesky operating in place
//!   on packed storage, without the `n²` expansion.
//!
//! Both apply the same semi-definite pivot rule: a pivot within
//! `PIVOT_EPSILON · max(diag C)` of zero produces a zero column (the matrix
//! is rank deficient but still PSD); a pivot below `-PIVOT_EPSILON ·
//! max(diag C)` or a non-finite pivot means `C` is not positive
//! semi-definite. Nothing is clipped or regularized.

mod dense;
mod packed;

pub use dense::DenseFactorizer;
pub use packed::PackedFactorizer;

use crate::core_types::Component;
use crate::error::SynthesisError;
use crate::spectra::packed::{unpack_lower, unpack_symmetric, PackedEntries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative size of a pivot treated as exactly zero.
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Failing pivot of a factorization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotFailure {
    pub column: usize,
    pub pivot: f64,
}

impl PivotFailure {
    /// Attach the component and frequency bin the matrix belongs to.
    pub fn into_error(self, component: Component, frequency_index: usize) -> SynthesisError {
        SynthesisError::NotPositiveSemiDefinite {
            component,
            frequency_index,
            column: self.column,
            pivot: self.pivot,
        }
    }
}

/// Outcome of testing one pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pivot {
    /// Square root of a positive pivot
    Positive(f64),
    /// Numerically zero pivot; the column is zero
    Zero,
}

#[inline]
fn classify_pivot(d: f64, zero_threshold: f64, column: usize) -> Result<Pivot, PivotFailure> {
    if !d.is_finite() || d < -zero_threshold {
        Err(PivotFailure { column, pivot: d })
    } else if d <= zero_threshold {
        Ok(Pivot::Zero)
    } else {
        Ok(Pivot::Positive(d.sqrt()))
    }
}

/// Largest diagonal entry of a packed symmetric matrix.
fn max_diagonal(packed: &[f64], n: usize) -> f64 {
    PackedEntries::new(n)
        .filter(|&(_, i, j)| i == j)
        .map(|(k, _, _)| packed[k])
        .fold(0.0, f64::max)
}

/// Cholesky backend.
pub trait Factorizer: Send + Sync {
    /// Backend name for logs and run info.
    fn name(&self) -> &'static str;

    /// Factor packed symmetric `c` (`n x n`) into packed lower-triangular
    /// `out`. Both slices have length `n (n + 1) / 2`.
    ///
    /// # Errors
    ///
    /// The first pivot that shows `c` is not positive semi-definite. The
    /// contents of `out` are unspecified on failure.
    fn factor(&self, c: &[f64], n: usize, out: &mut [f64]) -> Result<(), PivotFailure>;
}

/// Available factorization backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorizerKind {
    /// Full-matrix reference implementation
    Dense,
    /// In-place packed implementation
    #[default]
    Packed,
}

/// Create the selected backend.
pub fn create_factorizer(kind: FactorizerKind) -> Box<dyn Factorizer> {
    let factorizer: Box<dyn Factorizer> = match kind {
        FactorizerKind::Dense => Box::new(DenseFactorizer),
        FactorizerKind::Packed => Box::new(PackedFactorizer),
    };
    debug!("Using {} Cholesky backend", factorizer.name());
    factorizer
}

/// Relative Frobenius residual `‖H·Hᵗ − C‖ / ‖C‖` (zero when `C = 0`).
pub fn relative_residual(c: &[f64], h: &[f64], n: usize) -> f64 {
    let c_full = unpack_symmetric(c, n);
    let norm = c_full.norm();
    let h_full = unpack_lower(h, n);
    let diff = (&h_full * h_full.transpose() - c_full).norm();
    if norm == 0.0 {
        diff
    } else {
        diff / norm
    }
}
