//! Error types for turbulence synthesis.
//!
//! Every failure surfaces synchronously from the call that detected it.
//! Configuration errors (infeasible grid, stress or spectral inputs) cannot
//! be fixed by retrying, so nothing in the crate retries. Contract errors
//! (shape mismatches between collaborators) indicate a caller bug.
//!
//! Recoverable numerical degradation is not an error: see
//! [`ToleranceWarning`].

use crate::core_types::Component;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Errors raised while building inputs or synthesizing a field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// Grid or time-axis parameters are missing, inconsistent or degenerate.
    #[error("Invalid grid parameter '{parameter}': {reason}")]
    InvalidGrid {
        parameter: &'static str,
        reason: String,
    },

    /// Reynolds-stress targets cannot be realized at a grid point.
    #[error(
        "Infeasible Reynolds stress at point {point} ({criterion}): \
         r_uv={:.4}, r_uw={:.4}, r_vw={:.4}",
        .correlations[0], .correlations[1], .correlations[2]
    )]
    InfeasibleStress {
        point: usize,
        criterion: StressCriterion,
        correlations: [f64; 3],
    },

    /// Cross-spectral matrix is not positive semi-definite.
    #[error(
        "Cross-spectral matrix for component {component} at frequency index \
         {frequency_index} is not positive semi-definite (pivot {pivot:.3e} at column {column})"
    )]
    NotPositiveSemiDefinite {
        component: Component,
        frequency_index: usize,
        column: usize,
        pivot: f64,
    },

    /// Factor reconstruction error beyond the soft bound.
    #[error(
        "Cholesky residual {residual:.3e} exceeds bound {bound:.3e} for component \
         {component} at frequency index {frequency_index}"
    )]
    ResidualExceeded {
        component: Component,
        frequency_index: usize,
        residual: f64,
        bound: f64,
    },

    /// A synthesis or stress parameter is out of range.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// Coherence parameters are invalid.
    #[error("Invalid coherence model: {reason}")]
    InvalidCoherence { reason: String },

    /// A collaborator produced an array with the wrong shape.
    #[error("Shape mismatch for {what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A spectral model produced a negative or non-finite density.
    #[error(
        "Spectral density for component {component} at point {point}, frequency index \
         {frequency_index} is {value} (must be finite and non-negative)"
    )]
    NegativeSpectrum {
        component: Component,
        point: usize,
        frequency_index: usize,
        value: f64,
    },

    /// The inverse real FFT rejected its input.
    #[error("Inverse transform failed: {0}")]
    Transform(String),

    /// The worker pool for the frequency loop could not be created.
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl SynthesisError {
    /// Create an invalid grid parameter error.
    pub fn invalid_grid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidGrid {
            parameter,
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Whether the error reflects infeasible inputs rather than a caller bug.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::NegativeSpectrum { .. }
                | Self::Transform(_)
                | Self::WorkerPool(_)
        )
    }
}

/// Which joint-feasibility condition a stress target violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressCriterion {
    /// A correlation magnitude exceeds one.
    Magnitude,
    /// The two largest magnitudes exceed one plus the smallest.
    Overlap,
    /// Exactly one negative stress, and the magnitudes sum above one.
    Sign,
    /// All three stresses negative and the magnitudes sum above one. Phase
    /// locking cannot share one phase between all three components with
    /// these signs, so the locked fractions do not fit in the bins.
    NegativeTriple,
    /// Non-zero stress where the product of standard deviations is zero.
    ZeroVariance,
}

impl std::fmt::Display for StressCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StressCriterion::Magnitude => write!(f, "magnitude criterion"),
            StressCriterion::Overlap => write!(f, "overlap criterion"),
            StressCriterion::Sign => write!(f, "sign criterion"),
            StressCriterion::NegativeTriple => write!(f, "negative triple criterion"),
            StressCriterion::ZeroVariance => write!(f, "zero variance"),
        }
    }
}

/// A factorization whose residual exceeded the tolerance but stayed within
/// the soft bound. Logged and recorded on the output; synthesis proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceWarning {
    pub component: Component,
    pub frequency_index: usize,
    pub residual: f64,
}
