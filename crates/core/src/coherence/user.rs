//! Coherence given explicitly as an array

use super::CoherenceModel;
use crate::core_types::{Component, N_COMP};
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;

/// Symmetric tolerance between `coh[i][j]` and `coh[j][i]`.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Coherence array `coh[comp][i][j][freq]` of shape `3 x n_p x n_p x n_f`.
#[derive(Debug, Clone)]
pub struct UserCoherence {
    n_p: usize,
    n_f: usize,
    data: Vec<f64>,
}

impl UserCoherence {
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] for a wrong length, and
    /// [`SynthesisError::InvalidCoherence`] for values outside `[0, 1]` or an
    /// asymmetric array.
    pub fn new(grid: &Grid, data: Vec<f64>) -> Result<Self> {
        let (n_p, n_f) = (grid.n_p(), grid.n_f());
        let expected = N_COMP * n_p * n_p * n_f;
        if data.len() != expected {
            return Err(SynthesisError::shape_mismatch("coherence", expected, data.len()));
        }
        if let Some(bad) = data.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!("coherence values must lie in [0, 1], found {bad}"),
            });
        }
        let model = Self { n_p, n_f, data };
        for comp in Component::ALL {
            for i in 0..n_p {
                for j in 0..i {
                    let asymmetric = (0..n_f).find(|&k| {
                        (model.get(comp, i, j, k) - model.get(comp, j, i, k)).abs()
                            > SYMMETRY_TOLERANCE
                    });
                    if let Some(k) = asymmetric {
                        return Err(SynthesisError::InvalidCoherence {
                            reason: format!(
                                "coherence for {comp} is not symmetric between points {i} and {j} at frequency index {k}"
                            ),
                        });
                    }
                }
            }
        }
        Ok(model)
    }

    #[inline]
    fn get(&self, comp: Component, i: usize, j: usize, k: usize) -> f64 {
        self.data[((comp.index() * self.n_p + i) * self.n_p + j) * self.n_f + k]
    }
}

impl CoherenceModel for UserCoherence {
    fn name(&self) -> &'static str {
        "user"
    }

    fn cross_coherence(&self, comp: Component, freq_index: usize, _f: f64, i: usize, j: usize) -> f64 {
        self.get(comp, i, j, freq_index)
    }
}
