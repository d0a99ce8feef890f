//! Cross-spectral matrix assembly
//!
//! `C[i][j] = coh(i, j) sqrt(S_i S_j)` off the diagonal and `C[i][i] = S_i`
//! exactly, written straight into packed lower-triangular storage.

use super::packed::{packed_len, PackedEntries};
use super::SpectralTensor;
use crate::coherence::CoherenceModel;
use crate::core_types::Component;

/// Scratch space for one packed cross-spectral matrix.
///
/// Each frequency worker owns one buffer. The last assembled
/// `(component, frequency)` is remembered, so asking for the same matrix
/// again is free.
#[derive(Debug, Clone)]
pub struct CrossSpectrumBuffer {
    n_p: usize,
    packed: Vec<f64>,
    sqrt_s: Vec<f64>,
    key: Option<(Component, usize)>,
}

impl CrossSpectrumBuffer {
    pub fn new(n_p: usize) -> Self {
        Self {
            n_p,
            packed: vec![0.0; packed_len(n_p)],
            sqrt_s: vec![0.0; n_p],
            key: None,
        }
    }

    /// Packed cross-spectral matrix of `comp` at frequency index `k`.
    ///
    /// # Panics
    ///
    /// If `tensor` was built for a different number of points.
    pub fn assemble(
        &mut self,
        tensor: &SpectralTensor,
        coherence: &dyn CoherenceModel,
        comp: Component,
        k: usize,
        f: f64,
    ) -> &[f64] {
        assert_eq!(tensor.n_p(), self.n_p, "cross-spectrum buffer size");
        if self.key == Some((comp, k)) {
            return &self.packed;
        }

        for (p, s) in self.sqrt_s.iter_mut().enumerate() {
            *s = tensor.get(comp, p, k).sqrt();
        }

        let diagonal_only = coherence.is_uncorrelated(comp);
        for (idx, i, j) in PackedEntries::new(self.n_p) {
            self.packed[idx] = if i == j {
                tensor.get(comp, i, k)
            } else if diagonal_only {
                0.0
            } else {
                let geometric_mean = self.sqrt_s[i] * self.sqrt_s[j];
                if geometric_mean == 0.0 {
                    0.0
                } else {
                    coherence.cross_coherence(comp, k, f, i, j) * geometric_mean
                }
            };
        }
        self.key = Some((comp, k));
        &self.packed
    }
}
