//! Random phase generation
//!
//! Independent uniform unit phasors `X[comp][point][freq]` are the only
//! source of randomness in the synthesized field. Components v and w are
//! later rewritten in place by the stress coupler; after that the field is
//! frozen and shared read-only by every frequency worker.

mod random;

pub use random::RandomSource;

use crate::core_types::{Component, N_COMP};
use crate::error::{Result, SynthesisError};
use realfft::num_complex::Complex64;
use std::f64::consts::TAU;

/// Accepted deviation of a phasor's magnitude from one.
const UNIT_TOLERANCE: f64 = 1e-9;

/// Unit-magnitude complex phases, laid out `[comp][point][freq]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseField {
    n_p: usize,
    n_f: usize,
    data: Vec<Complex64>,
}

impl PhaseField {
    /// Draw independent phases uniform on `[0, 2π)`.
    ///
    /// Draw order is component, then point, then frequency, so a fixed seed
    /// always maps to the same phases.
    pub fn generate_uniform(n_p: usize, n_f: usize, rng: &mut RandomSource) -> Self {
        let data = (0..N_COMP * n_p * n_f)
            .map(|_| Complex64::from_polar(1.0, TAU * rng.uniform()))
            .collect();
        Self { n_p, n_f, data }
    }

    /// Wrap caller-supplied phases. Every entry must have unit magnitude.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] if `data.len() != 3 * n_p * n_f`,
    /// [`SynthesisError::InvalidParameter`] if an entry's magnitude is not 1.
    pub fn from_vec(n_p: usize, n_f: usize, data: Vec<Complex64>) -> Result<Self> {
        let expected = N_COMP * n_p * n_f;
        if data.len() != expected {
            return Err(SynthesisError::shape_mismatch("phases", expected, data.len()));
        }
        if let Some((i, z)) = data
            .iter()
            .enumerate()
            .find(|(_, z)| {
                let deviation = (z.norm() - 1.0).abs();
                deviation.is_nan() || deviation > UNIT_TOLERANCE
            })
        {
            return Err(SynthesisError::InvalidParameter {
                parameter: "phases",
                reason: format!("entry {i} has magnitude {}, expected 1", z.norm()),
            });
        }
        Ok(Self { n_p, n_f, data })
    }

    pub fn n_p(&self) -> usize {
        self.n_p
    }

    pub fn n_f(&self) -> usize {
        self.n_f
    }

    #[inline]
    fn offset(&self, comp: Component, point: usize) -> usize {
        (comp.index() * self.n_p + point) * self.n_f
    }

    /// Phases of one point over all frequencies.
    pub fn point(&self, comp: Component, point: usize) -> &[Complex64] {
        let start = self.offset(comp, point);
        &self.data[start..start + self.n_f]
    }

    pub fn point_mut(&mut self, comp: Component, point: usize) -> &mut [Complex64] {
        let start = self.offset(comp, point);
        &mut self.data[start..start + self.n_f]
    }

    #[inline]
    pub fn get(&self, comp: Component, point: usize, freq: usize) -> Complex64 {
        self.data[self.offset(comp, point) + freq]
    }

    #[inline]
    pub fn set(&mut self, comp: Component, point: usize, freq: usize, value: Complex64) {
        let idx = self.offset(comp, point) + freq;
        self.data[idx] = value;
    }

    /// Gather the phase vector of one component at one frequency.
    pub fn column_into(&self, comp: Component, freq: usize, out: &mut [Complex64]) {
        for (p, x) in out.iter_mut().enumerate().take(self.n_p) {
            *x = self.get(comp, p, freq);
        }
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }
}
