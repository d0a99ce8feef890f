//! Auto-spectral density tensor `S[comp][point][freq]`

use crate::core_types::{Component, N_COMP};
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;

/// Per-point, per-frequency power spectral density of each component.
///
/// Units are velocity²/Hz. Entries are validated finite and non-negative on
/// construction and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralTensor {
    n_p: usize,
    n_f: usize,
    df: f64,
    data: Vec<f64>,
}

impl SpectralTensor {
    /// Wrap a `[comp][point][freq]` array evaluated on `grid`.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] for a wrong length and
    /// [`SynthesisError::NegativeSpectrum`] for the first negative or
    /// non-finite entry.
    pub fn from_vec(grid: &Grid, data: Vec<f64>) -> Result<Self> {
        let (n_p, n_f) = (grid.n_p(), grid.n_f());
        let expected = N_COMP * n_p * n_f;
        if data.len() != expected {
            return Err(SynthesisError::shape_mismatch("spectra", expected, data.len()));
        }
        if let Some(idx) = data.iter().position(|s| !s.is_finite() || *s < 0.0) {
            let comp = Component::from_index(idx / (n_p * n_f)).unwrap_or(Component::W);
            return Err(SynthesisError::NegativeSpectrum {
                component: comp,
                point: (idx / n_f) % n_p,
                frequency_index: idx % n_f,
                value: data[idx],
            });
        }
        Ok(Self {
            n_p,
            n_f,
            df: grid.df(),
            data,
        })
    }

    pub fn n_p(&self) -> usize {
        self.n_p
    }

    pub fn n_f(&self) -> usize {
        self.n_f
    }

    pub fn df(&self) -> f64 {
        self.df
    }

    #[inline]
    pub fn get(&self, comp: Component, point: usize, freq: usize) -> f64 {
        self.data[(comp.index() * self.n_p + point) * self.n_f + freq]
    }

    /// Spectrum of one point over all frequencies.
    pub fn point(&self, comp: Component, point: usize) -> &[f64] {
        let start = (comp.index() * self.n_p + point) * self.n_f;
        &self.data[start..start + self.n_f]
    }

    /// Variance carried by the synthesized series, `Σ_{k≥1} S[k] df`.
    ///
    /// The DC bin is excluded: the synthesized fluctuation has zero mean.
    pub fn variance(&self, comp: Component, point: usize) -> f64 {
        self.point(comp, point).iter().skip(1).sum::<f64>() * self.df
    }

    /// Standard deviation, `sqrt(variance)`.
    pub fn std_dev(&self, comp: Component, point: usize) -> f64 {
        self.variance(comp, point).sqrt()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Source of the auto-spectra.
///
/// Closed-form spectral models are not part of this crate; anything that can
/// produce `S[comp][point][freq]` at the grid frequencies implements this.
pub trait SpectralModel: Send + Sync {
    /// Evaluate the spectra at every grid point and frequency `grid.f()`.
    fn spectra(&self, grid: &Grid) -> Result<SpectralTensor>;
}

/// Spectra given directly as a `[comp][point][freq]` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySpectrum {
    data: Vec<f64>,
}

impl ArraySpectrum {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl SpectralModel for ArraySpectrum {
    fn spectra(&self, grid: &Grid) -> Result<SpectralTensor> {
        SpectralTensor::from_vec(grid, self.data.clone())
    }
}

/// Spectra from a closure `(component, f, y, z) -> S`.
///
/// The closure is never called at `f = 0`; the DC bin is set to zero since
/// it does not contribute to the synthesized fluctuation.
pub struct FnSpectrum<F> {
    f: F,
}

impl<F> FnSpectrum<F>
where
    F: Fn(Component, f64, f64, f64) -> f64 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> SpectralModel for FnSpectrum<F>
where
    F: Fn(Component, f64, f64, f64) -> f64 + Send + Sync,
{
    fn spectra(&self, grid: &Grid) -> Result<SpectralTensor> {
        let freqs = grid.f();
        let mut data = Vec::with_capacity(N_COMP * grid.n_p() * grid.n_f());
        for comp in Component::ALL {
            for p in 0..grid.n_p() {
                let (y, z) = grid.point_coords(p);
                data.extend(freqs.iter().enumerate().map(|(k, &f)| {
                    if k == 0 {
                        0.0
                    } else {
                        (self.f)(comp, f, y, z)
                    }
                }));
            }
        }
        SpectralTensor::from_vec(grid, data)
    }
}
