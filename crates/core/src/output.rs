//! Synthesized velocity field and its statistics
//!
//! # Layout
//!
//! `velocity[((c * n_z + iz) * n_y + iy) * n_t + t]`: component-major, then
//! height (bottom row first), then lateral position, with time innermost.
//! Binary writers index into this array directly, so the layout is part of
//! the public contract.

use crate::core_types::{Component, StressPair, N_COMP};
use crate::error::{Result, SynthesisError, ToleranceWarning};
use crate::grid::Grid;
use crate::profile::MeanProfile;
use crate::stress::CouplingSummary;
use realfft::num_complex::Complex64;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

/// Metadata describing how a field was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Seed of the run random source; reproduces the run when reused
    pub seed: u64,
    /// Whether the seed was supplied rather than drawn from entropy
    pub seeded: bool,
    pub coherence_model: String,
    pub factorizer: String,
    /// Length of the synthesized series before windowing
    pub n_t_synth: usize,
    /// Offset of the output window in the synthesized series
    pub i0_out: usize,
    pub coupling: CouplingSummary,
}

/// Velocity time series on the grid, mean included.
#[derive(Debug, Clone)]
pub struct TurbulenceField {
    grid: Grid,
    mean: MeanProfile,
    velocity: Vec<f32>,
    info: RunInfo,
    warnings: Vec<ToleranceWarning>,
}

impl TurbulenceField {
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] unless `velocity` holds
    /// `3 * n_p * n_t_out` samples.
    pub fn new(
        grid: Grid,
        mean: MeanProfile,
        velocity: Vec<f32>,
        info: RunInfo,
        warnings: Vec<ToleranceWarning>,
    ) -> Result<Self> {
        let expected = N_COMP * grid.n_p() * grid.n_t_out();
        if velocity.len() != expected {
            return Err(SynthesisError::shape_mismatch(
                "velocity",
                expected,
                velocity.len(),
            ));
        }
        Ok(Self {
            grid,
            mean,
            velocity,
            info,
            warnings,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn mean_profile(&self) -> &MeanProfile {
        &self.mean
    }

    /// The full `[comp][iz][iy][t]` array.
    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }

    pub fn into_velocity(self) -> Vec<f32> {
        self.velocity
    }

    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    /// Factorizations whose residual exceeded the tolerance.
    pub fn warnings(&self) -> &[ToleranceWarning] {
        &self.warnings
    }

    /// True if any factorization needed the soft residual bound.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of output time steps.
    pub fn n_t(&self) -> usize {
        self.grid.n_t_out()
    }

    pub fn dt(&self) -> f64 {
        self.grid.dt()
    }

    /// Sample times `t * dt` of the output window (s).
    pub fn time(&self) -> Vec<f64> {
        (0..self.n_t()).map(|t| t as f64 * self.dt()).collect()
    }

    /// Subscripts `(iz, iy)` of the hub point.
    pub fn hub_index(&self) -> (usize, usize) {
        self.grid.hub_index()
    }

    /// All samples of one component.
    pub fn component(&self, comp: Component) -> &[f32] {
        let len = self.grid.n_p() * self.n_t();
        &self.velocity[comp.index() * len..(comp.index() + 1) * len]
    }

    /// Time series of one component at one point.
    pub fn series(&self, comp: Component, point: usize) -> &[f32] {
        let n_t = self.n_t();
        let start = (comp.index() * self.grid.n_p() + point) * n_t;
        &self.velocity[start..start + n_t]
    }

    /// Time series at the hub point.
    pub fn hub_series(&self, comp: Component) -> &[f32] {
        self.series(comp, self.grid.hub_point())
    }

    /// Fluctuation about the mean profile at one point.
    pub fn fluctuation(&self, comp: Component, point: usize) -> Vec<f64> {
        let mean = self.mean.get(comp, point);
        self.series(comp, point)
            .iter()
            .map(|&v| f64::from(v) - mean)
            .collect()
    }

    fn mean_product(&self, a: Component, b: Component, point: usize) -> f64 {
        let fa = self.fluctuation(a, point);
        let fb = self.fluctuation(b, point);
        fa.iter().zip(&fb).map(|(x, y)| x * y).sum::<f64>() / fa.len() as f64
    }

    /// Time-averaged `⟨c'²⟩` per point, `[comp][point]`.
    pub fn tke(&self) -> Vec<f64> {
        Component::ALL
            .iter()
            .flat_map(|&c| (0..self.grid.n_p()).map(move |p| (c, p)))
            .map(|(c, p)| self.mean_product(c, c, p))
            .collect()
    }

    /// Streamwise turbulence intensity `std(u') / U` per point.
    pub fn turbulence_intensity(&self) -> Vec<f64> {
        (0..self.grid.n_p())
            .map(|p| {
                self.mean_product(Component::U, Component::U, p).sqrt()
                    / self.mean.get(Component::U, p)
            })
            .collect()
    }

    /// Realized Reynolds stress `⟨a'b'⟩` per point.
    pub fn reynolds_stress(&self, pair: StressPair) -> Vec<f64> {
        let (a, b) = pair.components();
        (0..self.grid.n_p())
            .map(|p| self.mean_product(a, b, p))
            .collect()
    }

    pub fn upvp(&self) -> Vec<f64> {
        self.reynolds_stress(StressPair::UV)
    }

    pub fn upwp(&self) -> Vec<f64> {
        self.reynolds_stress(StressPair::UW)
    }

    pub fn vpwp(&self) -> Vec<f64> {
        self.reynolds_stress(StressPair::VW)
    }
}

/// One-sided power spectral density of `series`, bins `k = 0..n/2`.
///
/// Uses the same normalization as the synthesizer, so a series synthesized
/// from `S` has a periodogram whose expectation is `S` at every bin
/// `1..n/2`.
///
/// # Errors
///
/// [`SynthesisError::Transform`] if the transform fails.
pub fn periodogram(series: &[f64], dt: f64) -> Result<Vec<f64>> {
    let n = series.len();
    if n < 2 {
        return Err(SynthesisError::shape_mismatch("periodogram series", 2, n));
    }
    let fft = RealFftPlanner::<f64>::new().plan_fft_forward(n);
    let mut input = series.to_vec();
    let mut spectrum: Vec<Complex64> = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum)
        .map_err(|e| SynthesisError::Transform(e.to_string()))?;

    let scale = 2.0 * dt / n as f64;
    Ok(spectrum
        .iter()
        .take(n / 2)
        .map(|x| x.norm_sqr() * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::phases::RandomSource;
    use crate::profile::{ProfileModel, UniformProfile};
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn field() -> TurbulenceField {
        let grid = Grid::new(
            &GridConfig {
                n_y: Some(2),
                n_z: Some(1),
                height: None,
                dz: Some(1.0),
                width: Some(4.0),
                n_t: Some(4),
                time_sec: None,
                dt: Some(0.5),
                ..Default::default()
            },
            &mut RandomSource::from_seed(0),
        )
        .unwrap();
        let mean = UniformProfile::streamwise(10.0).mean_profile(&grid).unwrap();
        #[rustfmt::skip]
        let velocity = vec![
            // u
            11.0, 9.0, 11.0, 9.0,
            10.0, 10.0, 10.0, 10.0,
            // v
            1.0, -1.0, 1.0, -1.0,
            0.0, 0.0, 0.0, 0.0,
            // w
            -0.5, 0.5, -0.5, 0.5,
            0.0, 0.0, 0.0, 0.0,
        ];
        let info = RunInfo {
            seed: 0,
            seeded: true,
            coherence_model: "none".into(),
            factorizer: "packed".into(),
            n_t_synth: 4,
            i0_out: 0,
            coupling: CouplingSummary::default(),
        };
        TurbulenceField::new(grid, mean, velocity, info, Vec::new()).unwrap()
    }

    #[test]
    fn accessors_follow_layout() {
        let f = field();
        assert_eq!(f.series(Component::V, 0), &[1.0, -1.0, 1.0, -1.0]);
        assert_eq!(f.component(Component::W).len(), 8);
        assert_eq!(f.time(), vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(f.hub_index(), (0, 1));
        assert!(!f.is_degraded());
    }

    #[test]
    fn statistics_of_known_series() {
        let f = field();
        let tke = f.tke();
        assert_relative_eq!(tke[0], 1.0);
        assert_relative_eq!(tke[1], 0.0);
        assert_relative_eq!(tke[2], 1.0);
        assert_relative_eq!(tke[4], 0.25);
        assert_relative_eq!(f.turbulence_intensity()[0], 0.1);
        assert_relative_eq!(f.upvp()[0], 1.0);
        assert_relative_eq!(f.upwp()[0], -0.5);
        assert_relative_eq!(f.vpwp()[0], -0.5);
        assert_relative_eq!(f.vpwp()[1], 0.0);
    }

    #[test]
    fn periodogram_recovers_sinusoid_power() {
        let n = 256;
        let dt = 0.1;
        let df = 1.0 / (n as f64 * dt);
        let k = 10;
        let amplitude = 2.0_f64;
        let series: Vec<f64> = (0..n)
            .map(|i| amplitude * (TAU * k as f64 * df * i as f64 * dt).cos())
            .collect();
        let psd = periodogram(&series, dt).unwrap();
        assert_eq!(psd.len(), n / 2);
        // Variance A²/2 concentrated in one bin of width df
        assert_relative_eq!(psd[k] * df, amplitude * amplitude / 2.0, epsilon = 1e-9);
        assert!(psd[k + 3] < 1e-12);
    }
}
