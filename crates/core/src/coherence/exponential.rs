//! Exponential-decay coherence
//!
//! `coh = exp(-a (r / z_m)^p sqrt((f r / u_m)^2 + b^2))` with `r` the point
//! separation, `z_m` the mean height and `u_m` the mean streamwise speed of
//! the two points. Pair geometry does not depend on frequency, so it is
//! tabulated once in packed order and reused for every bin.

use super::CoherenceModel;
use crate::config::ExponentialCoherenceParams;
use crate::core_types::Component;
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;
use crate::profile::MeanProfile;
use crate::spectra::packed::{packed_index, packed_len, PackedEntries};

#[derive(Debug, Clone, Copy)]
struct PairGeometry {
    /// Frequency-independent part of the exponent, `(r / z_m)^p`
    height_factor: f64,
    /// `r / u_m` (s)
    travel_time: f64,
}

/// Exponential coherence with per-component decay coefficients.
#[derive(Debug, Clone)]
pub struct ExponentialCoherence {
    params: ExponentialCoherenceParams,
    n_p: usize,
    pairs: Vec<PairGeometry>,
}

impl ExponentialCoherence {
    /// Tabulate pair geometry for `grid`.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidCoherence`] for negative or non-finite
    /// coefficients, a non-zero exponent with points at or below z = 0, or a
    /// non-positive mean speed at any point.
    pub fn new(params: ExponentialCoherenceParams, grid: &Grid, mean: &MeanProfile) -> Result<Self> {
        for (comp, d) in Component::ALL.iter().zip(params.decay.iter()) {
            if !(d.a.is_finite() && d.a >= 0.0 && d.b.is_finite() && d.b >= 0.0) {
                return Err(SynthesisError::InvalidCoherence {
                    reason: format!(
                        "decay coefficients for {comp} must be finite and non-negative (a = {}, b = {})",
                        d.a, d.b
                    ),
                });
            }
        }
        let p = params.exponent;
        if !p.is_finite() {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!("exponent must be finite, got {p}"),
            });
        }
        if p != 0.0 && grid.z().iter().any(|&z| z <= 0.0) {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!("exponent {p} requires every grid height to be above zero"),
            });
        }
        if let Some(point) = mean
            .component(Component::U)
            .iter()
            .position(|&u| !(u.is_finite() && u > 0.0))
        {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!(
                    "mean streamwise speed must be positive, got {} at point {point}",
                    mean.get(Component::U, point)
                ),
            });
        }

        let n_p = grid.n_p();
        let u = mean.component(Component::U);
        let mut pairs = Vec::with_capacity(packed_len(n_p));
        for (_, i, j) in PackedEntries::new(n_p) {
            let r = grid.dist(i, j);
            let z_m = 0.5 * (grid.point_z(i) + grid.point_z(j));
            let u_m = 0.5 * (u[i] + u[j]);
            pairs.push(PairGeometry {
                height_factor: if p == 0.0 { 1.0 } else { (r / z_m).powf(p) },
                travel_time: r / u_m,
            });
        }

        Ok(Self { params, n_p, pairs })
    }

    pub fn params(&self) -> &ExponentialCoherenceParams {
        &self.params
    }
}

impl CoherenceModel for ExponentialCoherence {
    fn name(&self) -> &'static str {
        "exponential"
    }

    fn cross_coherence(&self, comp: Component, _freq_index: usize, f: f64, i: usize, j: usize) -> f64 {
        let decay = self.params.decay[comp.index()];
        let pair = self.pairs[packed_index(self.n_p, i, j)];
        (-decay.a * pair.height_factor * (f * pair.travel_time).hypot(decay.b)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecayCoefficients, GridConfig};
    use crate::phases::RandomSource;
    use crate::profile::{FnProfile, ProfileModel, UniformProfile};
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(
            &GridConfig {
                center: 20.0,
                n_y: Some(3),
                n_z: Some(3),
                width: Some(10.0),
                height: Some(10.0),
                ..Default::default()
            },
            &mut RandomSource::from_seed(0),
        )
        .unwrap()
    }

    fn params(a: f64, b: f64, p: f64) -> ExponentialCoherenceParams {
        let d = DecayCoefficients::new(a, b);
        ExponentialCoherenceParams {
            decay: [d, d, d],
            exponent: p,
        }
    }

    #[test]
    fn matches_closed_form() {
        let g = grid();
        let mean = UniformProfile::streamwise(10.0).mean_profile(&g).unwrap();
        let coh = ExponentialCoherence::new(params(12.0, 0.001, 0.0), &g, &mean).unwrap();
        // (iz=0, iy=0) to (iz=0, iy=2): 10 m apart
        let f = 0.2;
        let expected = (-12.0 * ((f * 10.0 / 10.0_f64).powi(2) + 0.001_f64.powi(2)).sqrt()).exp();
        assert_relative_eq!(coh.cross_coherence(Component::U, 0, f, 0, 2), expected, epsilon = 1e-12);
        assert_relative_eq!(
            coh.cross_coherence(Component::U, 0, f, 2, 0),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn decays_with_frequency_and_distance() {
        let g = grid();
        let mean = UniformProfile::streamwise(8.0).mean_profile(&g).unwrap();
        let coh = ExponentialCoherence::new(params(8.0, 0.0, 0.0), &g, &mean).unwrap();
        let near = coh.cross_coherence(Component::V, 0, 0.1, 0, 1);
        let far = coh.cross_coherence(Component::V, 0, 0.1, 0, 8);
        let high = coh.cross_coherence(Component::V, 0, 1.0, 0, 1);
        assert!(far < near && high < near);
        assert!((0.0..=1.0).contains(&far));
    }

    #[test]
    fn height_exponent_uses_mean_height() {
        let g = grid();
        let mean = FnProfile::new(|c, _, z| if c == Component::U { z / 2.0 } else { 0.0 })
            .mean_profile(&g)
            .unwrap();
        let coh = ExponentialCoherence::new(params(5.0, 0.0, 0.5), &g, &mean).unwrap();
        // (iz=0, iy=0) at z=15 to (iz=2, iy=0) at z=25: r=10, z_m=20, u_m=10
        let f = 0.3;
        let expected = (-5.0 * (10.0_f64 / 20.0).sqrt() * (f * 10.0 / 10.0)).exp();
        assert_relative_eq!(coh.cross_coherence(Component::W, 0, f, 0, 6), expected, epsilon = 1e-12);
    }

    #[test]
    fn rejects_exponent_with_ground_level_points() {
        let g = Grid::new(
            &GridConfig {
                center: 5.0,
                height: Some(10.0),
                ..Default::default()
            },
            &mut RandomSource::from_seed(0),
        )
        .unwrap();
        let mean = UniformProfile::streamwise(10.0).mean_profile(&g).unwrap();
        assert!(matches!(
            ExponentialCoherence::new(params(5.0, 0.0, 0.3), &g, &mean),
            Err(SynthesisError::InvalidCoherence { .. })
        ));
        assert!(ExponentialCoherence::new(params(5.0, 0.0, 0.0), &g, &mean).is_ok());
    }

    #[test]
    fn rejects_stagnant_flow() {
        let g = grid();
        let mean = UniformProfile::streamwise(0.0).mean_profile(&g).unwrap();
        assert!(ExponentialCoherence::new(params(5.0, 0.0, 0.0), &g, &mean).is_err());
    }
}
