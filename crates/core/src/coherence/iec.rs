//! IEC 61400-1 coherence
//!
//! Only the streamwise component is coherent:
//! `coh_u = exp(-a sqrt((f r / u_hub)^2 + (0.12 r / L)^2))`. The standard
//! gives no lateral or vertical coherence, so v and w are uncorrelated
//! between distinct points.

use super::CoherenceModel;
use crate::core_types::Component;
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;
use crate::spectra::packed::{packed_index, packed_len, PackedEntries};
use serde::{Deserialize, Serialize};

/// Resolved IEC coherence constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IecCoherenceParams {
    /// Coherence decrement `a`
    pub decrement: f64,
    /// Coherence scale parameter `L` (m)
    pub length_scale: f64,
}

impl IecCoherenceParams {
    /// Constants for an edition of the standard at `hub_height`.
    ///
    /// The turbulence scale parameter is `Λ = 0.7 min(z_hub, z_cap)`, with
    /// `z_cap` = 30 m (edition 2) or 60 m (edition 3). Both editions use
    /// `L = 3.5 Λ`; only the decrement and the cap differ.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidCoherence`] for an unknown edition or a
    /// non-positive hub height.
    pub fn for_edition(edition: u8, hub_height: f64) -> Result<Self> {
        if !(hub_height.is_finite() && hub_height > 0.0) {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!("IEC hub height must be positive, got {hub_height}"),
            });
        }
        let (decrement, l_factor, lambda_cap) = match edition {
            2 => (8.8, 3.5, 21.0),
            3 => (12.0, 3.5, 42.0),
            other => {
                return Err(SynthesisError::InvalidCoherence {
                    reason: format!("unsupported IEC edition {other} (expected 2 or 3)"),
                })
            }
        };
        let lambda = (0.7 * hub_height).min(lambda_cap);
        Ok(Self {
            decrement,
            length_scale: l_factor * lambda,
        })
    }
}

/// IEC coherence on u, none on v and w.
#[derive(Debug, Clone)]
pub struct IecCoherence {
    params: IecCoherenceParams,
    hub_speed: f64,
    n_p: usize,
    /// Point separations in packed order
    dist: Vec<f64>,
}

impl IecCoherence {
    /// # Errors
    ///
    /// [`SynthesisError::InvalidCoherence`] for a non-positive hub speed.
    pub fn new(params: IecCoherenceParams, hub_speed: f64, grid: &Grid) -> Result<Self> {
        if !(hub_speed.is_finite() && hub_speed > 0.0) {
            return Err(SynthesisError::InvalidCoherence {
                reason: format!("IEC hub speed must be positive, got {hub_speed}"),
            });
        }
        let n_p = grid.n_p();
        let mut dist = Vec::with_capacity(packed_len(n_p));
        dist.extend(PackedEntries::new(n_p).map(|(_, i, j)| grid.dist(i, j)));
        Ok(Self {
            params,
            hub_speed,
            n_p,
            dist,
        })
    }

    pub fn params(&self) -> &IecCoherenceParams {
        &self.params
    }
}

impl CoherenceModel for IecCoherence {
    fn name(&self) -> &'static str {
        "iec"
    }

    fn cross_coherence(&self, comp: Component, _freq_index: usize, f: f64, i: usize, j: usize) -> f64 {
        if comp != Component::U {
            return 0.0;
        }
        let r = self.dist[packed_index(self.n_p, i, j)];
        let IecCoherenceParams {
            decrement,
            length_scale,
        } = self.params;
        (-decrement * (f * r / self.hub_speed).hypot(0.12 * r / length_scale)).exp()
    }

    fn is_uncorrelated(&self, comp: Component) -> bool {
        comp != Component::U
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::phases::RandomSource;
    use approx::assert_relative_eq;

    #[test]
    fn edition_constants() {
        let ed2 = IecCoherenceParams::for_edition(2, 80.0).unwrap();
        assert_relative_eq!(ed2.decrement, 8.8);
        assert_relative_eq!(ed2.length_scale, 3.5 * 21.0);

        let ed3 = IecCoherenceParams::for_edition(3, 40.0).unwrap();
        assert_relative_eq!(ed3.decrement, 12.0);
        assert_relative_eq!(ed3.length_scale, 3.5 * 28.0, epsilon = 1e-12);

        // Below both caps the editions share one length scale.
        let low = [2, 3].map(|e| IecCoherenceParams::for_edition(e, 20.0).unwrap().length_scale);
        assert_relative_eq!(low[0], low[1]);
        assert_relative_eq!(low[1], 3.5 * 14.0, epsilon = 1e-12);

        assert!(IecCoherenceParams::for_edition(4, 80.0).is_err());
        assert!(IecCoherenceParams::for_edition(3, 0.0).is_err());
    }

    #[test]
    fn lateral_and_vertical_are_incoherent() {
        let g = Grid::new(&GridConfig::default(), &mut RandomSource::from_seed(0)).unwrap();
        let params = IecCoherenceParams::for_edition(3, g.z_hub()).unwrap();
        let coh = IecCoherence::new(params, 11.0, &g).unwrap();

        assert_eq!(coh.cross_coherence(Component::V, 1, 0.1, 0, 1), 0.0);
        assert_eq!(coh.cross_coherence(Component::W, 1, 0.1, 0, 1), 0.0);

        // Adjacent points 15 m apart
        let r = 15.0;
        let expected = (-12.0 * ((0.1 * r / 11.0_f64).powi(2) + (0.12 * r / (3.5 * 42.0_f64)).powi(2)).sqrt()).exp();
        assert_relative_eq!(coh.cross_coherence(Component::U, 1, 0.1, 0, 1), expected, epsilon = 1e-12);
    }
}
