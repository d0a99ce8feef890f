//! Stress target providers

use super::StressModel;
use crate::core_types::StressPair;
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;

/// Stress targets given directly as a `[pair][point]` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStress {
    data: Vec<f64>,
}

impl ArrayStress {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl StressModel for ArrayStress {
    fn stress(&self, grid: &Grid) -> Result<Vec<f64>> {
        let expected = StressPair::ALL.len() * grid.n_p();
        if self.data.len() != expected {
            return Err(SynthesisError::shape_mismatch(
                "stress",
                expected,
                self.data.len(),
            ));
        }
        Ok(self.data.clone())
    }
}

/// Spatially uniform Reynolds stresses (m²/s²).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformStress {
    pub upvp: f64,
    pub upwp: f64,
    pub vpwp: f64,
}

impl StressModel for UniformStress {
    fn stress(&self, grid: &Grid) -> Result<Vec<f64>> {
        let n_p = grid.n_p();
        let mut data = Vec::with_capacity(3 * n_p);
        for value in [self.upvp, self.upwp, self.vpwp] {
            data.extend(std::iter::repeat_n(value, n_p));
        }
        Ok(data)
    }
}

/// Boundary-layer stress for tidal channels.
///
/// `u'w' = -u*² (1 - z / z_ref)` below the no-stress level `z_ref` and zero
/// above it. `u'v'` and `v'w'` are zero. A non-positive `z_ref` gives zero
/// stress everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TidalStress {
    /// Friction velocity at the bed (m/s)
    pub u_star: f64,
    /// Height of the no-stress level (m)
    pub z_ref: f64,
}

impl StressModel for TidalStress {
    fn stress(&self, grid: &Grid) -> Result<Vec<f64>> {
        let n_p = grid.n_p();
        let mut data = vec![0.0; 3 * n_p];
        let upwp = &mut data[StressPair::UW.index() * n_p..(StressPair::UW.index() + 1) * n_p];
        for (p, value) in upwp.iter_mut().enumerate() {
            let z = grid.point_z(p);
            if self.z_ref > 0.0 && z < self.z_ref {
                *value = -self.u_star * self.u_star * (1.0 - z / self.z_ref);
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::phases::RandomSource;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(
            &GridConfig {
                center: 10.0,
                n_y: Some(2),
                n_z: Some(3),
                width: Some(4.0),
                height: Some(16.0),
                time_sec: Some(10.0),
                dt: Some(0.5),
                ..Default::default()
            },
            &mut RandomSource::from_seed(0),
        )
        .unwrap()
    }

    #[test]
    fn uniform_stress_layout() {
        let g = grid();
        let s = UniformStress {
            upvp: 0.1,
            upwp: -0.2,
            vpwp: 0.3,
        }
        .stress(&g)
        .unwrap();
        assert_eq!(s.len(), 18);
        assert_eq!(s[5], 0.1);
        assert_eq!(s[6], -0.2);
        assert_eq!(s[17], 0.3);
    }

    #[test]
    fn tidal_stress_vanishes_above_reference() {
        let g = grid();
        // z = [2, 10, 18]
        let s = TidalStress {
            u_star: 0.5,
            z_ref: 12.0,
        }
        .stress(&g)
        .unwrap();
        let n_p = g.n_p();
        let upwp = &s[n_p..2 * n_p];
        assert_relative_eq!(upwp[0], -0.25 * (1.0 - 2.0 / 12.0), epsilon = 1e-12);
        assert_relative_eq!(upwp[3], -0.25 * (1.0 - 10.0 / 12.0), epsilon = 1e-12);
        assert_eq!(upwp[4], 0.0);
        assert!(s[..n_p].iter().chain(&s[2 * n_p..]).all(|&x| x == 0.0));
    }

    #[test]
    fn array_stress_checks_length() {
        let g = grid();
        assert!(ArrayStress::new(vec![0.0; 18]).stress(&g).is_ok());
        assert!(matches!(
            ArrayStress::new(vec![0.0; 6]).stress(&g),
            Err(SynthesisError::ShapeMismatch { .. })
        ));
    }
}
