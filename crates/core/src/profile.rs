//! Mean velocity profile
//!
//! The mean field `U[comp][iz][iy]` enters the synthesis twice: the local
//! mean speed scales the coherence decay, and the final output is the mean
//! plus the synthesized fluctuation. Closed-form profile laws live outside
//! this crate; anything that can fill the array implements [`ProfileModel`].

use crate::core_types::{Component, N_COMP};
use crate::error::{Result, SynthesisError};
use crate::grid::Grid;

/// Mean velocity at every grid point, laid out `[comp][point]`
/// (equivalently `[comp][iz][iy]`).
#[derive(Debug, Clone, PartialEq)]
pub struct MeanProfile {
    n_p: usize,
    data: Vec<f64>,
}

impl MeanProfile {
    /// Wrap a `[comp][iz][iy]` array.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] if the length is not `3 * n_p`.
    pub fn from_vec(grid: &Grid, data: Vec<f64>) -> Result<Self> {
        let expected = N_COMP * grid.n_p();
        if data.len() != expected {
            return Err(SynthesisError::shape_mismatch(
                "mean profile",
                expected,
                data.len(),
            ));
        }
        Ok(Self {
            n_p: grid.n_p(),
            data,
        })
    }

    #[inline]
    pub fn get(&self, comp: Component, point: usize) -> f64 {
        self.data[comp.index() * self.n_p + point]
    }

    /// Mean of one component over all points.
    pub fn component(&self, comp: Component) -> &[f64] {
        let start = comp.index() * self.n_p;
        &self.data[start..start + self.n_p]
    }

    /// Mean streamwise speed at the hub point.
    pub fn hub_speed(&self, grid: &Grid) -> f64 {
        self.get(Component::U, grid.hub_point())
    }

    pub fn n_p(&self) -> usize {
        self.n_p
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Source of the mean velocity field.
pub trait ProfileModel: Send + Sync {
    /// Evaluate the mean field on `grid`.
    ///
    /// # Errors
    ///
    /// Implementations return [`SynthesisError::ShapeMismatch`] when they
    /// cannot cover the grid.
    fn mean_profile(&self, grid: &Grid) -> Result<MeanProfile>;
}

/// Mean profile given directly as an array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayProfile {
    data: Vec<f64>,
}

impl ArrayProfile {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl ProfileModel for ArrayProfile {
    fn mean_profile(&self, grid: &Grid) -> Result<MeanProfile> {
        MeanProfile::from_vec(grid, self.data.clone())
    }
}

/// Spatially constant mean velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformProfile {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl UniformProfile {
    /// Streamwise-only flow at `speed`.
    pub fn streamwise(speed: f64) -> Self {
        Self {
            u: speed,
            v: 0.0,
            w: 0.0,
        }
    }
}

impl ProfileModel for UniformProfile {
    fn mean_profile(&self, grid: &Grid) -> Result<MeanProfile> {
        let n_p = grid.n_p();
        let mut data = Vec::with_capacity(N_COMP * n_p);
        for value in [self.u, self.v, self.w] {
            data.extend(std::iter::repeat_n(value, n_p));
        }
        MeanProfile::from_vec(grid, data)
    }
}

/// Mean profile from a closure `(component, y, z) -> mean`.
pub struct FnProfile<F> {
    f: F,
}

impl<F> FnProfile<F>
where
    F: Fn(Component, f64, f64) -> f64 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ProfileModel for FnProfile<F>
where
    F: Fn(Component, f64, f64) -> f64 + Send + Sync,
{
    fn mean_profile(&self, grid: &Grid) -> Result<MeanProfile> {
        let mut data = Vec::with_capacity(N_COMP * grid.n_p());
        for comp in Component::ALL {
            for p in 0..grid.n_p() {
                let (y, z) = grid.point_coords(p);
                data.push((self.f)(comp, y, z));
            }
        }
        MeanProfile::from_vec(grid, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::phases::RandomSource;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(&GridConfig::default(), &mut RandomSource::from_seed(0)).unwrap()
    }

    #[test]
    fn uniform_profile_fills_every_point() {
        let g = grid();
        let mean = UniformProfile::streamwise(10.0).mean_profile(&g).unwrap();
        assert!(mean.component(Component::U).iter().all(|&u| u == 10.0));
        assert!(mean.component(Component::W).iter().all(|&w| w == 0.0));
        assert_relative_eq!(mean.hub_speed(&g), 10.0);
    }

    #[test]
    fn closure_profile_sees_point_heights() {
        let g = grid();
        let mean = FnProfile::new(|comp, _y, z| match comp {
            Component::U => 10.0 * (z / 80.0).powf(0.2),
            _ => 0.0,
        })
        .mean_profile(&g)
        .unwrap();
        let top = g.sub2ind(-1, 0).unwrap();
        assert!(mean.get(Component::U, top) > mean.get(Component::U, 0));
        assert_relative_eq!(mean.hub_speed(&g), 10.0);
    }

    #[test]
    fn array_profile_checks_length() {
        let g = grid();
        let err = ArrayProfile::new(vec![1.0; 10]).mean_profile(&g).unwrap_err();
        assert_eq!(err, SynthesisError::shape_mismatch("mean profile", 75, 10));
    }
}
