//! Spatial coherence models
//!
//! A coherence model gives the normalized cross-spectral magnitude between
//! two grid points for one component at one frequency, a value in `[0, 1]`.
//! The cross-spectral assembly multiplies it by the geometric mean of the two
//! auto-spectra; diagonal entries bypass the model entirely.
//!
//! # Model Selection
//!
//! [`create_coherence`] resolves a [`CoherenceConfig`] against the grid and
//! mean profile and returns a boxed model. Explicit coherence arrays are
//! built directly with [`UserCoherence::new`].

mod exponential;
mod iec;
mod user;

pub use exponential::ExponentialCoherence;
pub use iec::{IecCoherence, IecCoherenceParams};
pub use user::UserCoherence;

use crate::config::CoherenceConfig;
use crate::core_types::Component;
use crate::error::Result;
use crate::grid::Grid;
use crate::profile::MeanProfile;
use tracing::info;

/// Pluggable coherence function.
pub trait CoherenceModel: Send + Sync {
    /// Short model name for logs and run info.
    fn name(&self) -> &'static str;

    /// Coherence between two distinct points.
    ///
    /// `freq_index` indexes `Grid::f()` and `f` is that frequency in Hz.
    /// Callers never pass `i == j`; use [`CoherenceModel::coherence`] when
    /// the points may coincide.
    fn cross_coherence(&self, comp: Component, freq_index: usize, f: f64, i: usize, j: usize)
        -> f64;

    /// True if distinct points of `comp` are uncorrelated at every frequency.
    ///
    /// The cross-spectral matrix is then diagonal and off-diagonal assembly
    /// is skipped.
    fn is_uncorrelated(&self, _comp: Component) -> bool {
        false
    }

    /// Coherence between any two points; exactly 1 when `i == j`.
    fn coherence(&self, comp: Component, freq_index: usize, f: f64, i: usize, j: usize) -> f64 {
        if i == j {
            1.0
        } else {
            self.cross_coherence(comp, freq_index, f, i, j)
        }
    }
}

/// No coherence between distinct points.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCoherence;

impl CoherenceModel for NoCoherence {
    fn name(&self) -> &'static str {
        "none"
    }

    fn cross_coherence(&self, _: Component, _: usize, _: f64, _: usize, _: usize) -> f64 {
        0.0
    }

    fn is_uncorrelated(&self, _comp: Component) -> bool {
        true
    }
}

/// Build the configured coherence model for `grid` and `mean`.
///
/// # Errors
///
/// [`crate::SynthesisError::InvalidCoherence`] if the parameters are out of
/// range for this grid (for example a non-zero height exponent with points at
/// or below z = 0).
pub fn create_coherence(
    config: &CoherenceConfig,
    grid: &Grid,
    mean: &MeanProfile,
) -> Result<Box<dyn CoherenceModel>> {
    match config {
        CoherenceConfig::Exponential(cfg) => {
            let params = cfg.resolve_defaults(mean.hub_speed(grid));
            info!(
                "Using exponential coherence: a = [{:.3}, {:.3}, {:.3}], b = [{:.4}, {:.4}, {:.4}], p = {}",
                params.decay[0].a,
                params.decay[1].a,
                params.decay[2].a,
                params.decay[0].b,
                params.decay[1].b,
                params.decay[2].b,
                params.exponent
            );
            Ok(Box::new(ExponentialCoherence::new(params, grid, mean)?))
        }
        CoherenceConfig::Iec(cfg) => {
            let hub_height = cfg.hub_height.unwrap_or_else(|| grid.z_hub());
            let hub_speed = cfg.hub_speed.unwrap_or_else(|| mean.hub_speed(grid));
            let params = IecCoherenceParams::for_edition(cfg.edition, hub_height)?;
            info!(
                "Using IEC edition {} coherence: a = {}, L = {:.2} m, hub speed {:.2} m/s",
                cfg.edition, params.decrement, params.length_scale, hub_speed
            );
            Ok(Box::new(IecCoherence::new(params, hub_speed, grid)?))
        }
        CoherenceConfig::None => {
            info!("Coherence disabled, points are spatially uncorrelated");
            Ok(Box::new(NoCoherence))
        }
    }
}
