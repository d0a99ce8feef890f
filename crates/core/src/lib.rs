//! Turbulent Inflow Synthesis Core Library
//!
//! Generates spatially and temporally correlated three-component velocity
//! time series on a rectangular z-y grid, for use as inflow to time-domain
//! wind and tidal turbine simulators.
//!
//! ## Method
//!
//! A generalized Veers / Shinozuka-Jan spectral synthesis:
//! - Per-point auto-spectra and a spatial coherence model define one
//!   cross-spectral matrix per component and frequency
//! - Each matrix is Cholesky-factored in packed lower-triangular storage
//! - The factor correlates independent uniform random phases, which are
//!   first phase-locked across components to realize Reynolds-stress targets
//! - An inverse real FFT turns each point's spectrum into a time series
//!
//! ## Example
//!
//! ```rust,ignore
//! use turbgen_core::{synthesize, FnSpectrum, RunConfig, UniformProfile, UniformStress};
//!
//! let config = RunConfig { seed: Some(42), ..Default::default() };
//! let spectra = FnSpectrum::new(|_, f, _, _| 1.0 / (1.0 + f * f));
//! let field = synthesize(
//!     &config,
//!     &spectra,
//!     &UniformProfile::streamwise(10.0),
//!     &UniformStress::default(),
//! )?;
//! println!("hub TI: {:.3}", field.turbulence_intensity()[field.grid().hub_point()]);
//! ```

// Shared types
pub mod config;
pub mod core_types;
pub mod error;

// Synthesis pipeline, leaves first
pub mod grid;
pub mod profile;
pub mod spectra;
pub mod coherence;
pub mod factor;
pub mod phases;
pub mod stress;
pub mod synth;
pub mod output;

// Re-export core types
pub use config::{
    CoherenceConfig, DecayCoefficients, ExponentialCoherenceConfig, GridConfig,
    IecCoherenceConfig, RunConfig, StressConfig, SynthesisConfig,
};
pub use core_types::{Component, StressPair, N_COMP};
pub use error::{Result, StressCriterion, SynthesisError, ToleranceWarning};

// Re-export pipeline types
pub use coherence::{create_coherence, CoherenceModel, UserCoherence};
pub use factor::{create_factorizer, Factorizer, FactorizerKind};
pub use grid::Grid;
pub use output::{periodogram, RunInfo, TurbulenceField};
pub use phases::{PhaseField, RandomSource};
pub use profile::{ArrayProfile, FnProfile, MeanProfile, ProfileModel, UniformProfile};
pub use spectra::{ArraySpectrum, FnSpectrum, SpectralModel, SpectralTensor};
pub use stress::{ArrayStress, ReynoldsStress, StressModel, TidalStress, UniformStress};
pub use synth::{synthesize, Synthesizer, TurbulenceRun};
