//! Run configuration
//!
//! Plain, strongly typed configuration structs for every stage of a
//! synthesis run. Parsing of text or binary input formats is out of scope;
//! these structs are what such a front end would produce. Optional fields
//! are filled in by pure `resolve_defaults`-style functions, never by
//! lookups at use sites.

use crate::factor::FactorizerKind;
use crate::grid::primes::DEFAULT_PRIME_MAX;
use serde::{Deserialize, Serialize};

/// Grid geometry and time-axis parameters.
///
/// Each spatial axis is given by any two of count, length and spacing. If
/// all three are supplied they must agree. The time axis is given by any two
/// of `n_t`, `time_sec` (or `time_min`) and `dt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Height of the grid center (m)
    pub center: f64,

    /// Number of points along y (lateral)
    pub n_y: Option<usize>,
    /// Number of points along z (vertical)
    pub n_z: Option<usize>,
    /// Total grid width along y (m)
    pub width: Option<f64>,
    /// Total grid height along z (m)
    pub height: Option<f64>,
    /// Point spacing along y (m)
    pub dy: Option<f64>,
    /// Point spacing along z (m)
    pub dz: Option<f64>,

    /// Number of synthesized time steps
    pub n_t: Option<usize>,
    /// Synthesized duration (s)
    pub time_sec: Option<f64>,
    /// Synthesized duration (min), used only when `time_sec` is absent
    pub time_min: Option<f64>,
    /// Time step (s)
    pub dt: Option<f64>,
    /// Output duration (s); defaults to the synthesized duration.
    /// A longer output duration extends the synthesized duration.
    pub time_sec_out: Option<f64>,

    /// Round `n_t` up to a length with only small prime factors
    pub round_to_low_primes: bool,
    /// Largest prime allowed when rounding `n_t`
    pub prime_max: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            center: 80.0,
            n_y: Some(5),
            n_z: Some(5),
            width: Some(60.0),
            height: Some(60.0),
            dy: None,
            dz: None,
            n_t: None,
            time_sec: Some(600.0),
            time_min: None,
            dt: Some(0.05),
            time_sec_out: None,
            round_to_low_primes: true,
            prime_max: DEFAULT_PRIME_MAX,
        }
    }
}

/// Decay coefficients `(a, b)` of the exponential coherence model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayCoefficients {
    /// Coherence decrement
    pub a: f64,
    /// Offset parameter (1/m)
    pub b: f64,
}

impl DecayCoefficients {
    #[must_use]
    pub const fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            b: self.b * factor,
        }
    }
}

/// Partially specified exponential-decay coherence parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExponentialCoherenceConfig {
    pub u: Option<DecayCoefficients>,
    pub v: Option<DecayCoefficients>,
    pub w: Option<DecayCoefficients>,
    /// Exponent `p` on the `dist / z_mean` factor
    pub exponent: Option<f64>,
}

/// Fully resolved exponential-decay coherence parameters, indexed by component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialCoherenceParams {
    pub decay: [DecayCoefficients; 3],
    pub exponent: f64,
}

/// Lateral and vertical decrements default to this fraction of the u values.
const CROSS_COMPONENT_DECAY_FACTOR: f64 = 0.75;

impl ExponentialCoherenceConfig {
    /// Fill in missing coefficients.
    ///
    /// u defaults to `(a, b) = (hub_speed, 0)`; v and w default to 0.75 times
    /// the (resolved) u coefficients; the exponent defaults to 0.
    #[must_use]
    pub fn resolve_defaults(&self, hub_speed: f64) -> ExponentialCoherenceParams {
        let u = self.u.unwrap_or(DecayCoefficients::new(hub_speed, 0.0));
        let cross = u.scaled(CROSS_COMPONENT_DECAY_FACTOR);
        ExponentialCoherenceParams {
            decay: [u, self.v.unwrap_or(cross), self.w.unwrap_or(cross)],
            exponent: self.exponent.unwrap_or(0.0),
        }
    }
}

/// IEC coherence parameters before resolution against the grid and profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IecCoherenceConfig {
    /// IEC 61400-1 edition (2 or 3)
    pub edition: u8,
    /// Hub height (m); defaults to the grid hub height
    pub hub_height: Option<f64>,
    /// Hub mean speed (m/s); defaults to the mean u at the grid hub point
    pub hub_speed: Option<f64>,
}

impl Default for IecCoherenceConfig {
    fn default() -> Self {
        Self {
            edition: 3,
            hub_height: None,
            hub_speed: None,
        }
    }
}

/// Spatial coherence model selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CoherenceConfig {
    /// `exp(-a (r/z_m)^p sqrt((f r / u_m)^2 + b^2))` per component
    Exponential(ExponentialCoherenceConfig),
    /// IEC coherence on u, zero on v and w
    Iec(IecCoherenceConfig),
    /// No coherence between distinct points
    None,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        CoherenceConfig::Exponential(ExponentialCoherenceConfig::default())
    }
}

/// Reynolds-stress coupling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressConfig {
    /// Empirical calibration multiplier on the phase-lock draws.
    ///
    /// A phase is locked when `draw * phase_lock_calibration < p`, so values
    /// below 1 lock more often than the nominal probability `p`. Values
    /// around 0.93 have been used to compensate for spectral-shape
    /// differences between components; 1.0 applies the nominal probabilities.
    pub phase_lock_calibration: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            phase_lock_calibration: 1.0,
        }
    }
}

/// Orchestrator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Cholesky backend
    pub factorizer: FactorizerKind,
    /// Check `H·Hᵗ ≈ C` for every factor (adds one matrix product per bin)
    pub verify_factors: bool,
    /// Relative residual accepted silently
    pub residual_tolerance: f64,
    /// Relative residual above which the run fails; between the tolerance
    /// and this bound the bin is logged and the output flagged as degraded
    pub residual_soft_bound: f64,
    /// Subtract the per-point temporal mean of each output window
    pub remove_window_mean: bool,
    /// Worker-pool size for the frequency loop (None = rayon default)
    pub threads: Option<usize>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            factorizer: FactorizerKind::Packed,
            verify_factors: true,
            residual_tolerance: 1e-5,
            residual_soft_bound: 1e-3,
            remove_window_mean: true,
            threads: None,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Random seed. `None` draws a fresh seed from OS entropy: the run is
    /// valid but not reproducible unless the reported seed is reused.
    pub seed: Option<u64>,
    pub grid: GridConfig,
    pub coherence: CoherenceConfig,
    pub stress: StressConfig,
    pub synthesis: SynthesisConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exponential_defaults_follow_hub_speed() {
        let params = ExponentialCoherenceConfig::default().resolve_defaults(12.0);
        assert_relative_eq!(params.decay[0].a, 12.0);
        assert_relative_eq!(params.decay[0].b, 0.0);
        assert_relative_eq!(params.decay[1].a, 9.0);
        assert_relative_eq!(params.decay[2].a, 9.0);
        assert_relative_eq!(params.exponent, 0.0);
    }

    #[test]
    fn explicit_u_coefficients_drive_cross_defaults() {
        let cfg = ExponentialCoherenceConfig {
            u: Some(DecayCoefficients::new(8.0, 0.004)),
            w: Some(DecayCoefficients::new(3.0, 0.0)),
            ..Default::default()
        };
        let params = cfg.resolve_defaults(20.0);
        assert_relative_eq!(params.decay[0].a, 8.0);
        assert_relative_eq!(params.decay[1].a, 6.0);
        assert_relative_eq!(params.decay[1].b, 0.003);
        assert_relative_eq!(params.decay[2].a, 3.0);
    }

    #[test]
    fn run_config_serde_round_trip() {
        let cfg = RunConfig {
            seed: Some(7),
            coherence: CoherenceConfig::Iec(IecCoherenceConfig::default()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"model\":\"iec\""), "{json}");
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
