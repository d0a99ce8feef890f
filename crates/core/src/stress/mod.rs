//! Reynolds-stress coupling
//!
//! Cross-component correlation is produced by probabilistic phase locking.
//! At each point the target correlations `r = stress / (σ_a σ_b)` are turned
//! into the fractions of frequency bins where the v (or w) phase is replaced
//! by `±` the u (or v) phase. A locked bin contributes fully to the
//! covariance of the pair, an unlocked bin contributes nothing on average,
//! so the locked fraction sets the realized correlation.
//!
//! Four exclusive lock kinds are tried per bin, each with a fresh draw:
//!
//! 1. overlap: v and w both follow u
//! 2. u-v only
//! 3. u-w only
//! 4. v-w only
//!
//! Later kinds only see bins that no earlier kind claimed, so each draw is
//! compared against a probability conditioned on the bins still free. This
//! makes the unconditional fraction of each lock kind equal its target. The
//! overlap fraction is chosen large enough that the four fractions fit in
//! the bins available, so every accepted target is reachable.

mod models;

pub use models::{ArrayStress, TidalStress, UniformStress};

use crate::config::StressConfig;
use crate::core_types::{Component, StressPair};
use crate::error::{Result, StressCriterion, SynthesisError};
use crate::grid::Grid;
use crate::phases::{PhaseField, RandomSource};
use crate::spectra::SpectralTensor;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of the Reynolds-stress targets.
pub trait StressModel: Send + Sync {
    /// Stresses `[pair][point]` in pair order u'v', u'w', v'w' (m²/s²).
    fn stress(&self, grid: &Grid) -> Result<Vec<f64>>;
}

/// Number of lock kinds (overlap, u-v, u-w, v-w).
const N_LOCK_KINDS: usize = 4;

/// Lock statistics from one coupling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CouplingSummary {
    /// Bins locked by each kind: overlap, u-v, u-w, v-w
    pub locked: [usize; N_LOCK_KINDS],
}

/// Stress targets together with the per-point maxima implied by the spectra.
#[derive(Debug, Clone, PartialEq)]
pub struct ReynoldsStress {
    n_p: usize,
    stress: Vec<f64>,
    stress_max: Vec<f64>,
}

impl ReynoldsStress {
    /// Pair `stress[pair][point]` with `stress_max = σ_a σ_b` from `tensor`.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] if `stress` does not cover the grid.
    pub fn new(stress: Vec<f64>, tensor: &SpectralTensor) -> Result<Self> {
        let n_p = tensor.n_p();
        let expected = StressPair::ALL.len() * n_p;
        if stress.len() != expected {
            return Err(SynthesisError::shape_mismatch("stress", expected, stress.len()));
        }
        let mut stress_max = Vec::with_capacity(expected);
        for pair in StressPair::ALL {
            let (a, b) = pair.components();
            stress_max.extend((0..n_p).map(|p| tensor.std_dev(a, p) * tensor.std_dev(b, p)));
        }
        Ok(Self {
            n_p,
            stress,
            stress_max,
        })
    }

    /// Evaluate `model` on `grid` and pair it with the spectra.
    pub fn from_model(model: &dyn StressModel, grid: &Grid, tensor: &SpectralTensor) -> Result<Self> {
        Self::new(model.stress(grid)?, tensor)
    }

    #[inline]
    pub fn stress(&self, pair: StressPair, point: usize) -> f64 {
        self.stress[pair.index() * self.n_p + point]
    }

    /// Largest stress magnitude the spectra allow, `σ_a σ_b`.
    #[inline]
    pub fn stress_max(&self, pair: StressPair, point: usize) -> f64 {
        self.stress_max[pair.index() * self.n_p + point]
    }

    /// True if every target stress is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.stress.iter().all(|&s| s == 0.0)
    }

    /// Target correlations `(r_uv, r_uw, r_vw)` at a point.
    ///
    /// A pair with zero stress has zero correlation even when its maximum is
    /// zero.
    pub fn correlations(&self, point: usize) -> [f64; 3] {
        StressPair::ALL.map(|pair| {
            let s = self.stress(pair, point);
            if s == 0.0 {
                0.0
            } else {
                s / self.stress_max(pair, point)
            }
        })
    }

    /// Check that the targets at `point` describe a realizable correlation
    /// structure.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InfeasibleStress`] naming the violated criterion.
    pub fn check_point(&self, point: usize) -> Result<()> {
        let r = self.correlations(point);
        let fail = |criterion| {
            Err(SynthesisError::InfeasibleStress {
                point,
                criterion,
                correlations: r,
            })
        };

        if StressPair::ALL
            .iter()
            .any(|&pair| self.stress(pair, point) != 0.0 && self.stress_max(pair, point) == 0.0)
        {
            return fail(StressCriterion::ZeroVariance);
        }
        let [s0, s1, s2] = sorted_magnitudes(r);
        if s2 > 1.0 {
            return fail(StressCriterion::Magnitude);
        }
        if 1.0 + s0 - s1 - s2 < 0.0 {
            return fail(StressCriterion::Overlap);
        }
        let sum = s0 + s1 + s2;
        match negative_count(&r) {
            1 if sum > 1.0 => fail(StressCriterion::Sign),
            3 if sum > 1.0 => fail(StressCriterion::NegativeTriple),
            _ => Ok(()),
        }
    }

    /// Check every point, stopping at the first infeasible one.
    pub fn check_validity(&self) -> Result<()> {
        (0..self.n_p).try_for_each(|p| self.check_point(p))
    }

    /// Fraction of bins where all three components share one phase.
    ///
    /// The mean of the products of the smallest magnitude with the other
    /// two, capped by the smallest magnitude. If the pairwise remainders
    /// `|r| - overlap` would not fit in the bins the overlap leaves free, it
    /// is raised to `(Σ|r| - 1) / 2`, which the overlap criterion keeps at
    /// or below the smallest magnitude.
    ///
    /// Zero when one phase cannot carry all three signs, i.e. one or three
    /// negative correlations; v'w' would come out with the wrong sign.
    pub fn overlap(&self, point: usize) -> f64 {
        let r = self.correlations(point);
        if negative_count(&r) % 2 == 1 {
            return 0.0;
        }
        let [s0, s1, s2] = sorted_magnitudes(r);
        let shared = ((s0 * s1 + s0 * s2) / 2.0).min(s0);
        shared.max((s0 + s1 + s2 - 1.0) / 2.0).min(s0)
    }

    /// Lock the v and w phases to realize the target stresses.
    ///
    /// Validity is checked for every point before any phase is modified.
    /// With all-zero targets nothing is drawn and the phases stay
    /// independent. Otherwise four uniform draws are consumed per point and
    /// frequency bin, in point-major order.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InfeasibleStress`] for the first infeasible point,
    /// [`SynthesisError::InvalidParameter`] for a calibration that is not a
    /// positive finite number, [`SynthesisError::ShapeMismatch`] if `phases`
    /// has a different point count.
    pub fn couple_phases(
        &self,
        phases: &mut PhaseField,
        rng: &mut RandomSource,
        config: &StressConfig,
    ) -> Result<CouplingSummary> {
        if phases.n_p() != self.n_p {
            return Err(SynthesisError::shape_mismatch("phases", self.n_p, phases.n_p()));
        }
        let calibration = config.phase_lock_calibration;
        if !(calibration.is_finite() && calibration > 0.0) {
            return Err(SynthesisError::InvalidParameter {
                parameter: "phase_lock_calibration",
                reason: format!("must be positive and finite, got {calibration}"),
            });
        }
        self.check_validity()?;

        let mut summary = CouplingSummary::default();
        if self.is_zero() {
            debug!("All Reynolds stresses are zero, phases left independent");
            return Ok(summary);
        }

        for point in 0..self.n_p {
            let r = self.correlations(point);
            let sign = r.map(|x| if x < 0.0 { -1.0 } else { 1.0 });
            let thresholds = lock_thresholds(r, self.overlap(point));

            for k in 0..phases.n_f() {
                let draws: [f64; N_LOCK_KINDS] = std::array::from_fn(|_| rng.uniform() * calibration);
                let x_u = phases.get(Component::U, point, k);
                if draws[0] < thresholds[0] {
                    phases.set(Component::V, point, k, x_u * sign[0]);
                    phases.set(Component::W, point, k, x_u * sign[1]);
                    summary.locked[0] += 1;
                } else if draws[1] < thresholds[1] {
                    phases.set(Component::V, point, k, x_u * sign[0]);
                    summary.locked[1] += 1;
                } else if draws[2] < thresholds[2] {
                    phases.set(Component::W, point, k, x_u * sign[1]);
                    summary.locked[2] += 1;
                } else if draws[3] < thresholds[3] {
                    let x_v = phases.get(Component::V, point, k);
                    phases.set(Component::W, point, k, x_v * sign[2]);
                    summary.locked[3] += 1;
                }
            }
        }

        debug!(
            "Stress coupling locked {} overlap, {} u-v, {} u-w, {} v-w bins",
            summary.locked[0], summary.locked[1], summary.locked[2], summary.locked[3]
        );
        Ok(summary)
    }
}

fn sorted_magnitudes(r: [f64; 3]) -> [f64; 3] {
    let mut s = r.map(f64::abs);
    s.sort_by(f64::total_cmp);
    s
}

fn negative_count(r: &[f64; 3]) -> usize {
    r.iter().filter(|&&x| x < 0.0).count()
}

/// Conditional lock thresholds for (overlap, u-v, u-w, v-w).
///
/// Kind `n` claims a fraction `p_n` of all bins but only sees the bins left
/// free by kinds before it, so its threshold is `p_n / free`. For targets
/// that pass [`ReynoldsStress::check_point`] the fractions sum to at most
/// one; the clip to one only absorbs rounding.
fn lock_thresholds(r: [f64; 3], overlap: f64) -> [f64; N_LOCK_KINDS] {
    let targets = [
        overlap,
        (r[0].abs() - overlap).max(0.0),
        (r[1].abs() - overlap).max(0.0),
        (r[2].abs() - overlap).max(0.0),
    ];
    let mut thresholds = [0.0; N_LOCK_KINDS];
    let mut free = 1.0;
    for (threshold, &p) in thresholds.iter_mut().zip(&targets) {
        if p <= 0.0 {
            continue;
        }
        *threshold = if free > 0.0 { (p / free).min(1.0) } else { 1.0 };
        free *= 1.0 - *threshold;
    }
    thresholds
}
