//! Rectangular z-y point lattice and the synthesis time axis
//!
//! Points are numbered row-major over `(iz, iy)`: `p = iz * n_y + iy`, with
//! `iz = 0` the bottom row and `iy = 0` the leftmost column. Every
//! `[comp][point]` array in the crate uses this order, so a flat
//! `[comp][iz][iy]` array and a `[comp][point]` array share one layout.
//!
//! The time axis carries the full synthesized length `n_t` (always even)
//! and the output window `[i0_out, i0_out + n_t_out)` cut from it. The
//! window offset is drawn uniformly so the output is an arbitrary slice of
//! the periodic synthesized series.

use crate::config::GridConfig;
use crate::error::{Result, SynthesisError};
use crate::grid::primes::next_low_prime_even;
use crate::phases::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative slack when checking that three axis parameters agree.
const CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// Guard against `l / d` landing a hair below an integer.
const COUNT_EPSILON: f64 = 1e-9;

/// Immutable grid geometry and time axis for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    center: f64,
    n_y: usize,
    n_z: usize,
    width: f64,
    height: f64,
    dy: f64,
    dz: f64,
    y: Vec<f64>,
    z: Vec<f64>,

    n_t: usize,
    dt: f64,
    n_f: usize,
    df: f64,
    f: Vec<f64>,
    n_t_out: usize,
    i0_out: usize,
}

impl Grid {
    /// Build a grid from its configuration.
    ///
    /// The output window offset is drawn from `rng`.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidGrid`] for under- or over-specified axes,
    /// zero or non-finite spacing, or too few time steps.
    pub fn new(config: &GridConfig, rng: &mut RandomSource) -> Result<Self> {
        if !config.center.is_finite() {
            return Err(SynthesisError::invalid_grid("center", "must be finite"));
        }
        let (n_y, width, dy) = resolve_spatial_axis(
            ("n_y", "width", "dy"),
            config.n_y,
            config.width,
            config.dy,
        )?;
        let (n_z, height, dz) = resolve_spatial_axis(
            ("n_z", "height", "dz"),
            config.n_z,
            config.height,
            config.dz,
        )?;

        let (n_t, dt, n_t_out) = resolve_time_axis(config)?;
        let n_t = if config.round_to_low_primes {
            if config.prime_max < 2 {
                return Err(SynthesisError::invalid_grid(
                    "prime_max",
                    format!("must be at least 2, got {}", config.prime_max),
                ));
            }
            next_low_prime_even(n_t, config.prime_max)
        } else {
            n_t + n_t % 2
        };

        let n_f = n_t / 2;
        let df = 1.0 / (n_t as f64 * dt);
        let f = (0..n_f).map(|k| k as f64 * df).collect();

        let y = (0..n_y).map(|iy| -width / 2.0 + iy as f64 * dy).collect();
        let z = (0..n_z)
            .map(|iz| config.center - height / 2.0 + iz as f64 * dz)
            .collect();

        let i0_out = rng.index_inclusive(n_t - n_t_out);

        debug!(
            "Grid {}x{} (z x y), n_t={} (output {} from offset {}), dt={}",
            n_z, n_y, n_t, n_t_out, i0_out, dt
        );

        Ok(Self {
            center: config.center,
            n_y,
            n_z,
            width,
            height,
            dy,
            dz,
            y,
            z,
            n_t,
            dt,
            n_f,
            df,
            f,
            n_t_out,
            i0_out,
        })
    }

    /// Grid center height (m)
    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn n_y(&self) -> usize {
        self.n_y
    }

    pub fn n_z(&self) -> usize {
        self.n_z
    }

    /// Total number of points, `n_y * n_z`
    pub fn n_p(&self) -> usize {
        self.n_y * self.n_z
    }

    /// Number of packed lower-triangular entries, `n_p (n_p + 1) / 2`
    pub fn n_packed(&self) -> usize {
        let n_p = self.n_p();
        n_p * (n_p + 1) / 2
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn dz(&self) -> f64 {
        self.dz
    }

    /// Lateral coordinates, centered on zero (m)
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Heights, bottom row first (m)
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Synthesized series length (even)
    pub fn n_t(&self) -> usize {
        self.n_t
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Synthesized duration, `n_t * dt` (s)
    pub fn time_sec(&self) -> f64 {
        self.n_t as f64 * self.dt
    }

    /// Number of non-negative frequency bins, `n_t / 2`
    pub fn n_f(&self) -> usize {
        self.n_f
    }

    /// Frequency resolution, `1 / (n_t dt)` (Hz)
    pub fn df(&self) -> f64 {
        self.df
    }

    /// Frequencies `k * df` for `k` in `0..n_f` (Hz)
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Output window length
    pub fn n_t_out(&self) -> usize {
        self.n_t_out
    }

    /// Output window offset into the synthesized series
    pub fn i0_out(&self) -> usize {
        self.i0_out
    }

    /// Output duration, `n_t_out * dt` (s)
    pub fn time_sec_out(&self) -> f64 {
        self.n_t_out as f64 * self.dt
    }

    /// Subscripts `(iz, iy)` of a flat point index.
    pub fn ind2sub(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.n_p()).then(|| (index / self.n_y, index % self.n_y))
    }

    /// Flat point index of `(iz, iy)`. Negative subscripts count from the
    /// end (`-1` is the top row / rightmost column).
    pub fn sub2ind(&self, iz: isize, iy: isize) -> Option<usize> {
        let iz = wrap_subscript(iz, self.n_z)?;
        let iy = wrap_subscript(iy, self.n_y)?;
        Some(iz * self.n_y + iy)
    }

    /// Coordinates `(y, z)` of a point.
    ///
    /// # Panics
    ///
    /// If `index >= n_p`.
    #[inline]
    pub fn point_coords(&self, index: usize) -> (f64, f64) {
        (self.y[index % self.n_y], self.z[index / self.n_y])
    }

    /// Height of a point (m).
    #[inline]
    pub fn point_z(&self, index: usize) -> f64 {
        self.z[index / self.n_y]
    }

    /// Euclidean distance between two points (m).
    ///
    /// # Panics
    ///
    /// If either index is `>= n_p`.
    pub fn dist(&self, p1: usize, p2: usize) -> f64 {
        let (y1, z1) = self.point_coords(p1);
        let (y2, z2) = self.point_coords(p2);
        (y1 - y2).hypot(z1 - z2)
    }

    /// Subscripts `(iz, iy)` of the hub (center) point.
    pub fn hub_index(&self) -> (usize, usize) {
        (self.n_z / 2, self.n_y / 2)
    }

    /// Flat index of the hub point.
    pub fn hub_point(&self) -> usize {
        let (iz, iy) = self.hub_index();
        iz * self.n_y + iy
    }

    /// Height of the hub point (m).
    pub fn z_hub(&self) -> f64 {
        self.z[self.n_z / 2]
    }

    /// Rotor diameter implied by the grid, `min(width, height)` (m).
    pub fn rotor_diameter(&self) -> f64 {
        self.width.min(self.height)
    }
}

fn wrap_subscript(sub: isize, n: usize) -> Option<usize> {
    let n = n as isize;
    let wrapped = if sub < 0 { n + sub } else { sub };
    (0..n).contains(&wrapped).then_some(wrapped as usize)
}

/// Resolve a spatial axis from any two of `(count, length, spacing)`.
///
/// Points include both end points, so `length = (count - 1) * spacing`.
fn resolve_spatial_axis(
    names: (&'static str, &'static str, &'static str),
    n: Option<usize>,
    length: Option<f64>,
    spacing: Option<f64>,
) -> Result<(usize, f64, f64)> {
    let (n_name, l_name, d_name) = names;
    if n == Some(0) {
        return Err(SynthesisError::invalid_grid(n_name, "must be at least 1"));
    }
    if let Some(l) = length {
        if !l.is_finite() || l < 0.0 {
            return Err(SynthesisError::invalid_grid(
                l_name,
                format!("must be finite and non-negative, got {l}"),
            ));
        }
    }
    if let Some(d) = spacing {
        if !d.is_finite() || d <= 0.0 {
            return Err(SynthesisError::invalid_grid(
                d_name,
                format!("must be finite and positive, got {d}"),
            ));
        }
    }

    match (n, length, spacing) {
        (Some(n), Some(l), Some(d)) => {
            let implied = (n - 1) as f64 * d;
            if (implied - l).abs() > CONSISTENCY_TOLERANCE * l.max(1.0) {
                return Err(SynthesisError::invalid_grid(
                    d_name,
                    format!("over-specified: {n_name}={n}, {l_name}={l} and {d_name}={d} disagree"),
                ));
            }
            Ok((n, l, d))
        }
        (Some(n), None, Some(d)) => Ok((n, (n - 1) as f64 * d, d)),
        (Some(1), Some(l), None) => {
            if l > 0.0 {
                return Err(SynthesisError::invalid_grid(
                    l_name,
                    format!("a single point cannot span {l} m"),
                ));
            }
            Ok((1, 0.0, 0.0))
        }
        (Some(n), Some(l), None) => {
            if l == 0.0 {
                return Err(SynthesisError::invalid_grid(
                    l_name,
                    format!("{n} points need a non-zero extent"),
                ));
            }
            Ok((n, l, l / (n - 1) as f64))
        }
        (None, Some(l), Some(d)) => {
            let n = (l / d + COUNT_EPSILON).floor() as usize + 1;
            Ok((n, (n - 1) as f64 * d, d))
        }
        _ => Err(SynthesisError::invalid_grid(
            n_name,
            format!("two of {n_name}, {l_name} and {d_name} are required"),
        )),
    }
}

/// Resolve `(n_t, dt, n_t_out)` before any prime-factor rounding.
fn resolve_time_axis(config: &GridConfig) -> Result<(usize, f64, usize)> {
    if let Some(dt) = config.dt {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SynthesisError::invalid_grid(
                "dt",
                format!("must be finite and positive, got {dt}"),
            ));
        }
    }
    for (name, value) in [
        ("time_sec", config.time_sec),
        ("time_min", config.time_min),
        ("time_sec_out", config.time_sec_out),
    ] {
        if let Some(t) = value {
            if !t.is_finite() || t <= 0.0 {
                return Err(SynthesisError::invalid_grid(
                    name,
                    format!("must be finite and positive, got {t}"),
                ));
            }
        }
    }

    let time_sec = config.time_sec.or(config.time_min.map(|m| m * 60.0));
    let (n_t, dt) = match (config.n_t, time_sec, config.dt) {
        (Some(n), Some(t), Some(dt)) => {
            if (n as f64 * dt - t).abs() > CONSISTENCY_TOLERANCE * t.max(1.0) {
                return Err(SynthesisError::invalid_grid(
                    "dt",
                    format!("over-specified: n_t={n}, time_sec={t} and dt={dt} disagree"),
                ));
            }
            (n, dt)
        }
        (Some(n), None, Some(dt)) => (n, dt),
        (Some(n), Some(t), None) => {
            if n == 0 {
                return Err(SynthesisError::invalid_grid("n_t", "must be positive"));
            }
            (n, t / n as f64)
        }
        (None, Some(t), Some(dt)) => ((t / dt + COUNT_EPSILON).floor() as usize, dt),
        _ => {
            return Err(SynthesisError::invalid_grid(
                "n_t",
                "two of n_t, time_sec (or time_min) and dt are required",
            ))
        }
    };

    // dt stays as resolved; a longer requested output extends the series.
    let n_t_out = match config.time_sec_out {
        Some(out) => (out / dt + COUNT_EPSILON).floor() as usize,
        None => n_t,
    };
    let n_t = n_t.max(n_t_out);
    if n_t_out < 2 {
        return Err(SynthesisError::invalid_grid(
            "n_t",
            format!("at least 2 output time steps are required, got {n_t_out}"),
        ));
    }
    Ok((n_t, dt, n_t_out))
}
