//! Full-matrix Cholesky

use super::{classify_pivot, max_diagonal, Factorizer, Pivot, PivotFailure, PIVOT_EPSILON};
use crate::spectra::packed::{pack_lower, unpack_symmetric};
use nalgebra::DMatrix;

/// Row-oriented Cholesky-Banachiewicz on an expanded `nalgebra` matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseFactorizer;

impl Factorizer for DenseFactorizer {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn factor(&self, c: &[f64], n: usize, out: &mut [f64]) -> Result<(), PivotFailure> {
        let a = unpack_symmetric(c, n);
        let zero_threshold = PIVOT_EPSILON * max_diagonal(c, n);
        let mut l = DMatrix::<f64>::zeros(n, n);

        for i in 0..n {
            for j in 0..=i {
                let mut sum = a[(i, j)];
                for p in 0..j {
                    sum -= l[(i, p)] * l[(j, p)];
                }
                if i == j {
                    l[(i, i)] = match classify_pivot(sum, zero_threshold, i)? {
                        Pivot::Positive(root) => root,
                        Pivot::Zero => 0.0,
                    };
                } else if l[(j, j)] != 0.0 {
                    l[(i, j)] = sum / l[(j, j)];
                }
            }
        }

        pack_lower(&l, out);
        Ok(())
    }
}
