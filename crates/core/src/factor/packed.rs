//! In-place packed Cholesky

use super::{classify_pivot, max_diagonal, Factorizer, Pivot, PivotFailure, PIVOT_EPSILON};
use crate::spectra::packed::packed_len;

/// Right-looking column Cholesky on packed lower-triangular storage.
///
/// Column `j` is scaled by its pivot, then its outer product is subtracted
/// from the trailing submatrix. Memory traffic stays within contiguous
/// column segments of the packed array.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedFactorizer;

impl Factorizer for PackedFactorizer {
    fn name(&self) -> &'static str {
        "packed"
    }

    fn factor(&self, c: &[f64], n: usize, out: &mut [f64]) -> Result<(), PivotFailure> {
        debug_assert_eq!(c.len(), packed_len(n));
        out.copy_from_slice(c);
        let zero_threshold = PIVOT_EPSILON * max_diagonal(c, n);

        // jj: offset of (j, j)
        let mut jj = 0;
        for j in 0..n {
            let len = n - j;
            match classify_pivot(out[jj], zero_threshold, j)? {
                Pivot::Zero => out[jj..jj + len].fill(0.0),
                Pivot::Positive(root) => {
                    out[jj] = root;
                    for x in &mut out[jj + 1..jj + len] {
                        *x /= root;
                    }
                    // kk: offset of (col, col) for the trailing columns
                    let mut kk = jj + len;
                    for col in j + 1..n {
                        let l_col = out[jj + (col - j)];
                        if l_col != 0.0 {
                            for row in col..n {
                                out[kk + (row - col)] -= out[jj + (row - j)] * l_col;
                            }
                        }
                        kk += n - col;
                    }
                }
            }
            jj += len;
        }
        Ok(())
    }
}
