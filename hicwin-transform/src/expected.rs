use ndarray::Array2;

use hicwin_core::errors::{HicwinError, Result};

///
/// Observed over expected normalization of a square contact block.
///
/// For every diagonal offset `d` the expected value is the mean of the
/// non-missing cells `(j + d, j)` whose row and column are both in `mask`.
/// Each masked cell on that diagonal is divided by it and mirrored across the
/// main diagonal. Cells outside the mask are returned unchanged; a diagonal
/// without usable cells, or with a zero mean, becomes NaN on its masked cells.
///
/// # Arguments
/// - matrix: the square block to normalize
/// - mask: per bin flag, `true` when the bin takes part in the expected values
///
pub fn observed_over_expected(matrix: &Array2<f64>, mask: &[bool]) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n || mask.len() != n {
        return Err(HicwinError::InvalidArgument(format!(
            "observed/expected needs a square matrix and a matching mask, got {:?} and {}",
            matrix.dim(),
            mask.len()
        )));
    }

    let mut out = matrix.clone();
    for offset in 0..n {
        let cells = (0..n - offset).filter(|&j| mask[j] && mask[j + offset]);

        let (sum, count) = cells
            .clone()
            .map(|j| matrix[[j + offset, j]])
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        let expected = if count > 0 { sum / count as f64 } else { f64::NAN };

        for j in cells {
            let value = if expected.is_finite() && expected != 0.0 {
                matrix[[j + offset, j]] / expected
            } else {
                f64::NAN
            };
            out[[j + offset, j]] = value;
            out[[j, j + offset]] = value;
        }
    }
    Ok(out)
}

/// Columns that hold at least one non-missing value.
pub fn valid_columns(matrix: &Array2<f64>) -> Vec<bool> {
    matrix
        .columns()
        .into_iter()
        .map(|col| col.iter().any(|v| !v.is_nan()))
        .collect()
}
