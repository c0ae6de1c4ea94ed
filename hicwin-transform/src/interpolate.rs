//! Linear gap filling for 1D tracks and 2D contact blocks.
//!
//! Missing values are NaN. Interior gaps are filled by linear interpolation
//! between the nearest valid neighbours; leading and trailing gaps take the
//! nearest valid value (flat extrapolation). A sequence with no valid value
//! at all cannot be filled and is reported as an error.

use ndarray::{Array2, Axis};

use hicwin_core::errors::{HicwinError, Result};

///
/// Return a copy of `values` with every NaN replaced by linear interpolation.
///
/// # Arguments
/// - values: the sequence to fill
///
pub fn interp_nan(values: &[f64]) -> Result<Vec<f64>> {
    let mut out = values.to_vec();
    interp_nan_inplace(&mut out)?;
    Ok(out)
}

/// In-place variant of [`interp_nan`].
pub fn interp_nan_inplace(values: &mut [f64]) -> Result<()> {
    if values.is_empty() || !values.iter().any(|v| v.is_nan()) {
        return Ok(());
    }

    let known: Vec<usize> = (0..values.len()).filter(|&i| !values[i].is_nan()).collect();
    let (first, last) = match (known.first(), known.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(HicwinError::InvalidArgument(
                "cannot interpolate a sequence with no valid values".to_string(),
            ));
        }
    };

    let first_value = values[first];
    let last_value = values[last];
    for v in values[..first].iter_mut() {
        *v = first_value;
    }
    for v in values[last + 1..].iter_mut() {
        *v = last_value;
    }

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let slope = (values[hi] - values[lo]) / (hi - lo) as f64;
        let base = values[lo];
        for (x, v) in values.iter_mut().enumerate().take(hi).skip(lo + 1) {
            *v = slope * (x - lo) as f64 + base;
        }
    }
    Ok(())
}

///
/// Fill NaN cells of a matrix.
///
/// Each pass interpolates every row and every column independently against the
/// current matrix; a missing cell takes the mean of the row and column
/// estimates when both exist, or whichever one exists. Cells whose row and
/// column are both fully missing are resolved by the next pass, once
/// neighbouring cells have been filled. Symmetric input stays symmetric.
///
pub fn interp_nan_2d(matrix: &mut Array2<f64>) -> Result<()> {
    loop {
        let missing = matrix.iter().filter(|v| v.is_nan()).count();
        if missing == 0 {
            return Ok(());
        }

        let by_rows = interpolate_lanes(matrix, Axis(0));
        let by_cols = interpolate_lanes(matrix, Axis(1));

        let mut filled = 0;
        for (cell, (r, c)) in matrix
            .iter_mut()
            .zip(by_rows.iter().zip(by_cols.iter()))
        {
            if !cell.is_nan() {
                continue;
            }
            let estimate = match (r.is_nan(), c.is_nan()) {
                (false, false) => (r + c) / 2.0,
                (false, true) => *r,
                (true, false) => *c,
                (true, true) => continue,
            };
            *cell = estimate;
            filled += 1;
        }

        if filled == 0 {
            return Err(HicwinError::InvalidArgument(
                "cannot interpolate a matrix with no valid values".to_string(),
            ));
        }
    }
}

/// Interpolate each lane along `axis` (rows for `Axis(0)`); fully missing lanes stay NaN.
fn interpolate_lanes(matrix: &Array2<f64>, axis: Axis) -> Array2<f64> {
    let mut out = matrix.clone();
    for mut lane in out.axis_iter_mut(axis) {
        let mut values: Vec<f64> = lane.iter().copied().collect();
        if interp_nan_inplace(&mut values).is_ok() {
            for (dst, src) in lane.iter_mut().zip(values) {
                *dst = src;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1.0, f64::NAN, 3.0], vec![1.0, 2.0, 3.0])]
    #[case(vec![f64::NAN, 2.0, 4.0], vec![2.0, 2.0, 4.0])]
    #[case(vec![1.0, 5.0, f64::NAN, f64::NAN], vec![1.0, 5.0, 5.0, 5.0])]
    #[case(vec![0.0, f64::NAN, f64::NAN, 3.0], vec![0.0, 1.0, 2.0, 3.0])]
    #[case(vec![4.0, 2.0], vec![4.0, 2.0])]
    fn test_interp_nan(#[case] input: Vec<f64>, #[case] expected: Vec<f64>) {
        assert_eq!(interp_nan(&input).unwrap(), expected);
    }

    #[rstest]
    fn test_interp_nan_all_missing_is_an_error() {
        let result = interp_nan(&[f64::NAN, f64::NAN]);
        assert!(matches!(result, Err(HicwinError::InvalidArgument(_))));
    }

    #[rstest]
    fn test_interp_nan_empty() {
        assert_eq!(interp_nan(&[]).unwrap(), Vec::<f64>::new());
    }

    #[rstest]
    fn test_interp_2d_single_gap() {
        let mut m = array![[1.0, 2.0, 3.0], [2.0, f64::NAN, 4.0], [3.0, 4.0, 5.0]];
        interp_nan_2d(&mut m).unwrap();
        // row estimate 3.0, column estimate 3.0
        assert_eq!(m[[1, 1]], 3.0);
    }

    #[rstest]
    fn test_interp_2d_missing_bins_stays_symmetric() {
        let nan = f64::NAN;
        let mut m = array![
            [1.0, nan, 2.0, nan],
            [nan, nan, nan, nan],
            [2.0, nan, 4.0, nan],
            [nan, nan, nan, nan],
        ];
        interp_nan_2d(&mut m).unwrap();
        assert!(m.iter().all(|v| !v.is_nan()));
        assert_eq!(m, m.t().to_owned());
        assert_eq!(m[[0, 1]], 1.5);
    }

    #[rstest]
    fn test_interp_2d_all_missing_is_an_error() {
        let mut m = Array2::from_elem((2, 2), f64::NAN);
        assert!(interp_nan_2d(&mut m).is_err());
    }
}
