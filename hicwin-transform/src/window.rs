use ndarray::{Array2, s};

use hicwin_core::consts::{COVERAGE_THRESHOLD, ZERO_FILL_QUANTILE};
use hicwin_core::errors::{HicwinError, Result};

use crate::expected::{observed_over_expected, valid_columns};
use crate::interpolate::interp_nan_2d;

/// Why a window was left out of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Fewer than the required fraction of central columns hold any data.
    LowCoverage { fraction: f64 },
    /// After normalization no nonzero value remained to anchor the log transform.
    NoSignal,
}

/// Outcome of transforming one window.
#[derive(Debug, Clone)]
pub enum WindowVerdict {
    /// The transformed central block.
    Accepted(Array2<f64>),
    /// The untransformed central block, kept for diagnostics.
    Rejected {
        reason: RejectReason,
        center: Array2<f64>,
    },
}

impl WindowVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, WindowVerdict::Accepted(_))
    }
}

///
/// Transform of a window with one window of flanking context on every side.
///
/// The input block has side `3 * window_size`. Coverage is judged on the
/// central block only; normalization runs on the whole block and only the
/// centre is returned.
///
#[derive(Debug, Clone)]
pub struct WindowTransform {
    pub window_size: usize,
    pub coverage_threshold: f64,
    pub zero_fill_quantile: f64,
}

impl WindowTransform {
    pub fn new(window_size: usize) -> Self {
        WindowTransform {
            window_size,
            coverage_threshold: COVERAGE_THRESHOLD,
            zero_fill_quantile: ZERO_FILL_QUANTILE,
        }
    }

    /// Side of the context block this transform expects.
    pub fn context_size(&self) -> usize {
        3 * self.window_size
    }

    fn center(&self, matrix: &Array2<f64>) -> Array2<f64> {
        let ws = self.window_size;
        matrix.slice(s![ws..2 * ws, ws..2 * ws]).to_owned()
    }

    /// Fraction of central columns holding at least one non-missing value.
    pub fn coverage(&self, matrix: &Array2<f64>) -> f64 {
        let usable = valid_columns(&self.center(matrix))
            .into_iter()
            .filter(|&usable| usable)
            .count();
        usable as f64 / self.window_size as f64
    }

    ///
    /// Gate, normalize and log transform a context block.
    ///
    /// # Arguments
    /// - matrix: square block of side `3 * window_size`
    ///
    pub fn apply(&self, matrix: &Array2<f64>) -> Result<WindowVerdict> {
        let side = self.context_size();
        if self.window_size == 0 || matrix.dim() != (side, side) {
            return Err(HicwinError::InvalidArgument(format!(
                "expected a {}x{} context block, got {:?}",
                side,
                side,
                matrix.dim()
            )));
        }

        let fraction = self.coverage(matrix);
        if fraction < self.coverage_threshold {
            return Ok(WindowVerdict::Rejected {
                reason: RejectReason::LowCoverage { fraction },
                center: self.center(matrix),
            });
        }

        let mask = valid_columns(matrix);
        let mut item = observed_over_expected(matrix, &mask)?;
        if item.iter().all(|v| v.is_nan()) {
            return Ok(WindowVerdict::Rejected {
                reason: RejectReason::NoSignal,
                center: self.center(matrix),
            });
        }
        interp_nan_2d(&mut item)?;

        let nonzero: Vec<f64> = item
            .iter()
            .copied()
            .filter(|v| *v != 0.0 && !v.is_nan())
            .collect();
        let fill = match quantile(&nonzero, self.zero_fill_quantile) {
            Some(fill) => fill,
            None => {
                return Ok(WindowVerdict::Rejected {
                    reason: RejectReason::NoSignal,
                    center: self.center(matrix),
                });
            }
        };
        item.mapv_inplace(|v| if v == 0.0 { fill } else { v });
        item.mapv_inplace(f64::log2);

        Ok(WindowVerdict::Accepted(self.center(&item)))
    }
}

///
/// Quantile with linear interpolation between closest ranks
/// (position `q * (n - 1)` in the sorted values). `None` for empty input.
///
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Convenience wrapper around [`WindowTransform::apply`] with default thresholds.
pub fn transform_window(matrix: &Array2<f64>, window_size: usize) -> Result<WindowVerdict> {
    WindowTransform::new(window_size).apply(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    /// Distance-decay block with a little position dependent texture.
    #[fixture]
    fn context() -> Array2<f64> {
        Array2::from_shape_fn((30, 30), |(i, j)| {
            let d = i.abs_diff(j) as f64;
            (100.0 / (d + 1.0)) * (1.0 + ((i + j) % 3) as f64 * 0.1)
        })
    }

    fn blank_columns(matrix: &mut Array2<f64>, cols: impl Iterator<Item = usize>) {
        for c in cols {
            matrix.column_mut(c).fill(f64::NAN);
            matrix.row_mut(c).fill(f64::NAN);
        }
    }

    #[rstest]
    #[case(vec![1.0, 2.0, 3.0, 4.0, 5.0], 0.5, 3.0)]
    #[case(vec![5.0, 1.0, 3.0], 0.0, 1.0)]
    #[case(vec![10.0, 0.0, 20.0], 1.0, 20.0)]
    #[case(vec![0.0, 100.0], 0.01, 1.0)]
    fn test_quantile(#[case] values: Vec<f64>, #[case] q: f64, #[case] expected: f64) {
        assert_eq!(quantile(&values, q), Some(expected));
    }

    #[rstest]
    fn test_quantile_empty() {
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[rstest]
    fn test_accepted_window_shape_and_finite(context: Array2<f64>) {
        let verdict = transform_window(&context, 10).unwrap();
        match verdict {
            WindowVerdict::Accepted(window) => {
                assert_eq!(window.dim(), (10, 10));
                assert!(window.iter().all(|v| v.is_finite()));
            }
            other => panic!("window unexpectedly rejected: {:?}", other),
        }
    }

    #[rstest]
    fn test_transform_is_deterministic(mut context: Array2<f64>) {
        blank_columns(&mut context, [3, 12, 25].into_iter());
        let first = transform_window(&context, 10).unwrap();
        let second = transform_window(&context, 10).unwrap();
        match (first, second) {
            (WindowVerdict::Accepted(a), WindowVerdict::Accepted(b)) => {
                let a_bits: Vec<u64> = a.iter().map(|v| v.to_bits()).collect();
                let b_bits: Vec<u64> = b.iter().map(|v| v.to_bits()).collect();
                assert_eq!(a_bits, b_bits);
            }
            _ => panic!("window unexpectedly rejected"),
        }
    }

    #[rstest]
    fn test_coverage_exactly_ninety_percent_is_accepted(mut context: Array2<f64>) {
        // one of ten central columns empty
        blank_columns(&mut context, std::iter::once(15));
        let transform = WindowTransform::new(10);
        assert_eq!(transform.coverage(&context), 0.9);
        assert!(transform.apply(&context).unwrap().is_accepted());
    }

    #[rstest]
    fn test_coverage_below_ninety_percent_is_rejected(mut context: Array2<f64>) {
        blank_columns(&mut context, [14, 15].into_iter());
        let verdict = transform_window(&context, 10).unwrap();
        match verdict {
            WindowVerdict::Rejected { reason, center } => {
                assert_eq!(reason, RejectReason::LowCoverage { fraction: 0.8 });
                // the diagnostic block is the raw centre
                assert_eq!(center[[0, 0]], context[[10, 10]]);
            }
            _ => panic!("window unexpectedly accepted"),
        }
    }

    #[rstest]
    fn test_flanking_gaps_do_not_count_against_coverage(mut context: Array2<f64>) {
        blank_columns(&mut context, (0..10).chain(20..30));
        assert!(transform_window(&context, 10).unwrap().is_accepted());
    }

    #[rstest]
    fn test_zero_cells_are_lifted_before_log(mut context: Array2<f64>) {
        // a zero cell and its mirror inside the centre
        context[[12, 17]] = 0.0;
        context[[17, 12]] = 0.0;
        match transform_window(&context, 10).unwrap() {
            WindowVerdict::Accepted(window) => {
                assert!(window[[2, 7]].is_finite());
                assert_eq!(window[[2, 7]], window[[7, 2]]);
            }
            _ => panic!("window unexpectedly rejected"),
        }
    }

    #[rstest]
    fn test_wrong_shape_is_an_error() {
        let m = Array2::<f64>::zeros((9, 9));
        assert!(transform_window(&m, 10).is_err());
    }

    #[rstest]
    fn test_all_zero_window_has_no_signal() {
        let m = Array2::<f64>::zeros((6, 6));
        match transform_window(&m, 2).unwrap() {
            WindowVerdict::Rejected { reason, .. } => assert_eq!(reason, RejectReason::NoSignal),
            _ => panic!("window unexpectedly accepted"),
        }
    }
}
