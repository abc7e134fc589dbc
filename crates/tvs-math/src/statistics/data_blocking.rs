//! Data-blocking estimator.
//!
//! The `M` observations of each column are split into `N` contiguous blocks
//! of `L = M / N` samples. For the first `n + 1` block averages `a_0..a_n`
//! the progressive mean is `⟨a⟩` and the progressive error is
//! `sqrt((⟨a²⟩ − ⟨a⟩²) / n)`, defined as 0 for `n = 0`.

use crate::{Array, Matrix};
use tvs_core::{errors::Result, Error, Real};

/// What to do with observations left over when the sample count is not a
/// multiple of the block count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockRemainder {
    /// Fail with `Error::InvalidArgument`.
    #[default]
    Reject,
    /// Drop the trailing `M mod N` observations.
    Truncate,
}

/// Output of [`data_blocking`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlocking {
    /// Number of observations preceding each block: `[0, L, 2L, …]`.
    pub x: Vec<usize>,
    /// Progressive mean, `n_blocks × n_columns`.
    pub mean: Matrix,
    /// Progressive error, `n_blocks × n_columns`.
    pub error: Matrix,
    /// Block length `L`.
    pub block_len: usize,
}

impl DataBlocking {
    /// Final estimate and error of column `col`, i.e. the last row.
    pub fn estimate(&self, col: usize) -> (Real, Real) {
        let last = self.mean.nrows() - 1;
        (self.mean[(last, col)], self.error[(last, col)])
    }
}

/// Block-average each column of `observations` (`n_obs × n_columns`).
pub fn data_blocking(
    observations: &Matrix,
    n_blocks: usize,
    remainder: BlockRemainder,
) -> Result<DataBlocking> {
    let m = observations.nrows();
    let k = observations.ncols();
    tvs_core::ensure!(k > 0, "observations must have at least one column");
    check_block_count(m, n_blocks, remainder)?;
    let l = m / n_blocks;

    let mut mean = Matrix::zeros(n_blocks, k);
    let mut error = Matrix::zeros(n_blocks, k);
    for col in 0..k {
        let column = observations.column(col);
        let mut sum = 0.0;
        let mut sum2 = 0.0;
        for i in 0..n_blocks {
            let ave = column.rows(i * l, l).sum() / l as Real;
            sum += ave;
            sum2 += ave * ave;
            let n = (i + 1) as Real;
            let av = sum / n;
            let av2 = sum2 / n;
            mean[(i, col)] = av;
            error[(i, col)] = if i == 0 {
                0.0
            } else {
                ((av2 - av * av).max(0.0) / i as Real).sqrt()
            };
        }
    }

    Ok(DataBlocking {
        x: (0..n_blocks).map(|i| i * l).collect(),
        mean,
        error,
        block_len: l,
    })
}

// Every misuse of the block count is an invalid argument.
fn check_block_count(m: usize, n_blocks: usize, remainder: BlockRemainder) -> Result<()> {
    let problem = if n_blocks == 0 {
        "block count must be positive".to_string()
    } else if m < n_blocks {
        format!("{m} observations cannot fill {n_blocks} blocks")
    } else if remainder == BlockRemainder::Reject && m % n_blocks != 0 {
        format!("{m} observations are not divisible into {n_blocks} blocks")
    } else {
        return Ok(());
    };
    Err(Error::InvalidArgument(problem))
}

/// Data blocking of a single series.
pub fn data_blocking_1d(
    observations: &[Real],
    n_blocks: usize,
    remainder: BlockRemainder,
) -> Result<DataBlocking> {
    data_blocking(
        &Matrix::from_column_slice(observations.len(), 1, observations),
        n_blocks,
        remainder,
    )
}

/// Per-column mean and standard error (population std / √n).
pub fn mean_and_error(observations: &Matrix) -> Result<(Array, Array)> {
    let n = observations.nrows();
    tvs_core::ensure!(n > 0, "cannot estimate from zero observations");
    let k = observations.ncols();
    let mut mean = Array::zeros(k);
    let mut error = Array::zeros(k);
    for (col, column) in observations.column_iter().enumerate() {
        let mu = column.mean();
        let var = column.iter().map(|x| (x - mu).powi(2)).sum::<Real>() / n as Real;
        mean[col] = mu;
        error[col] = (var / n as Real).sqrt();
    }
    Ok((mean, error))
}

/// Mean and standard error of a single series.
pub fn mean_and_error_1d(observations: &[Real]) -> Result<(Real, Real)> {
    let (mean, error) =
        mean_and_error(&Matrix::from_column_slice(observations.len(), 1, observations))?;
    Ok((mean[0], error[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn progressive_means_and_errors() {
        let data = [1.0, 3.0, 2.0, 4.0, 6.0, 8.0];
        let b = data_blocking_1d(&data, 3, BlockRemainder::Reject).unwrap();
        assert_eq!(b.x, vec![0, 2, 4]);
        assert_eq!(b.block_len, 2);
        // block averages 2, 3, 7
        assert_abs_diff_eq!(b.mean[(0, 0)], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(b.mean[(1, 0)], 2.5, epsilon = 1e-14);
        assert_abs_diff_eq!(b.mean[(2, 0)], 4.0, epsilon = 1e-14);
        assert_eq!(b.error[(0, 0)], 0.0);
        assert_abs_diff_eq!(b.error[(1, 0)], 0.5, epsilon = 1e-14);
        let var: Real = (4.0 + 9.0 + 49.0) / 3.0 - 16.0;
        assert_abs_diff_eq!(b.error[(2, 0)], (var / 2.0).sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn remainder_policy() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(data_blocking_1d(&data, 2, BlockRemainder::Reject).is_err());
        let b = data_blocking_1d(&data, 2, BlockRemainder::Truncate).unwrap();
        assert_eq!(b.block_len, 2);
        assert_abs_diff_eq!(b.estimate(0).0, 2.5, epsilon = 1e-14);
    }

    #[test]
    fn block_count_misuse_is_an_invalid_argument() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        for (n_blocks, remainder) in [
            (0, BlockRemainder::Truncate),
            (6, BlockRemainder::Truncate),
            (6, BlockRemainder::Reject),
            (2, BlockRemainder::Reject),
        ] {
            assert!(
                matches!(
                    data_blocking_1d(&data, n_blocks, remainder),
                    Err(Error::InvalidArgument(_))
                ),
                "{n_blocks} blocks with {remainder:?}"
            );
        }
    }

    #[test]
    fn columns_are_independent() {
        let obs = Matrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]);
        let b = data_blocking(&obs, 2, BlockRemainder::Reject).unwrap();
        assert_abs_diff_eq!(b.estimate(0).0, 2.5, epsilon = 1e-14);
        assert_abs_diff_eq!(b.estimate(1).0, 25.0, epsilon = 1e-14);
        assert_abs_diff_eq!(b.estimate(1).1, 10.0 * b.estimate(0).1, epsilon = 1e-12);
    }

    #[test]
    fn plain_mean_and_error() {
        let (mean, err) = mean_and_error_1d(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_abs_diff_eq!(mean, 2.5, epsilon = 1e-14);
        assert_abs_diff_eq!(err, (1.25_f64 / 4.0).sqrt(), epsilon = 1e-14);
        assert!(mean_and_error_1d(&[]).is_err());
    }

    proptest! {
        #[test]
        fn unit_blocks_reproduce_plain_mean(data in prop::collection::vec(-10.0f64..10.0, 1..64)) {
            let b = data_blocking_1d(&data, data.len(), BlockRemainder::Reject).unwrap();
            let (mean, _) = mean_and_error_1d(&data).unwrap();
            let (est, _) = b.estimate(0);
            prop_assert!((est - mean).abs() < 1e-10);
            prop_assert_eq!(b.error[(0, 0)], 0.0);
        }
    }
}
