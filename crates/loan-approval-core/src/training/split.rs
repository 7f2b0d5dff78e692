use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::LoanError;
use crate::LoanResult;

/// Seeded shuffle, then the first `ceil(n * test_size)` rows become the test set.
///
/// Returns `(train, test)`. Both partitions must be non-empty.
pub fn train_test_split<T: Clone>(
    rows: &[T],
    test_size: f64,
    seed: u64,
) -> LoanResult<(Vec<T>, Vec<T>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(LoanError::InvalidInput {
            field: "test_size".into(),
            reason: "Must be strictly between 0 and 1".into(),
        });
    }
    let n = rows.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(LoanError::InsufficientData(format!(
            "Cannot split {n} rows into non-empty train and test sets with test_size {test_size}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let test = order[..n_test].iter().map(|&i| rows[i].clone()).collect();
    let train = order[n_test..].iter().map(|&i| rows[i].clone()).collect();
    Ok((train, test))
}
