// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles rows and splits them into a training set and a
// held-out test set by a fixed test fraction.
//
//   test size  = round(n * test_fraction)
//   train size = n - test size
//
// With a seed the split is reproducible (StdRng); without one
// it uses thread_rng. There is no stratification: the attrition
// rate of the test set can drift from the training set.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::dataset::Dataset;
use crate::error::{AttritionError, Result};

/// Split `dataset` into (train, test). `test_fraction` must be in (0, 1).
pub fn split_train_test(
    dataset: Dataset,
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<(Dataset, Dataset)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AttritionError::InvalidArgument(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let (schema, mut rows) = dataset.into_parts();

    match seed {
        Some(seed) => rows.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => rows.shuffle(&mut rand::thread_rng()),
    }

    let total = rows.len();
    let test_len = ((total as f64) * test_fraction).round() as usize;
    let split_at = total - test_len.min(total);

    // split_off(n) leaves [0..n) in `rows` and returns [n..total)
    let test = rows.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test ({:.0}% held out)",
        rows.len(),
        test.len(),
        test_fraction * 100.0,
    );

    let train = Dataset::new(schema.clone(), rows);
    let test = Dataset::new(schema, test);
    Ok((train, test))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::employee_dataset;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn correct_split_sizes() {
        let ds = employee_dataset(100, 1);
        let (train, test) = split_train_test(ds, 0.2, Some(7)).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn reference_sized_split() {
        let ds = employee_dataset(1470, 3);
        let (train, test) = split_train_test(ds, 0.2, Some(7)).unwrap();
        assert_eq!(test.len(), 294);
        assert_eq!(train.len(), 1176);
    }

    #[test]
    fn seeded_split_is_reproducible() {
        let a = split_train_test(employee_dataset(60, 4), 0.3, Some(11)).unwrap();
        let b = split_train_test(employee_dataset(60, 4), 0.3, Some(11)).unwrap();
        let ids = |d: &Dataset| d.rows().iter().map(|e| e.row_id()).collect::<Vec<_>>();
        assert_eq!(ids(&a.1), ids(&b.1));
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let ds = employee_dataset(10, 1);
            assert!(split_train_test(ds, f, Some(1)).is_err());
        }
    }

    #[test]
    fn unseeded_split_preserves_rows() {
        let (train, test) = split_train_test(employee_dataset(30, 2), 0.5, None).unwrap();
        assert_eq!(train.len() + test.len(), 30);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn split_is_a_partition(n in 1usize..120, f in 0.05f64..0.95, seed in any::<u64>()) {
            let ds = employee_dataset(n, 5);
            let (train, test) = split_train_test(ds, f, Some(seed)).unwrap();
            prop_assert_eq!(train.len() + test.len(), n);

            let train_ids: HashSet<usize> = train.rows().iter().map(|e| e.row_id()).collect();
            let test_ids: HashSet<usize> = test.rows().iter().map(|e| e.row_id()).collect();
            prop_assert!(train_ids.is_disjoint(&test_ids));
            prop_assert_eq!(train_ids.len() + test_ids.len(), n);
        }
    }
}
