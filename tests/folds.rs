//! Integration tests for the shared fold assignment.

use std::collections::HashSet;

use lifeboat::folds::FoldPlanner;

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn same_seed_reproduces_the_same_assignment() {
    let a = FoldPlanner::plan(137, 5, 42);
    let b = FoldPlanner::plan(137, 5, 42);
    assert_eq!(a, b);
}

#[test]
fn different_seeds_disagree_somewhere() {
    let a = FoldPlanner::plan(137, 5, 42);
    let b = FoldPlanner::plan(137, 5, 43);
    assert_ne!(a.labels(), b.labels());
}

// ---------------------------------------------------------------------------
// Partition shape
// ---------------------------------------------------------------------------

#[test]
fn every_row_gets_exactly_one_label_in_range() {
    let folds = FoldPlanner::plan(300, 5, 7);
    assert_eq!(folds.n_rows(), 300);
    assert!(folds.labels().iter().all(|&l| l < 5));
}

#[test]
fn fold_sizes_are_balanced_within_one() {
    for n in [300usize, 301, 302, 303, 304] {
        let folds = FoldPlanner::plan(n, 5, 9);
        let mut sizes = vec![0usize; 5];
        for &l in folds.labels() {
            sizes[l] += 1;
        }
        let min = *sizes.iter().min().unwrap();
        let max = *sizes.iter().max().unwrap();
        assert!(max - min <= 1, "n = {}: sizes {:?}", n, sizes);
    }
}

#[test]
fn train_and_test_indices_partition_the_rows() {
    let folds = FoldPlanner::plan(101, 5, 3);
    for fold in 0..5 {
        let train = folds.train_indices(fold);
        let test = folds.test_indices(fold);
        assert_eq!(train.len() + test.len(), 101);

        let train_set: HashSet<usize> = train.into_iter().collect();
        let test_set: HashSet<usize> = test.into_iter().collect();
        assert!(train_set.is_disjoint(&test_set));
        assert_eq!(train_set.len() + test_set.len(), 101);
    }
}
