//! Chronological train/test splitting.
//!
//! Every strategy works on sample indices of a time-ordered dataset and never
//! shuffles. Parameters that cannot produce a usable fold yield no splits.

use serde::{Deserialize, Serialize};

/// One train/test fold. Both index vectors are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub fold: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Cross-validation strategy over chronologically ordered samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Training set grows each fold, test windows follow it.
    ExpandingWindow {
        n_splits: usize,
        /// Defaults to n_samples / (n_splits + 1)
        test_size: Option<usize>,
        /// Samples dropped between train end and test start
        gap: usize,
    },
    /// Fixed-size training window sliding forward.
    WalkForward {
        train_size: usize,
        test_size: usize,
        /// Defaults to test_size
        step: Option<usize>,
        gap: usize,
    },
    /// Contiguous k-fold with a purge buffer on both sides of the test fold.
    PurgedKFold { n_splits: usize, purge_gap: usize },
}

impl SplitStrategy {
    pub fn expanding(n_splits: usize) -> Self {
        SplitStrategy::ExpandingWindow {
            n_splits,
            test_size: None,
            gap: 0,
        }
    }

    pub fn walk_forward(train_size: usize, test_size: usize) -> Self {
        SplitStrategy::WalkForward {
            train_size,
            test_size,
            step: None,
            gap: 0,
        }
    }

    pub fn purged_k_fold(n_splits: usize, purge_gap: usize) -> Self {
        SplitStrategy::PurgedKFold {
            n_splits,
            purge_gap,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitStrategy::ExpandingWindow { .. } => "expanding_window",
            SplitStrategy::WalkForward { .. } => "walk_forward",
            SplitStrategy::PurgedKFold { .. } => "purged_k_fold",
        }
    }

    /// Produce the folds for `n_samples` samples.
    pub fn split(&self, n_samples: usize) -> Vec<Split> {
        match *self {
            SplitStrategy::ExpandingWindow {
                n_splits,
                test_size,
                gap,
            } => expanding_window(n_samples, n_splits, test_size, gap),
            SplitStrategy::WalkForward {
                train_size,
                test_size,
                step,
                gap,
            } => walk_forward(n_samples, train_size, test_size, step.unwrap_or(test_size), gap),
            SplitStrategy::PurgedKFold {
                n_splits,
                purge_gap,
            } => purged_k_fold(n_samples, n_splits, purge_gap),
        }
    }
}

fn expanding_window(
    n_samples: usize,
    n_splits: usize,
    test_size: Option<usize>,
    gap: usize,
) -> Vec<Split> {
    if n_splits == 0 {
        return Vec::new();
    }
    let test_size = test_size.unwrap_or(n_samples / (n_splits + 1));
    if test_size == 0 {
        return Vec::new();
    }

    let mut splits = Vec::with_capacity(n_splits);
    for i in 0..n_splits {
        let test_start = match (i + 1).checked_mul(test_size) {
            Some(start) if start < n_samples => start,
            _ => break,
        };
        let test_end = test_start.saturating_add(test_size).min(n_samples);
        let train_end = test_start.saturating_sub(gap);
        if train_end == 0 {
            continue;
        }

        splits.push(Split {
            fold: splits.len(),
            train: (0..train_end).collect(),
            test: (test_start..test_end).collect(),
        });
    }

    splits
}

fn walk_forward(
    n_samples: usize,
    train_size: usize,
    test_size: usize,
    step: usize,
    gap: usize,
) -> Vec<Split> {
    if train_size == 0 || test_size == 0 || step == 0 {
        return Vec::new();
    }

    let mut splits = Vec::new();
    let mut start: usize = 0;
    loop {
        let Some(train_end) = start.checked_add(train_size) else {
            break;
        };
        let Some(test_start) = train_end.checked_add(gap) else {
            break;
        };
        let test_end = match test_start.checked_add(test_size) {
            Some(end) if end <= n_samples => end,
            _ => break,
        };

        splits.push(Split {
            fold: splits.len(),
            train: (start..train_end).collect(),
            test: (test_start..test_end).collect(),
        });
        match start.checked_add(step) {
            Some(next) => start = next,
            None => break,
        }
    }

    splits
}

fn purged_k_fold(n_samples: usize, n_splits: usize, purge_gap: usize) -> Vec<Split> {
    if n_splits < 2 || n_samples < n_splits {
        return Vec::new();
    }

    let fold_size = n_samples / n_splits;
    let mut splits = Vec::with_capacity(n_splits);

    for i in 0..n_splits {
        let test_start = i * fold_size;
        let test_end = if i == n_splits - 1 {
            n_samples
        } else {
            (i + 1) * fold_size
        };

        // Drop `purge_gap` samples on both sides of the test fold
        let purge_start = test_start.saturating_sub(purge_gap);
        let purge_end = test_end.saturating_add(purge_gap).min(n_samples);
        let train: Vec<usize> = (0..n_samples)
            .filter(|&idx| idx < purge_start || idx >= purge_end)
            .collect();
        if train.is_empty() {
            continue;
        }

        splits.push(Split {
            fold: splits.len(),
            train,
            test: (test_start..test_end).collect(),
        });
    }

    splits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanding_window() {
        let splits = SplitStrategy::expanding(4).split(100);
        assert_eq!(splits.len(), 4);

        // test_size = 100 / 5 = 20
        assert_eq!(splits[0].train, (0..20).collect::<Vec<_>>());
        assert_eq!(splits[0].test, (20..40).collect::<Vec<_>>());
        assert_eq!(splits[3].train.len(), 80);
        assert_eq!(splits[3].test, (80..100).collect::<Vec<_>>());

        for pair in splits.windows(2) {
            assert!(pair[1].train.len() > pair[0].train.len());
        }
    }

    #[test]
    fn test_expanding_window_gap() {
        let strategy = SplitStrategy::ExpandingWindow {
            n_splits: 3,
            test_size: Some(10),
            gap: 5,
        };
        let splits = strategy.split(50);

        assert_eq!(splits.len(), 3);
        for split in &splits {
            let train_max = *split.train.last().unwrap();
            let test_min = split.test[0];
            assert_eq!(test_min - train_max, 6);
        }
    }

    #[test]
    fn test_walk_forward() {
        let strategy = SplitStrategy::WalkForward {
            train_size: 30,
            test_size: 10,
            step: None,
            gap: 2,
        };
        let splits = strategy.split(100);

        // start = 0, 10, ..., 50 (50 + 30 + 2 + 10 = 92); 60 -> 102 > 100
        assert_eq!(splits.len(), 6);
        for split in &splits {
            assert_eq!(split.train.len(), 30);
            assert_eq!(split.test.len(), 10);
            assert!(split.train.last().unwrap() + 2 < split.test[0]);
        }
        assert_eq!(splits[1].train[0], 10);
    }

    #[test]
    fn test_no_test_sample_precedes_training() {
        for strategy in [SplitStrategy::expanding(5), SplitStrategy::walk_forward(20, 5)] {
            for split in strategy.split(120) {
                assert!(split.train.last().unwrap() < &split.test[0]);
            }
        }
    }

    #[test]
    fn test_purged_k_fold_gap() {
        let purge_gap = 5;
        let splits = SplitStrategy::purged_k_fold(5, purge_gap).split(100);
        assert_eq!(splits.len(), 5);

        for split in &splits {
            let test_start = split.test[0];
            let test_end = *split.test.last().unwrap() + 1;
            for &idx in &split.train {
                assert!(idx + purge_gap < test_start || idx >= test_end + purge_gap);
                assert!(!split.test.contains(&idx));
            }
        }

        // Middle fold: test 40..60, train excludes 35..65
        assert_eq!(splits[2].train.len(), 100 - 30);
    }

    #[test]
    fn test_purged_k_fold_last_fold_absorbs_remainder() {
        let splits = SplitStrategy::purged_k_fold(3, 0).split(10);
        assert_eq!(splits[2].test, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_invalid_parameters_yield_no_splits() {
        assert!(SplitStrategy::expanding(0).split(100).is_empty());
        assert!(SplitStrategy::expanding(10).split(5).is_empty());
        assert!(SplitStrategy::walk_forward(0, 5).split(100).is_empty());
        assert!(SplitStrategy::walk_forward(200, 5).split(100).is_empty());
        assert!(SplitStrategy::purged_k_fold(1, 0).split(100).is_empty());
        assert!(SplitStrategy::purged_k_fold(10, 0).split(5).is_empty());
        assert!(SplitStrategy::expanding(3).split(0).is_empty());
    }

    #[test]
    fn test_huge_sizes_yield_no_splits() {
        assert!(SplitStrategy::walk_forward(usize::MAX, 5).split(100).is_empty());
        assert!(SplitStrategy::walk_forward(20, usize::MAX).split(100).is_empty());
        let gapped = SplitStrategy::WalkForward {
            train_size: 20,
            test_size: 5,
            step: None,
            gap: usize::MAX,
        };
        assert!(gapped.split(100).is_empty());
        let expanding = SplitStrategy::ExpandingWindow {
            n_splits: 3,
            test_size: Some(usize::MAX),
            gap: 0,
        };
        assert!(expanding.split(100).is_empty());
    }

    #[test]
    fn test_huge_step_stops_after_first_fold() {
        let strategy = SplitStrategy::WalkForward {
            train_size: 20,
            test_size: 5,
            step: Some(usize::MAX),
            gap: 0,
        };
        assert_eq!(strategy.split(100).len(), 1);

        let purged = SplitStrategy::purged_k_fold(4, usize::MAX).split(100);
        assert!(purged.is_empty());
    }

    #[test]
    fn test_strategy_deserializes_from_tagged_json() {
        let strategy: SplitStrategy =
            serde_json::from_str(r#"{"type":"purged_k_fold","n_splits":4,"purge_gap":3}"#).unwrap();
        assert_eq!(strategy, SplitStrategy::purged_k_fold(4, 3));
    }
}
