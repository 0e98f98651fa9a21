//! Isolation forest anomaly detector.
//!
//! Standard construction: 100 trees over 256-point sub-samples with random
//! axis-aligned splits, path lengths normalized by the average
//! unsuccessful-search length of a binary tree. Rows whose score lands in
//! the top `contamination` fraction are flagged. Runs on the same projected
//! points as k-means but shares nothing with it.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_TREES: usize = 100;
const SAMPLE_SIZE: usize = 256;
const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

pub struct IsolationForest {
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    pub fn new(contamination: f64, seed: u64) -> Self {
        Self {
            contamination,
            seed,
        }
    }

    /// Flag the top `contamination` fraction of rows by isolation score.
    pub fn fit_predict(&self, data: &Array2<f64>) -> Vec<bool> {
        let n = data.nrows();
        if n == 0 {
            return Vec::new();
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let sample_size = SAMPLE_SIZE.min(n);
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(N_TREES);
        for _ in 0..N_TREES {
            let sample = sample_without_replacement(n, sample_size, &mut rng);
            trees.push(build_tree(data, &sample, 0, max_depth, &mut rng));
        }

        let normalizer = average_path_length(sample_size);
        let scores: Vec<f64> = (0..n)
            .map(|i| {
                let mean_path: f64 = trees
                    .iter()
                    .map(|t| path_length(t, data, i, 0))
                    .sum::<f64>()
                    / N_TREES as f64;
                2f64.powf(-mean_path / normalizer)
            })
            .collect();

        let n_anomalies = ((n as f64) * self.contamination).ceil() as usize;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut flags = vec![false; n];
        for &i in order.iter().take(n_anomalies.min(n)) {
            flags[i] = true;
        }
        flags
    }
}

fn sample_without_replacement(n: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    // partial Fisher-Yates over the index range
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

fn build_tree(
    data: &Array2<f64>,
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // only features with spread in this sub-sample can split it
    let candidates: Vec<usize> = (0..data.ncols())
        .filter(|&j| {
            let (lo, hi) = min_max(data, indices, j);
            hi > lo
        })
        .collect();
    if candidates.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let feature = candidates[rng.gen_range(0..candidates.len())];
    let (lo, hi) = min_max(data, indices, feature);
    let threshold = rng.gen_range(lo..hi);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| data[[i, feature]] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, &left_idx, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(data, &right_idx, depth + 1, max_depth, rng)),
    }
}

fn min_max(data: &Array2<f64>, indices: &[usize], feature: usize) -> (f64, f64) {
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for &i in indices {
        let v = data[[i, feature]];
        if v < lo {
            lo = v;
        }
        if v > hi {
            hi = v;
        }
    }
    (lo, hi)
}

fn path_length(node: &Node, data: &Array2<f64>, row: usize, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            let next = if data[[row, *feature]] < *threshold {
                left
            } else {
                right
            };
            path_length(next, data, row, depth + 1)
        }
    }
}

/// Average unsuccessful-search path length of a binary search tree with `n`
/// nodes, the c(n) normalizer from the isolation forest paper.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn cluster_with_outlier() -> Array2<f64> {
        let mut flat = Vec::new();
        for i in 0..40 {
            flat.push((i % 7) as f64 * 0.1);
            flat.push((i % 5) as f64 * 0.1);
        }
        // one far-away point
        flat.push(100.0);
        flat.push(100.0);
        Array2::from_shape_vec((41, 2), flat).unwrap()
    }

    #[test]
    fn flags_the_obvious_outlier() {
        let data = cluster_with_outlier();
        let flags = IsolationForest::new(0.05, 42).fit_predict(&data);
        assert_eq!(flags.len(), 41);
        assert!(flags[40], "far-away point must be flagged");
    }

    #[test]
    fn flag_count_follows_contamination() {
        let data = cluster_with_outlier();
        let flags = IsolationForest::new(0.1, 42).fit_predict(&data);
        let expected = (41.0f64 * 0.1).ceil() as usize;
        assert_eq!(flags.iter().filter(|f| **f).count(), expected);
    }

    #[test]
    fn same_seed_same_flags() {
        let data = cluster_with_outlier();
        let a = IsolationForest::new(0.1, 9).fit_predict(&data);
        let b = IsolationForest::new(0.1, 9).fit_predict(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn identical_rows_do_not_panic() {
        let data = Array2::from_elem((10, 3), 1.0);
        let flags = IsolationForest::new(0.2, 42).fit_predict(&data);
        assert_eq!(flags.len(), 10);
        assert_eq!(flags.iter().filter(|f| **f).count(), 2);
    }
}
