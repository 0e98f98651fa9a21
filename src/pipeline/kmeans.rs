//! Seeded k-means over the projected points.
//!
//! k-means++ initialization followed by Lloyd iterations. The seed comes in
//! from the pipeline config so labels are stable across reruns on the same
//! data; labels across *different* seeds carry no meaning.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERATIONS: usize = 300;

pub struct KMeans {
    k: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self { k, seed }
    }

    /// Label every row with its cluster in `[0, k)`. Caller guarantees
    /// `data.nrows() >= k`.
    pub fn fit_predict(&self, data: &Array2<f64>) -> Vec<usize> {
        let n = data.nrows();
        let d = data.ncols();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut centroids = self.init_plus_plus(data, &mut rng);
        let mut labels = vec![0usize; n];

        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for i in 0..n {
                let nearest = nearest_centroid(data.row(i), &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            let mut sums = Array2::<f64>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for i in 0..n {
                let label = labels[i];
                counts[label] += 1;
                for j in 0..d {
                    sums[[label, j]] += data[[i, j]];
                }
            }
            for c in 0..self.k {
                // an emptied cluster keeps its previous centroid
                if counts[c] > 0 {
                    for j in 0..d {
                        centroids[[c, j]] = sums[[c, j]] / counts[c] as f64;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        labels
    }

    /// k-means++: first centroid uniform, the rest sampled proportionally to
    /// squared distance from the nearest already-chosen centroid.
    fn init_plus_plus(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        let first = rng.gen_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        let mut dist2 = vec![f64::MAX; n];
        for c in 1..self.k {
            for i in 0..n {
                let dd = squared_distance(data.row(i), centroids.row(c - 1));
                if dd < dist2[i] {
                    dist2[i] = dd;
                }
            }
            let total: f64 = dist2.iter().sum();
            let choice = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut picked = n - 1;
                for (i, &w) in dist2.iter().enumerate() {
                    if target < w {
                        picked = i;
                        break;
                    }
                    target -= w;
                }
                picked
            } else {
                // all points coincide with chosen centroids
                rng.gen_range(0..n)
            };
            centroids.row_mut(c).assign(&data.row(choice));
        }

        centroids
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dd = squared_distance(point, centroid);
        if dd < best_dist {
            best_dist = dd;
            best = c;
        }
    }
    best
}
