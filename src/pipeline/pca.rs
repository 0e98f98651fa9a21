//! Principal-component analysis over the standardized feature matrix.
//!
//! Full rank: every component is kept for variance accounting, the UI
//! decides how many to draw (typically three). The eigendecomposition is
//! cyclic Jacobi on the covariance matrix, which stays small - features x
//! features - for this workload. No automatic truncation happens here; the
//! ratios are diagnostic output, not a selection criterion.

use ndarray::{Array1, Array2};

pub struct Pca {
    /// Features x components, eigenvectors in the columns, ordered by
    /// descending eigenvalue.
    pub components: Array2<f64>,
    pub explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Fit on already-centered (standardized) data.
    pub fn fit(data: &Array2<f64>) -> Self {
        let n = data.nrows() as f64;
        let d = data.ncols();
        let covariance = data.t().dot(data) / (n - 1.0).max(1.0);
        let (eigenvalues, eigenvectors) = jacobi_eigen(&covariance);

        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut components = Array2::zeros((d, d));
        let mut sorted_values = Vec::with_capacity(d);
        for (k, &i) in order.iter().enumerate() {
            // numerical noise can push a zero eigenvalue slightly negative
            sorted_values.push(eigenvalues[i].max(0.0));
            for r in 0..d {
                components[[r, k]] = eigenvectors[[r, i]];
            }
        }

        let total: f64 = sorted_values.iter().sum();
        let explained_variance_ratio = if total > 0.0 {
            sorted_values.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; d]
        };

        Self {
            components,
            explained_variance_ratio,
        }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        data.dot(&self.components)
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix. Returns the
/// eigenvalues on the diagonal and the accumulated rotations as columns.
fn jacobi_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let d = matrix.nrows();
    let mut a = matrix.clone();
    let mut v: Array2<f64> = Array2::eye(d);

    for _sweep in 0..100 {
        let off: f64 = (0..d)
            .flat_map(|p| ((p + 1)..d).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off < 1e-18 {
            break;
        }

        for p in 0..d {
            for q in (p + 1)..d {
                let apq = a[[p, q]];
                if apq.abs() < 1e-300 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (theta * theta + 1.0).sqrt())
                } else {
                    1.0 / (theta - (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                let app = a[[p, p]];
                let aqq = a[[q, q]];
                a[[p, p]] = app - t * apq;
                a[[q, q]] = aqq + t * apq;
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..d {
                    if k == p || k == q {
                        continue;
                    }
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[p, k]] = a[[k, p]];
                    a[[k, q]] = s * akp + c * akq;
                    a[[q, k]] = a[[k, q]];
                }

                for k in 0..d {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn jacobi_recovers_diagonal_eigenvalues() {
        let m = array![[3.0, 0.0], [0.0, 1.0]];
        let (values, _) = jacobi_eigen(&m);
        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert!((sorted[0] - 3.0).abs() < 1e-10);
        assert!((sorted[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn jacobi_handles_off_diagonal() {
        // eigenvalues of [[2,1],[1,2]] are 3 and 1
        let m = array![[2.0, 1.0], [1.0, 2.0]];
        let (values, vectors) = jacobi_eigen(&m);
        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert!((sorted[0] - 3.0).abs() < 1e-10);
        assert!((sorted[1] - 1.0).abs() < 1e-10);
        // columns stay orthonormal
        let dot = vectors.column(0).dot(&vectors.column(1));
        assert!(dot.abs() < 1e-10);
    }

    #[test]
    fn single_feature_ratio_is_one() {
        let data = array![[1.0], [-1.0], [0.5], [-0.5]];
        let pca = Pca::fit(&data);
        assert_eq!(pca.explained_variance_ratio.len(), 1);
        assert!((pca.explained_variance_ratio[0] - 1.0).abs() < 1e-12);
    }
}
