//! Unsupervised Pattern-Detection Pipeline
//!
//! CRISP-DM style chain over the numeric columns:
//! standardize -> PCA -> k-means + isolation forest -> cluster summaries.
//!
//! Clustering and anomaly detection both run on the PCA projection and are
//! independent of each other: a row can sit in cluster 2 and still be
//! flagged anomalous. Both randomized stages take their seed from the config
//! so repeated runs over identical data return identical labels.

pub mod features;
pub mod pca;
pub mod kmeans;
pub mod forest;

#[cfg(test)]
mod tests;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SEED;
use crate::error::{Error, Result};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of k-means clusters, at least 2.
    pub n_clusters: usize,
    /// Expected anomaly proportion, strictly between 0 and 1.
    pub contamination: f64,
    /// Seed for both randomized stages.
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            contamination: 0.1,
            seed: DEFAULT_SEED,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.n_clusters < 2 {
            return Err(Error::InvalidParameter(format!(
                "n_clusters must be at least 2, got {}",
                self.n_clusters
            )));
        }
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "contamination must be in (0, 1), got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    pub percentage: f64,
    pub anomalies: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Numeric columns the feature matrix was built from.
    pub feature_columns: Vec<String>,
    /// Per-row coordinates in principal-component space, full rank. The UI
    /// typically draws the first three.
    pub projection: Vec<Vec<f64>>,
    /// Non-negative, non-increasing, summing to at most 1.
    pub explained_variance_ratio: Vec<f64>,
    /// Per-row cluster label in `[0, n_clusters)`.
    pub clusters: Vec<usize>,
    /// Per-row anomaly flag, independent of the cluster label.
    pub anomalies: Vec<bool>,
    pub cluster_stats: Vec<ClusterSummary>,
}

/// Run the full pipeline. Hard errors only for preconditions (no numeric
/// columns, fewer rows than clusters, invalid parameters); everything past
/// the preconditions is deterministic given the seed.
pub fn run(table: &Table, config: &PipelineConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let matrix = features::FeatureMatrix::from_table(table)?;
    let n_rows = matrix.data.nrows();
    if n_rows < config.n_clusters {
        return Err(Error::NotEnoughRows {
            rows: n_rows,
            clusters: config.n_clusters,
        });
    }

    let standardized = features::standardize(&matrix.data);
    let pca = pca::Pca::fit(&standardized);
    let projected = pca.transform(&standardized);

    let clusters = kmeans::KMeans::new(config.n_clusters, config.seed).fit_predict(&projected);
    let anomalies =
        forest::IsolationForest::new(config.contamination, config.seed).fit_predict(&projected);

    let cluster_stats = summarize(&clusters, &anomalies);

    log::info!(
        "analysis done: {} rows, {} features, {} clusters, {} anomalies",
        n_rows,
        matrix.names.len(),
        cluster_stats.len(),
        anomalies.iter().filter(|a| **a).count()
    );

    Ok(AnalysisReport {
        feature_columns: matrix.names,
        projection: to_rows(&projected),
        explained_variance_ratio: pca.explained_variance_ratio,
        clusters,
        anomalies,
        cluster_stats,
    })
}

fn to_rows(data: &Array2<f64>) -> Vec<Vec<f64>> {
    data.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Size, share and anomaly count per distinct cluster label present.
fn summarize(clusters: &[usize], anomalies: &[bool]) -> Vec<ClusterSummary> {
    let total = clusters.len();
    let mut labels: Vec<usize> = clusters.to_vec();
    labels.sort_unstable();
    labels.dedup();

    labels
        .into_iter()
        .map(|label| {
            let size = clusters.iter().filter(|&&c| c == label).count();
            let anomaly_count = clusters
                .iter()
                .zip(anomalies.iter())
                .filter(|(&c, &a)| c == label && a)
                .count();
            ClusterSummary {
                cluster: label,
                size,
                percentage: size as f64 / total as f64 * 100.0,
                anomalies: anomaly_count,
            }
        })
        .collect()
}
