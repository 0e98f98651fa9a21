//! Feature matrix construction: numeric selection, imputation, scaling.

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};
use crate::table::{ColumnData, Table};

pub struct FeatureMatrix {
    pub names: Vec<String>,
    /// Rows x features, missing values already imputed.
    pub data: Array2<f64>,
}

impl FeatureMatrix {
    /// Collect all numeric columns. Missing values are zero-filled, the
    /// canonical imputation policy of the pipeline.
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut names = Vec::new();
        let mut columns: Vec<&Vec<Option<f64>>> = Vec::new();
        for column in table.columns() {
            if let ColumnData::Number(values) = &column.data {
                names.push(column.name.clone());
                columns.push(values);
            }
        }
        if names.is_empty() {
            return Err(Error::NoNumericColumns);
        }

        let n_rows = table.n_rows();
        let mut data = Array2::zeros((n_rows, names.len()));
        for (j, values) in columns.iter().enumerate() {
            for (i, value) in values.iter().enumerate() {
                data[[i, j]] = value.unwrap_or(0.0);
            }
        }
        Ok(Self { names, data })
    }
}

/// Zero mean, unit variance per column. A constant column keeps scale 1.0 so
/// it standardizes to all zeros instead of dividing by zero.
pub fn standardize(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows().max(1) as f64;
    let mut out = data.clone();
    for mut column in out.axis_iter_mut(Axis(1)) {
        let mean = column.sum() / n;
        let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let scale = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        column.mapv_inplace(|v| (v - mean) / scale);
    }
    out
}
