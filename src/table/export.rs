//! Results export - the analyzed table plus `Cluster` and `Anomaly` columns.
//!
//! The downloadable artifact of an analysis run. `Anomaly` keeps the
//! -1 (anomalous) / 1 (normal) sign convention of the dashboard's original
//! export so existing downstream tooling keeps working.

use std::io::Write;

use crate::error::{Error, Result};
use crate::pipeline::AnalysisReport;

use super::Table;

pub fn export_csv<W: Write>(table: &Table, report: &AnalysisReport, writer: W) -> Result<()> {
    let n_rows = table.n_rows();
    if report.clusters.len() != n_rows {
        return Err(Error::RowCountMismatch {
            table_rows: n_rows,
            report_rows: report.clusters.len(),
        });
    }

    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = table.column_names().iter().map(|n| n.to_string()).collect();
    header.push("Cluster".to_string());
    header.push("Anomaly".to_string());
    wtr.write_record(&header)?;

    for row in 0..n_rows {
        let mut record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.data.cell_to_string(row).unwrap_or_default())
            .collect();
        record.push(report.clusters[row].to_string());
        record.push(if report.anomalies[row] { "-1" } else { "1" }.to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    log::info!("exported {} analyzed rows", n_rows);
    Ok(())
}
