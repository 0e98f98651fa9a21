use chrono::{Duration, NaiveDate};

use super::{run, PipelineConfig};
use crate::error::Error;
use crate::table::{Column, ColumnData, Table};
use crate::timestamp::{detect_timestamp_columns, filter_by_time, parse_column, ParseReport};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn numeric_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Column {
        name: name.to_string(),
        data: ColumnData::Number(values),
    }
}

fn text_column(name: &str, values: Vec<Option<String>>) -> Column {
    Column {
        name: name.to_string(),
        data: ColumnData::Text(values),
    }
}

/// Three numeric bands so k=3 clustering is unambiguous.
fn banded_table(rows: usize) -> Table {
    let bytes = (0..rows)
        .map(|i| Some((i % 3) as f64 * 1000.0 + i as f64 * 0.1))
        .collect();
    Table::new(vec![numeric_column("bytes", bytes)])
}

#[test]
fn rejects_table_without_numeric_columns() {
    let table = Table::new(vec![text_column(
        "proto",
        vec![Some("tcp".into()), Some("udp".into())],
    )]);
    let result = run(&table, &PipelineConfig::default());
    assert!(matches!(result, Err(Error::NoNumericColumns)));
}

#[test]
fn rejects_invalid_parameters() {
    let table = banded_table(30);
    let too_few_clusters = PipelineConfig {
        n_clusters: 1,
        ..Default::default()
    };
    assert!(run(&table, &too_few_clusters).is_err());

    let bad_contamination = PipelineConfig {
        contamination: 1.5,
        ..Default::default()
    };
    assert!(run(&table, &bad_contamination).is_err());
}

#[test]
fn rejects_fewer_rows_than_clusters() {
    let table = banded_table(2);
    let result = run(&table, &PipelineConfig::default());
    assert!(matches!(result, Err(Error::NotEnoughRows { .. })));
}

#[test]
fn every_row_gets_one_label_and_one_flag() {
    init_logging();
    let table = banded_table(60);
    let config = PipelineConfig::default();
    let report = run(&table, &config).unwrap();

    assert_eq!(report.clusters.len(), 60);
    assert_eq!(report.anomalies.len(), 60);
    assert!(report.clusters.iter().all(|&c| c < config.n_clusters));
}

#[test]
fn variance_ratios_are_bounded_and_ordered() {
    let table = Table::new(vec![
        numeric_column("a", (0..40).map(|i| Some(i as f64)).collect()),
        numeric_column("b", (0..40).map(|i| Some((i * i) as f64)).collect()),
        numeric_column("c", (0..40).map(|i| Some((i % 5) as f64)).collect()),
    ]);
    let report = run(&table, &PipelineConfig::default()).unwrap();

    let ratios = &report.explained_variance_ratio;
    assert_eq!(ratios.len(), 3);
    assert!(ratios.iter().all(|&r| r >= 0.0));
    assert!(ratios.windows(2).all(|w| w[0] >= w[1] - 1e-12));
    let sum: f64 = ratios.iter().sum();
    assert!(sum <= 1.0 + 1e-9);
}

#[test]
fn identical_runs_are_identical() {
    let table = banded_table(50);
    let config = PipelineConfig {
        n_clusters: 3,
        contamination: 0.1,
        seed: 42,
    };
    let a = run(&table, &config).unwrap();
    let b = run(&table, &config).unwrap();

    assert_eq!(a.clusters, b.clusters);
    assert_eq!(a.anomalies, b.anomalies);
    assert_eq!(a.explained_variance_ratio, b.explained_variance_ratio);
}

#[test]
fn zero_variance_column_does_not_poison_the_matrix() {
    let table = Table::new(vec![
        numeric_column("flat", vec![Some(7.0); 30]),
        numeric_column("varied", (0..30).map(|i| Some(i as f64)).collect()),
    ]);
    let report = run(&table, &PipelineConfig::default()).unwrap();
    assert!(report
        .projection
        .iter()
        .flatten()
        .all(|v| v.is_finite()));
}

#[test]
fn missing_values_are_zero_filled() {
    // the null row must land with the low band, not crash or vanish
    let mut values: Vec<Option<f64>> = (0..30).map(|i| Some((i % 3) as f64 * 100.0)).collect();
    values[4] = None;
    let table = Table::new(vec![numeric_column("bytes", values)]);
    let report = run(&table, &PipelineConfig::default()).unwrap();

    assert_eq!(report.clusters.len(), 30);
    // zero-filled row clusters with the zero band (rows 0, 3, 6, ...)
    assert_eq!(report.clusters[4], report.clusters[0]);
}

#[test]
fn cluster_stats_cover_all_rows() {
    let table = banded_table(90);
    let config = PipelineConfig {
        contamination: 0.05,
        ..Default::default()
    };
    let report = run(&table, &config).unwrap();

    let total_size: usize = report.cluster_stats.iter().map(|s| s.size).sum();
    assert_eq!(total_size, 90);
    let total_pct: f64 = report.cluster_stats.iter().map(|s| s.percentage).sum();
    assert!((total_pct - 100.0).abs() < 1e-9);
    let flagged = report.anomalies.iter().filter(|a| **a).count();
    let stats_anomalies: usize = report.cluster_stats.iter().map(|s| s.anomalies).sum();
    assert_eq!(flagged, stats_anomalies);
}

#[test]
fn anomaly_count_follows_contamination() {
    let table = banded_table(100);
    let config = PipelineConfig {
        contamination: 0.05,
        ..Default::default()
    };
    let report = run(&table, &config).unwrap();
    assert_eq!(report.anomalies.iter().filter(|a| **a).count(), 5);
}

// ============================================================================
// END TO END
// ============================================================================

/// Full chain over a firewall-log shaped table: detect -> parse -> filter to
/// a one-hour sub-window -> pipeline.
#[test]
fn full_chain_on_firewall_log_shape() {
    init_logging();

    let base = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    // 100 rows spanning two hours at 72-second intervals
    let timestamps: Vec<Option<String>> = (0..100i64)
        .map(|i| {
            Some(
                (base + Duration::seconds(72 * i))
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
            )
        })
        .collect();
    let src_ips: Vec<Option<String>> = (0..100).map(|i| Some(format!("1.2.3.{}", i % 4))).collect();
    let dst_ips: Vec<Option<String>> = (0..100).map(|_| Some("8.8.8.8".to_string())).collect();
    let mut bytes: Vec<Option<f64>> = (0..100)
        .map(|i| Some((i % 3) as f64 * 1000.0 + i as f64 * 0.1))
        .collect();
    for row in [10, 20, 30, 40, 90] {
        bytes[row] = None;
    }

    let table = Table::new(vec![
        text_column("timestamp", timestamps),
        text_column("src_ip", src_ips),
        text_column("dst_ip", dst_ips),
        numeric_column("bytes", bytes),
    ]);

    // detect
    let detected = detect_timestamp_columns(&table);
    assert!(detected.contains(&"timestamp".to_string()));

    // parse
    let parsed = parse_column(&table, "timestamp").unwrap();
    assert!(matches!(parsed.report, ParseReport::Parsed { failed: 0, .. }));

    // filter to the first hour (inclusive bounds: 72 * i <= 3600, i <= 50)
    let filtered = filter_by_time(
        &parsed.table,
        "timestamp",
        base,
        base + Duration::hours(1),
    )
    .unwrap();
    assert_eq!(filtered.retained, 51);
    assert_eq!(filtered.retained, filtered.table.n_rows());

    // pipeline
    let config = PipelineConfig {
        n_clusters: 3,
        contamination: 0.05,
        seed: 42,
    };
    let report = run(&filtered.table, &config).unwrap();

    assert_eq!(report.feature_columns, vec!["bytes"]);
    assert_eq!(report.clusters.len(), 51);
    assert_eq!(report.anomalies.len(), 51);

    let mut distinct = report.clusters.clone();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 3);

    assert_eq!(report.explained_variance_ratio.len(), 1);
    let sum: f64 = report.explained_variance_ratio.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
}
