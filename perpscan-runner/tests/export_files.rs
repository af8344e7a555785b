//! File-level export and config loading tests.

use chrono::{TimeZone, Utc};
use perpscan_runner::config::ExportConfig;
use perpscan_runner::export::{cleanup_exports, export_filename};
use perpscan_runner::{write_exports, ConfigError, ScanConfig, ScanRow};

fn rows() -> Vec<ScanRow> {
    let mut row = ScanRow::new("BTCUSDT");
    row.push_number("Vol 5M", 1.5);
    vec![row]
}

#[test]
fn cleanup_keeps_newest() {
    let dir = tempfile::tempdir().unwrap();
    for day in 1..=5 {
        let at = Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap();
        std::fs::write(dir.path().join(export_filename(at, "csv")), "x").unwrap();
    }
    std::fs::write(dir.path().join("notes.csv"), "keep me").unwrap();

    let removed = cleanup_exports(dir.path(), "csv", 2).unwrap();
    assert_eq!(removed, 3);

    let mut left: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(
        left,
        vec![
            "Scan_20240604_120000.csv",
            "Scan_20240605_120000.csv",
            "notes.csv"
        ]
    );
}

#[test]
fn write_exports_respects_formats_and_retention() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        output_dir: dir.path().join("out"),
        csv: true,
        html: false,
        keep_exports: Some(1),
    };

    let first = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 6, 1, 0, 30, 0).unwrap();
    write_exports(&rows(), &config, first).unwrap();
    let written = write_exports(&rows(), &config, second).unwrap();

    assert_eq!(written.len(), 1);
    let names: Vec<String> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Scan_20240601_003000.csv"]);

    let csv = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(csv, "Symbol,Vol 5M\nBTCUSDT,1.5\n");
}

#[test]
fn config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perpscan.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "https://api-testnet.bybit.com"

[scan]
benchmark = "ETHUSDT"
concurrency = 8

[notify]
enabled = true
"#,
    )
    .unwrap();

    let config = ScanConfig::from_file(&path).unwrap();
    assert_eq!(config.api.base_url, "https://api-testnet.bybit.com");
    assert_eq!(config.scan.benchmark, "ETHUSDT");
    assert_eq!(config.scan.concurrency, 8);
    assert!(config.notify.enabled);
    assert_eq!(config.fetch.target_bars, 5040);
}

#[test]
fn missing_config_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ScanConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
