//! perpscan runner — scan orchestration, output, and scheduling.
//!
//! This crate builds on `perpscan-core` to provide:
//! - TOML configuration with validated defaults
//! - Tracing subscriber setup
//! - Per-pass orchestration over a bounded rayon pool
//! - Row assembly, CSV and HTML export
//! - Desktop notifications and the continuous re-scan loop

pub mod config;
pub mod export;
pub mod logging;
pub mod notify;
pub mod row;
pub mod scan;
pub mod schedule;

pub use config::{ConfigError, ScanConfig};
pub use export::{export_csv, export_html, export_json, write_exports, ExportError};
pub use logging::init_logging;
pub use notify::{notifier_for_platform, DesktopNotifier, NoopNotifier, Notifier, NotifyError};
pub use row::{assemble_row, CellValue, RowInputs, ScanRow};
pub use scan::{ScanError, ScanFailure, ScanOrchestrator, ScanReport};
pub use schedule::{run_continuous, run_loop, run_once};
