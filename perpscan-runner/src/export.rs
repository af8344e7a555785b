//! Scan export — CSV table and a self-contained HTML dashboard.
//!
//! Files are named `Scan_YYYYMMDD_HHMMSS.{csv,html}` from the pass start time
//! (UTC), so lexical order is chronological order.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::row::{CellValue, ScanRow};
use crate::scan::ScanReport;

const FILE_PREFIX: &str = "Scan_";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output is not valid UTF-8")]
    Utf8,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `Scan_YYYYMMDD_HHMMSS.{ext}`
pub fn export_filename(at: DateTime<Utc>, ext: &str) -> String {
    format!("{FILE_PREFIX}{}.{ext}", at.format("%Y%m%d_%H%M%S"))
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Render rows as CSV. The header comes from the first row.
pub fn export_csv(rows: &[ScanRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    if let Some(first) = rows.first() {
        wtr.write_record(first.header())?;
    }
    for row in rows {
        wtr.write_record(row.columns().iter().map(|(_, v)| v.to_string()))?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a full report (rows, failures, timing) to pretty JSON.
pub fn export_json(report: &ScanReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

// ─── HTML ───────────────────────────────────────────────────────────

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn cell_class(value: &CellValue) -> &'static str {
    match value {
        CellValue::Number(v) if *v > 0.0 => "pos",
        CellValue::Number(v) if *v < 0.0 => "neg",
        CellValue::Number(_) => "zero",
        CellValue::Text(_) => "text",
    }
}

/// Render rows as a standalone HTML page with one table.
pub fn export_html(rows: &[ScanRow], generated_at: DateTime<Utc>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Scan {}</title>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(
        "<style>\n\
         body { font-family: sans-serif; font-size: 13px; }\n\
         table { border-collapse: collapse; }\n\
         th, td { border: 1px solid #ccc; padding: 2px 6px; text-align: right; }\n\
         th { background: #f0f0f0; position: sticky; top: 0; }\n\
         td.text { text-align: left; font-weight: bold; }\n\
         td.pos { color: #0a7d28; }\n\
         td.neg { color: #b3141b; }\n\
         td.zero { color: #888; }\n\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!(
        "<h1>Scan {}</h1>\n<p>{} symbols</p>\n<table>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        rows.len()
    ));

    if let Some(first) = rows.first() {
        html.push_str("<thead><tr>");
        for col in first.header() {
            html.push_str(&format!("<th>{}</th>", escape_html(col)));
        }
        html.push_str("</tr></thead>\n");
    }

    html.push_str("<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for (_, value) in row.columns() {
            html.push_str(&format!(
                "<td class=\"{}\">{}</td>",
                cell_class(value),
                escape_html(&value.to_string())
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write the enabled export formats and prune old files.
///
/// Returns the paths written.
pub fn write_exports(
    rows: &[ScanRow],
    config: &ExportConfig,
    at: DateTime<Utc>,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(&config.output_dir)?;
    let mut written = Vec::new();

    if config.csv {
        let path = config.output_dir.join(export_filename(at, "csv"));
        std::fs::write(&path, export_csv(rows)?)?;
        written.push(path);
    }
    if config.html {
        let path = config.output_dir.join(export_filename(at, "html"));
        std::fs::write(&path, export_html(rows, at))?;
        written.push(path);
    }

    if let Some(keep) = config.keep_exports {
        for ext in ["csv", "html"] {
            cleanup_exports(&config.output_dir, ext, keep)?;
        }
    }

    info!(files = written.len(), rows = rows.len(), dir = %config.output_dir.display(), "scan exported");
    Ok(written)
}

/// Delete all but the `keep` newest `Scan_*.{ext}` files in `dir`.
///
/// Returns the number of files removed.
pub fn cleanup_exports(dir: &Path, ext: &str, keep: usize) -> Result<usize, ExportError> {
    let suffix = format!(".{ext}");
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(&suffix))
        })
        .collect();

    // Newest first.
    files.sort();
    files.reverse();

    let mut removed = 0;
    for path in files.iter().skip(keep) {
        std::fs::remove_file(path)?;
        debug!(path = %path.display(), "removed old export");
        removed += 1;
    }
    Ok(removed)
}
