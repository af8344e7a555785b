//! Per-symbol output rows.
//!
//! A row is an ordered list of `(column, value)` pairs with `Symbol` first.
//! Numeric values are rounded to 4 decimal places on insertion.

use chrono::{DateTime, Utc};
use perpscan_core::domain::{Bar, FundingRate, OpenInterestWindow};
use perpscan_core::indicators;
use serde::Serialize;
use std::fmt;

pub const SYMBOL_COLUMN: &str = "Symbol";

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Round to 4 decimal places. Non-finite values become 0.0.
pub fn round4(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let r = (v * 10_000.0).round() / 10_000.0;
    // Avoid rendering "-0".
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Column label for a window in minutes: `5M`, `15M`, `1H`, `4H`.
pub fn window_label(minutes: usize) -> String {
    if minutes >= 60 && minutes % 60 == 0 {
        format!("{}H", minutes / 60)
    } else {
        format!("{minutes}M")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    columns: Vec<(String, CellValue)>,
}

impl ScanRow {
    pub fn new(symbol: &str) -> Self {
        Self {
            columns: vec![(
                SYMBOL_COLUMN.to_string(),
                CellValue::Text(symbol.to_string()),
            )],
        }
    }

    pub fn push_number(&mut self, column: impl Into<String>, value: f64) {
        self.columns
            .push((column.into(), CellValue::Number(round4(value))));
    }

    pub fn push_text(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns
            .push((column.into(), CellValue::Text(value.into())));
    }

    pub fn symbol(&self) -> &str {
        match &self.columns[0].1 {
            CellValue::Text(s) => s,
            CellValue::Number(_) => "",
        }
    }

    pub fn columns(&self) -> &[(String, CellValue)] {
        &self.columns
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }
}

/// Everything needed to compute one symbol's row.
#[derive(Debug, Clone, Copy)]
pub struct RowInputs<'a> {
    pub symbol: &'a str,
    pub bars: &'a [Bar],
    pub benchmark: &'a [Bar],
    pub turnover_24h: f64,
    pub funding: FundingRate,
    /// Open-interest change per configured window, in column order.
    pub oi_changes: &'a [(OpenInterestWindow, f64)],
}

/// Format a funding timestamp as UTC text; the sentinel renders empty.
pub fn format_funding_time(timestamp_ms: i64) -> String {
    if timestamp_ms == 0 {
        return String::new();
    }
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn volume_percentile(bars: &[Bar], window: usize) -> f64 {
    let history = indicators::volume_change_history(bars, window);
    match history.split_last() {
        Some((current, prior)) => indicators::percentile_rank(prior, *current),
        None => 0.0,
    }
}

fn price_change_percentile(bars: &[Bar], window: usize) -> f64 {
    let history = indicators::price_change_history(bars, window);
    let current = indicators::price_change_percent(bars, window);
    match history.split_last() {
        Some((_, prior)) => indicators::percentile_rank(prior, current),
        None => 0.0,
    }
}

/// Compute every indicator column for one symbol.
///
/// Column groups, each repeated per window: volume change (plus percentile),
/// benchmark correlation, volatility range, price change (plus percentile).
/// Then turnover, funding, and one `OI Change {label}` column per
/// open-interest window.
///
/// Every number is rounded to 4 places except `Funding Rate`, which is kept
/// at full precision since typical rates (`0.0001`) sit at the rounding edge.
/// `Funding Time` is UTC text, empty for the unavailable sentinel.
pub fn assemble_row(inputs: &RowInputs<'_>, windows: &[usize], percentiles: bool) -> ScanRow {
    let mut row = ScanRow::new(inputs.symbol);

    for &w in windows {
        row.push_number(
            format!("Vol {}", window_label(w)),
            indicators::volume_change(inputs.bars, w),
        );
    }
    if percentiles {
        for &w in windows {
            row.push_number(
                format!("Vol {} %ile", window_label(w)),
                volume_percentile(inputs.bars, w),
            );
        }
    }
    for &w in windows {
        row.push_number(
            format!("Corr {}", window_label(w)),
            indicators::price_correlation(inputs.bars, inputs.benchmark, w),
        );
    }
    for &w in windows {
        row.push_number(
            format!("Range {}", window_label(w)),
            indicators::volatility_range(inputs.bars, w),
        );
    }
    for &w in windows {
        row.push_number(
            format!("Chg {}", window_label(w)),
            indicators::price_change_percent(inputs.bars, w),
        );
    }
    if percentiles {
        for &w in windows {
            row.push_number(
                format!("Chg {} %ile", window_label(w)),
                price_change_percentile(inputs.bars, w),
            );
        }
    }

    row.push_number("24h Turnover", inputs.turnover_24h);
    // Funding rates are small; keep full precision.
    row.columns.push((
        "Funding Rate".to_string(),
        CellValue::Number(if inputs.funding.rate.is_finite() {
            inputs.funding.rate
        } else {
            0.0
        }),
    ));
    row.push_text("Funding Time", format_funding_time(inputs.funding.timestamp));
    for (window, change) in inputs.oi_changes {
        row.push_number(format!("OI Change {}", window.label()), *change);
    }
    row
}
