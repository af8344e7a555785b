//! perpscan CLI — scan, watch, and inspection commands.
//!
//! Commands:
//! - `scan` — run one pass over the perpetual universe and export the table
//! - `watch` — re-scan every `interval_minutes`
//! - `symbols` — list the universe ranked by 24h turnover
//! - `klines` — build one symbol's minute series and print its indicators
//! - `config` — print the default configuration as TOML

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use perpscan_core::data::MIN_BARS;
use perpscan_core::domain::{OpenInterestWindow, Series};
use perpscan_runner::row::{assemble_row, window_label, RowInputs};
use perpscan_runner::{
    export_json, init_logging, notifier_for_platform, run_continuous, run_once, ScanConfig,
    ScanOrchestrator, ScanReport,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "perpscan",
    version,
    about = "perpscan — multi-window scanner for USDT perpetual futures"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default log level (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scan pass and export the results.
    Scan {
        #[command(flatten)]
        overrides: ScanOverrides,

        /// Also print the full report as JSON on stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Scan repeatedly on the configured interval.
    Watch {
        #[command(flatten)]
        overrides: ScanOverrides,

        /// Minutes between pass starts.
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many passes. Runs until interrupted when omitted.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        passes: Option<u64>,
    },
    /// List perpetual symbols ranked by 24h turnover.
    Symbols {
        /// Show only the top N.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Build one symbol's minute series and print its indicator row.
    Klines {
        /// Symbol, e.g. SOLUSDT.
        symbol: String,

        /// Bars to request (at least the minimum series length).
        #[arg(long)]
        bars: Option<usize>,
    },
    /// Print the default configuration as TOML.
    Config,
}

#[derive(clap::Args, Default)]
struct ScanOverrides {
    /// Directory for CSV/HTML exports.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Scan only the top N symbols by turnover.
    #[arg(long)]
    top: Option<usize>,

    /// Worker threads for the scan pool.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Disable desktop notifications.
    #[arg(long, default_value_t = false)]
    no_notify: bool,

    /// Skip writing export files.
    #[arg(long, default_value_t = false)]
    no_export: bool,
}

impl ScanOverrides {
    fn apply(&self, config: &mut ScanConfig) {
        if let Some(dir) = &self.output_dir {
            config.export.output_dir = dir.clone();
        }
        if let Some(n) = self.top {
            config.scan.top_n = Some(n);
        }
        if let Some(c) = self.concurrency {
            config.scan.concurrency = c;
        }
        if self.no_notify {
            config.notify.enabled = false;
        }
        if self.no_export {
            config.export.csv = false;
            config.export.html = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Config => {
            let toml = ScanConfig::default().to_toml()?;
            print!("{toml}");
            Ok(())
        }
        Commands::Scan { overrides, json } => {
            let mut config = load_config(cli.config.as_ref())?;
            overrides.apply(&mut config);
            run_scan(&config, json)
        }
        Commands::Watch {
            overrides,
            interval,
            passes,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            overrides.apply(&mut config);
            if let Some(minutes) = interval {
                config.schedule.interval_minutes = minutes;
            }
            config.validate()?;
            let completed = run_continuous(&config, passes.map(|n| n as usize))?;
            info!(completed, "watch finished");
            Ok(())
        }
        Commands::Symbols { top } => {
            let config = load_config(cli.config.as_ref())?;
            run_symbols(&config, top.or(config.scan.top_n))
        }
        Commands::Klines { symbol, bars } => {
            let config = load_config(cli.config.as_ref())?;
            run_klines(&config, &symbol, bars.unwrap_or(config.fetch.target_bars))
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanConfig> {
    match path {
        Some(p) => ScanConfig::from_file(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Ok(ScanConfig::default()),
    }
}

fn run_scan(config: &ScanConfig, json: bool) -> Result<()> {
    let orchestrator =
        ScanOrchestrator::from_config(config).context("setting up scan orchestrator")?;
    let universe = orchestrator.symbol_universe();
    let notifier = notifier_for_platform(config.notify.enabled);

    let Some(report) = run_once(&orchestrator, &universe, notifier.as_ref(), config)? else {
        println!("Symbol universe is empty; nothing scanned.");
        return Ok(());
    };

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_report(&report, config);
    }
    Ok(())
}

fn run_symbols(config: &ScanConfig, top: Option<usize>) -> Result<()> {
    let orchestrator = ScanOrchestrator::from_config(config)?;
    let entries = orchestrator.symbol_universe().top(top);
    if entries.is_empty() {
        bail!("symbol universe is empty (tickers endpoint unavailable?)");
    }

    println!("{:>4}  {:<16} {:>20}", "Rank", "Symbol", "24h Turnover");
    println!("{}", "-".repeat(42));
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{:>4}  {:<16} {:>20}",
            i + 1,
            entry.symbol,
            format_turnover(entry.turnover_24h)
        );
    }
    Ok(())
}

fn run_klines(config: &ScanConfig, symbol: &str, bars: usize) -> Result<()> {
    if bars < MIN_BARS {
        bail!("--bars must be at least {MIN_BARS}, got {bars}");
    }
    let mut config = config.clone();
    config.fetch.target_bars = bars;

    let orchestrator =
        ScanOrchestrator::from_config(&config).context("setting up scan orchestrator")?;
    let series = orchestrator.series(symbol);
    if series.is_empty() {
        bail!("{symbol}: insufficient klines (fewer than {MIN_BARS} bars available)");
    }
    print_series_summary(&series);

    let benchmark = orchestrator.series(&config.scan.benchmark);
    let universe = orchestrator.symbol_universe();
    let turnover = universe
        .list()
        .into_iter()
        .find(|e| e.symbol == symbol)
        .map(|e| e.turnover_24h)
        .unwrap_or(0.0);

    let derivatives = orchestrator.derivatives();
    let oi_changes: Vec<(OpenInterestWindow, f64)> = config
        .scan
        .oi_windows
        .iter()
        .map(|&window| (window, derivatives.open_interest_change(symbol, window)))
        .collect();
    let inputs = RowInputs {
        symbol,
        bars: series.bars(),
        benchmark: benchmark.bars(),
        turnover_24h: turnover,
        funding: derivatives.funding_rate(symbol),
        oi_changes: &oi_changes,
    };
    let row = assemble_row(&inputs, &config.scan.windows, config.scan.percentiles);

    println!();
    for (name, value) in row.columns() {
        println!("{name:<20} {value}");
    }
    Ok(())
}

fn print_series_summary(series: &Series) {
    let first = series.bars().first();
    let last = series.bars().last();
    let fmt_ms = |ms: i64| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| ms.to_string())
    };

    println!("Symbol:  {}", series.symbol);
    println!("Bars:    {}", series.len());
    if let (Some(first), Some(last)) = (first, last) {
        println!(
            "Range:   {} to {} UTC",
            fmt_ms(first.open_time),
            fmt_ms(last.open_time)
        );
        println!("Last:    {}", last.close);
    }
}

fn print_report(report: &ScanReport, config: &ScanConfig) {
    println!();
    println!("=== Scan Result ===");
    println!("Started:   {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Elapsed:   {:.1}s", report.elapsed_secs());
    println!("Scanned:   {}", report.succeeded());
    println!("Failed:    {}", report.failed());
    if config.export.csv || config.export.html {
        println!("Exports:   {}", config.export.output_dir.display());
    }

    let head_window = config.scan.windows.first().copied();
    if let Some(window) = head_window {
        let vol_col = format!("Vol {}", window_label(window));
        let chg_col = format!("Chg {}", window_label(window));
        println!();
        println!("{:<16} {:>12} {:>12}", "Symbol", vol_col, chg_col);
        println!("{}", "-".repeat(42));
        for row in report.rows.iter().take(20) {
            let cell = |name: &str| {
                row.get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string())
            };
            println!(
                "{:<16} {:>12} {:>12}",
                row.symbol(),
                cell(&vol_col),
                cell(&chg_col)
            );
        }
        if report.rows.len() > 20 {
            println!("... {} more", report.rows.len() - 20);
        }
    }

    for failure in &report.failures {
        println!("WARNING: {}: {}", failure.symbol, failure.reason);
    }
    println!();
}

fn format_turnover(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}
