//! Single-pass and continuous scan drivers.

use std::time::{Duration, Instant};

use chrono::Utc;
use perpscan_core::data::SymbolUniverse;
use tracing::{error, info, warn};

use crate::config::ScanConfig;
use crate::export::write_exports;
use crate::notify::{notifier_for_platform, Notifier};
use crate::scan::{ScanError, ScanOrchestrator, ScanReport};

/// List the universe, scan it, export, and notify.
///
/// Returns `Ok(None)` when the universe is empty and the pass was skipped.
pub fn run_once(
    orchestrator: &ScanOrchestrator,
    universe: &SymbolUniverse,
    notifier: &dyn Notifier,
    config: &ScanConfig,
) -> Result<Option<ScanReport>, ScanError> {
    let symbols = universe.top(config.scan.top_n);
    if symbols.is_empty() {
        warn!("symbol universe is empty, skipping pass");
        return Ok(None);
    }

    let report = orchestrator.run_pass(&symbols);

    if config.export.csv || config.export.html {
        write_exports(&report.rows, &config.export, report.started_at)?;
    }

    if let Err(e) = notifier.notify("Scan complete", &report.summary()) {
        warn!(error = %e, "notification failed");
    }
    Ok(Some(report))
}

/// Run passes every `interval` until `max_passes` have been attempted
/// (forever when `None`, not at all when `Some(0)`).
///
/// A failed pass is logged and the loop continues. `sleep` is injected so the
/// cadence can be driven without real waiting. Returns the number of passes
/// that produced a report.
pub fn run_loop<S>(
    orchestrator: &ScanOrchestrator,
    universe: &SymbolUniverse,
    notifier: &dyn Notifier,
    config: &ScanConfig,
    max_passes: Option<usize>,
    mut sleep: S,
) -> usize
where
    S: FnMut(Duration),
{
    if max_passes == Some(0) {
        return 0;
    }
    let interval = config.interval();
    let mut attempted = 0usize;
    let mut completed = 0usize;

    loop {
        let started = Instant::now();
        attempted += 1;
        info!(pass = attempted, "starting scan pass");

        match run_once(orchestrator, universe, notifier, config) {
            Ok(Some(report)) => {
                completed += 1;
                info!(
                    pass = attempted,
                    rows = report.succeeded(),
                    failed = report.failed(),
                    "pass complete"
                );
            }
            Ok(None) => {}
            Err(e) => error!(pass = attempted, error = %e, "scan pass failed"),
        }

        if max_passes.is_some_and(|max| attempted >= max) {
            break;
        }

        let wait = interval.saturating_sub(started.elapsed());
        let next_at = Utc::now()
            + chrono::Duration::from_std(wait).unwrap_or_else(|_| chrono::Duration::zero());
        info!(
            next_in_secs = wait.as_secs(),
            next_at = %next_at.format("%H:%M:%S"),
            "waiting for next pass"
        );
        sleep(wait);
    }

    completed
}

/// Build HTTP collaborators from `config` and scan every `interval_minutes`.
pub fn run_continuous(config: &ScanConfig, max_passes: Option<usize>) -> Result<usize, ScanError> {
    let orchestrator = ScanOrchestrator::from_config(config)?;
    let universe = orchestrator.symbol_universe();
    let notifier = notifier_for_platform(config.notify.enabled);
    Ok(run_loop(
        &orchestrator,
        &universe,
        notifier.as_ref(),
        config,
        max_passes,
        std::thread::sleep,
    ))
}
