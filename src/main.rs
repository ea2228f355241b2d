//! Pagegrep main entry point
//!
//! Command-line interface for the pagegrep web page scanner.

use clap::Parser;
use pagegrep::config::{load_config_with_hash, Config};
use pagegrep::fetch::HttpFetcher;
use pagegrep::scan::{ScanEvent, Scanner, TaskKind};
use pagegrep::TaskError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Pagegrep: a bounded-concurrency web page scanner
///
/// Pagegrep starts at one URL, follows the links it finds, and counts how
/// often a search term appears in the visible text of every page, stopping
/// once the configured URL budget is spent.
#[derive(Parser, Debug)]
#[command(name = "pagegrep")]
#[command(version = "1.0.0")]
#[command(about = "Count search-term occurrences across linked web pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scanned without scanning
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scan(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagegrep=info,warn"),
            1 => EnvFilter::new("pagegrep=debug,info"),
            2 => EnvFilter::new("pagegrep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be
/// scanned
fn handle_dry_run(config: &Config) {
    println!("=== Pagegrep Dry Run ===\n");

    println!("Scan:");
    println!("  Starting URL: {}", config.scan.starting_url);
    println!("  Search term: {:?}", config.scan.search_term);
    println!("  Workers: {}", config.scan.worker_count);
    println!("  URL budget: {}", config.scan.max_urls);

    println!("\nTransport:");
    println!("  Request timeout: {}ms", config.transport.request_timeout_ms);
    println!("  Connect timeout: {}ms", config.transport.connect_timeout_ms);
    println!("  User agent: {}", config.transport.user_agent);

    println!("\n✓ Configuration is valid");
}

/// Handles the main scan operation
async fn handle_scan(config: Config) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&config.transport)?);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let scanner = Scanner::new(&config, fetcher, events_tx)?;

    let reporter = tokio::spawn(report_events(events_rx));

    // Ctrl-C stops the scan gracefully; in-flight work is abandoned cleanly
    let interrupt = {
        let scanner = scanner.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, canceling scan");
                scanner.cancel();
            }
        })
    };

    scanner.run().await;
    let admitted = scanner.admitted_count();

    // Drop every event sender so the reporter drains out and stops
    interrupt.abort();
    let _ = interrupt.await;
    drop(scanner);

    let report = reporter.await?;

    println!();
    if report.canceled {
        println!("Scan canceled.");
    }
    println!(
        "Scanned {} of {} admitted URLs: {} total matches, {} failed",
        report.pages, admitted, report.matches, report.failures
    );

    Ok(())
}

/// Totals accumulated from the event stream
#[derive(Debug, Default)]
struct ScanReport {
    pages: usize,
    matches: usize,
    failures: usize,
    canceled: bool,
}

/// Prints per-URL results as they arrive and accumulates totals
async fn report_events(mut rx: mpsc::UnboundedReceiver<ScanEvent>) -> ScanReport {
    let mut report = ScanReport::default();

    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Started => tracing::info!("Scan started"),
            ScanEvent::TaskStarted { url, kind } => match kind {
                TaskKind::Download => tracing::debug!("Downloading {}", url),
                TaskKind::Parse => tracing::debug!("Parsing {}", url),
            },
            ScanEvent::TaskFinished { url, matches } => {
                report.pages += 1;
                report.matches += matches;
                println!("{}: {} matches", url, matches);
            }
            ScanEvent::TaskFailed { url, error } => {
                // Cancellation is a consequence of stopping, not a failure
                if error != TaskError::Canceled {
                    report.failures += 1;
                    println!("{}: failed ({})", url, error);
                }
            }
            ScanEvent::Finished => tracing::info!("Scan finished"),
            ScanEvent::Canceled => report.canceled = true,
        }
    }

    report
}
