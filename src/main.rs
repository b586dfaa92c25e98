//! # Awful Daily Digest
//!
//! Command-line driver for the crawler: loads the settings and source list,
//! crawls every source for articles inside the lookback window, prints a
//! listing, and optionally writes the JSON hand-off file for the downstream
//! ranking step.
//!
//! ## Usage
//!
//! ```sh
//! awful_daily_digest -j ./json
//! RUST_LOG=awful_daily_digest=debug awful_daily_digest --lookback-hours 48
//! ```

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use awful_daily_digest::aggregator::Aggregator;
use awful_daily_digest::config::{resolve_settings, resolve_sources};
use awful_daily_digest::dates::format_instant;
use awful_daily_digest::models::{CrawlReport, FetchWindow};
use awful_daily_digest::outputs::{json, listing};
use awful_daily_digest::utils::{ensure_writable_dir, time_of_day};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_daily_digest starting up");
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    debug!(?args.sources, ?args.settings, ?args.json_output_dir, "Parsed CLI arguments");

    // Early check: fail before crawling if the report cannot be written
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Load settings & sources ----
    let mut settings = resolve_settings(args.settings.as_deref())?.crawler;
    if let Some(hours) = args.lookback_hours {
        settings.lookback_hours = hours;
    }
    if let Some(cap) = args.max_per_source {
        settings.max_articles_per_source = cap;
    }
    let sources = resolve_sources(args.sources.as_deref())?;
    info!(
        sources = sources.len(),
        lookback_hours = settings.lookback_hours,
        max_per_source = settings.max_articles_per_source,
        "Configuration ready"
    );

    // ---- Crawl ----
    let now = Utc::now();
    let window = FetchWindow::ending_at(now, settings.lookback_hours);
    let aggregator = Aggregator::new(settings)?;
    let articles = aggregator.run_at(&sources, now).await;

    if !args.quiet {
        print!("{}", listing::render_listing(&articles));
    }

    // ---- JSON hand-off ----
    if let Some(dir) = &args.json_output_dir {
        let report = CrawlReport {
            local_date: Local::now().date_naive().to_string(),
            time_of_day: time_of_day(),
            cutoff: format_instant(&window.cutoff()),
            articles,
        };
        if let Err(e) = json::write_report(&report, dir).await {
            error!(error = %e, "Failed to write JSON report");
            return Err(e.into());
        }
    }

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "awful_daily_digest finished"
    );
    Ok(())
}
