//! Command-line interface definitions for the digest crawler.
//!
//! All arguments can be provided via command-line flags or environment
//! variables (a `.env` file in the working directory is loaded first).

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the crawler.
///
/// Overrides given here win over the settings file.
///
/// # Examples
///
/// ```sh
/// # Default config locations, listing on stdout
/// awful_daily_digest
///
/// # Explicit files, a wider window, and a JSON hand-off file
/// awful_daily_digest -s ./my_sources.yaml --lookback-hours 48 -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Sources file (YAML or JSON). Defaults to config/sources.{yaml,json}
    #[arg(short, long, env = "DIGEST_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Settings file (YAML or JSON). Defaults to config/settings.{yaml,json}
    #[arg(long, env = "DIGEST_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Override the recency window, in hours
    #[arg(long, env = "DIGEST_LOOKBACK_HOURS")]
    pub lookback_hours: Option<u32>,

    /// Override the per-source article cap
    #[arg(long, env = "DIGEST_MAX_PER_SOURCE")]
    pub max_per_source: Option<usize>,

    /// Directory for the JSON hand-off file; nothing is written without it
    #[arg(short, long, env = "DIGEST_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<PathBuf>,

    /// Do not print the article listing
    #[arg(short, long)]
    pub quiet: bool,
}
