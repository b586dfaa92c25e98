//! Settings and source list loading.
//!
//! Both files are read with `serde_yaml`, so YAML and JSON are accepted alike.
//!
//! ```yaml
//! # config/settings.yaml
//! crawler:
//!   lookback_hours: 24
//!   max_articles_per_source: 5
//!   max_content_chars: 500
//!   request_timeout: 15
//!   user_agent: "TechCrawlerBot/1.0"
//!   request_delay_ms: 500
//!   max_concurrent_sources: 4
//! ```
//!
//! ```yaml
//! # config/sources.yaml
//! sources:
//!   - _doc: "entries without name and url are skipped"
//!   - name: Example Blog
//!     url: https://blog.example.com/feed.xml
//!     type: feed
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::CrawlError;
use crate::models::SourceEntry;

/// Searched in order when no settings path is given.
pub const DEFAULT_SETTINGS_PATHS: [&str; 2] = ["config/settings.yaml", "config/settings.json"];
/// Searched in order when no sources path is given.
pub const DEFAULT_SOURCES_PATHS: [&str; 2] = ["config/sources.yaml", "config/sources.json"];

/// The `crawler` section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub lookback_hours: u32,
    pub max_articles_per_source: usize,
    pub max_content_chars: usize,
    /// Seconds.
    pub request_timeout: u64,
    pub user_agent: String,
    /// Pause between article fetches against one web source.
    pub request_delay_ms: u64,
    /// Sources crawled at once. 1 crawls strictly in order.
    pub max_concurrent_sources: usize,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            max_articles_per_source: 5,
            max_content_chars: 500,
            request_timeout: 15,
            user_agent: "TechCrawlerBot/1.0".to_string(),
            request_delay_ms: 500,
            max_concurrent_sources: 4,
        }
    }
}

impl CrawlerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Whole settings file. Sections other than `crawler` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub crawler: CrawlerSettings,
}

/// Whole sources file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, CrawlError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| CrawlError::ConfigRead {
        path: display.clone(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| CrawlError::ConfigParse {
        path: display,
        source,
    })
}

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(PathBuf::from).find(|p| p.is_file())
}

/// Load a settings file.
///
/// # Errors
///
/// [`CrawlError::ConfigRead`] or [`CrawlError::ConfigParse`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_settings(path: &Path) -> Result<Settings, CrawlError> {
    let settings: Settings = load_file(path)?;
    info!(?settings.crawler, "Loaded settings");
    Ok(settings)
}

/// Settings from `explicit`, else from the first default location that
/// exists, else built-in defaults.
///
/// # Errors
///
/// Only when a file was found but could not be read or parsed.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings, CrawlError> {
    if let Some(path) = explicit {
        return load_settings(path);
    }
    match first_existing(&DEFAULT_SETTINGS_PATHS) {
        Some(path) => load_settings(&path),
        None => {
            debug!("No settings file found; using defaults");
            Ok(Settings::default())
        }
    }
}

/// Load a sources file. Placeholder entries are kept; the aggregator skips
/// them.
///
/// # Errors
///
/// [`CrawlError::ConfigRead`] or [`CrawlError::ConfigParse`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_sources(path: &Path) -> Result<Vec<SourceEntry>, CrawlError> {
    let file: SourcesFile = load_file(path)?;
    info!(entries = file.sources.len(), "Loaded sources");
    Ok(file.sources)
}

/// Sources from `explicit`, else from the first default location that exists.
///
/// # Errors
///
/// [`CrawlError::ConfigRead`] when no sources file exists at all.
pub fn resolve_sources(explicit: Option<&Path>) -> Result<Vec<SourceEntry>, CrawlError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => first_existing(&DEFAULT_SOURCES_PATHS)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCES_PATHS[0])),
    };
    load_sources(&path)
}
