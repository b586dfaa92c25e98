//! Runs every configured source and concatenates what they return.
//!
//! Sources are independent, so they are crawled on a bounded pool of Tokio
//! tasks (`max_concurrent_sources`). Each source runs in its own task: an
//! error or a panic costs that source its records and nothing else. Results
//! are reassembled in the order the sources were listed, with no
//! cross-source deduplication or re-sorting.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

use crate::config::CrawlerSettings;
use crate::error::CrawlError;
use crate::models::{ArticleRecord, FetchWindow, SourceDescriptor, SourceEntry};
use crate::strategies::{CrawlContext, Strategy};
use crate::transport::Transport;

pub struct Aggregator {
    transport: Transport,
    settings: CrawlerSettings,
}

impl Aggregator {
    /// Build an aggregator with a transport configured from `settings`.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: CrawlerSettings) -> Result<Self, CrawlError> {
        let transport = Transport::new(settings.request_timeout(), &settings.user_agent)?;
        Ok(Self::with_transport(settings, transport))
    }

    pub fn with_transport(settings: CrawlerSettings, transport: Transport) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Crawl `entries` with a window ending now.
    pub async fn run(&self, entries: &[SourceEntry]) -> Vec<ArticleRecord> {
        self.run_at(entries, Utc::now()).await
    }

    /// Crawl `entries` with a window ending at `now`.
    ///
    /// Placeholder entries are skipped without a log line; entries of an
    /// unsupported type are skipped with a warning. Never fails: a source that
    /// errors contributes zero records.
    #[instrument(level = "info", skip_all, fields(entries = entries.len()))]
    pub async fn run_at(&self, entries: &[SourceEntry], now: DateTime<Utc>) -> Vec<ArticleRecord> {
        let window = FetchWindow::ending_at(now, self.settings.lookback_hours);
        let ctx = CrawlContext::from_settings(&self.settings, window);
        info!(cutoff = %window.cutoff(), "Starting crawl");

        let jobs: Vec<(SourceDescriptor, Strategy)> = entries
            .iter()
            .filter_map(SourceDescriptor::from_entry)
            .filter_map(|source| match Strategy::for_kind(&source.kind) {
                Some(strategy) => Some((source, strategy)),
                None => {
                    warn!(source = %source.name, kind = %source.kind, "Unsupported source type; skipping");
                    None
                }
            })
            .collect();

        let concurrency = self.settings.max_concurrent_sources.max(1);
        let per_source: Vec<Vec<ArticleRecord>> = stream::iter(jobs)
            .map(|(source, strategy)| {
                let transport = self.transport.clone();
                let ctx = ctx.clone();
                async move {
                    let name = source.name.clone();
                    let worker =
                        tokio::spawn(async move { strategy.fetch(&transport, &source, &ctx).await });
                    match worker.await {
                        Ok(Ok(articles)) => {
                            info!(source = %name, count = articles.len(), "Source done");
                            articles
                        }
                        Ok(Err(e)) => {
                            error!(source = %name, error = %e, "Source failed; no articles from it");
                            Vec::new()
                        }
                        Err(e) => {
                            error!(source = %name, error = %e, "Source worker aborted");
                            Vec::new()
                        }
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let articles: Vec<ArticleRecord> = per_source.into_iter().flatten().collect();
        info!(total = articles.len(), "Crawl complete");
        articles
    }
}
