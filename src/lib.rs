//! # Awful Daily Digest
//!
//! Collects the last day (or any lookback window) of articles from many
//! heterogeneous sources and normalizes them into one flat list, ready to be
//! handed to a ranking or summarization step.
//!
//! ## Sources
//!
//! - **feed**: RSS 0.9x/1.0/2.0 and Atom
//! - **sitemap**: XML sitemaps, sitemap indexes, and Google News sitemaps
//! - **web**: plain HTML listing pages, with article links discovered
//!   heuristically (or by a CSS selector) and each article page read in a
//!   readability-style pass
//!
//! ## Architecture
//!
//! 1. **Configuration**: [`config`] loads settings and the source list
//! 2. **Dispatch**: the [`aggregator::Aggregator`] validates each entry and
//!    hands it to its [`strategies::Strategy`], several sources at a time
//! 3. **Extraction**: strategies use [`transport`] for I/O, [`extract`] for
//!    HTML signals, and [`dates`] to normalize every date to UTC
//! 4. **Output**: [`outputs`] writes the JSON hand-off file and the listing
//!
//! ## Usage
//!
//! ```no_run
//! use awful_daily_digest::aggregator::Aggregator;
//! use awful_daily_digest::config::{CrawlerSettings, resolve_sources};
//!
//! # async fn demo() -> Result<(), awful_daily_digest::error::CrawlError> {
//! let sources = resolve_sources(None)?;
//! let aggregator = Aggregator::new(CrawlerSettings::default())?;
//! for article in aggregator.run(&sources).await {
//!     println!("{} {}", article.published_at, article.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod dates;
pub mod error;
pub mod extract;
pub mod models;
pub mod outputs;
pub mod strategies;
pub mod transport;
pub mod utils;
