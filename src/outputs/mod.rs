//! What a run leaves behind.
//!
//! # Submodules
//!
//! - [`json`]: writes the [`CrawlReport`](crate::models::CrawlReport) hand-off file
//! - [`listing`]: renders the plain-text listing printed to stdout
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```

pub mod json;
pub mod listing;
