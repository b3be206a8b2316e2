//! Per-line edit-frequency heatmaps from git history.
//!
//! For every line of a file, count the commits that touched it, cache the
//! result per revision, and map the counts onto a blue-to-red color scale.

pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod git;
pub mod heatmap;
pub mod model;
pub mod renderer;
pub mod scale;

pub use analyzer::CountAggregator;
pub use cache::{DocumentCache, RevisionCache};
pub use color::{color_for_bin, Rgba};
pub use error::{error_message, ErrorSink, ErrorValue, HeatError, TracingSink};
pub use git::{blame_at, current_revision, line_change_count, GitProvider, HistoryProvider};
pub use heatmap::Heatmap;
pub use model::{CacheKey, CountVector, DocumentKey, LineMeta, RepoContext, RevisionId};
pub use scale::{assign_bins, BinAssignment, ScaleConfig, ScaleMode};
