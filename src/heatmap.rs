// src/heatmap.rs

use crate::analyzer::CountAggregator;
use crate::cache::{DocumentCache, RevisionCache};
use crate::error::{error_message, ErrorSink, ErrorValue, HeatError, Result, TracingSink};
use crate::git::{self, HistoryProvider};
use crate::model::{CacheKey, CountVector, DocumentKey, LineMeta, RepoContext};
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::debug;

/// Wires a history provider to the caches and the aggregator.
///
/// Hosts own one of these per session and call into it from their own
/// events (open, save, cursor move, settings change); nothing here
/// listens for anything by itself.
pub struct Heatmap {
    provider: Arc<dyn HistoryProvider>,
    aggregator: CountAggregator,
    revisions: RevisionCache,
    documents: DocumentCache,
    sink: Arc<dyn ErrorSink>,
}

impl Heatmap {
    pub fn new(provider: Arc<dyn HistoryProvider>) -> Self {
        Self {
            provider,
            aggregator: CountAggregator::default(),
            revisions: RevisionCache::new(),
            documents: DocumentCache::new(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_aggregator(mut self, aggregator: CountAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn revision_cache(&self) -> &RevisionCache {
        &self.revisions
    }

    pub fn document_cache(&self) -> &DocumentCache {
        &self.documents
    }

    /// Locate `file` in its repository. `None` when it isn't in one.
    /// Relative paths resolve against the working directory.
    pub async fn repo_context(&self, file: &Path, line_count: usize) -> Result<Option<RepoContext>> {
        let file = std::path::absolute(file)?;
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !self.provider.is_repository(dir).await {
            return Ok(None);
        }
        let repo_root = self.provider.top_level(dir).await?;
        let relative_path = relative_path(&repo_root, &file)?;
        Ok(Some(RepoContext {
            repo_root,
            relative_path,
            line_count,
        }))
    }

    /// Counts for the file at its current revision, computed at most once per revision.
    pub async fn counts(&self, ctx: &RepoContext) -> CountVector {
        let revision = git::current_revision(self.provider.as_ref(), &ctx.repo_root).await;
        let key = CacheKey::for_context(ctx, &revision);
        if let Some(counts) = self.revisions.get(&key, ctx.line_count) {
            return counts;
        }

        debug!("computing counts for {} at {revision}", ctx.relative_path);
        let counts = self
            .aggregator
            .compute_counts(
                self.provider.as_ref(),
                &ctx.repo_root,
                &ctx.relative_path,
                ctx.line_count,
            )
            .await;
        self.revisions.put(key, &counts);
        counts
    }

    /// Full update for an open document.
    ///
    /// Failures are reported once to the sink and yield `None`.
    pub async fn refresh(&self, doc: &DocumentKey, file: &Path, line_count: usize) -> Option<CountVector> {
        if line_count == 0 {
            return None;
        }
        match self.repo_context(file, line_count).await {
            Ok(Some(ctx)) => {
                let counts = self.counts(&ctx).await;
                self.documents.set(doc.clone(), counts.clone());
                Some(counts)
            }
            Ok(None) => None,
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Counts for a cursor move: the document's last-known counts if they
    /// still fit, otherwise whatever the revision cache or history gives.
    /// Failures stay silent.
    pub async fn selection_counts(&self, doc: &DocumentKey, file: &Path, line_count: usize) -> Option<CountVector> {
        if let Some(counts) = self.documents.get(doc, line_count) {
            return Some(counts);
        }
        let ctx = match self.repo_context(file, line_count).await {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return None,
            Err(e) => {
                debug!("no counts for {}: {e}", file.display());
                return None;
            }
        };
        let counts = self.counts(&ctx).await;
        self.documents.set(doc.clone(), counts.clone());
        Some(counts)
    }

    /// The document's text changed; its counts no longer line up.
    pub fn document_changed(&self, doc: &DocumentKey) {
        self.documents.delete(doc);
    }

    /// Scaling or visibility settings changed.
    pub fn configuration_changed(&self) {
        self.revisions.invalidate_all();
        self.documents.clear();
    }

    pub async fn blame(&self, ctx: &RepoContext, line1: usize) -> LineMeta {
        git::blame_at(
            self.provider.as_ref(),
            self.sink.as_ref(),
            &ctx.repo_root,
            &ctx.relative_path,
            line1,
        )
        .await
    }

    fn report(&self, err: &HeatError) {
        let msg = error_message(&ErrorValue::Error(err));
        if !msg.is_empty() {
            self.sink.report(&format!("Git history error: {msg}"));
        }
    }
}

/// Clamp a 1-based line into `[1, line_count]`
pub fn clamp_line(line1: usize, line_count: usize) -> usize {
    line1.clamp(1, line_count.max(1))
}

/// Inline label for the selected 1-based line, e.g. `(3 changes)`
pub fn line_label(counts: &CountVector, line1: usize) -> String {
    let line1 = clamp_line(line1, counts.len());
    format!("({} changes)", counts.count_at(line1 - 1))
}

/// `/`-separated path of `file` below `repo_root`
pub fn relative_path(repo_root: &Path, file: &Path) -> Result<String> {
    let file = file.canonicalize()?;
    let rel = file
        .strip_prefix(repo_root)
        .map_err(|_| HeatError::OutsideRepository {
            path: file.clone(),
            root: repo_root.to_path_buf(),
        })?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}
