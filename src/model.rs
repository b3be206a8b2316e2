// src/model.rs

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

/// Files longer than this only get real counts for their first lines
pub const SAFE_MAX_LINES: usize = 1200;

/// Number of line-history queries allowed in flight at once
pub const BATCH_SIZE: usize = 6;

/// Highest bin number; bins run from 0 to MAX_BINS inclusive
pub const MAX_BINS: u8 = 10;

/// A quantized heat bucket in `0..=MAX_BINS`
pub type Bin = u8;

/// Identifies a file within a repository at the moment of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub repo_root: PathBuf,
    /// Path relative to `repo_root`, always `/`-separated
    pub relative_path: String,
    pub line_count: usize,
}

/// Opaque identifier of the repository state a count vector was computed for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionId(String);

impl RevisionId {
    /// Sentinel used when no commit can be resolved
    pub const WORKTREE: &'static str = "WORKTREE";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn worktree() -> Self {
        Self(Self::WORKTREE.to_string())
    }

    pub fn is_worktree(&self) -> bool {
        self.0 == Self::WORKTREE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `repo_root::relative_path::revision`, the primary cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(repo_root: &std::path::Path, relative_path: &str, revision: &RevisionId) -> Self {
        Self(format!(
            "{}::{}::{}",
            repo_root.display(),
            relative_path,
            revision
        ))
    }

    pub fn for_context(ctx: &RepoContext, revision: &RevisionId) -> Self {
        Self::new(&ctx.repo_root, &ctx.relative_path, revision)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of an open document in the host, e.g. a URI string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-line change counts, index = zero-based line number.
///
/// Immutable once built; clones share the same allocation, so a vector
/// handed out by a cache can be read by several callers at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountVector(Arc<[u32]>);

impl CountVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count for a zero-based line, 0 when out of range
    pub fn count_at(&self, line0: usize) -> u32 {
        self.0.get(line0).copied().unwrap_or(0)
    }
}

impl Deref for CountVector {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for CountVector {
    fn from(counts: Vec<u32>) -> Self {
        Self(counts.into())
    }
}

impl From<&[u32]> for CountVector {
    fn from(counts: &[u32]) -> Self {
        Self(Arc::from(counts))
    }
}

/// Subset of blame metadata for one line. Fields are empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMeta {
    pub author: String,
    /// Author date as `YYYY-MM-DD`
    pub date: String,
    pub summary: String,
}

impl LineMeta {
    pub fn is_empty(&self) -> bool {
        self.author.is_empty() && self.date.is_empty() && self.summary.is_empty()
    }
}
