// src/git.rs

use crate::error::{error_message, is_benign_blame_error, ErrorSink, ErrorValue, HeatError, Result};
use crate::model::{LineMeta, RevisionId};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use git2::Repository;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// History queries the heatmap needs from a version-control backend.
///
/// Line numbers are 1-based. Implementations report failures as errors;
/// [`current_revision`], [`line_change_count`] and [`blame_at`] apply the
/// degradation rules on top.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn is_repository(&self, path: &Path) -> bool;

    /// Working-tree root of the repository containing `path`
    async fn top_level(&self, path: &Path) -> Result<PathBuf>;

    async fn head_revision(&self, repo_root: &Path) -> Result<String>;

    /// Number of distinct commits that touched `line`, traced through history
    async fn line_history(&self, repo_root: &Path, relative_path: &str, line: usize) -> Result<u32>;

    async fn blame_line(&self, repo_root: &Path, relative_path: &str, line: usize) -> Result<LineMeta>;
}

/// Current revision, or the `WORKTREE` sentinel if none can be resolved.
pub async fn current_revision(provider: &dyn HistoryProvider, repo_root: &Path) -> RevisionId {
    match provider.head_revision(repo_root).await {
        Ok(hash) => RevisionId::new(hash),
        Err(e) => {
            debug!("No revision for {}: {e}", repo_root.display());
            RevisionId::worktree()
        }
    }
}

/// Change count for one line; any failure counts as zero.
pub async fn line_change_count(
    provider: &dyn HistoryProvider,
    repo_root: &Path,
    relative_path: &str,
    line: usize,
) -> u32 {
    provider
        .line_history(repo_root, relative_path, line)
        .await
        .unwrap_or_else(|e| {
            debug!("line history failed for {relative_path}:{line}: {e}");
            0
        })
}

/// Best-effort blame metadata. Benign failures are logged, anything else is
/// reported once to `sink`; either way the result is empty metadata.
pub async fn blame_at(
    provider: &dyn HistoryProvider,
    sink: &dyn ErrorSink,
    repo_root: &Path,
    relative_path: &str,
    line: usize,
) -> LineMeta {
    match provider.blame_line(repo_root, relative_path, line).await {
        Ok(meta) => meta,
        Err(e) => {
            let msg = error_message(&ErrorValue::Error(&e));
            if is_benign_blame_error(&msg) {
                warn!("Benign blame error ignored: {msg}");
            } else {
                sink.report(&format!("Git Blame Error: {msg}"));
            }
            LineMeta::default()
        }
    }
}

/// [`HistoryProvider`] backed by libgit2 and the `git` binary.
///
/// libgit2 has no line-range log, so `-L` tracing and porcelain blame go
/// through a `git` subprocess.
#[derive(Debug, Clone)]
pub struct GitProvider {
    git: PathBuf,
}

impl Default for GitProvider {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitProvider {
    pub fn new(git_binary: impl Into<PathBuf>) -> Self {
        Self { git: git_binary.into() }
    }

    async fn run(&self, repo_root: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.git)
            .args(args)
            .current_dir(repo_root)
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(HeatError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl HistoryProvider for GitProvider {
    async fn is_repository(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Repository::discover(&path).is_ok_and(|repo| repo.workdir().is_some())
        })
        .await
        .unwrap_or(false)
    }

    async fn top_level(&self, path: &Path) -> Result<PathBuf> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let repo = Repository::discover(&path)
                .map_err(|_| HeatError::NotARepository(path.clone()))?;
            let workdir = repo.workdir().ok_or(HeatError::NoWorkdir)?;
            Ok(workdir.canonicalize()?)
        })
        .await?
    }

    async fn head_revision(&self, repo_root: &Path) -> Result<String> {
        let root = repo_root.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<String> {
            let repo = Repository::open(&root)?;
            let commit = repo.head()?.peel_to_commit()?;
            Ok(commit.id().to_string())
        })
        .await?
    }

    async fn line_history(&self, repo_root: &Path, relative_path: &str, line: usize) -> Result<u32> {
        let range = format!("{line},{line}:{relative_path}");
        let out = self
            .run(repo_root, &["log", "--no-patch", "--pretty=%H", "-L", &range])
            .await?;
        Ok(count_commit_lines(&out))
    }

    async fn blame_line(&self, repo_root: &Path, relative_path: &str, line: usize) -> Result<LineMeta> {
        let range = format!("{line},{line}");
        let out = self
            .run(repo_root, &["blame", "-p", "-L", &range, "--", relative_path])
            .await?;
        Ok(parse_porcelain_blame(&out))
    }
}

/// `git log --pretty=%H` prints one hash per commit
fn count_commit_lines(out: &str) -> u32 {
    out.lines().filter(|l| !l.trim().is_empty()).count() as u32
}

fn parse_porcelain_blame(out: &str) -> LineMeta {
    let mut meta = LineMeta::default();
    for line in out.lines() {
        if let Some(author) = line.strip_prefix("author ") {
            meta.author = author.trim().to_string();
        } else if let Some(time) = line.strip_prefix("author-time ") {
            meta.date = time
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
        } else if let Some(summary) = line.strip_prefix("summary ") {
            meta.summary = summary.trim().to_string();
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Provider whose every query fails with the given stderr text
    struct FailingProvider(&'static str);

    impl FailingProvider {
        fn err(&self) -> HeatError {
            HeatError::CommandFailed {
                command: "blame".to_string(),
                stderr: self.0.to_string(),
            }
        }
    }

    #[async_trait]
    impl HistoryProvider for FailingProvider {
        async fn is_repository(&self, _path: &Path) -> bool {
            false
        }
        async fn top_level(&self, path: &Path) -> Result<PathBuf> {
            Err(HeatError::NotARepository(path.to_path_buf()))
        }
        async fn head_revision(&self, _repo_root: &Path) -> Result<String> {
            Err(self.err())
        }
        async fn line_history(&self, _: &Path, _: &str, _: usize) -> Result<u32> {
            Err(self.err())
        }
        async fn blame_line(&self, _: &Path, _: &str, _: usize) -> Result<LineMeta> {
            Err(self.err())
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl ErrorSink for RecordingSink {
        fn report(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn current_revision_falls_back_to_worktree() {
        let provider = FailingProvider("fatal: ambiguous argument 'HEAD'");
        let rev = current_revision(&provider, Path::new("/repo")).await;
        assert_eq!(rev.as_str(), "WORKTREE");
        assert!(rev.is_worktree());
    }

    #[tokio::test]
    async fn line_change_count_degrades_to_zero() {
        let provider = FailingProvider("fatal: file a.rs has only 2 lines");
        assert_eq!(line_change_count(&provider, Path::new("/repo"), "a.rs", 7).await, 0);
    }

    #[tokio::test]
    async fn benign_blame_failure_is_not_reported() {
        let provider = FailingProvider("fatal: file a.rs has only 2 lines");
        let sink = RecordingSink::default();
        let meta = blame_at(&provider, &sink, Path::new("/repo"), "a.rs", 9).await;
        assert!(meta.is_empty());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unexpected_blame_failure_is_reported_once() {
        let provider = FailingProvider("fatal: permission denied");
        let sink = RecordingSink::default();
        let meta = blame_at(&provider, &sink, Path::new("/repo"), "a.rs", 1).await;
        assert!(meta.is_empty());
        let reports = sink.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("Git Blame Error:"));
        assert!(reports[0].contains("permission denied"));
    }

    #[test]
    fn porcelain_blame_fields_are_extracted() {
        let out = "\
3f2a9c1e 1 1 1
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0000
committer Ada Lovelace
summary Tighten the loop
filename src/lib.rs
\tlet x = 1;
";
        let meta = parse_porcelain_blame(out);
        assert_eq!(meta.author, "Ada Lovelace");
        assert_eq!(meta.date, "2023-11-14");
        assert_eq!(meta.summary, "Tighten the loop");
    }

    #[test]
    fn commit_lines_ignore_blank_output() {
        assert_eq!(count_commit_lines(""), 0);
        assert_eq!(count_commit_lines("abc\ndef\n\n"), 2);
    }
}
