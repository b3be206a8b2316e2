// src/analyzer.rs

use crate::error::{HeatError, Result};
use crate::git::HistoryProvider;
use crate::model::{CountVector, BATCH_SIZE, SAFE_MAX_LINES};
use futures::future::join_all;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Builds a file's per-line change counts from one history query per line.
///
/// Queries run in batches: every query of a batch is in flight together and
/// the next batch starts only once the whole batch has settled. Lines past
/// `safe_max_lines` are never queried and count as zero.
#[derive(Clone)]
pub struct CountAggregator {
    batch_size: usize,
    safe_max_lines: usize,
    query_timeout: Option<Duration>,
    progress: ProgressBar,
}

impl Default for CountAggregator {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            safe_max_lines: SAFE_MAX_LINES,
            query_timeout: None,
            progress: ProgressBar::hidden(),
        }
    }
}

impl CountAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, batch_size: usize, safe_max_lines: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self.safe_max_lines = safe_max_lines;
        self
    }

    /// Queries slower than `timeout` count as zero. Off by default.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn compute_counts(
        &self,
        provider: &dyn HistoryProvider,
        repo_root: &Path,
        relative_path: &str,
        line_count: usize,
    ) -> CountVector {
        let effective_line_count = line_count.min(self.safe_max_lines);
        if effective_line_count < line_count {
            debug!(
                "{relative_path}: {line_count} lines, only the first {effective_line_count} are queried"
            );
        }

        // Index-addressed slots keep line order independent of completion order
        let mut counts = vec![0u32; line_count];

        self.progress.set_length(effective_line_count as u64);
        self.progress.set_position(0);
        self.progress.set_message(format!("Tracing {relative_path}"));

        let lines: Vec<usize> = (1..=effective_line_count).collect();
        for batch in lines.chunks(self.batch_size) {
            let queries = batch.iter().map(|&line| async move {
                let outcome = self.query_line(provider, repo_root, relative_path, line).await;
                (line, outcome)
            });

            for (line, outcome) in join_all(queries).await {
                counts[line - 1] = match outcome {
                    Ok(count) => count,
                    Err(e) => {
                        debug!("{relative_path}:{line} counted as 0: {e}");
                        0
                    }
                };
                self.progress.inc(1);
            }
        }

        self.progress.finish_and_clear();
        CountVector::from(counts)
    }

    async fn query_line(
        &self,
        provider: &dyn HistoryProvider,
        repo_root: &Path,
        relative_path: &str,
        line: usize,
    ) -> Result<u32> {
        let query = provider.line_history(repo_root, relative_path, line);
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, query)
                .await
                .map_err(|_| HeatError::Timeout(limit))?,
            None => query.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineMeta;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Line N has been touched by N revisions. Tracks how queries overlap.
    #[derive(Default)]
    struct LineNumberProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        batches: AtomicUsize,
        queried: Mutex<Vec<usize>>,
        completed: Mutex<Vec<usize>>,
        fail_even: bool,
        /// Later lines of each batch of this size finish first
        reverse_within: Option<usize>,
        stall_line: Option<usize>,
    }

    #[async_trait]
    impl HistoryProvider for LineNumberProvider {
        async fn is_repository(&self, _path: &Path) -> bool {
            true
        }
        async fn top_level(&self, path: &Path) -> Result<PathBuf> {
            Ok(path.to_path_buf())
        }
        async fn head_revision(&self, _repo_root: &Path) -> Result<String> {
            Ok("abc123".to_string())
        }
        async fn line_history(&self, _: &Path, _: &str, line: usize) -> Result<u32> {
            self.queried.lock().unwrap().push(line);
            if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
                self.batches.fetch_add(1, Ordering::SeqCst);
            }
            let now = self.in_flight.load(Ordering::SeqCst);
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.stall_line == Some(line) {
                futures::future::pending::<()>().await;
            }
            let yields = self.reverse_within.map_or(1, |n| n - (line - 1) % n);
            for _ in 0..yields {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.lock().unwrap().push(line);

            if self.fail_even && line % 2 == 0 {
                return Err(HeatError::CommandFailed {
                    command: "log".to_string(),
                    stderr: "fatal: no path in history".to_string(),
                });
            }
            Ok(line as u32)
        }
        async fn blame_line(&self, _: &Path, _: &str, _: usize) -> Result<LineMeta> {
            Ok(LineMeta::default())
        }
    }

    #[tokio::test]
    async fn counts_follow_line_numbers_in_bounded_batches() {
        let provider = LineNumberProvider::default();
        let lines = 20;
        let counts = CountAggregator::new()
            .compute_counts(&provider, Path::new("/repo"), "a.rs", lines)
            .await;

        let expected: Vec<u32> = (1..=lines as u32).collect();
        assert_eq!(&*counts, expected.as_slice());
        assert!(provider.batches.load(Ordering::SeqCst) >= lines.div_ceil(BATCH_SIZE));
        assert!(provider.peak.load(Ordering::SeqCst) <= BATCH_SIZE);
    }

    #[tokio::test]
    async fn line_order_ignores_completion_order() {
        let provider = LineNumberProvider {
            reverse_within: Some(BATCH_SIZE),
            ..Default::default()
        };
        let lines = 15;
        let counts = CountAggregator::new()
            .compute_counts(&provider, Path::new("/repo"), "a.rs", lines)
            .await;

        let completed = provider.completed.lock().unwrap().clone();
        assert_eq!(&completed[..BATCH_SIZE], &[6, 5, 4, 3, 2, 1]);
        let expected: Vec<u32> = (1..=lines as u32).collect();
        assert_eq!(&*counts, expected.as_slice());
    }

    #[tokio::test]
    async fn large_files_are_capped_but_keep_full_length() {
        let provider = LineNumberProvider::default();
        let counts = CountAggregator::new()
            .compute_counts(&provider, Path::new("/repo"), "big.rs", SAFE_MAX_LINES + 5)
            .await;

        assert_eq!(counts.len(), SAFE_MAX_LINES + 5);
        assert_eq!(counts[SAFE_MAX_LINES - 1], SAFE_MAX_LINES as u32);
        assert!(counts[SAFE_MAX_LINES..].iter().all(|&c| c == 0));
        assert_eq!(provider.queried.lock().unwrap().len(), SAFE_MAX_LINES);
    }

    #[tokio::test]
    async fn failed_lines_count_as_zero() {
        let provider = LineNumberProvider {
            fail_even: true,
            ..Default::default()
        };
        let counts = CountAggregator::new()
            .compute_counts(&provider, Path::new("/repo"), "a.rs", 5)
            .await;
        assert_eq!(&*counts, &[1, 0, 3, 0, 5]);
    }

    #[tokio::test]
    async fn stalled_query_times_out_to_zero() {
        let provider = LineNumberProvider {
            stall_line: Some(2),
            ..Default::default()
        };
        let counts = CountAggregator::new()
            .with_query_timeout(Some(Duration::from_millis(20)))
            .compute_counts(&provider, Path::new("/repo"), "a.rs", 8)
            .await;
        assert_eq!(&*counts, &[1, 0, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn empty_file_issues_no_queries() {
        let provider = LineNumberProvider::default();
        let counts = CountAggregator::new()
            .compute_counts(&provider, Path::new("/repo"), "empty.rs", 0)
            .await;
        assert!(counts.is_empty());
        assert!(provider.queried.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_batch_size_bounds_overlap() {
        let provider = LineNumberProvider::default();
        CountAggregator::new()
            .with_limits(2, SAFE_MAX_LINES)
            .compute_counts(&provider, Path::new("/repo"), "a.rs", 7)
            .await;
        assert_eq!(provider.peak.load(Ordering::SeqCst), 2);
        assert_eq!(provider.batches.load(Ordering::SeqCst), 4);
    }
}
