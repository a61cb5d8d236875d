//! Bounded pool for CPU-bound analysis.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::Finding;
use crate::error::ProcessingError;
use crate::ports::Analyzer;

/// Runs the analyzer on tokio's blocking threads, at most `workers` at a time.
#[derive(Clone)]
pub struct AnalysisPool {
    analyzer: Arc<dyn Analyzer>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl AnalysisPool {
    /// `workers` is raised to at least 1.
    pub fn new(analyzer: Arc<dyn Analyzer>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            analyzer,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// One fewer than the available cores, and at least 1.
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn analyze(&self, text: String) -> Result<Vec<Finding>, ProcessingError> {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ProcessingError::Analysis(e.to_string()))?;

        let analyzer = Arc::clone(&self.analyzer);
        tokio::task::spawn_blocking(move || analyzer.analyze(&text))
            .await
            .map_err(|e| ProcessingError::Analysis(format!("analysis worker failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Tracking {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Analyzer for Tracking {
        fn analyze(&self, text: &str) -> Result<Vec<Finding>, ProcessingError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![Finding::new("LEN", 0, text.chars().count(), 1.0)])
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_count() {
        let analyzer = Arc::new(Tracking {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let pool = AnalysisPool::new(analyzer.clone(), 2);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move { pool.analyze("x".repeat(i)).await }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            let findings = task.await.unwrap().unwrap();
            assert_eq!(findings[0].end, i);
        }

        assert!(analyzer.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn sizes_are_at_least_one() {
        assert!(AnalysisPool::default_workers() >= 1);
        struct Nothing;
        impl Analyzer for Nothing {
            fn analyze(&self, _: &str) -> Result<Vec<Finding>, ProcessingError> {
                Ok(Vec::new())
            }
        }
        assert_eq!(AnalysisPool::new(Arc::new(Nothing), 0).workers(), 1);
    }
}
