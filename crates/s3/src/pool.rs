//! Bounded worker pool
//!
//! Runs independent chunk tasks with a concurrency cap and streams the
//! results back in completion order. The pool knows nothing about
//! ordering; callers that care re-establish it downstream (sorting by
//! part number, writing at fixed offsets).
//!
//! Cancellation is cooperative through the channel: when the consumer
//! drops the receiver, tasks that have not started yet return without
//! running, and tasks already in flight finish with their results
//! discarded.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use osc_core::Result;

/// Executes tasks with at most `workers` running at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawn one task per input and return the receiving end of the
    /// results channel. Results arrive in completion order, not input
    /// order.
    pub fn dispatch<I, R, F, Fut>(&self, inputs: Vec<I>, task: F) -> mpsc::Receiver<Result<R>>
    where
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(inputs.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let task = Arc::new(task);

        for input in inputs {
            let semaphore = Arc::clone(&semaphore);
            let task = Arc::clone(&task);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                // Consumer gave up; skip work that nobody will read
                if tx.is_closed() {
                    return;
                }
                let result = task(input).await;
                let _ = tx.send(result).await;
            });
        }

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatch_runs_all_tasks() {
        let pool = WorkerPool::new(4);
        let inputs: Vec<u64> = (0..10).collect();

        let mut rx = pool.dispatch(inputs, |n| async move { Ok(n * 2) });

        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result.unwrap());
        }

        results.sort_unstable();
        let expected: Vec<u64> = (0..10).map(|n| n * 2).collect();
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn test_dispatch_bounds_concurrency() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let running_task = Arc::clone(&running);
        let peak_task = Arc::clone(&peak);

        let mut rx = pool.dispatch((0..8).collect::<Vec<u32>>(), move |n| {
            let running = Arc::clone(&running_task);
            let peak = Arc::clone(&peak_task);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(n)
            }
        });

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }

        assert_eq!(count, 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_dropped_receiver_skips_pending_tasks() {
        let pool = WorkerPool::new(1);
        let started = Arc::new(AtomicUsize::new(0));

        let started_task = Arc::clone(&started);
        let rx = pool.dispatch((0..20).collect::<Vec<u32>>(), move |n| {
            let started = Arc::clone(&started_task);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(n)
            }
        });

        drop(rx);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // At most one task can have started before the drop was visible
        assert!(started.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn test_failure_flows_through_channel() {
        let pool = WorkerPool::new(4);

        let mut rx = pool.dispatch(vec![1u32, 2, 3], |n| async move {
            if n == 2 {
                Err(Error::General("task failed".into()))
            } else {
                Ok(n)
            }
        });

        let mut failures = 0;
        let mut successes = 0;
        while let Some(result) = rx.recv().await {
            match result {
                Ok(_) => successes += 1,
                Err(_) => failures += 1,
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(failures, 1);
    }
}
