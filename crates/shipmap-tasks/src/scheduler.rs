use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 16;

/// Runs independent tasks with bounded parallelism.
///
/// `min(workers, items)` workers are spawned. Each worker repeatedly pulls the
/// next item from a shared queue until the queue is empty, so a slow task
/// never holds back items assigned to other workers.
#[derive(Clone, Copy, Debug)]
pub struct TaskScheduler {
    workers: usize,
}

impl TaskScheduler {
    /// Create a scheduler with `workers` concurrent workers (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Maximum number of tasks in flight.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` once for every item and wait for all of them.
    ///
    /// Results are returned in input order regardless of completion order.
    /// A task that panics is logged and contributes no result; the remaining
    /// items still run.
    pub async fn run<I, R, F, Fut>(&self, items: Vec<I>, task: F) -> Vec<R>
    where
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let queue: Arc<Mutex<VecDeque<(usize, I)>>> =
            Arc::new(Mutex::new(items.into_iter().enumerate().collect()));
        let task = Arc::new(task);
        let pool_size = self.workers.min(total);

        let mut workers = JoinSet::new();
        for worker in 0..pool_size {
            let queue = Arc::clone(&queue);
            let task = Arc::clone(&task);
            workers.spawn(async move {
                let mut finished = Vec::new();
                loop {
                    let next = queue
                        .lock()
                        .expect("scheduler queue mutex poisoned")
                        .pop_front();
                    let Some((index, item)) = next else {
                        break;
                    };
                    // Each item runs in its own task so a panic stays contained.
                    match tokio::spawn((*task)(item)).await {
                        Ok(result) => finished.push((index, result)),
                        Err(e) => warn!(worker, index, error = %e, "scheduled task failed"),
                    }
                }
                debug!(worker, completed = finished.len(), "worker drained queue");
                finished
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(finished) => results.extend(finished),
                Err(e) => warn!(error = %e, "scheduler worker failed"),
            }
        }

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
