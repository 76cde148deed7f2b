//! Worker pool: runs blocking jobs on tokio's blocking threads, never more than
//! `max_parallel` at a time.
//!
//! Jobs are launched in submission order and their results are returned in the
//! same order, so partition order survives parallel execution. Every launched
//! job is awaited before `run_all` returns, even when an earlier one failed;
//! no worker keeps writing after the caller has seen the error.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::{ExecError, Result};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    max_parallel: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_parallel: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            max_parallel,
            semaphore: Arc::new(Semaphore::new(max_parallel)),
        }
    }

    pub async fn run_all<T, F>(&self, jobs: Vec<F>) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        trace!(jobs = jobs.len(), max_parallel = self.max_parallel, "dispatching workers");
        let mut handles: Vec<JoinHandle<Result<T>>> = Vec::with_capacity(jobs.len());

        for job in jobs {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ExecError::Invalid("worker pool closed".into()))?;

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit; // held for the duration of the job
                job()
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        let mut first_err: Option<ExecError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(v)) => results.push(v),
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(join) => {
                    first_err.get_or_insert(ExecError::Join(join.to_string()));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_submission_order() {
        let pool = WorkerPool::new(3);
        let jobs: Vec<_> = (0..10usize)
            .map(|i| move || -> Result<usize> { Ok(i * 2) })
            .collect();
        let out = pool.run_all(jobs).await.unwrap();
        assert_eq!(out, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_exceeds_bound() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..8)
            .map(|_| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                move || -> Result<()> {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .collect();

        pool.run_all(jobs).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn reports_first_error() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<Box<dyn FnOnce() -> Result<u8> + Send>> = vec![
            Box::new(|| Ok(1)),
            Box::new(|| Err(ExecError::Invalid("boom".into()))),
            Box::new(|| Ok(3)),
        ];
        let err = pool.run_all(jobs).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
