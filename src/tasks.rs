//! Shared bounded worker pool for search and merge work

use std::future::Future;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{Task, TaskPool, TaskPoolBuilder, available_parallelism};

/// Worker pool shared by every CPU-bound stage of the pipeline.
///
/// Holds `max(2, cores - 1)` threads so the authoritative thread keeps a core.
#[derive(Resource, Clone)]
pub struct WorkerPool {
    pool: Arc<TaskPool>,
    threads: usize,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_threads(Self::default_thread_count())
    }

    pub fn with_threads(threads: usize) -> Self {
        let threads = threads.max(1);
        let pool = TaskPoolBuilder::new()
            .num_threads(threads)
            .thread_name("roadnet-worker".to_string())
            .build();
        Self {
            pool: Arc::new(pool),
            threads,
        }
    }

    pub fn default_thread_count() -> usize {
        available_parallelism().saturating_sub(1).max(2)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Fire-and-forget submission
    pub fn fire<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pool.spawn(job).detach();
    }

    /// Value-returning submission; the task can be polled or blocked on
    pub fn submit<T, F>(&self, job: F) -> Task<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        self.pool.spawn(job)
    }

    /// Run every job on the pool and return their results in input order.
    ///
    /// All jobs are spawned before any result is awaited, so the call takes as
    /// long as the slowest job rather than the sum of all of them.
    pub fn fan_out<I, T, J>(&self, inputs: I, job: J) -> Vec<T>
    where
        I: IntoIterator,
        I::Item: Send,
        T: Send + 'static,
        J: Fn(I::Item) -> T + Sync,
    {
        let job = &job;
        self.pool.scope(|scope| {
            for input in inputs {
                scope.spawn(async move { job(input) });
            }
        })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
