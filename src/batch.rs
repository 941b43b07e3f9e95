//! Per-document fan-out with bounded concurrency.
//!
//! Work may complete in any order; results are always handed back in input
//! order so downstream ranking never depends on completion timing.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};

/// Aggregate of per-item results. Failures never abort sibling items.
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    pub succeeded: Vec<T>,
    pub failed: Vec<E>,
}

impl<T, E> BatchOutcome<T, E> {
    pub fn from_results(results: Vec<Result<T, E>>) -> Self {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for result in results {
            match result {
                Ok(value) => succeeded.push(value),
                Err(err) => failed.push(err),
            }
        }
        Self { succeeded, failed }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Completed-item counter, readable after the batch future is dropped.
#[derive(Debug)]
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    pub fn tick(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Apply `f` to every item with at most `limit` futures in flight, returning
/// results in input order.
pub async fn map_bounded<'a, T, R, F, Fut>(items: &'a [T], limit: usize, f: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R> + 'a,
{
    let mut indexed: Vec<(usize, R)> = stream::iter(items.iter().enumerate())
        .map(|(index, item)| {
            let fut = f(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
