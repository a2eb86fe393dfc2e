//! Caller-supplied worker pool for wide fan-outs
//!
//! A fan-out splits an ordered collection into contiguous ranges, runs one
//! unit of work per range and waits for all of them before returning. The
//! first failure is reported once every unit has finished.

use std::ops::Range;

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Stack reserved for each worker; rendering and compaction recurse once
/// per nesting level.
pub const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Worker threads used by compaction and serialization
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Pool with exactly `threads` workers (at least one)
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("tidyxml-worker-{i}"))
            .stack_size(WORKER_STACK_SIZE)
            .build()
            .map_err(|e| {
                Error::new(ErrorKind::WorkerFailure)
                    .with_context("building worker pool")
                    .with_source(e)
            })?;
        Ok(Self { pool })
    }

    /// Pool with one worker per available core
    pub fn with_available_cores() -> Result<Self> {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(cores)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of workers to use for `items` units, capped by `items`
    pub fn core_count(&self, items: usize) -> usize {
        self.threads().min(items).max(1)
    }

    /// Runs `work` over contiguous ranges of `items` in parallel. `work`
    /// receives the index of the range's first item and the range itself.
    pub fn fan_out<T, F>(&self, items: &[T], work: F) -> Result<()>
    where
        T: Sync,
        F: Fn(usize, &[T]) -> Result<()> + Sync,
    {
        if items.is_empty() {
            return Ok(());
        }
        let ranges = partition(items.len(), self.core_count(items.len()));
        debug!(items = items.len(), workers = ranges.len(), "fan-out");

        let failure = Mutex::new(None);
        self.pool.scope(|scope| {
            let work = &work;
            let failure = &failure;
            for range in ranges {
                let start = range.start;
                let chunk = items.get(range).unwrap_or_default();
                scope.spawn(move |_| {
                    if let Err(e) = work(start, chunk) {
                        record(failure, e);
                    }
                });
            }
        });
        into_result(failure)
    }

    /// Like [`fan_out`](Self::fan_out), with each worker owning its range mutably.
    pub fn fan_out_mut<T, F>(&self, items: &mut [T], work: F) -> Result<()>
    where
        T: Send,
        F: Fn(&mut [T]) -> Result<()> + Sync,
    {
        if items.is_empty() {
            return Ok(());
        }
        let ranges = partition(items.len(), self.core_count(items.len()));
        debug!(items = items.len(), workers = ranges.len(), "fan-out");

        let failure = Mutex::new(None);
        self.pool.scope(|scope| {
            let work = &work;
            let failure = &failure;
            let mut rest = items;
            for range in ranges {
                let (chunk, tail) = rest.split_at_mut(range.len());
                rest = tail;
                scope.spawn(move |_| {
                    if let Err(e) = work(chunk) {
                        record(failure, e);
                    }
                });
            }
        });
        into_result(failure)
    }
}

/// Splits `0..len` into `workers` contiguous ranges of `len / workers`
/// items; the last range also takes the remainder.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, len.max(1));
    let per_worker = len / workers;
    (0..workers)
        .map(|c| {
            let start = per_worker * c;
            let end = if c + 1 == workers {
                len
            } else {
                per_worker * (c + 1)
            };
            start..end
        })
        .collect()
}

fn record(failure: &Mutex<Option<Error>>, e: Error) {
    let mut slot = failure.lock();
    if slot.is_none() {
        *slot = Some(e);
    }
}

fn into_result(failure: Mutex<Option<Error>>) -> Result<()> {
    match failure.into_inner() {
        Some(e) => Err(Error::worker_failure(e)),
        None => Ok(()),
    }
}
