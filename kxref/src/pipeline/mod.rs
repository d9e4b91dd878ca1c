//! # Resolution Pipeline
//!
//! Connects the symbol scanner (producer) to the DWARF resolver through a
//! bounded queue and a single worker thread.
//!
//! ```text
//! scanner ──▶ Dispatcher::enqueue ──▶ [ bounded queue, 16 ] ──▶ Worker
//!                                                              │
//!                                  Resolver::lookup (mutex) ◀──┤
//!                                  select + fill template   ◀──┤
//!                                  Sink::execute            ◀──┘
//! ```
//!
//! ## Backpressure
//!
//! At most [`QUEUE_DEPTH`] jobs are outstanding, counting the one the worker
//! is processing. A producer that gets ahead of the resolver blocks in
//! [`Dispatcher::enqueue`] until the worker finishes a job.
//!
//! ## Ordering
//!
//! Jobs reach the sink in the order one producer enqueued them. Nothing is
//! promised across producers.
//!
//! ## Failure
//!
//! A sink error stops the worker. Pending jobs are discarded, later enqueues
//! return [`PipelineError::WorkerGone`], and [`Pipeline::finish`] returns
//! the sink error.
//!
//! ## Caching
//!
//! [`Pipeline::start`] keeps no resolution history, so
//! [`Dispatcher::has_seen`] always answers `None`. Producers that enqueue the
//! same address more than once use [`Pipeline::start_with_cache`] instead;
//! the cache then holds one entry per distinct resolved address.

pub mod cache;
pub mod dispatcher;
pub mod job;
pub mod worker;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use log::info;

use crate::domain::PipelineError;
use crate::symbolization::Resolver;

pub use cache::ResolutionCache;
pub use dispatcher::Dispatcher;
pub use job::{Job, Request};
pub use worker::{select_source_line, WorkerStats};

use worker::Worker;

/// Maximum number of outstanding jobs
pub const QUEUE_DEPTH: usize = 16;

/// A running resolution pipeline: one queue, one worker thread
pub struct Pipeline {
    dispatcher: Dispatcher,
    worker: JoinHandle<Result<WorkerStats, PipelineError>>,
}

impl Pipeline {
    /// Create the queue and start the worker
    ///
    /// # Errors
    /// Returns an error if the worker thread cannot be spawned
    pub fn start(resolver: Resolver) -> Result<Self, PipelineError> {
        Self::spawn(resolver, false)
    }

    /// Like [`Pipeline::start`], but the worker records every address that
    /// resolved to at most one record for [`Dispatcher::has_seen`]
    ///
    /// # Errors
    /// Returns an error if the worker thread cannot be spawned
    pub fn start_with_cache(resolver: Resolver) -> Result<Self, PipelineError> {
        Self::spawn(resolver, true)
    }

    fn spawn(resolver: Resolver, caching: bool) -> Result<Self, PipelineError> {
        let (job_tx, job_rx) = bounded(QUEUE_DEPTH);
        let (permit_tx, permit_rx) = bounded(QUEUE_DEPTH);
        let cache = Arc::new(ResolutionCache::new());

        let recorder = caching.then(|| Arc::clone(&cache));
        let worker = Worker::new(resolver, job_rx, permit_rx, recorder);
        let worker = thread::Builder::new()
            .name("kxref-resolver".to_string())
            .spawn(move || worker.run())
            .map_err(PipelineError::Spawn)?;

        info!("Resolution worker started (queue depth {QUEUE_DEPTH}, caching {caching})");
        Ok(Self { dispatcher: Dispatcher::new(job_tx, permit_tx, cache), worker })
    }

    /// Producer handle
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Close the queue, wait for the worker to drain it and return its stats
    ///
    /// Blocks until every [`Dispatcher`] clone has been dropped.
    ///
    /// # Errors
    /// Returns the sink error that stopped the worker, or
    /// [`PipelineError::WorkerPanicked`]
    pub fn finish(self) -> Result<WorkerStats, PipelineError> {
        let Self { dispatcher, worker } = self;
        drop(dispatcher);

        let stats = worker.join().map_err(|_| PipelineError::WorkerPanicked)??;
        info!(
            "Resolution worker done: {} statements ({} resolved, {} unresolved, {} passthrough)",
            stats.statements, stats.resolved, stats.unresolved, stats.passthrough
        );
        Ok(stats)
    }
}
