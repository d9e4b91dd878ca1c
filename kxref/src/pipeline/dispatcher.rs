//! Producer-side entry point of the pipeline

use std::sync::Arc;

use crossbeam_channel::Sender;

use super::cache::ResolutionCache;
use super::job::{Job, Request};
use crate::domain::PipelineError;
use crate::sink::SinkHandle;

/// Enqueues jobs for the resolution worker
///
/// Cloneable; every clone must be dropped before [`super::Pipeline::finish`]
/// can observe the end of the queue.
#[derive(Clone)]
pub struct Dispatcher {
    jobs: Sender<Job>,
    /// One token per outstanding job, returned by the worker once the job's
    /// statement has been executed
    permits: Sender<()>,
    cache: Arc<ResolutionCache>,
}

impl Dispatcher {
    pub(crate) fn new(jobs: Sender<Job>, permits: Sender<()>, cache: Arc<ResolutionCache>) -> Self {
        Self { jobs, permits, cache }
    }

    /// Queue a resolution job, blocking while the queue is full
    ///
    /// `expected_symbol == "None"` forwards `sql_template` verbatim.
    /// Otherwise the worker substitutes the resolved `file:line` for the
    /// single `%s` after doubling any `'` in it, so the placeholder belongs
    /// inside a quoted SQL string literal (`'%s'`) and must not be escaped
    /// again by the caller.
    ///
    /// # Errors
    /// Returns [`PipelineError::Template`] for a malformed template and
    /// [`PipelineError::WorkerGone`] once the worker has stopped
    pub fn enqueue(
        &self,
        sink: &SinkHandle,
        address: u64,
        expected_symbol: &str,
        sql_template: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let request = Request::from_parts(address, expected_symbol, sql_template)?;
        self.submit(sink, request)
    }

    /// Queue an already built request, blocking while the queue is full
    ///
    /// # Errors
    /// Returns [`PipelineError::WorkerGone`] once the worker has stopped
    pub fn submit(&self, sink: &SinkHandle, request: Request) -> Result<(), PipelineError> {
        self.permits.send(()).map_err(|_| PipelineError::WorkerGone)?;
        self.jobs
            .send(Job { request, sink: Arc::clone(sink) })
            .map_err(|_| PipelineError::WorkerGone)
    }

    /// Previously resolved `file:line` for `address`, if the cache has one
    ///
    /// Always `None` unless the pipeline was started with
    /// [`super::Pipeline::start_with_cache`].
    #[must_use]
    pub fn has_seen(&self, address: u64) -> Option<String> {
        self.cache.get(address)
    }

    /// Jobs queued or in progress
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.permits.len()
    }
}
