//! Resolution worker
//!
//! Drains the job queue in FIFO order. For each job it resolves the address,
//! picks one record, formats the statement and executes it on the job's
//! sink. A sink failure stops the worker; the error surfaces through
//! [`super::Pipeline::finish`] and every later enqueue fails.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use kxref_common::{quote, UNRESOLVED};
use log::{debug, error};

use super::cache::ResolutionCache;
use super::job::{Job, Request};
use crate::domain::PipelineError;
use crate::symbolization::{ResolutionRecord, Resolver};

/// Counters reported when the worker finishes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Statements executed on a sink
    pub statements: usize,
    /// Raw statements forwarded verbatim
    pub passthrough: usize,
    /// Addresses resolved to at least one record
    pub resolved: usize,
    /// Addresses substituted with `NONE`
    pub unresolved: usize,
}

/// Pick the `file:line` to store for one address
///
/// The first record whose function is `expected_symbol` wins; without a
/// match the last (outermost) record is used. No records yields `NONE`.
#[must_use]
pub fn select_source_line(records: &[ResolutionRecord], expected_symbol: &str) -> String {
    let mut chosen = None;
    for record in records {
        chosen = Some(record);
        if record.function.as_deref() == Some(expected_symbol) {
            break;
        }
    }
    chosen.map_or_else(|| UNRESOLVED.to_string(), ResolutionRecord::file_line)
}

pub(crate) struct Worker {
    resolver: Resolver,
    jobs: Receiver<Job>,
    permits: Receiver<()>,
    /// Present only when the pipeline was started with caching
    cache: Option<Arc<ResolutionCache>>,
    stats: WorkerStats,
}

impl Worker {
    pub(crate) fn new(
        resolver: Resolver,
        jobs: Receiver<Job>,
        permits: Receiver<()>,
        cache: Option<Arc<ResolutionCache>>,
    ) -> Self {
        Self { resolver, jobs, permits, cache, stats: WorkerStats::default() }
    }

    /// Run until every dispatcher is dropped and the queue is drained, or
    /// until a sink fails
    pub(crate) fn run(mut self) -> Result<WorkerStats, PipelineError> {
        while let Ok(job) = self.jobs.recv() {
            let statement = self.render(job.request);

            if let Err(e) = job.sink.execute(&statement) {
                error!("Statement failed, aborting run:\n{statement}");
                return Err(e.into());
            }
            self.stats.statements += 1;

            // Job complete; free its slot
            let _ = self.permits.try_recv();
        }

        debug!("Job queue closed after {} statements", self.stats.statements);
        Ok(self.stats)
    }

    fn render(&mut self, request: Request) -> String {
        match request {
            Request::Raw(statement) => {
                self.stats.passthrough += 1;
                statement
            }
            Request::Resolve { address, expected_symbol, template } => {
                let records = self.resolver.lookup(address);
                let source_line = select_source_line(&records, &expected_symbol);

                if records.is_empty() {
                    self.stats.unresolved += 1;
                } else {
                    self.stats.resolved += 1;
                }
                if let Some(cache) = self.cache.as_ref().filter(|_| records.len() <= 1) {
                    cache.record(address, &source_line);
                }

                debug!(
                    "0x{address:x} ({expected_symbol}): {} record(s) -> {source_line}",
                    records.len()
                );
                // The value is quoted here; templates wrap the placeholder in '...'
                template.fill(&quote(&source_line))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &str, line: u32, function: &str) -> ResolutionRecord {
        ResolutionRecord { file: file.to_string(), line, function: Some(function.to_string()) }
    }

    #[test]
    fn test_single_record() {
        let records = [record("a/b.c", 42, "foo")];
        assert_eq!(select_source_line(&records, "foo"), "a/b.c:42");
        assert_eq!(select_source_line(&records, "bar"), "a/b.c:42");
    }

    #[test]
    fn test_matching_function_wins() {
        let records = [record("x.c", 10, "inner"), record("y.c", 20, "foo")];
        assert_eq!(select_source_line(&records, "foo"), "y.c:20");
        assert_eq!(select_source_line(&records, "inner"), "x.c:10");
    }

    #[test]
    fn test_last_record_without_match() {
        let records = [record("x.c", 10, "inner"), record("y.c", 20, "foo")];
        assert_eq!(select_source_line(&records, "bar"), "y.c:20");
    }

    #[test]
    fn test_first_match_stops_iteration() {
        let records = [
            record("x.c", 10, "helper"),
            record("y.c", 20, "helper"),
            record("z.c", 30, "outer"),
        ];
        assert_eq!(select_source_line(&records, "helper"), "x.c:10");
    }

    #[test]
    fn test_unknown_function_never_matches() {
        let records = [
            ResolutionRecord { file: "x.c".to_string(), line: 1, function: None },
            record("y.c", 2, "outer"),
        ];
        assert_eq!(select_source_line(&records, ""), "y.c:2");
    }

    #[test]
    fn test_empty_resolution() {
        assert_eq!(select_source_line(&[], "foo"), "NONE");
    }
}
