//! Database sink
//!
//! The worker hands every completed statement to a [`Sink`]. Calls are
//! synchronous: `execute` returns only once the row is visible to later
//! statements on the same sink, so a following `execute_returning_id`
//! observes it.

pub mod sqlite;

use std::sync::Arc;

use crate::domain::SinkError;

pub use sqlite::SqliteSink;

/// Executes fully formatted INSERT statements
pub trait Sink: Send + Sync {
    /// Execute one statement
    ///
    /// # Errors
    /// Any database error; the run treats it as fatal
    fn execute(&self, statement: &str) -> Result<(), SinkError>;

    /// Execute one INSERT and return the row id it allocated
    ///
    /// # Errors
    /// Any database error; the run treats it as fatal
    fn execute_returning_id(&self, statement: &str) -> Result<i64, SinkError>;
}

/// Shared handle carried by every job
pub type SinkHandle = Arc<dyn Sink>;
