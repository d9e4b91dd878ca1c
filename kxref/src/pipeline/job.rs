//! Resolution jobs carried by the bounded queue

use kxref_common::{SqlTemplate, PASSTHROUGH_SYMBOL};

use crate::domain::{normalize_symbol, PipelineError};
use crate::sink::SinkHandle;

/// What the worker has to do for one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Execute verbatim, no resolution
    Raw(String),
    /// Resolve `address`, substitute the chosen `file:line` into `template`
    Resolve { address: u64, expected_symbol: String, template: SqlTemplate },
}

impl Request {
    /// Build a request from the untyped producer contract
    ///
    /// An expected symbol of `"None"` selects passthrough. Otherwise the
    /// `sym.` prefix is stripped and the template must hold exactly one
    /// placeholder.
    ///
    /// # Errors
    /// Returns [`PipelineError::Template`] for a malformed template
    pub fn from_parts(
        address: u64,
        expected_symbol: &str,
        sql_template: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        if expected_symbol == PASSTHROUGH_SYMBOL {
            return Ok(Request::Raw(sql_template.into()));
        }

        Ok(Request::Resolve {
            address,
            expected_symbol: normalize_symbol(expected_symbol).to_string(),
            template: SqlTemplate::new(sql_template)?,
        })
    }
}

/// One unit of work: a request plus the sink its statement goes to
pub struct Job {
    pub request: Request,
    pub sink: SinkHandle,
}
