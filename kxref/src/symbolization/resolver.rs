use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::canonical::canonicalize_path;
use super::dwarf_reader::DwarfReader;
use crate::domain::ResolveError;

/// One source location an address maps to
///
/// A single address may yield several records when the call site sits
/// inside inlined code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRecord {
    pub file: String,
    pub line: u32,
    pub function: Option<String>,
}

impl ResolutionRecord {
    /// `file:line` as stored in the database
    #[must_use]
    pub fn file_line(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// Source of line-table lookups
///
/// Implementations may keep cursor state across a lookup, hence `&mut self`.
/// Records are returned innermost frame first, outermost frame last.
pub trait LineReader: Send {
    fn frames(&mut self, address: u64) -> Vec<ResolutionRecord>;
}

struct NoLineInfo;

impl LineReader for NoLineInfo {
    fn frames(&mut self, _address: u64) -> Vec<ResolutionRecord> {
        Vec::new()
    }
}

/// Address resolver over one debug binary
///
/// The reader is only reachable through [`Resolver::lookup`], which holds an
/// exclusive lock for the duration of a single lookup.
pub struct Resolver {
    reader: Mutex<Box<dyn LineReader>>,
}

impl Resolver {
    /// Open the DWARF line tables of `path`
    ///
    /// # Errors
    /// Returns [`ResolveError::DebugInfoUnavailable`] when the file is
    /// missing, unreadable, or has no line table
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        Ok(Self::with_reader(DwarfReader::open(path)?))
    }

    /// Resolver that maps every address to nothing
    ///
    /// Used when only raw statements flow through the pipeline.
    #[must_use]
    pub fn without_debug_info() -> Self {
        Self::with_reader(NoLineInfo)
    }

    /// Wrap an arbitrary line reader
    pub fn with_reader(reader: impl LineReader + 'static) -> Self {
        Self { reader: Mutex::new(Box::new(reader)) }
    }

    /// Resolve an address to zero or more records with canonical file paths
    ///
    /// Never fails: an address outside any compilation unit yields an empty
    /// list.
    pub fn lookup(&self, address: u64) -> Vec<ResolutionRecord> {
        let mut records = {
            let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
            reader.frames(address)
        };

        for record in &mut records {
            record.file = canonicalize_path(&record.file);
        }
        records
    }
}
