//! Advisory resolution cache
//!
//! Remembers `address → file:line` for addresses whose resolution did not
//! depend on the expected symbol (zero or one record). Producers may consult
//! it to skip a DWARF lookup; nothing relies on it for correctness. Only
//! pipelines started with [`super::Pipeline::start_with_cache`] fill it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<u64, String>>,
}

impl ResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, address: u64, resolved: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.entry(address).or_insert_with(|| resolved.to_string());
    }

    #[must_use]
    pub fn get(&self, address: u64) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&address).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
