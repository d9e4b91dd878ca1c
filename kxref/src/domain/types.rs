//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep database row identifiers apart from plain
//! integers and carry the producer-side symbol normalization.

use std::fmt;
use std::str::FromStr;

use kxref_common::{InstanceRow, SYM_PREFIX};

use super::errors::ConfigError;

/// Row identifier of an ingested kernel build
///
/// Allocated by the sink when the `instances` row is inserted; every other
/// row references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub i64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Strip the disassembler `sym.` prefix from a symbol name
#[must_use]
pub fn normalize_symbol(name: &str) -> &str {
    name.strip_prefix(SYM_PREFIX).unwrap_or(name)
}

/// Kernel version tuple, as in the top-level kernel Makefile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelVersion {
    pub version: i64,
    pub patchlevel: i64,
    pub sublevel: i64,
    pub extraversion: String,
}

impl KernelVersion {
    /// Build the `instances` row for this version
    #[must_use]
    pub fn instance_row(&self, note: &str) -> InstanceRow {
        InstanceRow {
            version: self.version,
            patchlevel: self.patchlevel,
            sublevel: self.sublevel,
            extraversion: self.extraversion.clone(),
            note: note.to_string(),
        }
    }
}

impl FromStr for KernelVersion {
    type Err = ConfigError;

    /// Parse `6.1.12-rc3` style strings; a missing sublevel is 0
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::KernelVersion(s.to_string());

        let split = s.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(s.len());
        let (numbers, extraversion) = s.split_at(split);

        let parts: Vec<&str> = numbers.trim_end_matches('.').split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let mut fields = [0i64; 3];
        for (field, part) in fields.iter_mut().zip(&parts) {
            *field = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self {
            version: fields[0],
            patchlevel: fields[1],
            sublevel: fields[2],
            extraversion: extraversion.to_string(),
        })
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}{}", self.version, self.patchlevel, self.sublevel, self.extraversion)
    }
}
