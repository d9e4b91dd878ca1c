//! # Shared Row Definitions (Scanner ↔ Database)
//!
//! Defines the SQL wire format shared between the symbol scanner, the
//! resolution worker and the database sink. Table and column names here are
//! the stable contract with downstream query tools; changing them breaks
//! every consumer of an ingested database.
//!
//! ## Statement Templates
//!
//! Rows that need a source location (`xrefs.source_line`) cannot be fully
//! rendered by the scanner, because resolving an address through DWARF is
//! the worker's job. Those rows are rendered as a [`SqlTemplate`] carrying a
//! single [`PLACEHOLDER`]; the worker fills it once the address is resolved.
//!
//! ## Key Types
//!
//! - [`SqlTemplate`] - Validated statement with exactly one placeholder
//! - [`InstanceRow`] - One ingested kernel build (returning-id insert)
//! - [`XrefRow`] - One call-site cross-reference
//! - [`SymbolFileRow`] - One function symbol of the scanned image

use std::fmt;

use thiserror::Error;

// ============================================================================
// Wire Constants
// ============================================================================

/// Placeholder substituted with the resolved `file:line`
pub const PLACEHOLDER: &str = "%s";

/// Substituted value when an address resolves to no source location
pub const UNRESOLVED: &str = "NONE";

/// Expected-symbol sentinel meaning "execute the template verbatim"
pub const PASSTHROUGH_SYMBOL: &str = "None";

/// Prefix some disassemblers put in front of symbol names
pub const SYM_PREFIX: &str = "sym.";

/// Schema of the relational store.
///
/// Offsets are stored as `0x`-prefixed hex text: kernel virtual addresses do
/// not fit a signed 64-bit integer column.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS instances (
        instance_id INTEGER PRIMARY KEY AUTOINCREMENT,
        version INTEGER NOT NULL,
        patchlevel INTEGER NOT NULL,
        sublevel INTEGER NOT NULL,
        extraversion TEXT NOT NULL,
        note TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS configs (
        config_id INTEGER PRIMARY KEY AUTOINCREMENT,
        config_key TEXT NOT NULL,
        config_val TEXT NOT NULL,
        instance_id INTEGER NOT NULL REFERENCES instances(instance_id)
    );
    CREATE TABLE IF NOT EXISTS files (
        id INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS symbols (
        id INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER,
        addr2line_prefix TEXT
    );
    CREATE TABLE IF NOT EXISTS symbols_files (
        id INTEGER NOT NULL,
        symbol_name TEXT NOT NULL,
        symbol_offset TEXT NOT NULL,
        symbol_type TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS xrefs (
        id INTEGER NOT NULL,
        caller_offset TEXT NOT NULL,
        calling_offset TEXT NOT NULL,
        callee_offset TEXT NOT NULL,
        source_line TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS xrefs_caller ON xrefs (id, caller_offset);
    CREATE INDEX IF NOT EXISTS xrefs_callee ON xrefs (id, callee_offset);
";

// ============================================================================
// Quoting
// ============================================================================

/// Quote a value as a SQL string literal body (single quotes doubled)
#[must_use]
pub fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render an address the way offsets are stored
#[must_use]
pub fn offset_literal(offset: u64) -> String {
    format!("0x{offset:016x}")
}

// ============================================================================
// Statement Templates
// ============================================================================

/// Errors raised while validating a statement template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has no '{PLACEHOLDER}' placeholder: {0}")]
    MissingPlaceholder(String),

    #[error("template has {count} placeholders, expected one: {template}")]
    ExtraPlaceholders { count: usize, template: String },
}

/// A partially formatted statement with exactly one `%s` placeholder.
///
/// `%%` renders as a literal `%`; any other `%` sequence is copied through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplate(String);

impl SqlTemplate {
    /// Validate a template
    ///
    /// # Errors
    /// Returns an error unless the text contains exactly one placeholder
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        match count_placeholders(&text) {
            0 => Err(TemplateError::MissingPlaceholder(text)),
            1 => Ok(Self(text)),
            count => Err(TemplateError::ExtraPlaceholders { count, template: text }),
        }
    }

    /// Substitute `value` into the placeholder
    #[must_use]
    pub fn fill(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + value.len());
        let mut chars = self.0.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                Some('s') => {
                    chars.next();
                    out.push_str(value);
                }
                _ => out.push('%'),
            }
        }
        out
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn count_placeholders(text: &str) -> usize {
    let mut count = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('s') => count += 1,
                Some(_) | None => {}
            }
        }
    }
    count
}

// ============================================================================
// Rows
// ============================================================================

/// `instances` row: one ingested kernel build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRow {
    pub version: i64,
    pub patchlevel: i64,
    pub sublevel: i64,
    pub extraversion: String,
    pub note: String,
}

impl InstanceRow {
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO instances (version, patchlevel, sublevel, extraversion, note) \
             VALUES ({}, {}, {}, '{}', '{}');",
            self.version,
            self.patchlevel,
            self.sublevel,
            quote(&self.extraversion),
            quote(&self.note)
        )
    }
}

/// `configs` row: one Kconfig entry of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
    pub instance_id: i64,
}

impl ConfigRow {
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO configs (config_key, config_val, instance_id) VALUES ('{}', '{}', {});",
            quote(&self.key),
            quote(&self.value),
            self.instance_id
        )
    }
}

/// Tables holding referential index rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTable {
    Files,
    Symbols,
    Tags,
}

impl IndexTable {
    pub const ALL: [IndexTable; 3] = [IndexTable::Files, IndexTable::Symbols, IndexTable::Tags];

    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            IndexTable::Files => "files",
            IndexTable::Symbols => "symbols",
            IndexTable::Tags => "tags",
        }
    }

    #[must_use]
    pub fn to_sql(self, instance_id: i64) -> String {
        format!("INSERT INTO {} (id) VALUES ({instance_id});", self.table_name())
    }
}

/// `symbols_files` row: one function symbol of the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFileRow {
    pub instance_id: i64,
    pub symbol_name: String,
    pub symbol_offset: u64,
    pub symbol_type: char,
}

impl SymbolFileRow {
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO symbols_files (id, symbol_name, symbol_offset, symbol_type) \
             VALUES ({}, '{}', '{}', '{}');",
            self.instance_id,
            quote(&self.symbol_name),
            offset_literal(self.symbol_offset),
            quote(&self.symbol_type.to_string())
        )
    }
}

/// `xrefs` row: the instruction at `calling_offset` inside the function at
/// `caller_offset` transfers control to `callee_offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefRow {
    pub instance_id: i64,
    pub caller_offset: u64,
    pub calling_offset: u64,
    pub callee_offset: u64,
}

impl XrefRow {
    /// Render with the source line left as a placeholder
    #[must_use]
    pub fn to_template(&self) -> SqlTemplate {
        SqlTemplate(format!(
            "INSERT INTO xrefs (id, caller_offset, calling_offset, callee_offset, source_line) \
             VALUES ({}, '{}', '{}', '{}', '{PLACEHOLDER}');",
            self.instance_id,
            offset_literal(self.caller_offset),
            offset_literal(self.calling_offset),
            offset_literal(self.callee_offset)
        ))
    }

    /// Render with an already known source line
    #[must_use]
    pub fn to_sql(&self, source_line: &str) -> String {
        self.to_template().fill(&quote(source_line))
    }
}

/// `tags` provenance row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub addr2line_prefix: String,
}

impl TagRow {
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("INSERT INTO tags (addr2line_prefix) VALUES ('{}');", quote(&self.addr2line_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_fill() {
        let template = SqlTemplate::new("INSERT INTO xrefs VALUES (1,2,3,'%s');").unwrap();
        assert_eq!(template.fill("a/b.c:42"), "INSERT INTO xrefs VALUES (1,2,3,'a/b.c:42');");
    }

    #[test]
    fn test_template_escaped_percent() {
        let template = SqlTemplate::new("SELECT '100%%', '%s';").unwrap();
        assert_eq!(template.fill("x"), "SELECT '100%', 'x';");
    }

    #[test]
    fn test_template_placeholder_count() {
        assert!(matches!(
            SqlTemplate::new("INSERT INTO tags VALUES ('x');"),
            Err(TemplateError::MissingPlaceholder(_))
        ));
        assert!(matches!(
            SqlTemplate::new("VALUES ('%s', '%s')"),
            Err(TemplateError::ExtraPlaceholders { count: 2, .. })
        ));
        // an escaped percent followed by 's' is not a placeholder
        assert!(SqlTemplate::new("LIKE '%%s%%' AND x = '%s'").is_ok());
    }

    #[test]
    fn test_xref_template_has_one_placeholder() {
        let row = XrefRow {
            instance_id: 7,
            caller_offset: 0xffff_ffff_8100_0000,
            calling_offset: 0xffff_ffff_8100_0010,
            callee_offset: 0xffff_ffff_8120_0000,
        };
        let sql = row.to_sql("kernel/fork.c:12");
        assert_eq!(
            sql,
            "INSERT INTO xrefs (id, caller_offset, calling_offset, callee_offset, source_line) \
             VALUES (7, '0xffffffff81000000', '0xffffffff81000010', '0xffffffff81200000', \
             'kernel/fork.c:12');"
        );
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote("it's"), "it''s");
        let row = ConfigRow { key: "CONFIG_X".into(), value: "\"a'b\"".into(), instance_id: 1 };
        assert!(row.to_sql().contains("'\"a''b\"'"));
    }

    #[test]
    fn test_index_rows() {
        let sql: Vec<String> = IndexTable::ALL.iter().map(|t| t.to_sql(3)).collect();
        assert_eq!(sql[0], "INSERT INTO files (id) VALUES (3);");
        assert_eq!(sql[2], "INSERT INTO tags (id) VALUES (3);");
    }
}
