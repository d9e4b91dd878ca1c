use std::path::Path;
use std::sync::{Mutex, PoisonError};

use kxref_common::SCHEMA_SQL;
use log::info;
use rusqlite::Connection;

use super::Sink;
use crate::domain::SinkError;

/// SQLite-backed sink
///
/// One connection, shared behind a mutex. The returning-id path reads
/// `last_insert_rowid()` on that same connection right after the INSERT.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Open (or create) the database at `path` and ensure the schema exists
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let open_err = |source| SinkError::Open { path: path.to_path_buf(), source };

        let conn = Connection::open(path).map_err(open_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(open_err)?;

        let sink = Self::with_connection(conn)?;
        info!("Opened database {}", path.display());
        Ok(sink)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created
    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()
            .map_err(|source| SinkError::Open { path: ":memory:".into(), source })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|source| SinkError::Execution { statement: SCHEMA_SQL.to_string(), source })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Count rows of `table`
    ///
    /// # Errors
    /// Returns an error if the table does not exist
    pub fn count_rows(&self, table: &str) -> Result<i64, SinkError> {
        let statement = format!("SELECT COUNT(*) FROM {table}");
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.query_row(&statement, [], |row| row.get(0))
            .map_err(|source| SinkError::Execution { statement, source })
    }
}

impl Sink for SqliteSink {
    fn execute(&self, statement: &str) -> Result<(), SinkError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch(statement)
            .map_err(|source| SinkError::Execution { statement: statement.to_string(), source })
    }

    fn execute_returning_id(&self, statement: &str) -> Result<i64, SinkError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch(statement)
            .map_err(|source| SinkError::Execution { statement: statement.to_string(), source })?;
        Ok(conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kxref_common::InstanceRow;

    fn instance(note: &str) -> String {
        InstanceRow {
            version: 6,
            patchlevel: 1,
            sublevel: 0,
            extraversion: String::new(),
            note: note.to_string(),
        }
        .to_sql()
    }

    #[test]
    fn test_returning_id_increments() {
        let sink = SqliteSink::open_in_memory().unwrap();
        let first = sink.execute_returning_id(&instance("a")).unwrap();
        let second = sink.execute_returning_id(&instance("b")).unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(sink.count_rows("instances").unwrap(), 2);
    }

    #[test]
    fn test_execute_error_carries_statement() {
        let sink = SqliteSink::open_in_memory().unwrap();
        let err = sink.execute("INSERT INTO no_such_table VALUES (1);").unwrap_err();
        match err {
            SinkError::Execution { statement, .. } => {
                assert_eq!(statement, "INSERT INTO no_such_table VALUES (1);");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
