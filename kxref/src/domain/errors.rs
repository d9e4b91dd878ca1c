//! Structured error types for kxref
//!
//! Each layer has its own enum; `anyhow` takes over only at the binary edge.

use std::path::PathBuf;

use kxref_common::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Debug info unavailable in {}: {reason}", path.display())]
    DebugInfoUnavailable { path: PathBuf, reason: String },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to execute statement: {source}\n{statement}")]
    Execution {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Sink execution failed, run aborted: {0}")]
    Sink(#[from] SinkError),

    #[error("Invalid statement template: {0}")]
    Template(#[from] TemplateError),

    #[error("Resolution worker has stopped")]
    WorkerGone,

    #[error("Resolution worker panicked")]
    WorkerPanicked,

    #[error("Failed to spawn resolution worker: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse object file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: object::Error,
    },

    #[error("Call-site decoding is not supported for {0:?}")]
    UnsupportedArchitecture(object::Architecture),

    #[error("No function symbols found in {}", .0.display())]
    NoSymbols(PathBuf),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid kernel version '{0}': expected VERSION.PATCHLEVEL[.SUBLEVEL][EXTRAVERSION]")]
    KernelVersion(String),

    #[error("Invalid config entry '{0}': expected KEY=VALUE")]
    ConfigEntry(String),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_info_unavailable_display() {
        let err = ResolveError::DebugInfoUnavailable {
            path: PathBuf::from("/boot/vmlinux"),
            reason: "no .debug_line section".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Debug info unavailable in /boot/vmlinux: no .debug_line section"
        );
    }

    #[test]
    fn test_execution_error_keeps_statement() {
        let err = SinkError::Execution {
            statement: "INSERT INTO tags VALUES ('x');".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().contains("INSERT INTO tags VALUES ('x');"));

        let err = PipelineError::from(err);
        assert!(err.to_string().starts_with("Sink execution failed"));
    }
}
