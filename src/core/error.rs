//! Audit error taxonomy
//!
//! Only two things can abort an audit: a ruleset that cannot be used
//! (`Data`) and a target folder that cannot be listed (`FolderNotFound`,
//! `Io`). Row-level anomalies are never errors.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an audit before any report is produced
#[derive(Debug, Error, Diagnostic)]
pub enum AuditError {
    #[error("ruleset {path:?} is unusable: {message}")]
    #[diagnostic(
        code(dossier::data),
        help("the ruleset must be a workbook (.xlsx, .xls) or CSV export with identifier, (unused), family code and path columns")
    )]
    Data { path: PathBuf, message: String },

    #[error("folder {0:?} does not exist")]
    #[diagnostic(code(dossier::io::not_found))]
    FolderNotFound(PathBuf),

    #[error("IO error on {path:?}: {message}")]
    #[diagnostic(code(dossier::io))]
    Io { path: PathBuf, message: String },
}

impl AuditError {
    pub(crate) fn data(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AuditError::Data {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            return AuditError::FolderNotFound(path);
        }
        AuditError::Io {
            path,
            message: err.to_string(),
        }
    }

    /// True for ruleset failures
    pub fn is_data(&self) -> bool {
        matches!(self, AuditError::Data { .. })
    }

    /// True for folder listing failures
    pub fn is_io(&self) -> bool {
        matches!(self, AuditError::FolderNotFound(_) | AuditError::Io { .. })
    }
}
