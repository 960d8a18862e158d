//! Rich error types for operation processing. These carry the data that ends
//! up on the client response - a result code, a message and possibly a
//! matched DN - so recording a failure on an operation is a single step.

use std::fmt;

use crate::dn::Dn;
use crate::prelude::*;

/// A failure that maps directly onto an LDAP result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryError {
    pub result_code: ResultCode,
    pub message: String,
    pub matched_dn: Option<Dn>,
}

impl DirectoryError {
    pub fn new(result_code: ResultCode, message: String) -> Self {
        DirectoryError {
            result_code,
            message,
            matched_dn: None,
        }
    }

    pub fn with_matched_dn(result_code: ResultCode, message: String, matched_dn: Dn) -> Self {
        DirectoryError {
            result_code,
            message,
            matched_dn: Some(matched_dn),
        }
    }

    pub fn from_schema_violation(reason: &SchemaError, detail: String) -> Self {
        DirectoryError::new(
            ResultCode::ObjectclassViolation,
            format!("{detail}: {reason}"),
        )
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.result_code, self.message)
    }
}

impl std::error::Error for DirectoryError {}

/// Raised by a backend when an in-flight write observed a cancellation
/// request and abandoned the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledOperationError {
    pub cancel_result: CancelResult,
    pub message: String,
}

impl fmt::Display for CancelledOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation cancelled ({:?}): {}", self.cancel_result, self.message)
    }
}

impl std::error::Error for CancelledOperationError {}

/// The failure modes of [`crate::be::Backend::rename_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameEntryError {
    Directory(DirectoryError),
    Cancelled(CancelledOperationError),
}

impl From<DirectoryError> for RenameEntryError {
    fn from(e: DirectoryError) -> Self {
        RenameEntryError::Directory(e)
    }
}

impl From<CancelledOperationError> for RenameEntryError {
    fn from(e: CancelledOperationError) -> Self {
        RenameEntryError::Cancelled(e)
    }
}

impl fmt::Display for RenameEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameEntryError::Directory(e) => e.fmt(f),
            RenameEntryError::Cancelled(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for RenameEntryError {}
