use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/* ===== result codes ===== */

/// LDAP result codes, with their wire-exact numeric values. Only the codes
/// the server core can produce are listed; `Other` doubles as the generic
/// "server error" code when nothing more precise applies.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u32)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Success = 0,
    OperationsError = 1,
    ProtocolError = 2,
    UnavailableCriticalExtension = 12,
    NoSuchAttribute = 16,
    ConstraintViolation = 19,
    NoSuchObject = 32,
    InvalidDnSyntax = 34,
    InsufficientAccessRights = 50,
    Busy = 51,
    UnwillingToPerform = 53,
    ObjectclassViolation = 65,
    Other = 80,
    Canceled = 118,
    NoSuchOperation = 119,
    TooLate = 120,
    CannotCancel = 121,
    AssertionFailed = 122,
    AuthorizationDenied = 123,
    // OpenLDAP experimental range, assigned to the no-op control.
    NoOperation = 16654,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Success | ResultCode::NoOperation)
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let v: u32 = (*self).into();
        write!(f, "{self:?}({v})")
    }
}

/* ===== cancellation ===== */

/// The outcome of a cancellation attempt against an in-flight operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancelResult {
    Canceled,
    NoSuchOperation,
    TooLate,
    CannotCancel,
}

impl CancelResult {
    /// The result code reported for an operation that ended in this
    /// cancellation state.
    pub fn result_code(self) -> ResultCode {
        match self {
            CancelResult::Canceled => ResultCode::Canceled,
            CancelResult::NoSuchOperation => ResultCode::NoSuchOperation,
            CancelResult::TooLate => ResultCode::TooLate,
            CancelResult::CannotCancel => ResultCode::CannotCancel,
        }
    }
}

/* ===== schema ===== */

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaError {
    NoClassFound,
    InvalidClass(Vec<String>),
    MissingMustAttribute(Vec<String>),
    InvalidAttribute(String),
    InvalidAttributeSyntax(String),
    AttributeNotValidForClass(String),
    SingleValueConstraint(String),
    EmptyValueSet(String),
    Corrupted,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::NoClassFound => write!(f, "entry has no object class"),
            SchemaError::InvalidClass(cs) => write!(f, "invalid object class {cs:?}"),
            SchemaError::MissingMustAttribute(attrs) => {
                write!(f, "missing required attributes {attrs:?}")
            }
            SchemaError::InvalidAttribute(a) => write!(f, "invalid attribute {a}"),
            SchemaError::InvalidAttributeSyntax(a) => {
                write!(f, "invalid attribute syntax for {a}")
            }
            SchemaError::AttributeNotValidForClass(a) => {
                write!(f, "attribute {a} not valid for entry object classes")
            }
            SchemaError::SingleValueConstraint(a) => {
                write!(f, "attribute {a} may only hold a single value")
            }
            SchemaError::EmptyValueSet(a) => write!(f, "attribute {a} has no values"),
            SchemaError::Corrupted => write!(f, "schema is corrupted"),
        }
    }
}
