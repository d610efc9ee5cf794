use std::cell::Cell;

use dtl_parse::UsageError;
use dtl_query::{QueryError, QueryErrorKind};

/// Reason of the last failure on the calling thread.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtlErrorCode {
    Ok = 0,
    NullPointer,
    InvalidUtf8,
    NoLanguage,
    IncompatibleLanguage,
    EditOutOfBounds,
    InvalidEdit,
    LengthMismatch,
    /// The tree was edited and has no source text until it is reparsed.
    EditedTree,
    QuerySyntax,
    QueryNodeType,
    QueryCapture,
    QueryPredicate,
}

thread_local! {
    static LAST_ERROR: Cell<DtlErrorCode> = const { Cell::new(DtlErrorCode::Ok) };
}

#[unsafe(no_mangle)]
pub extern "C" fn dtl_last_error() -> DtlErrorCode {
    LAST_ERROR.with(Cell::get)
}

pub(crate) fn set_error(code: DtlErrorCode) {
    LAST_ERROR.with(|last| last.set(code));
}

pub(crate) fn clear_error() {
    set_error(DtlErrorCode::Ok);
}

impl From<&UsageError> for DtlErrorCode {
    fn from(error: &UsageError) -> Self {
        match error {
            UsageError::NoLanguage => Self::NoLanguage,
            UsageError::IncompatibleLanguage { .. } => Self::IncompatibleLanguage,
            UsageError::EditOutOfBounds { .. } => Self::EditOutOfBounds,
            UsageError::InvalidEdit { .. } => Self::InvalidEdit,
            UsageError::LengthMismatch { .. } => Self::LengthMismatch,
        }
    }
}

impl From<&QueryError> for DtlErrorCode {
    fn from(error: &QueryError) -> Self {
        match error.kind {
            QueryErrorKind::Syntax => Self::QuerySyntax,
            QueryErrorKind::NodeType(_) => Self::QueryNodeType,
            QueryErrorKind::Capture(_) => Self::QueryCapture,
            QueryErrorKind::Predicate(_) => Self::QueryPredicate,
        }
    }
}

/// Records `error` and returns `value`.
pub(crate) fn fail<T>(error: impl Into<DtlErrorCode>, value: T) -> T {
    set_error(error.into());
    value
}
