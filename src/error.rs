//! # Execution Error Codes
//!
//! Every fallible operation in turvec returns `eyre::Result<T>`. The result codes
//! that callers need to branch on travel inside the report as an [`ExecError`],
//! so a caller can recover the code without parsing messages:
//!
//! ```ignore
//! match ExecError::code_of(&report) {
//!     Some(ErrorCode::SubqueryReturnedMultipleRows) => { /* ... */ }
//!     _ => return Err(report),
//! }
//! ```
//!
//! ## Taxonomy
//!
//! | Class | Codes |
//! |-------|-------|
//! | Control flow | end of stream is `Ok(false)`, invisibility is `Visibility::Invisible` |
//! | Caller errors | `InvalidArgument`, `Unsupported`, `Unimplemented`, `NotFound` |
//! | Schema/type | `SchemaFieldMissing`, `SchemaFieldTypeMismatch`, `ValueTooLong`, `VectorDimMismatch`, `NotNullableValue`, `InvalidDate` |
//! | Query shape | `SubqueryReturnedMultipleRows`, `TooLongSubqueryExpr`, `NotNullAfterIs` |
//! | Internal | `Internal` |
//!
//! End-of-stream and invisibility are never constructed as errors. They are
//! part of the normal return values of `next()` and `Trx::visit_record`.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidArgument,
    Unsupported,
    Unimplemented,
    NotFound,
    SchemaFieldMissing,
    SchemaFieldTypeMismatch,
    ValueTooLong,
    VectorDimMismatch,
    NotNullableValue,
    InvalidDate,
    SubqueryReturnedMultipleRows,
    TooLongSubqueryExpr,
    NotNullAfterIs,
    Internal,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("unimplemented: {0}")]
    Unimplemented(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("schema field missing: {0}")]
    SchemaFieldMissing(String),
    #[error("schema field type mismatch: {0}")]
    SchemaFieldTypeMismatch(String),
    #[error("value too long: {0}")]
    ValueTooLong(String),
    #[error("vector dimension mismatch: {left} vs {right}")]
    VectorDimMismatch { left: usize, right: usize },
    #[error("null value for non-nullable field '{0}'")]
    NotNullableValue(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("subquery returned more than one row")]
    SubqueryReturnedMultipleRows,
    #[error("subquery must project exactly one column, got {0}")]
    TooLongSubqueryExpr(usize),
    #[error("IS / IS NOT must be followed by NULL")]
    NotNullAfterIs,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ExecError::Unsupported(_) => ErrorCode::Unsupported,
            ExecError::Unimplemented(_) => ErrorCode::Unimplemented,
            ExecError::NotFound(_) => ErrorCode::NotFound,
            ExecError::SchemaFieldMissing(_) => ErrorCode::SchemaFieldMissing,
            ExecError::SchemaFieldTypeMismatch(_) => ErrorCode::SchemaFieldTypeMismatch,
            ExecError::ValueTooLong(_) => ErrorCode::ValueTooLong,
            ExecError::VectorDimMismatch { .. } => ErrorCode::VectorDimMismatch,
            ExecError::NotNullableValue(_) => ErrorCode::NotNullableValue,
            ExecError::InvalidDate(_) => ErrorCode::InvalidDate,
            ExecError::SubqueryReturnedMultipleRows => ErrorCode::SubqueryReturnedMultipleRows,
            ExecError::TooLongSubqueryExpr(_) => ErrorCode::TooLongSubqueryExpr,
            ExecError::NotNullAfterIs => ErrorCode::NotNullAfterIs,
            ExecError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Finds the first `ExecError` in the report's cause chain.
    ///
    /// Context added with `wrap_err` sits on top of the original error, so the
    /// whole chain is searched rather than only the outermost layer.
    pub fn code_of(report: &eyre::Report) -> Option<ErrorCode> {
        report
            .chain()
            .find_map(|cause| cause.downcast_ref::<ExecError>())
            .map(ExecError::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::{bail, WrapErr};

    fn failing() -> eyre::Result<()> {
        bail!(ExecError::ValueTooLong("name".into()));
    }

    #[test]
    fn code_of_finds_error_under_context() {
        let report = failing().wrap_err("while inserting row 3").unwrap_err();
        assert_eq!(ExecError::code_of(&report), Some(ErrorCode::ValueTooLong));
    }

    #[test]
    fn code_of_plain_report_is_none() {
        let report = eyre::eyre!("something unrelated");
        assert_eq!(ExecError::code_of(&report), None);
    }

    #[test]
    fn vector_dim_mismatch_message_names_both_sides() {
        let err = ExecError::VectorDimMismatch { left: 3, right: 2 };
        assert_eq!(err.to_string(), "vector dimension mismatch: 3 vs 2");
    }
}
