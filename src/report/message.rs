use super::Error;
use std::fmt::Display;

pub const UNEXPECTED_TOKEN: &str = "unexpected token";
pub const UNEXPECTED_BLOCK: &str = "unexpected block";
pub const UNEXPECTED_EOF: &str = "unexpected eof";
pub const INVALID_SYNTAX: &str = "invalid syntax";
pub const UNKNOWN_HELPER: &str = "unknown helper";
pub const INVALID_HELPER: &str = "invalid helper";
pub const INCOMPATIBLE_TYPES: &str = "incompatible types";
pub const MISSING_CHILD: &str = "child not found";
pub const DISABLED_EXPRESSION: &str = "disabled expression";

/// Return an [`Error`] explaining that the end of source was not expected.
pub fn error_eof(source: &str) -> Error {
    let source_len = source.len();
    Error::syntax(UNEXPECTED_EOF)
        .with_pointer(source, source_len..source_len)
        .with_help("expected additional tokens, did you close all blocks and expressions?")
}

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::new(super::ErrorKind::Write, "write failure")
        .with_help("failed to write result of render, are you low on memory?")
}

/// Return a string describing an unexpected operator.
pub fn expected_operator<T>(received: T) -> String
where
    T: Display,
{
    format!(
        "expected operator like `+`, `-`, `*`, `/`, `%`, `==`, `!=`, `>=`, `<=`, found `{}`",
        received
    )
}

/// Return a string describing an unexpected keyword.
pub fn expected_keyword<T>(received: T) -> String
where
    T: Display,
{
    format!(
        "expected keyword like `if`, `else`, `for`, `let`, `section`, `render` or `end`, \
        found {}",
        received
    )
}
