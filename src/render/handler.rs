use crate::report::Error;
use serde_json::Value;

/// Decides what happens when a node fails during evaluation.
///
/// A handler either returns a substitute [`Value`], which is rendered in place
/// of the failed node, or returns the [`Error`] to abort the render.
///
/// Missing children and write failures never reach a handler.
pub trait ErrorHandler: Send + Sync {
    /// Handle a failure raised while evaluating an expression.
    fn handle_expression_error(&self, error: Error) -> Result<Value, Error>;

    /// Handle a failure raised by a helper, including a helper that could
    /// not be resolved.
    fn handle_helper_error(&self, error: Error) -> Result<Value, Error>;
}

/// An [`ErrorHandler`] that aborts the render on every failure.
///
/// This is the handler a [`RenderingContext`][`crate::RenderingContext`]
/// uses when no other handler was set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardErrorHandler;

impl ErrorHandler for StandardErrorHandler {
    fn handle_expression_error(&self, error: Error) -> Result<Value, Error> {
        Err(error)
    }

    fn handle_helper_error(&self, error: Error) -> Result<Value, Error> {
        Err(error)
    }
}

/// An [`ErrorHandler`] that logs the failure and renders a short message
/// in place of the failed node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerantErrorHandler;

impl ErrorHandler for TolerantErrorHandler {
    fn handle_expression_error(&self, error: Error) -> Result<Value, Error> {
        log::warn!("expression failed: {}", error.reason());

        Ok(Value::String(format!("Expression error: {}", error.reason())))
    }

    fn handle_helper_error(&self, error: Error) -> Result<Value, Error> {
        log::warn!("helper failed: {}", error.reason());

        Ok(Value::String(format!("Helper error: {}", error.reason())))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorHandler, StandardErrorHandler, TolerantErrorHandler};
    use crate::report::Error;
    use serde_json::json;

    #[test]
    fn test_standard_reraises() {
        let handler = StandardErrorHandler;

        assert_eq!(
            handler.handle_expression_error(Error::build("division by zero")),
            Err(Error::build("division by zero"))
        );
        assert!(handler
            .handle_helper_error(Error::helper_not_found("shout"))
            .is_err());
    }

    #[test]
    fn test_tolerant_substitutes_text() {
        let handler = TolerantErrorHandler;

        assert_eq!(
            handler.handle_expression_error(Error::build("division by zero")),
            Ok(json!("Expression error: division by zero"))
        );
        assert_eq!(
            handler.handle_helper_error(Error::helper_not_found("shout")),
            Ok(json!("Helper error: unknown helper"))
        );
    }
}
