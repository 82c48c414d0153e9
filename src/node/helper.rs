use super::Node;
use crate::{
    helper::Arguments,
    region::Region,
    render::RenderingContext,
    report::{Error, ErrorKind},
};
use serde_json::Value;

/// Calls a named helper.
///
/// In the pipe form `name | upper` the receiver is the node on the left of
/// the pipe, and its value becomes the input of the helper. The call form
/// `upper(name)` has no receiver, and the input is `null`.
///
/// Anonymous arguments are named by the parser, so every argument reaches
/// the helper with a name.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperNode {
    name: String,
    receiver: Option<Box<Node>>,
    arguments: Vec<(String, Node)>,
    region: Region,
}

impl HelperNode {
    pub fn new(
        name: String,
        receiver: Option<Node>,
        arguments: Vec<(String, Node)>,
        region: Region,
    ) -> Self {
        Self {
            name,
            receiver: receiver.map(Box::new),
            arguments,
            region,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver(&self) -> Option<&Node> {
        self.receiver.as_deref()
    }

    pub fn arguments(&self) -> &[(String, Node)] {
        &self.arguments
    }

    /// Return the receiver, if any, followed by the value of every argument.
    pub fn children(&self) -> Vec<&Node> {
        self.receiver
            .as_deref()
            .into_iter()
            .chain(self.arguments.iter().map(|(_, node)| node))
            .collect()
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        self.receiver
            .as_deref_mut()
            .into_iter()
            .chain(self.arguments.iter_mut().map(|(_, node)| node))
            .collect()
    }

    /// Return the region of the helper name in the template source.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Resolve the helper, evaluate the receiver and arguments, then invoke
    /// the helper.
    ///
    /// # Errors
    ///
    /// Failures of the helper itself, including a helper that does not exist,
    /// go to the error handler of the context. Errors of the receiver or an
    /// argument propagate unchanged.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let helper = match context.view_helper_resolver().resolve(&self.name) {
            Ok(helper) => helper,
            Err(error) => {
                return context
                    .error_handler()
                    .handle_helper_error(error.with_region(self.region))
            }
        };

        let input = match &self.receiver {
            Some(receiver) => receiver.execute(context)?,
            None => Value::Null,
        };
        let mut arguments = Arguments::with_capacity(self.arguments.len());
        for (name, node) in &self.arguments {
            arguments.insert(name.clone(), node.execute(context)?);
        }

        log::trace!("invoking helper `{}`", self.name);

        match helper.invoke(&input, &arguments, context) {
            Ok(value) => Ok(value),
            Err(error) if matches!(error.kind(), ErrorKind::ChildNotFound | ErrorKind::Write) => {
                Err(error)
            }
            Err(error) => context
                .error_handler()
                .handle_helper_error(error.with_region(self.region)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HelperNode;
    use crate::{
        helper::{Arguments, HelperResolver},
        node::{LiteralNode, Node},
        region::Region,
        render::{RenderingContext, TolerantErrorHandler},
        report::{Error, ErrorKind},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn echo(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
        let mut names: Vec<&String> = arguments.keys().collect();
        names.sort();

        Ok(json!(format!("{input} {names:?}")))
    }

    fn fail(_: &Value, _: &Arguments) -> Result<Value, Error> {
        Err(Error::build("helper `fail` always fails"))
    }

    fn context() -> RenderingContext {
        let resolver = HelperResolver::new()
            .with_helper_must("echo", echo)
            .with_helper_must("fail", fail);

        RenderingContext::new().with_view_helper_resolver(Arc::new(resolver))
    }

    fn literal(value: Value) -> Node {
        LiteralNode::new(value).into()
    }

    #[test]
    fn test_receiver_becomes_input() {
        let node = HelperNode::new(
            "echo".into(),
            Some(literal(json!("x"))),
            vec![("1".into(), literal(json!(2))), ("glue".into(), literal(json!("/")))],
            Region::new(0..4),
        );

        assert_eq!(
            node.execute(&mut context()),
            Ok(json!(r#""x" ["1", "glue"]"#))
        );
    }

    #[test]
    fn test_call_form_input_is_null() {
        let node = HelperNode::new("echo".into(), None, vec![], Region::new(0..4));

        assert_eq!(node.execute(&mut context()), Ok(json!("null []")));
    }

    #[test]
    fn test_failure_keeps_region() {
        let node = HelperNode::new("fail".into(), None, vec![], Region::new(3..7));
        let error = node.execute(&mut context()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Evaluation);
        assert_eq!(error.region(), Some(Region::new(3..7)));
    }

    #[test]
    fn test_failure_tolerated() {
        let node = HelperNode::new("fail".into(), None, vec![], Region::new(3..7));
        let mut context = context().with_error_handler(TolerantErrorHandler);

        assert_eq!(
            node.execute(&mut context),
            Ok(json!("Helper error: helper `fail` always fails"))
        );
    }

    #[test]
    fn test_unknown_helper() {
        let node = HelperNode::new("ghost".into(), None, vec![], Region::new(0..5));
        let error = node.execute(&mut context()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::HelperNotFound);
    }
}
