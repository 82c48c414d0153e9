use super::Node;
use crate::{render::RenderingContext, report::Error};
use serde_json::Value;

/// A `let` block, which stores the value of an expression in a variable of
/// the current frame.
///
/// ```html
/// {% let total = price * amount %}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AssignNode {
    name: String,
    value: Box<Node>,
}

impl AssignNode {
    pub fn new(name: String, value: Node) -> Self {
        Self {
            name,
            value: Box::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Node {
        &mut self.value
    }

    /// Evaluate the value and assign it. Produces no output.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let value = self.value.execute(context)?;
        context.variable_provider_mut().add(&self.name, value);

        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::AssignNode;
    use crate::{
        node::LiteralNode,
        render::{RenderingContext, VariableProvider},
    };
    use serde_json::json;

    #[test]
    fn test_assign() {
        let mut context = RenderingContext::new();
        let node = AssignNode::new("answer".into(), LiteralNode::new(json!(42)).into());

        assert_eq!(node.execute(&mut context), Ok(json!(null)));
        assert_eq!(context.variable_provider().get("answer"), Some(&json!(42)));
    }
}
