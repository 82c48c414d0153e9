use super::Node;
use crate::{
    render::{Pipe, RenderingContext},
    report::{error_write, Error},
};
use serde_json::Value;

/// A sequence of nodes.
///
/// A single child passes its value through unchanged, so `{{ items }}`
/// keeps the array it refers to. Any other number of children is rendered
/// to text and concatenated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RootNode {
    children: Vec<Node>,
}

impl RootNode {
    /// Create an empty [`RootNode`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        if let [child] = self.children.as_slice() {
            return child.execute(context);
        }

        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);
        for child in &self.children {
            let value = child.execute(context)?;
            pipe.write_value(&value).map_err(|_| error_write())?;
        }

        Ok(Value::String(buffer))
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }
}

impl From<Vec<Node>> for RootNode {
    fn from(children: Vec<Node>) -> Self {
        Self { children }
    }
}
