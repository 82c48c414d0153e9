use super::{Node, RootNode};
use crate::{
    region::Region,
    render::{Pipe, RenderingContext},
    report::{error_write, Error, INCOMPATIBLE_TYPES},
};
use serde_json::{json, Value};

/// A `for` block.
///
/// Iterates the items of an array, or the entries of an object, and executes
/// the body once for each. The body runs in a new variable frame holding the
/// loop variables and a `loop` object that describes the position:
///
/// ```html
/// {% for key, value in object %}
///     {{ loop.cycle }}/{{ loop.total }} {{ key }}={{ value }}
/// {% end %}
/// ```
///
/// For arrays the key is the index of the item.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopNode {
    key: Option<String>,
    value: String,
    iterable: Box<Node>,
    body: RootNode,
    region: Region,
}

impl LoopNode {
    pub fn new(
        key: Option<String>,
        value: String,
        iterable: Node,
        body: RootNode,
        region: Region,
    ) -> Self {
        Self {
            key,
            value,
            iterable: Box::new(iterable),
            body,
            region,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn iterable(&self) -> &Node {
        &self.iterable
    }

    pub fn body(&self) -> &RootNode {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RootNode {
        &mut self.body
    }

    /// Return the iterable followed by the nodes of the body.
    pub fn children(&self) -> Vec<&Node> {
        std::iter::once(self.iterable.as_ref())
            .chain(self.body.children())
            .collect()
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        std::iter::once(self.iterable.as_mut())
            .chain(self.body.children_mut().iter_mut())
            .collect()
    }

    /// Replace the iterable with the first node of the list, and the body
    /// with the rest.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the list is empty.
    pub fn set_children(&mut self, children: Vec<Node>) -> Result<(), Error> {
        let mut children = children.into_iter();
        let Some(iterable) = children.next() else {
            return Err(Error::invalid_argument("invalid argument")
                .with_help("a loop node needs an iterable as its first child"));
        };

        *self.iterable = iterable;
        self.body.set_children(children.collect());

        Ok(())
    }

    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let items: Vec<(Value, Value)> = match self.iterable.execute(context)? {
            Value::Null => return Ok(Value::String(String::new())),
            Value::Array(array) => array
                .into_iter()
                .enumerate()
                .map(|(index, item)| (json!(index), item))
                .collect(),
            Value::Object(object) => object
                .into_iter()
                .map(|(key, item)| (Value::String(key), item))
                .collect(),
            other => {
                let error = Error::build(INCOMPATIBLE_TYPES)
                    .with_help(format!("`{other}` cannot be iterated, expected an array or object"))
                    .with_region(self.region);

                return context.error_handler().handle_expression_error(error);
            }
        };

        let total = items.len();
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);

        for (index, (key, item)) in items.into_iter().enumerate() {
            let provider = context.variable_provider_mut();
            provider.push();
            if let Some(name) = &self.key {
                provider.add(name, key);
            }
            provider.add(&self.value, item);
            provider.add("loop", position(index, total));

            let result = self.body.execute(context);
            context.variable_provider_mut().pop();

            pipe.write_value(&result?).map_err(|_| error_write())?;
        }

        Ok(Value::String(buffer))
    }
}

/// Return the `loop` object for the item at the index.
fn position(index: usize, total: usize) -> Value {
    let cycle = index + 1;

    json!({
        "index": index,
        "cycle": cycle,
        "total": total,
        "first": index == 0,
        "last": cycle == total,
        "even": cycle % 2 == 0,
        "odd": cycle % 2 == 1,
    })
}

#[cfg(test)]
mod tests {
    use super::LoopNode;
    use crate::{
        node::{ObjectAccessorNode, RootNode, TextNode},
        region::Region,
        render::{RenderingContext, StandardVariableProvider, VariableProvider},
        report::ErrorKind,
    };
    use serde_json::json;

    fn accessor(path: &[&str]) -> crate::node::Node {
        ObjectAccessorNode::new(path.iter().map(|s| s.to_string()).collect(), Region::default())
            .into()
    }

    fn context() -> RenderingContext {
        RenderingContext::new().with_variable_provider(
            StandardVariableProvider::new()
                .with_must("names", vec!["a", "b", "c"])
                .with_must("scores", json!({"x": 1}))
                .with_must("count", 3),
        )
    }

    #[test]
    fn test_array() {
        let body = RootNode::from(vec![
            accessor(&["loop", "cycle"]),
            TextNode::new(":").into(),
            accessor(&["name"]),
            TextNode::new(" ").into(),
        ]);
        let node = LoopNode::new(None, "name".into(), accessor(&["names"]), body, Region::default());

        assert_eq!(node.execute(&mut context()), Ok(json!("1:a 2:b 3:c ")));
    }

    #[test]
    fn test_object_with_key() {
        let body = RootNode::from(vec![
            accessor(&["key"]),
            TextNode::new("=").into(),
            accessor(&["value"]),
        ]);
        let node = LoopNode::new(
            Some("key".into()),
            "value".into(),
            accessor(&["scores"]),
            body,
            Region::default(),
        );

        assert_eq!(node.execute(&mut context()), Ok(json!("x=1")));
    }

    #[test]
    fn test_position_flags() {
        let body = RootNode::from(vec![
            accessor(&["loop", "first"]),
            TextNode::new(",").into(),
            accessor(&["loop", "last"]),
            TextNode::new(",").into(),
            accessor(&["loop", "even"]),
            TextNode::new(";").into(),
        ]);
        let node = LoopNode::new(None, "name".into(), accessor(&["names"]), body, Region::default());

        assert_eq!(
            node.execute(&mut context()),
            Ok(json!("true,false,false;false,false,true;false,true,false;"))
        );
    }

    #[test]
    fn test_variables_do_not_leak() {
        let mut context = context();
        let node = LoopNode::new(
            None,
            "name".into(),
            accessor(&["names"]),
            RootNode::new(),
            Region::default(),
        );
        node.execute(&mut context).unwrap();

        assert!(!context.variable_provider().exists("name"));
        assert!(!context.variable_provider().exists("loop"));
    }

    #[test]
    fn test_null_renders_nothing() {
        let node = LoopNode::new(
            None,
            "name".into(),
            accessor(&["ghost"]),
            RootNode::from(vec![TextNode::new("x").into()]),
            Region::default(),
        );

        assert_eq!(node.execute(&mut context()), Ok(json!("")));
    }

    #[test]
    fn test_scalar_is_error() {
        let node = LoopNode::new(
            None,
            "name".into(),
            accessor(&["count"]),
            RootNode::new(),
            Region::new(7..12),
        );
        let error = node.execute(&mut context()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Evaluation);
        assert_eq!(error.region(), Some(Region::new(7..12)));
    }
}
