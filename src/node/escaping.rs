use super::Node;
use crate::{
    render::{stringify, RenderingContext},
    report::Error,
};
use serde_json::Value;

/// Wraps exactly one child and HTML-escapes its output.
///
/// Adding a child replaces the wrapped child, the previous one is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EscapingNode {
    child: Box<Node>,
    escape: bool,
}

impl EscapingNode {
    /// Create a new [`EscapingNode`] wrapping the given child.
    pub fn new(child: Node) -> Self {
        Self {
            child: Box::new(child),
            escape: true,
        }
    }

    pub fn child(&self) -> &Node {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut Node {
        &mut self.child
    }

    /// Return false if the output of the child passes through untouched.
    pub fn is_escaping(&self) -> bool {
        self.escape
    }

    pub fn set_escaping(&mut self, escape: bool) {
        self.escape = escape;
    }

    /// Replace the wrapped child.
    pub fn add_child(&mut self, child: Node) {
        *self.child = child;
    }

    /// Wrap the last node of the list.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the list is empty.
    pub fn set_children(&mut self, mut children: Vec<Node>) -> Result<(), Error> {
        match children.pop() {
            Some(child) => {
                self.add_child(child);

                Ok(())
            }
            None => Err(Error::invalid_argument("invalid argument")
                .with_help("an escaping node must wrap exactly one child")),
        }
    }

    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let value = self.child.execute(context)?;
        if !self.escape {
            return Ok(value);
        }

        Ok(Value::String(escape_html(&stringify(&value))))
    }
}

/// Replace the characters `&`, `<`, `>`, `"` and `'` with HTML entities.
///
/// # Examples
///
/// ```
/// use stencil::node::escape_html;
///
/// assert_eq!(escape_html(r#"it's "ok""#), "it&#039;s &quot;ok&quot;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => buffer.push_str("&amp;"),
            '<' => buffer.push_str("&lt;"),
            '>' => buffer.push_str("&gt;"),
            '"' => buffer.push_str("&quot;"),
            '\'' => buffer.push_str("&#039;"),
            c => buffer.push(c),
        }
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::{escape_html, EscapingNode};
    use crate::{
        node::{LiteralNode, Node, TextNode},
        render::RenderingContext,
    };
    use serde_json::json;

    #[test]
    fn test_escapes_child_output() {
        let node = EscapingNode::new(TextNode::new("<b>x</b>").into());

        assert_eq!(
            node.execute(&mut RenderingContext::new()),
            Ok(json!("&lt;b&gt;x&lt;/b&gt;"))
        );
    }

    #[test]
    fn test_add_child_replaces_wrapped_child() {
        let mut node = EscapingNode::new(TextNode::new("<b>x</b>").into());
        node.add_child(TextNode::new("<i>y</i>").into());

        assert_eq!(
            node.execute(&mut RenderingContext::new()),
            Ok(json!("&lt;i&gt;y&lt;/i&gt;"))
        );
        assert_eq!(node.child(), &Node::from(TextNode::new("<i>y</i>")));
    }

    #[test]
    fn test_only_most_recent_child_kept() {
        let mut node = EscapingNode::new(TextNode::new("first").into());
        node.add_child(TextNode::new("second").into());
        node.add_child(TextNode::new(r#"it's "ok""#).into());

        assert_eq!(
            node.execute(&mut RenderingContext::new()),
            Ok(json!("it&#039;s &quot;ok&quot;"))
        );
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let mut context = RenderingContext::new();

        let number = EscapingNode::new(LiteralNode::new(json!(12)).into());
        assert_eq!(number.execute(&mut context), Ok(json!("12")));

        let null = EscapingNode::new(LiteralNode::new(json!(null)).into());
        assert_eq!(null.execute(&mut context), Ok(json!("")));
    }

    #[test]
    fn test_disabled_passes_through() {
        let mut node = EscapingNode::new(LiteralNode::new(json!("<b>")).into());
        node.set_escaping(false);

        assert!(!node.is_escaping());
        assert_eq!(node.execute(&mut RenderingContext::new()), Ok(json!("<b>")));
    }

    #[test]
    fn test_escape_every_special_character() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
