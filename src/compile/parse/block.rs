use crate::node::Node;

/// Represents a parsed block tag.
pub enum Block {
    /// The `{% if x > y %}` part of an "if" block.
    If(Node),
    /// The `{% else if n > m %}` part of an "if" block.
    ElseIf(Node),
    /// The `{% else %}` part of an "if" block.
    Else,
    /// The `{% for k, v in items %}` part of a "for" block.
    For {
        key: Option<String>,
        value: String,
        iterable: Node,
    },
    /// A `{% let name = value %}` block.
    Let(String, Node),
    /// The `{% section name %}` part of a "section" block.
    Section(String),
    /// A `{% render "name" %}` block, the flag is true when followed by
    /// `optional`.
    Render(String, bool),
    /// The `{% end %}` block that closes "if", "for" and "section".
    End,
}
