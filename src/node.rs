//! The syntax tree.
//!
//! A [`TemplateParser`][`crate::TemplateParser`] turns template source into a
//! tree of [`Node`] instances. Each node produces a [`Value`] when it is
//! executed with a [`RenderingContext`], and composite nodes build their value
//! from the values of their children.
//!
//! Nodes never change while they are executed, so one parsed tree can be
//! rendered by many contexts at once.
mod accessor;
mod assign;
mod condition;
mod escaping;
mod expression;
mod helper;
mod loops;
mod root;
mod section;
mod text;

pub use accessor::{ObjectAccessorNode, Segment, VariableAccessorNode};
pub use assign::AssignNode;
pub use condition::ConditionNode;
pub use escaping::{escape_html, EscapingNode};
pub use expression::{CastType, ExpressionNode, Operation};
pub use helper::HelperNode;
pub use loops::LoopNode;
pub use root::RootNode;
pub use section::RenderSectionNode;
pub use text::{LiteralNode, TextNode};

use crate::{render::RenderingContext, report::Error};
use serde_json::Value;

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A sequence of nodes.
    Root(RootNode),
    /// Raw text from the template source.
    Text(TextNode),
    /// A value written in the template, such as `"name"` or `12`.
    Literal(LiteralNode),
    /// Escapes the output of a single child.
    Escaping(EscapingNode),
    /// A variable path with fixed segments, such as `user.name`.
    ObjectAccessor(ObjectAccessorNode),
    /// A variable path with computed segments, such as `users[index].name`.
    VariableAccessor(VariableAccessorNode),
    /// Math, comparison, logic, ternary and cast expressions.
    Expression(ExpressionNode),
    /// A call to a named helper.
    Helper(HelperNode),
    /// An `if` block with its `else if` and `else` branches.
    Condition(ConditionNode),
    /// A `for` block.
    Loop(LoopNode),
    /// A `let` block.
    Assign(AssignNode),
    /// A `render` block.
    RenderSection(RenderSectionNode),
}

impl Node {
    /// Execute the node and return the value it produces.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a child cannot be found, or evaluating the
    /// node fails and the context's error handler re-raises the failure.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        match self {
            Node::Root(node) => node.execute(context),
            Node::Text(node) => Ok(node.execute()),
            Node::Literal(node) => Ok(node.execute()),
            Node::Escaping(node) => node.execute(context),
            Node::ObjectAccessor(node) => Ok(node.execute(context)),
            Node::VariableAccessor(node) => node.execute(context),
            Node::Expression(node) => node.execute(context),
            Node::Helper(node) => node.execute(context),
            Node::Condition(node) => node.execute(context),
            Node::Loop(node) => node.execute(context),
            Node::Assign(node) => node.execute(context),
            Node::RenderSection(node) => node.execute(context),
        }
    }

    /// Add a child to the node.
    ///
    /// Sequence nodes append the child. An [`EscapingNode`] wraps exactly one
    /// child, so the new child replaces the old one.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`InvalidArgument`][`crate::ErrorKind::InvalidArgument`] when the node
    /// does not hold a list of children.
    pub fn add_child(&mut self, child: Node) -> Result<(), Error> {
        match self {
            Node::Root(node) => node.add_child(child),
            Node::Loop(node) => node.body_mut().add_child(child),
            Node::Escaping(node) => node.add_child(child),
            Node::Expression(node) => node.add_child(child),
            other => return Err(leaf_error(other)),
        }

        Ok(())
    }

    /// Return the children of the node, in the order they are executed.
    ///
    /// A condition lists the condition and body of each branch, then the
    /// `else` body. A loop lists its iterable, then the nodes of its body. A
    /// helper lists its receiver, then the values of its arguments. A
    /// variable accessor lists the nodes of its computed segments.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Root(node) => node.children().iter().collect(),
            Node::Escaping(node) => vec![node.child()],
            Node::VariableAccessor(node) => node.children(),
            Node::Expression(node) => node.children().iter().collect(),
            Node::Helper(node) => node.children(),
            Node::Condition(node) => node.children(),
            Node::Loop(node) => node.children(),
            Node::Assign(node) => vec![node.value()],
            Node::Text(_) | Node::Literal(_) | Node::ObjectAccessor(_) | Node::RenderSection(_) => {
                vec![]
            }
        }
    }

    /// Return the children of the node for modification, in the same order
    /// as [`Node::children`].
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Root(node) => node.children_mut().iter_mut().collect(),
            Node::Escaping(node) => vec![node.child_mut()],
            Node::VariableAccessor(node) => node.children_mut(),
            Node::Expression(node) => node.children_mut().iter_mut().collect(),
            Node::Helper(node) => node.children_mut(),
            Node::Condition(node) => node.children_mut(),
            Node::Loop(node) => node.children_mut(),
            Node::Assign(node) => vec![node.value_mut()],
            Node::Text(_) | Node::Literal(_) | Node::ObjectAccessor(_) | Node::RenderSection(_) => {
                vec![]
            }
        }
    }

    /// Replace the children of the node, given in the order of
    /// [`Node::children`].
    ///
    /// Root and expression nodes take any number of children, a condition
    /// rebuilds its branches from the list, and a loop takes the iterable
    /// followed by its body. An [`EscapingNode`] keeps the last node of the
    /// list. Every other node requires as many children as it already has.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`InvalidArgument`][`crate::ErrorKind::InvalidArgument`] when the list
    /// does not fit the node.
    pub fn set_children(&mut self, children: Vec<Node>) -> Result<(), Error> {
        match self {
            Node::Root(node) => node.set_children(children),
            Node::Escaping(node) => node.set_children(children)?,
            Node::Expression(node) => node.set_children(children),
            Node::Condition(node) => node.set_children(children)?,
            Node::Loop(node) => node.set_children(children)?,
            other => {
                let expected = other.children().len();
                if expected != children.len() {
                    return Err(count_error(other, expected, children.len()));
                }
                for (slot, child) in other.children_mut().into_iter().zip(children) {
                    *slot = child;
                }
            }
        }

        Ok(())
    }

    /// Return a short name for the kind of node, used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Text(_) => "text",
            Node::Literal(_) => "literal",
            Node::Escaping(_) => "escaping",
            Node::ObjectAccessor(_) => "object accessor",
            Node::VariableAccessor(_) => "variable accessor",
            Node::Expression(_) => "expression",
            Node::Helper(_) => "helper",
            Node::Condition(_) => "condition",
            Node::Loop(_) => "loop",
            Node::Assign(_) => "assign",
            Node::RenderSection(_) => "render section",
        }
    }
}

/// Return an [`Error`] explaining that the node holds no list of children.
fn leaf_error(node: &Node) -> Error {
    Error::invalid_argument("invalid argument").with_help(format!(
        "a {} node does not hold a list of children",
        node.kind()
    ))
}

fn count_error(node: &Node, expected: usize, given: usize) -> Error {
    if expected == 0 {
        return leaf_error(node);
    }

    Error::invalid_argument("invalid argument").with_help(format!(
        "a {} node holds {expected} children, received {given}",
        node.kind()
    ))
}

macro_rules! impl_from_node {
    ($($variant:ident => $node:ty),* $(,)?) => {
        $(
            impl From<$node> for Node {
                fn from(value: $node) -> Self {
                    Node::$variant(value)
                }
            }
        )*
    };
}

impl_from_node!(
    Root => RootNode,
    Text => TextNode,
    Literal => LiteralNode,
    Escaping => EscapingNode,
    ObjectAccessor => ObjectAccessorNode,
    VariableAccessor => VariableAccessorNode,
    Expression => ExpressionNode,
    Helper => HelperNode,
    Condition => ConditionNode,
    Loop => LoopNode,
    Assign => AssignNode,
    RenderSection => RenderSectionNode,
);
