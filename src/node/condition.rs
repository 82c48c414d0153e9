use super::Node;
use crate::{
    render::{is_truthy, RenderingContext},
    report::Error,
};
use serde_json::Value;

/// An `if` block, with any number of `else if` branches and an optional
/// `else` branch.
///
/// Branches are tried in order and only the body of the first branch whose
/// condition is truthy is executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionNode {
    branches: Vec<(Node, Node)>,
    otherwise: Option<Box<Node>>,
}

impl ConditionNode {
    /// Create a new [`ConditionNode`] from `(condition, body)` pairs and the
    /// body of the `else` branch.
    pub fn new(branches: Vec<(Node, Node)>, otherwise: Option<Node>) -> Self {
        Self {
            branches,
            otherwise: otherwise.map(Box::new),
        }
    }

    pub fn branches(&self) -> &[(Node, Node)] {
        &self.branches
    }

    pub fn otherwise(&self) -> Option<&Node> {
        self.otherwise.as_deref()
    }

    /// Return the condition and body of each branch in order, followed by
    /// the `else` body.
    pub fn children(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .branches
            .iter()
            .flat_map(|(condition, body)| [condition, body])
            .collect();
        children.extend(self.otherwise.as_deref());

        children
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        let mut children: Vec<&mut Node> = self
            .branches
            .iter_mut()
            .flat_map(|(condition, body)| [condition, body])
            .collect();
        children.extend(self.otherwise.as_deref_mut());

        children
    }

    /// Rebuild the branches from a list in the order of
    /// [`ConditionNode::children`]. A trailing node without a partner becomes
    /// the `else` body.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the list does not hold a single branch.
    pub fn set_children(&mut self, children: Vec<Node>) -> Result<(), Error> {
        if children.len() < 2 {
            return Err(Error::invalid_argument("invalid argument")
                .with_help("a condition node needs at least one condition and its body"));
        }

        let mut branches = vec![];
        let mut children = children.into_iter();
        let otherwise = loop {
            match (children.next(), children.next()) {
                (Some(condition), Some(body)) => branches.push((condition, body)),
                (last, _) => break last,
            }
        };

        self.branches = branches;
        self.otherwise = otherwise.map(Box::new);

        Ok(())
    }

    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        for (condition, body) in &self.branches {
            if is_truthy(&condition.execute(context)?) {
                return body.execute(context);
            }
        }

        match &self.otherwise {
            Some(body) => body.execute(context),
            None => Ok(Value::Null),
        }
    }
}
