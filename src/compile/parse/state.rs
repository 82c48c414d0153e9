use crate::{node::Node, region::Region};

/// A block that was opened and is waiting for its `end`.
#[derive(Debug)]
pub enum State {
    /// An "if" block.
    If {
        /// The `(condition, body)` pairs of every finished branch.
        branches: Vec<(Node, Node)>,
        /// Condition of the branch being parsed, `None` once the "else"
        /// branch was reached.
        condition: Option<Node>,
        /// [`Region`] of the opening tag.
        region: Region,
    },
    /// A "for" block.
    For {
        /// Name of the key variable, if one was given.
        key: Option<String>,
        /// Name of the value variable.
        value: String,
        /// The value being iterated.
        iterable: Node,
        /// [`Region`] of the opening tag.
        region: Region,
    },
    /// A "section" block.
    Section {
        /// The name of the section.
        name: String,
        /// [`Region`] of the opening tag.
        region: Region,
    },
}

impl State {
    /// Return the keyword that opened the block.
    pub fn keyword(&self) -> &'static str {
        match self {
            State::If { .. } => "if",
            State::For { .. } => "for",
            State::Section { .. } => "section",
        }
    }

    /// Return the [`Region`] of the opening tag.
    pub fn region(&self) -> Region {
        match self {
            State::If { region, .. } | State::For { region, .. } | State::Section { region, .. } => {
                *region
            }
        }
    }
}
