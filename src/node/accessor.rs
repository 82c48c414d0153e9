use super::Node;
use crate::{
    region::Region,
    render::RenderingContext,
    report::{Error, INCOMPATIBLE_TYPES},
};
use serde_json::Value;

/// Reads a variable through a path of fixed segments, such as `user.name`
/// or `items.0`.
///
/// Numeric segments index into arrays. A path that leads nowhere produces
/// `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAccessorNode {
    path: Vec<String>,
    region: Region,
}

impl ObjectAccessorNode {
    pub fn new(path: Vec<String>, region: Region) -> Self {
        Self { path, region }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn execute(&self, context: &RenderingContext) -> Value {
        lookup(context, self.path.iter().map(String::as_str))
    }
}

/// One segment of a [`VariableAccessorNode`] path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A segment written in the template, as in `user.name`.
    Name(String),
    /// A segment computed from an expression, as in `users[index]`.
    Dynamic(Node),
}

/// Reads a variable through a path that contains computed segments, such as
/// `users[index].name`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAccessorNode {
    name: String,
    segments: Vec<Segment>,
    region: Region,
}

impl VariableAccessorNode {
    pub fn new(name: String, segments: Vec<Segment>, region: Region) -> Self {
        Self {
            name,
            segments,
            region,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Return the nodes of the computed segments, in path order.
    pub fn children(&self) -> Vec<&Node> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Dynamic(node) => Some(node),
                Segment::Name(_) => None,
            })
            .collect()
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        self.segments
            .iter_mut()
            .filter_map(|segment| match segment {
                Segment::Dynamic(node) => Some(node),
                Segment::Name(_) => None,
            })
            .collect()
    }

    /// Evaluate every computed segment, then follow the path.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a computed segment is neither a string nor a
    /// number, and the error handler re-raises it.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let mut keys = vec![self.name.clone()];
        for segment in &self.segments {
            match segment {
                Segment::Name(name) => keys.push(name.clone()),
                Segment::Dynamic(node) => match node.execute(context)? {
                    Value::String(string) => keys.push(string),
                    Value::Number(number) => keys.push(number.to_string()),
                    Value::Null => return Ok(Value::Null),
                    other => {
                        let error = Error::build(INCOMPATIBLE_TYPES)
                            .with_help(format!("`{other}` cannot be used as a key"))
                            .with_region(self.region);

                        return context.error_handler().handle_expression_error(error);
                    }
                },
            }
        }

        Ok(lookup(context, keys.iter().map(String::as_str)))
    }
}

/// Follow the keys from the variables of the context.
fn lookup<'a, I>(context: &RenderingContext, mut keys: I) -> Value
where
    I: Iterator<Item = &'a str>,
{
    let Some(first) = keys.next() else {
        return Value::Null;
    };
    let Some(mut current) = context.variable_provider().get(first) else {
        return Value::Null;
    };

    for key in keys {
        let next = match current {
            Value::Object(object) => object.get(key),
            Value::Array(array) => key.parse::<usize>().ok().and_then(|i| array.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Value::Null,
        }
    }

    current.clone()
}
