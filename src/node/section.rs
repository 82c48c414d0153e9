use crate::{
    region::Region,
    render::RenderingContext,
    report::Error,
};
use serde_json::Value;

/// A `render` block, which executes a section of the template being
/// rendered.
///
/// ```html
/// {% render "footer" %}
/// {% render "sidebar" optional %}
/// ```
///
/// An optional section that does not exist renders nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSectionNode {
    name: String,
    optional: bool,
    region: Region,
}

impl RenderSectionNode {
    pub fn new(name: String, optional: bool, region: Region) -> Self {
        Self {
            name,
            optional,
            region,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`ChildNotFound`][`crate::ErrorKind::ChildNotFound`] when a section
    /// that is not optional does not exist.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        let sections = context.sections();
        match sections.as_ref().and_then(|sections| sections.get(&self.name)) {
            Some(section) => section.execute(context),
            None if self.optional => Ok(Value::String(String::new())),
            None => Err(Error::child_not_found(&self.name).with_region(self.region)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RenderSectionNode;
    use crate::{
        node::{Node, TextNode},
        region::Region,
        render::RenderingContext,
        report::ErrorKind,
    };
    use serde_json::json;
    use std::{collections::HashMap, sync::Arc};

    fn context() -> RenderingContext {
        let mut sections: HashMap<String, Node> = HashMap::new();
        sections.insert("footer".into(), TextNode::new("bye").into());

        let mut context = RenderingContext::new();
        context.push_sections(Arc::new(sections));

        context
    }

    #[test]
    fn test_renders_section() {
        let node = RenderSectionNode::new("footer".into(), false, Region::default());

        assert_eq!(node.execute(&mut context()), Ok(json!("bye")));
    }

    #[test]
    fn test_optional_missing() {
        let node = RenderSectionNode::new("sidebar".into(), true, Region::default());

        assert_eq!(node.execute(&mut context()), Ok(json!("")));
    }

    #[test]
    fn test_missing() {
        let node = RenderSectionNode::new("sidebar".into(), false, Region::new(3..10));
        let error = node.execute(&mut context()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ChildNotFound);
        assert_eq!(error.region(), Some(Region::new(3..10)));
    }
}
