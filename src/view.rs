//! A template together with the context it is rendered with.
use crate::{
    compile::ParsingState,
    helper::HelperResolver,
    render::RenderingContext,
    report::Error,
};
use serde::Serialize;
use serde_json::{to_value, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

static NEXT_VIEW: AtomicU64 = AtomicU64::new(1);

/// Identifies one [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        Self(NEXT_VIEW.fetch_add(1, Ordering::Relaxed))
    }
}

/// Holds a parsed template and the [`RenderingContext`] used to render it.
///
/// # Examples
///
/// ```
/// use stencil::View;
///
/// let mut view = View::new("{{ greeting }}, {{ name }}!").unwrap();
/// view.assign("greeting", "hello")
///     .unwrap()
///     .assign("name", "taylor")
///     .unwrap();
///
/// assert_eq!(view.render().unwrap(), "hello, taylor!");
/// ```
#[derive(Debug)]
pub struct View {
    id: ViewId,
    context: RenderingContext,
    source: String,
    parsed: ParsingState,
}

impl View {
    /// Create a new [`View`] for the source with a default
    /// [`RenderingContext`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source is not a valid template.
    pub fn new(source: &str) -> Result<Self, Error> {
        Self::with_context(source, RenderingContext::new())
    }

    /// Create a new [`View`] for the source, parsed and rendered with the
    /// given [`RenderingContext`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source is not a valid template.
    pub fn with_context(source: &str, mut context: RenderingContext) -> Result<Self, Error> {
        let id = ViewId::next();
        context.view_helper_variable_container_mut().set_view(id);
        let parsed = context.template_parser().parse(source)?;

        Ok(Self {
            id,
            context,
            source: source.to_owned(),
            parsed,
        })
    }

    /// Return the [`ViewId`] of this view.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Assign a value to a template variable.
    ///
    /// Assigning a name twice replaces the earlier value.
    ///
    /// Returns the [`View`], so additional assignments may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`InvalidArgument`][`crate::ErrorKind::InvalidArgument`] when the
    /// value cannot be serialized.
    pub fn assign<T>(&mut self, key: &str, value: T) -> Result<&mut Self, Error>
    where
        T: Serialize,
    {
        let value = to_value(value).map_err(|error| {
            Error::invalid_argument("unserializable value")
                .with_help(format!("the value of `{key}` could not be serialized: {error}"))
        })?;
        self.context.variable_provider_mut().add(key, value);

        Ok(self)
    }

    /// Assign every entry of a mapping to template variables.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`InvalidArgument`][`crate::ErrorKind::InvalidArgument`] when the
    /// mapping does not serialize to an object.
    pub fn assign_multiple<T>(&mut self, mapping: T) -> Result<&mut Self, Error>
    where
        T: Serialize,
    {
        match to_value(mapping) {
            Ok(Value::Object(object)) => {
                let provider = self.context.variable_provider_mut();
                for (key, value) in object {
                    provider.add(&key, value);
                }

                Ok(self)
            }
            Ok(other) => Err(Error::invalid_argument("invalid argument").with_help(format!(
                "`assign_multiple` expects a mapping of names to values, received `{other}`"
            ))),
            Err(error) => Err(Error::invalid_argument("unserializable value")
                .with_help(format!("`assign_multiple` could not serialize its input: {error}"))),
        }
    }

    /// Return the [`RenderingContext`] of this view.
    pub fn rendering_context(&self) -> &RenderingContext {
        &self.context
    }

    /// Return the [`RenderingContext`] of this view for modification.
    ///
    /// Changes to the parser configuration only affect the template after
    /// it is parsed again with [`View::set_rendering_context`].
    pub fn rendering_context_mut(&mut self) -> &mut RenderingContext {
        &mut self.context
    }

    /// Replace the [`RenderingContext`] and parse the template again with
    /// its parser.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the template is not valid under the
    /// configuration of the new context. The view is unchanged in that case.
    pub fn set_rendering_context(&mut self, mut context: RenderingContext) -> Result<(), Error> {
        let parsed = context.template_parser().parse(&self.source)?;
        context.view_helper_variable_container_mut().set_view(self.id);

        self.parsed = parsed;
        self.context = context;

        Ok(())
    }

    /// Return the [`HelperResolver`] of the rendering context.
    pub fn view_helper_resolver(&self) -> &Arc<HelperResolver> {
        self.context.view_helper_resolver()
    }

    /// Render the template.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when rendering fails.
    pub fn render(&mut self) -> Result<String, Error> {
        self.parsed.render(&mut self.context)
    }

    /// Render the section with the given name.
    ///
    /// When `ignore_unknown` is true, a section that does not exist renders
    /// as an empty string.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`ChildNotFound`][`crate::ErrorKind::ChildNotFound`] when the section
    /// does not exist and `ignore_unknown` is false, or any error raised while
    /// rendering the section.
    pub fn render_section(&mut self, name: &str, ignore_unknown: bool) -> Result<String, Error> {
        match self.parsed.render_section(name, &mut self.context) {
            Err(error) if ignore_unknown && error.is_child_not_found() => Ok(String::new()),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::View;
    use crate::{
        compile::ExpressionKind,
        render::{RenderingContext, VariableProvider},
        report::ErrorKind,
    };
    use serde::Serialize;
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    /// Provider that records every assignment.
    #[derive(Default)]
    struct RecordingProvider {
        added: Arc<Mutex<Vec<(String, Value)>>>,
        values: HashMap<String, Value>,
    }

    impl VariableProvider for RecordingProvider {
        fn add(&mut self, key: &str, value: Value) {
            if let Ok(mut added) = self.added.lock() {
                added.push((key.to_owned(), value.clone()));
            }
            self.values.insert(key.to_owned(), value);
        }

        fn get(&self, key: &str) -> Option<&Value> {
            self.values.get(key)
        }

        fn remove(&mut self, key: &str) {
            self.values.remove(key);
        }

        fn push(&mut self) {}

        fn pop(&mut self) {}

        fn names(&self) -> Vec<String> {
            self.values.keys().cloned().collect()
        }
    }

    #[test]
    fn test_assign_chains_to_provider() {
        let provider = RecordingProvider::default();
        let added = Arc::clone(&provider.added);
        let context = RenderingContext::new().with_variable_provider(provider);
        let mut view = View::with_context("{{ a }}{{ b }}", context).unwrap();

        view.assign("a", 1).unwrap().assign("b", "two").unwrap();

        assert_eq!(
            *added.lock().unwrap(),
            vec![("a".to_string(), json!(1)), ("b".to_string(), json!("two"))]
        );
        assert_eq!(view.render().unwrap(), "1two");
    }

    #[test]
    fn test_assign_overrides() {
        let mut view = View::new("{{ name }}").unwrap();
        view.assign("name", "first").unwrap();
        view.assign("name", "second").unwrap();

        assert_eq!(view.render().unwrap(), "second");
    }

    #[test]
    fn test_assign_multiple() {
        #[derive(Serialize)]
        struct Person {
            name: &'static str,
            age: u8,
        }

        let mut view = View::new("{{ name }} is {{ age }}").unwrap();
        view.assign_multiple(Person {
            name: "taylor",
            age: 30,
        })
        .unwrap();

        assert_eq!(view.render().unwrap(), "taylor is 30");
        assert_eq!(
            view.assign_multiple(vec![1, 2]).err().map(|e| e.kind()),
            Some(ErrorKind::InvalidArgument)
        );
    }

    #[test]
    fn test_render_section() {
        let mut view = View::new("{% section title %}{{ name }}{% end %}body").unwrap();
        view.assign("name", "home").unwrap();

        assert_eq!(view.render().unwrap(), "body");
        assert_eq!(view.render_section("title", false).unwrap(), "home");
        assert_eq!(view.render_section("missing", true).unwrap(), "");
        assert_eq!(
            view.render_section("missing", false).err().map(|e| e.kind()),
            Some(ErrorKind::ChildNotFound)
        );
    }

    #[test]
    fn test_container_knows_view() {
        let view = View::new("").unwrap();

        assert_eq!(
            view.rendering_context().view_helper_variable_container().view(),
            Some(view.id())
        );
    }

    #[test]
    fn test_set_rendering_context_parses_again() {
        let mut view = View::new("{{ 1 + 2 }}").unwrap();
        assert_eq!(view.render().unwrap(), "3");

        let strict = RenderingContext::new().with_expression_node_types(vec![ExpressionKind::Cast]);
        assert_eq!(
            view.set_rendering_context(strict).err().map(|e| e.kind()),
            Some(ErrorKind::Syntax)
        );
        assert_eq!(view.render().unwrap(), "3");

        let other = RenderingContext::new();
        let id = other.id();
        view.set_rendering_context(other).unwrap();
        assert_eq!(view.rendering_context().id(), id);
        assert_eq!(
            view.rendering_context().view_helper_variable_container().view(),
            Some(view.id())
        );
    }
}
