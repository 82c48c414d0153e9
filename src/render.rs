mod compare;
mod handler;
mod pipe;
mod provider;

pub use handler::{ErrorHandler, StandardErrorHandler, TolerantErrorHandler};
pub use provider::{StandardVariableProvider, VariableProvider};

pub(crate) use compare::{compare_values, is_truthy};
pub(crate) use pipe::{stringify, Pipe};

use crate::{
    compile::{Configuration, ExpressionKind, ParsingState, TemplateParser},
    container::ViewHelperVariableContainer,
    helper::HelperResolver,
    node::Node,
    report::Error,
};
use std::{
    collections::HashMap,
    fmt::Debug,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static STANDARD: StandardErrorHandler = StandardErrorHandler;
static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Render a [`ParsingState`] with the given variables and the default
/// [`RenderingContext`].
///
/// Provides a shortcut to quickly render a template when no custom helpers
/// or handlers are needed.
///
/// # Examples
///
/// ```
/// use stencil::{compile, render, StandardVariableProvider};
///
/// let template = compile("hello, {{ name }}!");
/// assert!(template.is_ok());
///
/// let output = render(
///     &template.unwrap(),
///     StandardVariableProvider::new().with_must("name", "taylor"),
/// );
/// assert_eq!(output.unwrap(), "hello, taylor!");
/// ```
pub fn render<T>(template: &ParsingState, variables: T) -> Result<String, Error>
where
    T: VariableProvider + 'static,
{
    let mut context = RenderingContext::new().with_variable_provider(variables);

    template.render(&mut context)
}

/// Identifies one [`RenderingContext`].
///
/// A [`TemplateParser`] remembers the id of the context it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Locations that templates, layouts and partials are loaded from.
///
/// Resolving files is left to the caller, the paths are carried so helpers
/// can find them through the [`RenderingContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePaths {
    template_root_paths: Vec<PathBuf>,
    layout_root_paths: Vec<PathBuf>,
    partial_root_paths: Vec<PathBuf>,
}

impl TemplatePaths {
    /// Create an empty [`TemplatePaths`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template_root_paths(&self) -> &[PathBuf] {
        &self.template_root_paths
    }

    pub fn set_template_root_paths(&mut self, paths: Vec<PathBuf>) {
        self.template_root_paths = paths;
    }

    pub fn layout_root_paths(&self) -> &[PathBuf] {
        &self.layout_root_paths
    }

    pub fn set_layout_root_paths(&mut self, paths: Vec<PathBuf>) {
        self.layout_root_paths = paths;
    }

    pub fn partial_root_paths(&self) -> &[PathBuf] {
        &self.partial_root_paths
    }

    pub fn set_partial_root_paths(&mut self, paths: Vec<PathBuf>) {
        self.partial_root_paths = paths;
    }
}

/// Everything a template needs while it is being rendered.
///
/// A `RenderingContext` is built for each render and handed by reference to
/// every node, so two renders never share variables.
///
/// # Examples
///
/// ```
/// use stencil::{RenderingContext, StandardVariableProvider, TolerantErrorHandler};
///
/// let mut context = RenderingContext::new()
///     .with_error_handler(TolerantErrorHandler)
///     .with_variable_provider(StandardVariableProvider::new().with_must("name", "taylor"));
///
/// let template = context.template_parser().parse("{{ name | shout }}").unwrap();
/// assert_eq!(
///     template.render(&mut context).unwrap(),
///     "Helper error: unknown helper"
/// );
/// ```
pub struct RenderingContext {
    id: ContextId,
    error_handler: Option<Box<dyn ErrorHandler>>,
    variable_provider: Box<dyn VariableProvider>,
    view_helper_variable_container: ViewHelperVariableContainer,
    view_helper_resolver: Arc<HelperResolver>,
    template_parser: TemplateParser,
    template_paths: TemplatePaths,
    expression_node_types: Vec<ExpressionKind>,
    escaping: bool,
    controller_name: String,
    controller_action: String,
    /// Sections of the templates being rendered, innermost last.
    sections: Vec<Arc<HashMap<String, Node>>>,
}

impl RenderingContext {
    /// Create a new [`RenderingContext`].
    ///
    /// The context uses the [`StandardErrorHandler`], an empty
    /// [`StandardVariableProvider`], the built-in helpers and a default
    /// [`TemplateParser`] that is attached to it.
    pub fn new() -> Self {
        let mut context = Self {
            id: ContextId::next(),
            error_handler: None,
            variable_provider: Box::new(StandardVariableProvider::new()),
            view_helper_variable_container: ViewHelperVariableContainer::new(),
            view_helper_resolver: Arc::new(HelperResolver::default()),
            template_parser: TemplateParser::new(),
            template_paths: TemplatePaths::new(),
            expression_node_types: ExpressionKind::ALL.to_vec(),
            escaping: true,
            controller_name: "Default".into(),
            controller_action: "Default".into(),
            sections: vec![],
        };
        context.reattach();

        context
    }

    /// Return the [`ContextId`] of this context.
    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Return the [`ErrorHandler`].
    ///
    /// When no handler was set, the [`StandardErrorHandler`] is returned.
    pub fn error_handler(&self) -> &dyn ErrorHandler {
        self.error_handler.as_deref().unwrap_or(&STANDARD)
    }

    /// Set the [`ErrorHandler`].
    pub fn set_error_handler<T>(&mut self, handler: T)
    where
        T: ErrorHandler + 'static,
    {
        self.error_handler = Some(Box::new(handler));
    }

    /// Set the [`ErrorHandler`].
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_error_handler<T>(mut self, handler: T) -> Self
    where
        T: ErrorHandler + 'static,
    {
        self.set_error_handler(handler);

        self
    }

    /// Return the [`VariableProvider`] holding the template variables.
    pub fn variable_provider(&self) -> &dyn VariableProvider {
        self.variable_provider.as_ref()
    }

    /// Return the [`VariableProvider`] holding the template variables.
    pub fn variable_provider_mut(&mut self) -> &mut dyn VariableProvider {
        self.variable_provider.as_mut()
    }

    /// Set the [`VariableProvider`].
    pub fn set_variable_provider<T>(&mut self, provider: T)
    where
        T: VariableProvider + 'static,
    {
        self.variable_provider = Box::new(provider);
    }

    /// Set the [`VariableProvider`].
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_variable_provider<T>(mut self, provider: T) -> Self
    where
        T: VariableProvider + 'static,
    {
        self.set_variable_provider(provider);

        self
    }

    /// Return the [`ViewHelperVariableContainer`] that helpers use to share
    /// state.
    pub fn view_helper_variable_container(&self) -> &ViewHelperVariableContainer {
        &self.view_helper_variable_container
    }

    /// Return the [`ViewHelperVariableContainer`] that helpers use to share
    /// state.
    pub fn view_helper_variable_container_mut(&mut self) -> &mut ViewHelperVariableContainer {
        &mut self.view_helper_variable_container
    }

    /// Set the [`ViewHelperVariableContainer`].
    pub fn set_view_helper_variable_container(&mut self, container: ViewHelperVariableContainer) {
        self.view_helper_variable_container = container;
    }

    /// Return the [`HelperResolver`].
    pub fn view_helper_resolver(&self) -> &Arc<HelperResolver> {
        &self.view_helper_resolver
    }

    /// Set the [`HelperResolver`].
    ///
    /// The attached [`TemplateParser`] learns which helpers produce raw
    /// output.
    pub fn set_view_helper_resolver(&mut self, resolver: Arc<HelperResolver>) {
        self.view_helper_resolver = resolver;
        self.reattach();
    }

    /// Set the [`HelperResolver`].
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_view_helper_resolver(mut self, resolver: Arc<HelperResolver>) -> Self {
        self.set_view_helper_resolver(resolver);

        self
    }

    /// Return the [`TemplateParser`] attached to this context.
    pub fn template_parser(&self) -> &TemplateParser {
        &self.template_parser
    }

    /// Set the [`TemplateParser`] and attach this context to it.
    ///
    /// Afterwards, `parser.rendering_context()` returns the id of this
    /// context.
    pub fn set_template_parser(&mut self, mut parser: TemplateParser) {
        parser.set_rendering_context(self);
        self.template_parser = parser;
    }

    /// Set the [`TemplateParser`] and attach this context to it.
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_template_parser(mut self, parser: TemplateParser) -> Self {
        self.set_template_parser(parser);

        self
    }

    /// Return the [`TemplatePaths`].
    pub fn template_paths(&self) -> &TemplatePaths {
        &self.template_paths
    }

    /// Set the [`TemplatePaths`].
    pub fn set_template_paths(&mut self, paths: TemplatePaths) {
        self.template_paths = paths;
    }

    /// Return the [`ExpressionKind`] instances templates may use.
    pub fn expression_node_types(&self) -> &[ExpressionKind] {
        &self.expression_node_types
    }

    /// Set the [`ExpressionKind`] instances templates may use.
    pub fn set_expression_node_types<T>(&mut self, kinds: T)
    where
        T: Into<Vec<ExpressionKind>>,
    {
        self.expression_node_types = kinds.into();
        self.reattach();
    }

    /// Set the [`ExpressionKind`] instances templates may use.
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_expression_node_types<T>(mut self, kinds: T) -> Self
    where
        T: Into<Vec<ExpressionKind>>,
    {
        self.set_expression_node_types(kinds);

        self
    }

    /// Return true if `{{ }}` output is escaped by default.
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// Set whether `{{ }}` output is escaped by default.
    pub fn set_escaping(&mut self, escaping: bool) {
        self.escaping = escaping;
        self.reattach();
    }

    /// Set whether `{{ }}` output is escaped by default.
    ///
    /// Returns the [`RenderingContext`], so additional methods may be chained.
    #[inline]
    pub fn with_escaping(mut self, escaping: bool) -> Self {
        self.set_escaping(escaping);

        self
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    pub fn set_controller_name<T>(&mut self, name: T)
    where
        T: Into<String>,
    {
        self.controller_name = name.into();
    }

    pub fn controller_action(&self) -> &str {
        &self.controller_action
    }

    pub fn set_controller_action<T>(&mut self, action: T)
    where
        T: Into<String>,
    {
        self.controller_action = action.into();
    }

    /// Return the [`Configuration`] a parser attached to this context uses.
    pub fn parser_configuration(&self) -> Configuration {
        Configuration::new()
            .with_escaping(self.escaping)
            .with_expression_kinds(self.expression_node_types.clone())
            .with_raw_helpers(self.view_helper_resolver.raw_helpers())
    }

    /// Make the sections of a template visible to section nodes.
    pub(crate) fn push_sections(&mut self, sections: Arc<HashMap<String, Node>>) {
        self.sections.push(sections);
    }

    /// Remove the sections pushed by the most recent `push_sections`.
    pub(crate) fn pop_sections(&mut self) {
        self.sections.pop();
    }

    /// Return the sections of the template being rendered.
    pub(crate) fn sections(&self) -> Option<Arc<HashMap<String, Node>>> {
        self.sections.last().cloned()
    }

    /// Bring the attached parser up to date with this context.
    fn reattach(&mut self) {
        let configuration = self.parser_configuration();
        let id = self.id;
        self.template_parser.attach(id, configuration);
    }
}

impl Default for RenderingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RenderingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingContext")
            .field("id", &self.id)
            .field("variables", &self.variable_provider.names())
            .field("container", &self.view_helper_variable_container)
            .field("resolver", &self.view_helper_resolver)
            .field("parser", &self.template_parser)
            .field("paths", &self.template_paths)
            .field("controller_name", &self.controller_name)
            .field("controller_action", &self.controller_action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorHandler, RenderingContext, TolerantErrorHandler};
    use crate::{
        compile::{ExpressionKind, TemplateParser},
        helper::HelperResolver,
        render::{StandardVariableProvider, VariableProvider},
        report::{Error, ErrorKind},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[test]
    fn test_default_error_handler() {
        let context = RenderingContext::new();

        assert_eq!(
            context
                .error_handler()
                .handle_expression_error(Error::build("boom")),
            Err(Error::build("boom"))
        );
    }

    #[test]
    fn test_custom_error_handler() {
        let context = RenderingContext::new().with_error_handler(TolerantErrorHandler);

        assert_eq!(
            context
                .error_handler()
                .handle_helper_error(Error::build("boom")),
            Ok(json!("Helper error: boom"))
        );
    }

    #[test]
    fn test_parser_attached_to_context() {
        let mut context = RenderingContext::new();
        assert_eq!(context.template_parser().rendering_context(), Some(context.id()));

        context.set_template_parser(TemplateParser::new());
        assert_eq!(context.template_parser().rendering_context(), Some(context.id()));
    }

    #[test]
    fn test_parser_follows_last_context() {
        let first = RenderingContext::new();
        let mut second = RenderingContext::new();
        let mut parser = TemplateParser::new();
        parser.set_rendering_context(&first);
        assert_eq!(parser.rendering_context(), Some(first.id()));

        second.set_template_parser(parser);
        assert_eq!(
            second.template_parser().rendering_context(),
            Some(second.id())
        );
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_setters_refresh_parser_configuration() {
        let mut context = RenderingContext::new();
        context.set_escaping(false);
        context.set_expression_node_types(vec![ExpressionKind::Cast]);

        let configuration = context.template_parser().configuration();
        assert!(!configuration.is_escaping());
        assert!(configuration.allows(ExpressionKind::Cast));
        assert!(!configuration.allows(ExpressionKind::Math));
    }

    #[test]
    fn test_resolver_raw_helpers_reach_parser() {
        let resolver = HelperResolver::default()
            .with_helper_must("shout", |input: &Value, _: &crate::helper::Arguments| {
                Ok(json!(input.as_str().unwrap_or_default().to_uppercase()))
            });
        let context = RenderingContext::new().with_view_helper_resolver(Arc::new(resolver));

        assert!(context.template_parser().configuration().is_raw_helper("raw"));
        assert!(!context.template_parser().configuration().is_raw_helper("shout"));
    }

    #[test]
    fn test_disabled_math_is_syntax_error() {
        let context =
            RenderingContext::new().with_expression_node_types(Vec::<ExpressionKind>::new());
        let result = context.template_parser().parse("{{ 1 + 2 }}");

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Syntax));
    }

    #[test]
    fn test_controller_defaults() {
        let mut context = RenderingContext::new();
        assert_eq!(context.controller_name(), "Default");
        assert_eq!(context.controller_action(), "Default");

        context.set_controller_name("Blog");
        context.set_controller_action("list");
        assert_eq!(context.controller_name(), "Blog");
        assert_eq!(context.controller_action(), "list");
    }

    #[test]
    fn test_concurrent_renders_are_isolated() {
        let template = TemplateParser::new()
            .parse("{% let seen = seen + 1 %}{{ name }}:{{ seen }}")
            .unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = ["alpha", "beta", "gamma"]
                .into_iter()
                .map(|name| {
                    let template = &template;
                    scope.spawn(move || {
                        let mut context = RenderingContext::new().with_variable_provider(
                            StandardVariableProvider::new()
                                .with_must("name", name)
                                .with_must("seen", 0),
                        );
                        let first = template.render(&mut context).unwrap();
                        let second = template.render(&mut context).unwrap();

                        (name, first, second, context.variable_provider().exists("other"))
                    })
                })
                .collect();

            for handle in handles {
                let (name, first, second, leaked) = handle.join().unwrap();
                assert_eq!(first, format!("{name}:1"));
                assert_eq!(second, format!("{name}:2"));
                assert!(!leaked);
            }
        });
    }
}
