use crate::{
    node::Node,
    render::{stringify, RenderingContext},
    report::Error,
};
use std::{collections::HashMap, sync::Arc};

/// A parsed template.
///
/// Holds the root [`Node`], the named sections and the source text. A
/// `ParsingState` is never changed by rendering, so it may be shared between
/// threads and rendered by many contexts at once.
#[derive(Debug, Clone)]
pub struct ParsingState {
    root: Node,
    sections: Arc<HashMap<String, Node>>,
    source: String,
    name: Option<String>,
}

impl ParsingState {
    pub(crate) fn new(root: Node, sections: HashMap<String, Node>, source: &str) -> Self {
        Self {
            root,
            sections: Arc::new(sections),
            source: source.to_owned(),
            name: None,
        }
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());

        self
    }

    /// Return the root [`Node`] of the template.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Return the source text the template was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Return the name given to [`parse_named`][`crate::TemplateParser::parse_named`].
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return true if the template declares a section with the given name.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Return the section with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`ChildNotFound`][`crate::ErrorKind::ChildNotFound`] when the template
    /// has no such section.
    pub fn named_child(&self, name: &str) -> Result<&Node, Error> {
        self.sections
            .get(name)
            .ok_or_else(|| self.decorate(Error::child_not_found(name)))
    }

    /// Render the template with the given [`RenderingContext`].
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::{compile, RenderingContext, StandardVariableProvider};
    ///
    /// let template = compile("{% for n in numbers %}{{ n * 2 }} {% end %}").unwrap();
    /// let mut context = RenderingContext::new().with_variable_provider(
    ///     StandardVariableProvider::new().with_must("numbers", vec![1, 2, 3]),
    /// );
    ///
    /// assert_eq!(template.render(&mut context).unwrap(), "2 4 6 ");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a node fails and the error handler of the
    /// context re-raises the failure, or a section is missing.
    pub fn render(&self, context: &mut RenderingContext) -> Result<String, Error> {
        log::debug!("rendering template `{}`", self.name.as_deref().unwrap_or("?"));

        self.execute(&self.root, context)
    }

    /// Render the section with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`ChildNotFound`][`crate::ErrorKind::ChildNotFound`] when the template
    /// has no such section, or any error raised while rendering it.
    pub fn render_section(
        &self,
        name: &str,
        context: &mut RenderingContext,
    ) -> Result<String, Error> {
        log::debug!("rendering section `{name}`");

        let section = self.named_child(name)?;

        self.execute(section, context)
    }

    /// Execute the node with the sections of this template visible.
    fn execute(&self, node: &Node, context: &mut RenderingContext) -> Result<String, Error> {
        context.push_sections(Arc::clone(&self.sections));
        let result = node.execute(context);
        context.pop_sections();

        result
            .map(|value| stringify(&value))
            .map_err(|error| self.decorate(error))
    }

    /// Point the error at the template source and name it.
    fn decorate(&self, error: Error) -> Error {
        let error = error.locate(&self.source);
        match &self.name {
            Some(name) if error.name().is_none() => error.with_name(name.clone()),
            _ => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compile::{compile, TemplateParser},
        render::{RenderingContext, StandardVariableProvider, TolerantErrorHandler},
        report::ErrorKind,
    };
    use serde_json::json;

    fn context() -> RenderingContext {
        RenderingContext::new().with_variable_provider(
            StandardVariableProvider::new()
                .with_must("name", "taylor")
                .with_must("age", 30)
                .with_must("tags", vec!["a", "b"])
                .with_must("html", "<b>&</b>")
                .with_must(
                    "users",
                    json!([{"name": "first", "admin": true}, {"name": "second", "admin": false}]),
                ),
        )
    }

    fn render(source: &str) -> String {
        compile(source)
            .and_then(|template| template.render(&mut context()))
            .unwrap()
    }

    #[test]
    fn test_text_and_variables() {
        assert_eq!(render("hello, {{ name }}!"), "hello, taylor!");
        assert_eq!(render("{{ users.1.name }} {{ users[0].name }}"), "second first");
        assert_eq!(render("[{{ ghost }}]"), "[]");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(render("{{ html }}"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(render("{{ html | raw }}"), "<b>&</b>");
        assert_eq!(render("{{ \"it's\" }}"), "it&#039;s");
    }

    #[test]
    fn test_expressions() {
        assert_eq!(render("{{ age + 1 }} {{ age / 4 }} {{ age % 7 }}"), "31 7.5 2");
        assert_eq!(render("{{ (age - 10) * 2 }}"), "40");
        assert_eq!(render("{{ age > 18 ? \"adult\" : \"minor\" }}"), "adult");
        assert_eq!(render("{{ age as string }}{{ \"5\" as integer + 1 }}"), "306");
        assert_eq!(render("{{ !tags }} {{ not ghost }}"), "false true");
    }

    #[test]
    fn test_conditions() {
        let source = "{% if age < 18 %}minor{% else if age < 65 %}adult{% else %}senior{% end %}";
        assert_eq!(render(source), "adult");
        assert_eq!(render("{% if ghost %}yes{% end %}"), "");
        assert_eq!(render("{% if name == \"taylor\" && age >= 30 %}yes{% end %}"), "yes");
    }

    #[test]
    fn test_loops() {
        assert_eq!(
            render("{% for user in users %}{% if user.admin %}{{ user.name }}{% end %}{% end %}"),
            "first"
        );
        assert_eq!(
            render("{% for i, tag in tags %}{{ i }}={{ tag }}{% if !loop.last %},{% end %}{% end %}"),
            "0=a,1=b"
        );
    }

    #[test]
    fn test_let() {
        assert_eq!(render("{% let double = age * 2 %}{{ double }}"), "60");
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(render("a   {{- name -}}   b"), "ataylorb");
        assert_eq!(render("<ul>\n  {%- for tag in tags -%}\n  <li>{{ tag }}</li>\n  {%- end -%}\n</ul>"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_sections() {
        let template = compile(
            "{% section footer %}bye {{ name }}{% end %}main {% render footer %}\
            {% render \"sidebar\" optional %}",
        )
        .unwrap();
        let mut context = context();

        assert_eq!(template.render(&mut context).unwrap(), "main bye taylor");
        assert_eq!(template.render_section("footer", &mut context).unwrap(), "bye taylor");
        assert!(template.named_child("footer").is_ok());
        assert_eq!(
            template.named_child("sidebar").err().map(|e| e.kind()),
            Some(ErrorKind::ChildNotFound)
        );
    }

    #[test]
    fn test_missing_section() {
        let template = TemplateParser::new()
            .parse_named("page.html", "{% render sidebar %}")
            .unwrap();
        let error = template.render(&mut context()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ChildNotFound);
        assert_eq!(error.name(), Some("page.html"));
        assert!(format!("{error:#}").contains("page.html:1:1"));
    }

    #[test]
    fn test_missing_section_is_not_tolerated() {
        let template = compile("{% render sidebar %}").unwrap();
        let mut context = context().with_error_handler(TolerantErrorHandler);

        assert!(template.render(&mut context).is_err());
    }

    #[test]
    fn test_tolerant_expression_error() {
        let template = compile("a {{ age / 0 }} b").unwrap();
        let mut context = context().with_error_handler(TolerantErrorHandler);

        assert_eq!(
            template.render(&mut context).unwrap(),
            "a Expression error: division by zero b"
        );
    }

    #[test]
    fn test_error_points_at_expression() {
        let error = compile("{{ age / 0 }}")
            .unwrap()
            .render(&mut context())
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Evaluation);
        assert!(format!("{error:#}").contains("^^^^^^^"));
    }
}
