//! Contains the `Helper` trait and the `HelperResolver` that maps names to
//! helpers.
//!
//! A helper is any type which implements the [`Helper`] trait. Register one
//! with [`HelperResolver::add_helper`], and templates rendered with a
//! [`RenderingContext`] holding that resolver can use it.
//!
//! Helpers are called in two forms. The pipe form passes the value on the
//! left as input:
//!
//! ```html
//! {{ name | default "guest" | upper }}
//! ```
//!
//! The call form has no input, which is `null` inside the helper:
//!
//! ```html
//! {{ join(tags, glue: " / ") }}
//! ```
//!
//! Arguments may be named, such as `glue` above. Anonymous arguments
//! have no explicitly assigned name, but they do still receive an implicitly
//! generated name. For each anonymous argument in a helper call, the name is
//! equal to (n + 1) where "n" is the number of anonymous arguments that came
//! before the argument.
//!
//! So, the `"guest"` argument for the `default` helper will have a name of
//! "1", because it is the first anonymous argument.
//!
//! # Examples
//!
//! You can either create a struct and implement the trait on that, or just
//! create a function matching the signature of a helper without context.
//!
//! ```rust
//! use stencil::{
//!     helper::{Arguments, HelperResolver},
//!     Error, RenderingContext, StandardVariableProvider,
//! };
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! fn shout(value: &Value, _: &Arguments) -> Result<Value, Error> {
//!     match value {
//!         Value::String(string) => Ok(json!(format!("{}!", string.to_uppercase()))),
//!         _ => Err(Error::build("helper `shout` requires string input")
//!                 .with_help("use quotes to coerce data to string")),
//!     }
//! }
//!
//! let resolver = HelperResolver::default().with_helper_must("shout", shout);
//! let mut context = RenderingContext::new()
//!     .with_view_helper_resolver(Arc::new(resolver))
//!     .with_variable_provider(StandardVariableProvider::new().with_must("name", "taylor"));
//!
//! let template = context.template_parser().parse("{{ name | shout }}").unwrap();
//!
//! assert_eq!(template.render(&mut context).unwrap(), "TAYLOR!");
//! ```
//!
//! If a helper returns an [`Error`] without a visual, the error is pointed at
//! the helper call in the template source. Printing it with `{:#}` shows:
//!
//! ```text
//! error: helper `shout` requires string input
//!  --> ?:1:11
//!   |
//! 1 | {{ name | shout }}
//!   |           ^^^^^
//!   |
//!  = help: use quotes to coerce data to string
//! ```
mod builtin;

use crate::{
    render::RenderingContext,
    report::{Error, INVALID_HELPER},
};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::Arc,
};

/// Named arguments handed to a [`Helper`].
pub type Arguments = HashMap<String, Value>;

/// Describes a type which can be used to produce or transform a value in a
/// template.
pub trait Helper: Sync + Send {
    /// Execute the helper with the given input and return a new Value as
    /// output.
    ///
    /// The [`RenderingContext`] gives access to template variables and to the
    /// [`ViewHelperVariableContainer`][`crate::ViewHelperVariableContainer`],
    /// where a helper may keep state between calls.
    fn invoke(
        &self,
        input: &Value,
        arguments: &Arguments,
        context: &mut RenderingContext,
    ) -> Result<Value, Error>;

    /// Return false if the output of this helper must never be escaped.
    fn escapes_output(&self) -> bool {
        true
    }
}

/// Allows assignment of any function matching the signature of `invoke`
/// without the context as a [`Helper`], instead of requiring a struct be
/// created.
impl<F> Helper for F
where
    F: Fn(&Value, &Arguments) -> Result<Value, Error> + Sync + Send,
{
    fn invoke(
        &self,
        input: &Value,
        arguments: &Arguments,
        _: &mut RenderingContext,
    ) -> Result<Value, Error> {
        self(input, arguments)
    }
}

/// Maps helper names to [`Helper`] instances.
///
/// The `Default` resolver carries the built-in helpers:
/// `raw`, `upper`, `lower`, `trim`, `default`, `length`, `join` and `cycle`.
/// A resolver made with [`HelperResolver::new`] is empty.
#[derive(Clone)]
pub struct HelperResolver {
    helpers: HashMap<String, Arc<dyn Helper>>,
}

impl HelperResolver {
    /// Create an empty [`HelperResolver`].
    #[inline]
    pub fn new() -> Self {
        Self {
            helpers: HashMap::new(),
        }
    }

    /// Add a [`Helper`] under the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a helper with the same name already exists.
    pub fn add_helper<T>(&mut self, name: &str, helper: T) -> Result<(), Error>
    where
        T: Helper + 'static,
    {
        if self.helpers.contains_key(name) {
            return Err(Error::invalid_argument(INVALID_HELPER).with_help(format!(
                "helper with name `{name}` already exists in resolver, \
                overwrite it with `.add_helper_must`"
            )));
        }
        self.helpers.insert(name.to_owned(), Arc::new(helper));

        Ok(())
    }

    /// Add a [`Helper`] under the given name, replacing any helper with the
    /// same name.
    #[inline]
    pub fn add_helper_must<T>(&mut self, name: &str, helper: T)
    where
        T: Helper + 'static,
    {
        self.helpers.insert(name.to_owned(), Arc::new(helper));
    }

    /// Add a [`Helper`] under the given name.
    ///
    /// Returns the [`HelperResolver`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a helper with the same name already exists.
    #[inline]
    pub fn with_helper<T>(mut self, name: &str, helper: T) -> Result<Self, Error>
    where
        T: Helper + 'static,
    {
        self.add_helper(name, helper)?;

        Ok(self)
    }

    /// Add a [`Helper`] under the given name, replacing any helper with the
    /// same name.
    ///
    /// Returns the [`HelperResolver`], so additional methods may be chained.
    #[inline]
    pub fn with_helper_must<T>(mut self, name: &str, helper: T) -> Self
    where
        T: Helper + 'static,
    {
        self.add_helper_must(name, helper);

        self
    }

    /// Return the [`Helper`] registered under the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`HelperNotFound`][`crate::ErrorKind::HelperNotFound`] when no helper
    /// has that name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Helper>, Error> {
        self.helpers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::helper_not_found(name))
    }

    /// Return true if a helper is registered under the given name.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Return the names of helpers whose output is never escaped.
    pub fn raw_helpers(&self) -> HashSet<String> {
        self.helpers
            .iter()
            .filter(|(_, helper)| !helper.escapes_output())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Default for HelperResolver {
    fn default() -> Self {
        let mut resolver = Self::new();
        builtin::register(&mut resolver);

        resolver
    }
}

impl Debug for HelperResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.helpers.keys().collect();
        names.sort();

        f.debug_struct("HelperResolver")
            .field("helpers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Arguments, HelperResolver};
    use crate::{
        compile::TemplateParser,
        render::{
            RenderingContext, StandardVariableProvider, TolerantErrorHandler,
        },
        report::{Error, ErrorKind},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[test]
    fn test_add() {
        let mut resolver = HelperResolver::new();
        resolver.add_helper_must("faux", faux_helper);

        assert!(resolver.contains("faux"));
        assert!(!resolver.contains("ghost"));
    }

    #[test]
    fn test_add_fluent() {
        assert!(HelperResolver::new()
            .with_helper("faux", faux_helper)
            .unwrap()
            .resolve("faux")
            .is_ok());
        assert_eq!(
            HelperResolver::new()
                .resolve("ghost")
                .err()
                .map(|e| e.kind()),
            Some(ErrorKind::HelperNotFound)
        );
    }

    #[test]
    fn test_add_duplicate() {
        assert!(HelperResolver::new()
            .with_helper_must("faux", faux_helper)
            .with_helper("faux", faux_helper)
            .is_err())
    }

    #[test]
    fn test_default_raw_helpers() {
        let raw = HelperResolver::default().raw_helpers();

        assert!(raw.contains("raw"));
        assert!(!raw.contains("upper"));
    }

    #[test]
    fn test_call_chain() {
        let result = render_with_test_helpers(
            "{{ name | to_lowercase | left 3 }}",
            StandardVariableProvider::new().with_must("name", "TAYLOR"),
        );

        assert_eq!(result.unwrap(), "tay");
    }

    #[test]
    fn test_call_form() {
        let result = render_with_test_helpers(
            "{{ left(\"stencil\", 4) }}",
            StandardVariableProvider::new(),
        );

        assert_eq!(result.unwrap(), "sten");
    }

    #[test]
    fn test_call_chain_error() {
        let result = render_with_test_helpers(
            "{{ name | to_lowercase | left \"10\" }}",
            StandardVariableProvider::new().with_must("name", "TAYLOR"),
        );

        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Evaluation);
        assert!(format!("{error:#}").contains("^^^^"));
    }

    #[test]
    fn test_missing_helper_standard() {
        let result = render_with_test_helpers("{{ name | ghost }}", StandardVariableProvider::new());

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::HelperNotFound));
    }

    #[test]
    fn test_missing_helper_tolerant() {
        let mut context = RenderingContext::new().with_error_handler(TolerantErrorHandler);
        let template = TemplateParser::new().parse("a {{ ghost() }} b").unwrap();

        assert_eq!(
            template.render(&mut context).unwrap(),
            "a Helper error: unknown helper b"
        );
    }

    /// Render the source with the test helpers registered.
    fn render_with_test_helpers(
        source: &str,
        provider: StandardVariableProvider,
    ) -> Result<String, Error> {
        let resolver = HelperResolver::default()
            .with_helper_must("to_lowercase", to_lowercase)
            .with_helper_must("left", left);
        let mut context = RenderingContext::new()
            .with_view_helper_resolver(Arc::new(resolver))
            .with_variable_provider(provider);
        let template = context.template_parser().parse(source)?;

        template.render(&mut context)
    }

    fn faux_helper(_: &Value, _: &Arguments) -> Result<Value, Error> {
        Ok(json!(""))
    }

    /// Lowercase the given value.
    ///
    /// # Errors
    ///
    /// Returns an Error if the Value is not of type String.
    fn to_lowercase(value: &Value, _: &Arguments) -> Result<Value, Error> {
        match value {
            Value::String(string) => Ok(json!(string.to_lowercase())),
            _ => Err(Error::build("helper `to_lowercase` requires string input")),
        }
    }

    /// Return the first n characters of the input Value from the left,
    /// where n is the value of the argument.
    ///
    /// In the call form the text is the first argument and n the second.
    fn left(value: &Value, args: &Arguments) -> Result<Value, Error> {
        let (text, count) = match value {
            Value::Null => (args.get("1"), args.get("2")),
            value => (Some(value), args.get("1")),
        };

        match (text, count) {
            (Some(Value::String(string)), Some(Value::Number(number))) => match number.as_u64() {
                Some(n) => Ok(json!(string.chars().take(n as usize).collect::<String>())),
                None => Err(Error::build(format!(
                    "helper `left` expects an integer (not a float) that fits in u64, \
                    `{number}` is invalid"
                ))),
            },
            (Some(Value::String(_)), other) => Err(Error::build(format!(
                "helper `left` expects a number argument, received `{}`",
                other.unwrap_or(&Value::Null)
            ))),
            _ => Err(Error::build("helper `left` expects string input")),
        }
    }
}
