use std::{collections::HashSet, fmt::Display};

/// Optional expression forms that a parser may recognize.
///
/// A [`RenderingContext`][`crate::RenderingContext`] lists the kinds it
/// enables, and a template using a kind that is not listed fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    /// Arithmetic with `+`, `-`, `*`, `/` and `%`.
    Math,
    /// Type conversion with `as`, such as `count as string`.
    Cast,
    /// Conditional selection with `condition ? then : else`.
    Ternary,
}

impl ExpressionKind {
    /// Every [`ExpressionKind`], in the order they are enabled by default.
    pub const ALL: [ExpressionKind; 3] = [
        ExpressionKind::Math,
        ExpressionKind::Cast,
        ExpressionKind::Ternary,
    ];
}

impl Display for ExpressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionKind::Math => write!(f, "math"),
            ExpressionKind::Cast => write!(f, "cast"),
            ExpressionKind::Ternary => write!(f, "ternary"),
        }
    }
}

/// Settings that change how a [`TemplateParser`][`crate::TemplateParser`]
/// builds nodes.
///
/// A parser attached to a [`RenderingContext`][`crate::RenderingContext`]
/// receives its `Configuration` from that context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    escaping: bool,
    expression_kinds: Vec<ExpressionKind>,
    raw_helpers: HashSet<String>,
}

impl Configuration {
    /// Create a new [`Configuration`].
    ///
    /// Escaping is enabled, every [`ExpressionKind`] is recognized and the
    /// built-in `raw` helper is the only helper whose output is not escaped.
    pub fn new() -> Self {
        Self {
            escaping: true,
            expression_kinds: ExpressionKind::ALL.to_vec(),
            raw_helpers: HashSet::from(["raw".to_string()]),
        }
    }

    /// Return true if `{{ }}` output is wrapped in an escaping node.
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// Set the escaping default.
    pub fn set_escaping(&mut self, escaping: bool) {
        self.escaping = escaping;
    }

    /// Set the escaping default.
    ///
    /// Returns the [`Configuration`], so additional methods may be chained.
    #[inline]
    pub fn with_escaping(mut self, escaping: bool) -> Self {
        self.set_escaping(escaping);

        self
    }

    /// Return the recognized [`ExpressionKind`] instances.
    pub fn expression_kinds(&self) -> &[ExpressionKind] {
        &self.expression_kinds
    }

    /// Set the recognized [`ExpressionKind`] instances.
    pub fn set_expression_kinds<T>(&mut self, kinds: T)
    where
        T: Into<Vec<ExpressionKind>>,
    {
        self.expression_kinds = kinds.into();
    }

    /// Set the recognized [`ExpressionKind`] instances.
    ///
    /// Returns the [`Configuration`], so additional methods may be chained.
    #[inline]
    pub fn with_expression_kinds<T>(mut self, kinds: T) -> Self
    where
        T: Into<Vec<ExpressionKind>>,
    {
        self.set_expression_kinds(kinds);

        self
    }

    /// Return true if the given [`ExpressionKind`] is recognized.
    pub fn allows(&self, kind: ExpressionKind) -> bool {
        self.expression_kinds.contains(&kind)
    }

    /// Set the names of helpers whose output is never escaped.
    pub fn set_raw_helpers(&mut self, names: HashSet<String>) {
        self.raw_helpers = names;
    }

    /// Set the names of helpers whose output is never escaped.
    ///
    /// Returns the [`Configuration`], so additional methods may be chained.
    #[inline]
    pub fn with_raw_helpers(mut self, names: HashSet<String>) -> Self {
        self.set_raw_helpers(names);

        self
    }

    /// Return true if output of the named helper is never escaped.
    pub fn is_raw_helper(&self, name: &str) -> bool {
        self.raw_helpers.contains(name)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
