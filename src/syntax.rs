//! Delimiter configuration.
//!
//! A [`Builder`] describes the markers that open and close expressions and
//! blocks. The resulting [`Syntax`] is handed to a
//! [`TemplateParser`][`crate::TemplateParser`], which searches template source
//! for those markers.
use morel::Syntax;

/// Markers that identify blocks and expressions within text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Beginning of an expression, which outputs a value.
    BeginExpression = 0,
    /// End of an expression.
    EndExpression = 1,
    /// Same as BeginExpression, but removes the trailing whitespace of the
    /// preceding raw text.
    BeginExpressionTrim = 2,
    /// Same as EndExpression, but removes the leading whitespace of the
    /// following raw text.
    EndExpressionTrim = 3,
    /// Beginning of a block such as "if", "for" or "section".
    BeginBlock = 4,
    /// End of a block.
    EndBlock = 5,
    /// Same as BeginBlock, with trimming.
    BeginBlockTrim = 6,
    /// Same as EndBlock, with trimming.
    EndBlockTrim = 7,
}

impl From<usize> for Marker {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::BeginExpression,
            1 => Self::EndExpression,
            2 => Self::BeginExpressionTrim,
            3 => Self::EndExpressionTrim,
            4 => Self::BeginBlock,
            5 => Self::EndBlock,
            6 => Self::BeginBlockTrim,
            7 => Self::EndBlockTrim,
            _ => unreachable!("marker ids are only assigned by Builder"),
        }
    }
}

impl From<Marker> for usize {
    fn from(k: Marker) -> Self {
        k as usize
    }
}

/// Provides methods to build a [`Syntax`].
///
/// # Example
///
/// ```
/// use stencil::Builder;
///
/// let syntax = Builder::new()
///     .with_expression("[[", "]]")
///     .with_block("[%", "%]")
///     .to_syntax();
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    expression: (String, String),
    block: (String, String),
    whitespace: char,
}

impl Builder {
    /// Create a new [`Builder`].
    ///
    /// The `Builder` has default markers:
    ///
    /// ```text
    /// Expressions: {{ name }}
    /// Blocks: {% if ... %}
    /// Whitespace:
    ///     Expression: {{- name -}}
    ///     Block:  {%- if ... -%}
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            expression: ("{{".into(), "}}".into()),
            block: ("{%".into(), "%}".into()),
            whitespace: '-',
        }
    }

    /// Set the expression markers.
    ///
    /// # Panics
    ///
    /// Panics if either marker is empty.
    pub fn set_expression(&mut self, begin: &str, end: &str) {
        assert!(!begin.is_empty() && !end.is_empty(), "markers must not be empty");
        self.expression = (begin.into(), end.into());
    }

    /// Set the expression markers.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    #[inline]
    pub fn with_expression(mut self, begin: &str, end: &str) -> Self {
        self.set_expression(begin, end);

        self
    }

    /// Set the block markers.
    ///
    /// # Panics
    ///
    /// Panics if either marker is empty.
    pub fn set_block(&mut self, begin: &str, end: &str) {
        assert!(!begin.is_empty() && !end.is_empty(), "markers must not be empty");
        self.block = (begin.into(), end.into());
    }

    /// Set the block markers.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    #[inline]
    pub fn with_block(mut self, begin: &str, end: &str) -> Self {
        self.set_block(begin, end);

        self
    }

    /// Set the whitespace trim character.
    ///
    /// # Panics
    ///
    /// Panics if the character is itself whitespace.
    pub fn set_whitespace(&mut self, character: char) {
        assert!(!character.is_whitespace(), "trim character must be visible");
        self.whitespace = character;
    }

    /// Set the whitespace trim character.
    ///
    /// Returns the Builder, so additional methods may be chained.
    #[inline]
    pub fn with_whitespace(mut self, character: char) -> Self {
        self.set_whitespace(character);

        self
    }

    /// Return a [`Syntax`] instance from the markers in this [`Builder`].
    pub fn to_syntax(&self) -> Syntax {
        let (begin_expression, end_expression) = &self.expression;
        let (begin_block, end_block) = &self.block;
        let ws = self.whitespace;

        let markers: Vec<(usize, String)> = vec![
            (Marker::BeginExpression.into(), begin_expression.clone()),
            (Marker::EndExpression.into(), end_expression.clone()),
            (
                Marker::BeginExpressionTrim.into(),
                format!("{begin_expression}{ws}"),
            ),
            (
                Marker::EndExpressionTrim.into(),
                format!("{ws}{end_expression}"),
            ),
            (Marker::BeginBlock.into(), begin_block.clone()),
            (Marker::EndBlock.into(), end_block.clone()),
            (Marker::BeginBlockTrim.into(), format!("{begin_block}{ws}")),
            (Marker::EndBlockTrim.into(), format!("{ws}{end_block}")),
        ];

        Syntax::new(markers)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Builder, Marker};

    #[test]
    fn test_marker_round_trip_ids() {
        for id in 0..8usize {
            assert_eq!(usize::from(Marker::from(id)), id);
        }
    }

    #[test]
    #[should_panic(expected = "markers must not be empty")]
    fn test_empty_marker_rejected() {
        Builder::new().with_expression("", "}}");
    }

    #[test]
    #[should_panic(expected = "trim character must be visible")]
    fn test_whitespace_trim_rejected() {
        Builder::new().with_whitespace(' ');
    }
}
