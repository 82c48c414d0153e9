mod config;
mod lex;
mod parse;
mod parsing;

pub use crate::compile::{
    config::{Configuration, ExpressionKind},
    parse::TemplateParser,
    parsing::ParsingState,
};

use crate::report::Error;
use std::fmt::Display;

/// Compile a [`ParsingState`] from the given text with the default
/// [`Configuration`].
///
/// Provides a shortcut to quickly compile a template without creating
/// a [`RenderingContext`][`crate::RenderingContext`].
///
/// # Examples
///
/// ```
/// use stencil::compile;
///
/// let template = compile("{{ name }}");
/// assert!(template.is_ok())
/// ```
pub fn compile(text: &str) -> Result<ParsingState, Error> {
    TemplateParser::new().parse(text)
}

/// Keywords recognized by the Lexer and Parser.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    /// Enables negation.
    Not,
    /// Beginning of an "if" block.
    If,
    /// Marks an "else" or "else if" branch in an "if" block.
    Else,
    /// Beginning of an assignment.
    Let,
    /// Beginning of a loop.
    For,
    /// Divides the loop variables from the iterated value.
    In,
    /// Beginning of a named section.
    Section,
    /// Renders a named section.
    Render,
    /// Separates a value from its cast target, as in `count as string`.
    As,
    /// End of a block.
    End,
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Keyword::Not => write!(f, "not"),
            Keyword::If => write!(f, "if"),
            Keyword::Else => write!(f, "else"),
            Keyword::Let => write!(f, "let"),
            Keyword::For => write!(f, "for"),
            Keyword::In => write!(f, "in"),
            Keyword::Section => write!(f, "section"),
            Keyword::Render => write!(f, "render"),
            Keyword::As => write!(f, "as"),
            Keyword::End => write!(f, "end"),
        }
    }
}

/// Operators recognized by the Lexer and Parser.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Operator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// >
    Greater,
    /// <
    Lesser,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// >=
    GreaterOrEqual,
    /// <=
    LesserOrEqual,
}

impl Operator {
    /// Return true for the arithmetic operators.
    pub fn is_math(&self) -> bool {
        matches!(
            self,
            Operator::Add
                | Operator::Subtract
                | Operator::Multiply
                | Operator::Divide
                | Operator::Modulo
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Subtract => write!(f, "-"),
            Operator::Multiply => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
            Operator::Modulo => write!(f, "%"),
            Operator::Greater => write!(f, ">"),
            Operator::Lesser => write!(f, "<"),
            Operator::Equal => write!(f, "=="),
            Operator::NotEqual => write!(f, "!="),
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::LesserOrEqual => write!(f, "<="),
        }
    }
}
