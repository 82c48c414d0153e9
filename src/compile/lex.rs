pub mod token;

mod state;

use crate::{
    compile::{lex::state::CursorState, Keyword, Operator},
    region::Region,
    report::{expected_operator, Error, INVALID_SYNTAX, UNEXPECTED_TOKEN},
};
use morel::Finder;
use token::Token;

/// Result of asking the [`Lexer`] for the next token, which may not exist.
pub type LexResult = Result<Option<(Token, Region)>, Error>;

/// Result of asking for a token that must exist.
pub type LexResultMust = Result<(Token, Region), Error>;

/// Provides methods to read a source string as [`Token`] instances.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
    /// Compiled [`Finder`] instance used to search for markers
    /// in the source text.
    finder: &'source Finder,
    /// Tracks the [`Lexer`] state and determines the action taken
    /// when `.next` is called.
    state: CursorState,
    /// When true, the following [`Token::Raw`] is left trimmed.
    left_trim: bool,
    /// Temporary storage for a [`Token`] that will be read
    /// on the following call to `.next`
    buffer: Option<(Token, Region)>,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] from the given source and [`Finder`].
    #[inline]
    pub fn new(source: &'source str, finder: &'source Finder) -> Self {
        Self {
            finder,
            state: CursorState::Default,
            source,
            left_trim: false,
            cursor: 0,
            buffer: None,
        }
    }

    /// Return the next [`Token`] and [`Region`].
    ///
    /// Any instance of [`Token::Whitespace`] is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected [`Token`] is found.
    pub fn next(&mut self) -> LexResult {
        loop {
            // Always prefer taking from the buffer when possible.
            if let Some(next) = self.buffer.take() {
                return Ok(Some(next));
            }
            if self.source[self.cursor..].is_empty() {
                return Ok(None);
            }

            let c = self.cursor;
            let result = match self.state {
                CursorState::Default => self.lex_default(c),
                CursorState::Inside { .. } => self.lex_tag(c),
            }?;

            return match result {
                Some((Token::Whitespace, _)) => continue,
                other => Ok(other),
            };
        }
    }

    /// Return the next [`Token`] and [`Region`] while inside of a tag.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected [`Token`] is found.
    fn lex_tag(&mut self, from: usize) -> LexResult {
        if let Some((id, end)) = self.finder.starts(self.source, from) {
            let (token, is_trimmed) = Token::from_usize_trim(id);

            return match self.state {
                CursorState::Inside { ref end_token } if token == *end_token => {
                    self.state = CursorState::Default;
                    self.left_trim = is_trimmed;
                    self.cursor = end;

                    Ok(Some((token, (from..end).into())))
                }
                CursorState::Inside { ref end_token } => {
                    let which = if *end_token == Token::EndExpression {
                        "expression"
                    } else {
                        "block"
                    };

                    Err(Error::syntax(UNEXPECTED_TOKEN)
                        .with_pointer(self.source, from..end)
                        .with_help(format!("did you close the previous {which}?")))
                }
                CursorState::Default => unreachable!("lexer must be in tag state"),
            };
        }

        let mut advance = |length: usize, data: Token| {
            self.cursor += length;

            Ok(Some((data, (from..from + length).into())))
        };

        let mut iterator = self.source[from..]
            .char_indices()
            .map(|(d, c)| (from + d, c));
        let (index, char) = iterator
            .next()
            .expect("lex_tag is only called with remaining source");

        match char {
            '*' => advance(1, Token::Operator(Operator::Multiply)),
            '+' => advance(1, Token::Operator(Operator::Add)),
            '/' => advance(1, Token::Operator(Operator::Divide)),
            '-' => advance(1, Token::Operator(Operator::Subtract)),
            '%' => advance(1, Token::Operator(Operator::Modulo)),
            '.' => advance(1, Token::Period),
            ',' => advance(1, Token::Comma),
            ':' => advance(1, Token::Colon),
            '?' => advance(1, Token::Question),
            '(' => advance(1, Token::LeftParen),
            ')' => advance(1, Token::RightParen),
            '[' => advance(1, Token::LeftBracket),
            ']' => advance(1, Token::RightBracket),
            '"' => self.lex_string(iterator, index),
            '=' | '!' | '>' | '<' | '|' | '&' => self.lex_operator(iterator, index, char),
            c if c.is_whitespace() => Ok(Some(self.lex_whitespace(iterator, index))),
            c if c.is_ascii_digit() => Ok(Some(self.lex_digit(index))),
            c if is_ident_start(c) => Ok(Some(self.lex_ident_or_keyword(iterator, index))),
            _ => Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.source, index..index + char.len_utf8())
                .with_help(
                    "expected an operator, an identifier, an ascii digit, \
                    or beginning of a string literal marked with `\"`",
                )),
        }
    }

    /// Return a [`Token`] and [`Region`] based on the previous character.
    ///
    /// Checks the next character to ensure the correct `Token` is
    /// returned. All of these are recognized:
    ///
    /// `==`, `!=`, `>=`, `<=`, `||`, `&&`, `=`, `|`, `!`, `>`, `<`
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected [`Token`] is found.
    fn lex_operator<T>(&mut self, mut iter: T, from: usize, previous: char) -> LexResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        let (position, token) = match (previous, iter.next()) {
            // Double:
            ('=', Some((usize, '='))) => (usize, Token::Operator(Operator::Equal)),
            ('!', Some((usize, '='))) => (usize, Token::Operator(Operator::NotEqual)),
            ('>', Some((usize, '='))) => (usize, Token::Operator(Operator::GreaterOrEqual)),
            ('<', Some((usize, '='))) => (usize, Token::Operator(Operator::LesserOrEqual)),
            ('|', Some((usize, '|'))) => (usize, Token::Or),
            ('&', Some((usize, '&'))) => (usize, Token::And),
            // Single:
            ('=', _) => (from, Token::Assign),
            ('|', _) => (from, Token::Pipe),
            ('!', _) => (from, Token::Exclamation),
            ('>', _) => (from, Token::Operator(Operator::Greater)),
            ('<', _) => (from, Token::Operator(Operator::Lesser)),
            _ => {
                return Err(Error::syntax(UNEXPECTED_TOKEN)
                    .with_pointer(self.source, from..from + 1)
                    .with_help(expected_operator(previous)));
            }
        };
        let position = position + 1;
        self.cursor = position;

        Ok(Some((token, (from..position).into())))
    }

    /// Return a [`Token::Number`] beginning at the given position.
    ///
    /// A period is only part of the number when a digit follows it, so
    /// `items.0.name` keeps its separators.
    fn lex_digit(&mut self, from: usize) -> (Token, Region) {
        let bytes = self.source.as_bytes();
        let mut end = from;
        let mut seen_period = false;

        while end < bytes.len() {
            match bytes[end] {
                b'0'..=b'9' => end += 1,
                b'.' if !seen_period
                    && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()) =>
                {
                    seen_period = true;
                    end += 1;
                }
                _ => break,
            }
        }
        self.cursor = end;

        (Token::Number, (from..end).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Whitespace`].
    fn lex_whitespace<T>(&mut self, mut iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        loop {
            match iter.next() {
                Some((index, char)) if !char.is_whitespace() => {
                    self.cursor = index;

                    break (Token::Whitespace, (from..index).into());
                }
                Some((_, _)) => continue,
                None => {
                    self.cursor = self.source.len();

                    break (Token::Whitespace, (from..self.source.len()).into());
                }
            }
        }
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::String`] using
    /// the given iterator.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the string is never closed.
    fn lex_string<T>(&mut self, mut iter: T, from: usize) -> LexResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut escaped = false;
        loop {
            match iter.next() {
                Some((index, '"')) if !escaped => {
                    // Add one to the index of the character to comply with string slice
                    // semantics.
                    let to = index + 1;
                    self.cursor = to;

                    return Ok(Some((Token::String, (from..to).into())));
                }
                Some((_, '\\')) if !escaped => escaped = true,
                Some(_) => escaped = false,
                None => {
                    return Err(Error::syntax(INVALID_SYNTAX)
                        .with_pointer(self.source, from..from + 1)
                        .with_help(
                            "this might be an undelimited string, try closing it with `\"`",
                        ));
                }
            }
        }
    }

    /// Return a [`Token`] and [`Region`] from the given iterator.
    ///
    /// The `Token` will be [`Token::Identifier`], [`Token::Keyword`] or one of
    /// the literal words.
    fn lex_ident_or_keyword<T>(&mut self, mut iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut check_keyword = |to: usize| {
            let token = match &self.source[from..to] {
                "not" => Token::Keyword(Keyword::Not),
                "if" => Token::Keyword(Keyword::If),
                "else" => Token::Keyword(Keyword::Else),
                "let" => Token::Keyword(Keyword::Let),
                "for" => Token::Keyword(Keyword::For),
                "in" => Token::Keyword(Keyword::In),
                "section" => Token::Keyword(Keyword::Section),
                "render" => Token::Keyword(Keyword::Render),
                "as" => Token::Keyword(Keyword::As),
                "end" => Token::Keyword(Keyword::End),
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Identifier,
            };
            self.cursor = to;

            (token, (from..to).into())
        };

        loop {
            match iter.next() {
                Some((index, char)) if !is_ident_continue(char) => {
                    break check_keyword(index);
                }
                Some((_, _)) => continue,
                None => break check_keyword(self.source.len()),
            }
        }
    }

    /// Return the next [`Token`] and [`Region`] while outside of a tag.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a closing marker appears outside of a tag.
    fn lex_default(&mut self, from: usize) -> LexResult {
        match self.finder.next(self.source, from) {
            Some((id, marker_begin, marker_end)) => {
                let (token, is_trimmed) = Token::from_usize_trim(id);

                let end_token = match &token {
                    Token::BeginExpression => Token::EndExpression,
                    Token::BeginBlock => Token::EndBlock,
                    _ => {
                        return Err(Error::syntax(UNEXPECTED_TOKEN)
                            .with_pointer(self.source, marker_begin..marker_end)
                            .with_help("expected beginning expression or beginning block"));
                    }
                };
                self.state = CursorState::Inside { end_token };
                self.cursor = marker_end;

                if from == marker_begin {
                    self.left_trim = false;

                    Ok(Some((token, (marker_begin..marker_end).into())))
                } else {
                    self.buffer = Some((token, (marker_begin..marker_end).into()));

                    Ok(self.raw(from, marker_begin, is_trimmed))
                }
            }
            None => {
                let end = self.source.len();
                self.cursor = end;

                Ok(self.raw(from, end, false))
            }
        }
    }

    /// Return a [`Token::Raw`] over the given range, applying any pending
    /// trim.
    ///
    /// When trimming leaves nothing, the buffered token is returned instead.
    fn raw(&mut self, begin: usize, end: usize, right_trim: bool) -> Option<(Token, Region)> {
        let mut text = &self.source[begin..end];
        let mut begin = begin;

        if right_trim {
            text = text.trim_end();
        }
        if self.left_trim {
            self.left_trim = false;
            let trimmed = text.trim_start();
            begin += text.len() - trimmed.len();
            text = trimmed;
        }
        if text.is_empty() {
            return self.buffer.take();
        }

        Some((Token::Raw, (begin..begin + text.len()).into()))
    }
}

/// Return true if the given character is a recognized beginning identifier,
/// meaning '_' or an `xid_start`.
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Return true if the given character is a recognized continue identifier,
/// meaning an `xid_continue`.
fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}
