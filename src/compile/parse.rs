//! Stencil parser.
//!
//! Utilizes a Lexer to receive tokens, which it uses to construct the tree of
//! [`Node`] instances held by a [`ParsingState`].
mod block;
mod state;

use crate::{
    compile::{
        lex::{token::Token, LexResult, LexResultMust, Lexer},
        parse::{block::Block, state::State},
        Configuration, ExpressionKind, Keyword, Operator, ParsingState,
    },
    node::{
        AssignNode, CastType, ConditionNode, EscapingNode, ExpressionNode, HelperNode,
        LiteralNode, LoopNode, Node, ObjectAccessorNode, Operation, RenderSectionNode, RootNode,
        Segment, TextNode, VariableAccessorNode,
    },
    region::Region,
    render::{ContextId, RenderingContext},
    report::{
        error_eof, expected_keyword, Error, DISABLED_EXPRESSION, INVALID_SYNTAX,
        UNEXPECTED_BLOCK, UNEXPECTED_TOKEN,
    },
    syntax::Builder,
};
use morel::Finder;
use serde_json::{Number, Value};
use std::{collections::HashMap, fmt::Debug, sync::Arc};

/// Turns template source into a [`ParsingState`].
///
/// A `TemplateParser` carries the delimiter syntax and the [`Configuration`]
/// of the [`RenderingContext`] it is attached to, which decides the escaping
/// default and the expression kinds templates may use.
///
/// # Examples
///
/// ```
/// use stencil::{Builder, TemplateParser};
///
/// let parser = TemplateParser::with_syntax(Builder::new().with_expression("[[", "]]"));
/// let template = parser.parse("hello, [[ name ]]");
///
/// assert!(template.is_ok());
/// ```
#[derive(Clone)]
pub struct TemplateParser {
    syntax: Builder,
    finder: Arc<Finder>,
    configuration: Configuration,
    context: Option<ContextId>,
}

impl TemplateParser {
    /// Create a new [`TemplateParser`] with the default syntax and
    /// [`Configuration`].
    #[inline]
    pub fn new() -> Self {
        Self::with_syntax(Builder::new())
    }

    /// Create a new [`TemplateParser`] that searches for the markers of the
    /// given [`Builder`].
    pub fn with_syntax(syntax: Builder) -> Self {
        Self {
            finder: Arc::new(Finder::new(syntax.to_syntax())),
            syntax,
            configuration: Configuration::new(),
            context: None,
        }
    }

    /// Set the [`Configuration`].
    ///
    /// Returns the [`TemplateParser`], so additional methods may be chained.
    #[inline]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;

        self
    }

    /// Return the [`Builder`] describing the markers of this parser.
    pub fn syntax(&self) -> &Builder {
        &self.syntax
    }

    /// Return the [`Configuration`] used while parsing.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Attach the parser to the [`RenderingContext`], adopting its
    /// configuration.
    pub fn set_rendering_context(&mut self, context: &RenderingContext) {
        self.attach(context.id(), context.parser_configuration());
    }

    /// Return the id of the [`RenderingContext`] this parser is attached to.
    pub fn rendering_context(&self) -> Option<ContextId> {
        self.context
    }

    pub(crate) fn attach(&mut self, context: ContextId, configuration: Configuration) {
        self.context = Some(context);
        self.configuration = configuration;
    }

    /// Parse the source into a [`ParsingState`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`Syntax`][`crate::ErrorKind::Syntax`]
    /// pointing at the problem when the source is not a valid template.
    pub fn parse(&self, source: &str) -> Result<ParsingState, Error> {
        log::debug!("parsing anonymous template");

        let (root, sections) = Parser::new(source, &self.finder, &self.configuration).compile()?;

        Ok(ParsingState::new(root, sections, source))
    }

    /// Parse the source into a [`ParsingState`] with the given name.
    ///
    /// The name appears in errors produced while parsing or rendering.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`Syntax`][`crate::ErrorKind::Syntax`]
    /// pointing at the problem when the source is not a valid template.
    pub fn parse_named(&self, name: &str, source: &str) -> Result<ParsingState, Error> {
        log::debug!("parsing template `{name}`");

        let (root, sections) = Parser::new(source, &self.finder, &self.configuration)
            .compile()
            .map_err(|error| error.with_name(name))?;

        Ok(ParsingState::new(root, sections, source).with_name(name))
    }
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TemplateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateParser")
            .field("syntax", &self.syntax)
            .field("configuration", &self.configuration)
            .field("context", &self.context)
            .finish()
    }
}

/// Parses one source text.
struct Parser<'source> {
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
    /// Store peeked tokens.
    ///
    /// Double option is used to remember when the next token is None.
    buffer: Option<Option<(Token, Region)>>,
    /// Decides the escaping default and the allowed expression kinds.
    configuration: &'source Configuration,
}

impl<'source> Parser<'source> {
    /// Create a new Parser from the given string.
    #[inline]
    fn new(
        source: &'source str,
        finder: &'source Finder,
        configuration: &'source Configuration,
    ) -> Self {
        Self {
            lexer: Lexer::new(source, finder),
            buffer: None,
            configuration,
        }
    }

    /// Compile the template.
    ///
    /// Returns the root node and the named sections.
    fn compile(mut self) -> Result<(Node, HashMap<String, Node>), Error> {
        // Blocks waiting for their `end`.
        let mut states: Vec<State> = vec![];

        // Nodes of each open block, the outermost is the template itself.
        //
        // Used to remember what belongs to the if branch and what belongs to the else
        // branch in an "if" block, for example.
        let mut scopes: Vec<Vec<Node>> = vec![vec![]];

        let mut sections: HashMap<String, Node> = HashMap::new();

        while let Some((token, region)) = self.next()? {
            let node: Node = match token {
                Token::Raw => TextNode::new(&self.lexer.source[region]).into(),
                Token::BeginExpression => {
                    let node = self.parse_output()?;
                    self.next_must(Token::EndExpression)?;

                    node
                }
                Token::BeginBlock => {
                    let block = self.parse_block()?;
                    let (_, end) = self.next_must(Token::EndBlock)?;
                    let region = region.combine(end);

                    match block {
                        Block::Let(name, value) => AssignNode::new(name, value).into(),
                        Block::Render(name, optional) => {
                            RenderSectionNode::new(name, optional, region).into()
                        }
                        Block::If(condition) => {
                            states.push(State::If {
                                branches: vec![],
                                condition: Some(condition),
                                region,
                            });
                            scopes.push(vec![]);
                            continue;
                        }
                        Block::ElseIf(next) => {
                            let body = self.close_branch(&states, &mut scopes, region)?;
                            if let Some(State::If { branches, condition, .. }) = states.last_mut() {
                                if let Some(previous) = condition.replace(next) {
                                    branches.push((previous, body));
                                }
                            }
                            scopes.push(vec![]);
                            continue;
                        }
                        Block::Else => {
                            let body = self.close_branch(&states, &mut scopes, region)?;
                            if let Some(State::If { branches, condition, .. }) = states.last_mut() {
                                if let Some(previous) = condition.take() {
                                    branches.push((previous, body));
                                }
                            }
                            scopes.push(vec![]);
                            continue;
                        }
                        Block::For {
                            key,
                            value,
                            iterable,
                        } => {
                            states.push(State::For {
                                key,
                                value,
                                iterable,
                                region,
                            });
                            scopes.push(vec![]);
                            continue;
                        }
                        Block::Section(name) => {
                            let open = states.iter().any(|state| {
                                matches!(state, State::Section { name: open, .. } if *open == name)
                            });
                            if open || sections.contains_key(&name) {
                                return Err(Error::syntax(INVALID_SYNTAX)
                                    .with_pointer(self.lexer.source, region)
                                    .with_help(format!(
                                        "a section named `{name}` already exists in this template"
                                    )));
                            }
                            states.push(State::Section { name, region });
                            scopes.push(vec![]);
                            continue;
                        }
                        Block::End => {
                            let Some(state) = states.pop() else {
                                return Err(Error::syntax(UNEXPECTED_BLOCK)
                                    .with_pointer(self.lexer.source, region)
                                    .with_help("there is no open block for this `end` to close"));
                            };
                            let children = compact(scopes.pop().unwrap_or_default());

                            match state {
                                State::If {
                                    mut branches,
                                    condition,
                                    ..
                                } => {
                                    let body = close_scope(children)?;
                                    match condition {
                                        Some(condition) => {
                                            branches.push((condition, body));
                                            ConditionNode::new(branches, None).into()
                                        }
                                        None => ConditionNode::new(branches, Some(body)).into(),
                                    }
                                }
                                State::For {
                                    key,
                                    value,
                                    iterable,
                                    region,
                                } => LoopNode::new(
                                    key,
                                    value,
                                    iterable,
                                    RootNode::from(children),
                                    region,
                                )
                                .into(),
                                State::Section { name, .. } => {
                                    sections.insert(name, close_scope(children)?);
                                    continue;
                                }
                            }
                        }
                    }
                }
                other => {
                    return Err(Error::syntax(UNEXPECTED_TOKEN)
                        .with_pointer(self.lexer.source, region)
                        .with_help(format!("did not expect {other} here")))
                }
            };

            if let Some(scope) = scopes.last_mut() {
                scope.push(node);
            }
        }

        if let Some(state) = states.last() {
            return Err(Error::syntax(INVALID_SYNTAX)
                .with_pointer(self.lexer.source, state.region())
                .with_help(format!(
                    "did you close the `{}` block with an `end` block?",
                    state.keyword()
                )));
        }

        let root = close_scope(compact(scopes.pop().unwrap_or_default()))?;

        Ok((root, sections))
    }

    /// Finish the current branch of the innermost "if" block and return its
    /// body.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the innermost block is not an "if" block, or
    /// the "if" block already reached its "else" branch.
    fn close_branch(
        &self,
        states: &[State],
        scopes: &mut Vec<Vec<Node>>,
        region: Region,
    ) -> Result<Node, Error> {
        match states.last() {
            Some(State::If {
                condition: Some(_), ..
            }) => close_scope(compact(scopes.pop().unwrap_or_default())),
            Some(State::If { .. }) => Err(Error::syntax(UNEXPECTED_BLOCK)
                .with_pointer(self.lexer.source, region)
                .with_help("an `if` block cannot continue after its `else` branch")),
            _ => Err(Error::syntax(UNEXPECTED_BLOCK)
                .with_pointer(self.lexer.source, region)
                .with_help("`else` must be inside of an `if` block")),
        }
    }

    /// Parse the contents of an expression tag.
    ///
    /// The result is escaped when escaping is enabled, unless the outermost
    /// node is a helper whose output is never escaped.
    fn parse_output(&mut self) -> Result<Node, Error> {
        let (node, _) = self.parse_pipe()?;
        if !self.configuration.is_escaping() {
            return Ok(node);
        }
        if let Node::Helper(helper) = &node {
            if self.configuration.is_raw_helper(helper.name()) {
                return Ok(node);
            }
        }

        Ok(EscapingNode::new(node).into())
    }

    /// Parse the contents of a block tag.
    fn parse_block(&mut self) -> Result<Block, Error> {
        // from
        // |
        // {% if name == "taylor" %}
        //   Welcome back, Taylor.
        // {% end %}
        //             |
        //             to
        let (keyword, region) = self.parse_keyword()?;

        match keyword {
            Keyword::If => Ok(Block::If(self.parse_pipe()?.0)),
            Keyword::Else if self.next_is(Token::Keyword(Keyword::If))? => {
                self.next()?;

                Ok(Block::ElseIf(self.parse_pipe()?.0))
            }
            Keyword::Else => Ok(Block::Else),
            Keyword::For => self.parse_for(),
            Keyword::Let => {
                let (_, name) = self.next_must(Token::Identifier)?;
                self.next_must(Token::Assign)?;
                let (value, _) = self.parse_pipe()?;

                Ok(Block::Let(self.lexer.source[name].to_owned(), value))
            }
            Keyword::Section => Ok(Block::Section(self.parse_name()?)),
            Keyword::Render => {
                let name = self.parse_name()?;
                let optional = match self.peek()? {
                    Some((Token::Identifier, next)) if &self.lexer.source[next] == "optional" => {
                        self.next()?;
                        true
                    }
                    _ => false,
                };

                Ok(Block::Render(name, optional))
            }
            Keyword::End => Ok(Block::End),
            other => Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(expected_keyword(other))),
        }
    }

    /// Parse the variables and the iterated value of a "for" block.
    fn parse_for(&mut self) -> Result<Block, Error> {
        // for name in names
        // for key, value in object
        let (_, first) = self.next_must(Token::Identifier)?;
        let (key, value) = if self.next_is(Token::Comma)? {
            self.next()?;
            let (_, second) = self.next_must(Token::Identifier)?;

            (Some(first), second)
        } else {
            (None, first)
        };
        self.next_must(Token::Keyword(Keyword::In))?;
        let (iterable, _) = self.parse_pipe()?;

        Ok(Block::For {
            key: key.map(|key| self.lexer.source[key].to_owned()),
            value: self.lexer.source[value].to_owned(),
            iterable,
        })
    }

    /// Parse the name of a section, given as identifier or string.
    fn parse_name(&mut self) -> Result<String, Error> {
        match self.next_any_must()? {
            (Token::Identifier, region) => Ok(self.lexer.source[region].to_owned()),
            (Token::String, region) => self.parse_string(region),
            (_, region) => Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help("expected a section name like `footer` or `\"footer\"`")),
        }
    }

    /// Parse an expression followed by any number of pipe helper calls.
    ///
    /// `name | prepend "hello, " | append "!" | upper`
    fn parse_pipe(&mut self) -> Result<(Node, Region), Error> {
        let (mut node, mut region) = self.parse_ternary()?;

        while self.next_is(Token::Pipe)? {
            self.next()?;
            let (_, name) = self.next_must(Token::Identifier)?;
            let (arguments, end) = self.parse_pipe_arguments()?;
            region = region.combine(end.unwrap_or(name));

            node = HelperNode::new(
                self.lexer.source[name].to_owned(),
                Some(node),
                arguments,
                name,
            )
            .into();
        }

        Ok((node, region))
    }

    /// Parse the arguments of a pipe helper call.
    ///
    /// A helper's arguments may come in two different forms, named or anonymous.
    ///
    /// Named arguments have an explicit name, which is an identifier or a
    /// keyword followed by a colon: `glue: ", "` or `as: "rows"`.
    ///
    /// Anonymous arguments are named "1", "2" and so on, in the order they
    /// appear.
    ///
    /// Arguments are literals or variables, separated by whitespace or
    /// commas. Returns the arguments and the [`Region`] of the last one.
    fn parse_pipe_arguments(&mut self) -> Result<(Vec<(String, Node)>, Option<Region>), Error> {
        let mut arguments = vec![];
        let mut anonymous = 0;
        let mut end = None;

        loop {
            match self.peek()? {
                Some((Token::Comma, _)) => {
                    self.next()?;
                    continue;
                }
                Some((
                    Token::String
                    | Token::Number
                    | Token::Identifier
                    | Token::True
                    | Token::False
                    | Token::Null
                    | Token::LeftParen
                    | Token::Operator(Operator::Add | Operator::Subtract),
                    _,
                )) => {}
                Some((Token::Keyword(keyword), _)) if keyword != Keyword::Not => {
                    let name = self.parse_keyword_name()?;
                    let (value, value_region) = self.parse_primary()?;
                    arguments.push((name, value));
                    end = Some(value_region);
                    continue;
                }
                _ => break,
            }

            let (value, region) = self.parse_primary()?;
            if self.next_is(Token::Colon)? {
                let name = self.argument_name(&value, region)?;
                self.next()?;
                let (value, value_region) = self.parse_primary()?;
                arguments.push((name, value));
                end = Some(value_region);
            } else {
                anonymous += 1;
                arguments.push((anonymous.to_string(), value));
                end = Some(region);
            }
        }

        Ok((arguments, end))
    }

    /// Parse the arguments of a call form helper, after the opening
    /// parenthesis.
    ///
    /// `join(tags, glue: ", ")`
    fn parse_call_arguments(&mut self) -> Result<(Vec<(String, Node)>, Region), Error> {
        let mut arguments = vec![];
        let mut anonymous = 0;

        while !self.next_is(Token::RightParen)? {
            if let Some((Token::Keyword(keyword), _)) = self.peek()? {
                if keyword != Keyword::Not {
                    let name = self.parse_keyword_name()?;
                    let (value, _) = self.parse_ternary()?;
                    arguments.push((name, value));

                    if !self.next_is(Token::Comma)? {
                        break;
                    }
                    self.next()?;
                    continue;
                }
            }

            let (value, region) = self.parse_ternary()?;
            if self.next_is(Token::Colon)? {
                let name = self.argument_name(&value, region)?;
                self.next()?;
                let (value, _) = self.parse_ternary()?;
                arguments.push((name, value));
            } else {
                anonymous += 1;
                arguments.push((anonymous.to_string(), value));
            }

            if !self.next_is(Token::Comma)? {
                break;
            }
            self.next()?;
        }
        let (_, end) = self.next_must(Token::RightParen)?;

        Ok((arguments, end))
    }

    /// Return the name of a named argument, which must be a plain identifier.
    fn argument_name(&self, node: &Node, region: Region) -> Result<String, Error> {
        match node {
            Node::ObjectAccessor(accessor) => match accessor.path() {
                [name] => Ok(name.clone()),
                _ => Err(self.invalid_argument_name(region)),
            },
            _ => Err(self.invalid_argument_name(region)),
        }
    }

    /// Parse a keyword used as an argument name, like `as: "zebra"`, up to
    /// and including the colon.
    fn parse_keyword_name(&mut self) -> Result<String, Error> {
        let (token, region) = self.next_any_must()?;
        let Token::Keyword(keyword) = token else {
            return Err(self.invalid_argument_name(region));
        };
        if !self.next_is(Token::Colon)? {
            return Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!(
                    "`{keyword}` is a keyword, it may only appear here as an argument name \
                    followed by a colon, like `{keyword}: value`"
                )));
        }
        self.next()?;

        Ok(keyword.to_string())
    }

    fn invalid_argument_name(&self, region: Region) -> Error {
        Error::syntax(INVALID_SYNTAX)
            .with_pointer(self.lexer.source, region)
            .with_help("argument names must be identifiers, like `glue: \", \"`")
    }

    /// Parse `condition ? then : otherwise`.
    fn parse_ternary(&mut self) -> Result<(Node, Region), Error> {
        let (condition, region) = self.parse_or()?;
        if !self.next_is(Token::Question)? {
            return Ok((condition, region));
        }
        let (_, question) = self.next_must(Token::Question)?;
        self.require(ExpressionKind::Ternary, question)?;

        let (then, _) = self.parse_ternary()?;
        self.next_must(Token::Colon)?;
        let (otherwise, end) = self.parse_ternary()?;
        let region = region.combine(end);

        Ok((
            ExpressionNode::new(Operation::Ternary, vec![condition, then, otherwise], region).into(),
            region,
        ))
    }

    fn parse_or(&mut self) -> Result<(Node, Region), Error> {
        let (mut left, mut region) = self.parse_and()?;

        while self.next_is(Token::Or)? {
            self.next()?;
            let (right, end) = self.parse_and()?;
            region = region.combine(end);
            left = ExpressionNode::new(Operation::Or, vec![left, right], region).into();
        }

        Ok((left, region))
    }

    fn parse_and(&mut self) -> Result<(Node, Region), Error> {
        let (mut left, mut region) = self.parse_comparison()?;

        while self.next_is(Token::And)? {
            self.next()?;
            let (right, end) = self.parse_comparison()?;
            region = region.combine(end);
            left = ExpressionNode::new(Operation::And, vec![left, right], region).into();
        }

        Ok((left, region))
    }

    /// Parse a single comparison, comparisons do not chain.
    fn parse_comparison(&mut self) -> Result<(Node, Region), Error> {
        let (left, region) = self.parse_additive()?;

        match self.peek()? {
            Some((Token::Operator(operator), _)) if !operator.is_math() => {
                self.next()?;
                let (right, end) = self.parse_additive()?;
                let region = region.combine(end);

                Ok((
                    ExpressionNode::new(Operation::Compare(operator), vec![left, right], region)
                        .into(),
                    region,
                ))
            }
            _ => Ok((left, region)),
        }
    }

    fn parse_additive(&mut self) -> Result<(Node, Region), Error> {
        let (mut left, mut region) = self.parse_multiplicative()?;

        while let Some((Token::Operator(operator @ (Operator::Add | Operator::Subtract)), at)) =
            self.peek()?
        {
            self.require(ExpressionKind::Math, at)?;
            self.next()?;
            let (right, end) = self.parse_multiplicative()?;
            region = region.combine(end);
            left = ExpressionNode::new(Operation::Math(operator), vec![left, right], region).into();
        }

        Ok((left, region))
    }

    fn parse_multiplicative(&mut self) -> Result<(Node, Region), Error> {
        let (mut left, mut region) = self.parse_cast()?;

        while let Some((
            Token::Operator(operator @ (Operator::Multiply | Operator::Divide | Operator::Modulo)),
            at,
        )) = self.peek()?
        {
            self.require(ExpressionKind::Math, at)?;
            self.next()?;
            let (right, end) = self.parse_cast()?;
            region = region.combine(end);
            left = ExpressionNode::new(Operation::Math(operator), vec![left, right], region).into();
        }

        Ok((left, region))
    }

    /// Parse `value as type`.
    fn parse_cast(&mut self) -> Result<(Node, Region), Error> {
        let (mut node, mut region) = self.parse_unary()?;

        while let Some((Token::Keyword(Keyword::As), at)) = self.peek()? {
            self.require(ExpressionKind::Cast, at)?;
            self.next()?;
            let (_, target) = self.next_must(Token::Identifier)?;
            let Some(cast) = CastType::from_name(&self.lexer.source[target]) else {
                return Err(Error::syntax(INVALID_SYNTAX)
                    .with_pointer(self.lexer.source, target)
                    .with_help(
                        "expected a cast type like `string`, `integer`, `float`, \
                        `boolean` or `array`",
                    ));
            };
            region = region.combine(target);
            node = ExpressionNode::new(Operation::Cast(cast), vec![node], region).into();
        }

        Ok((node, region))
    }

    /// Parse `!value` or `not value`.
    fn parse_unary(&mut self) -> Result<(Node, Region), Error> {
        match self.peek()? {
            Some((Token::Exclamation | Token::Keyword(Keyword::Not), at)) => {
                self.next()?;
                let (operand, end) = self.parse_unary()?;
                let region = at.combine(end);

                Ok((
                    ExpressionNode::new(Operation::Not, vec![operand], region).into(),
                    region,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse a literal, a variable, a call form helper or a parenthesized
    /// expression.
    ///
    /// ## Literal
    ///
    /// "hello world"
    ///
    /// -1000
    ///
    /// 10.2
    ///
    /// ## Variable
    ///
    /// person.name
    ///
    /// people[index].name
    fn parse_primary(&mut self) -> Result<(Node, Region), Error> {
        let (token, region) = self.next_any_must()?;
        let node: Node = match token {
            Token::Number => self.parse_number(region)?,
            Token::Operator(operator @ (Operator::Add | Operator::Subtract)) => {
                let (_, number) = self.next_must(Token::Number)?;

                // -1000 | +1000  <- valid, negative/positive numbers
                // - 1000 | + 1000<- invalid
                if !region.is_neighbor(number) {
                    return Err(Error::syntax(UNEXPECTED_TOKEN)
                        .with_pointer(self.lexer.source, region)
                        .with_help(format!(
                            "if you want to indicate that {} is a positive or negative number \
                            try removing the separating whitespace",
                            &self.lexer.source[number]
                        )));
                }

                let region = region.combine(number);
                let node = match operator {
                    Operator::Subtract => self.parse_number(region)?,
                    _ => self.parse_number(number)?,
                };

                return Ok((node, region));
            }
            Token::String => LiteralNode::new(Value::String(self.parse_string(region)?)).into(),
            Token::True => LiteralNode::new(Value::Bool(true)).into(),
            Token::False => LiteralNode::new(Value::Bool(false)).into(),
            Token::Null => LiteralNode::new(Value::Null).into(),
            Token::LeftParen => {
                let (node, _) = self.parse_pipe()?;
                let (_, end) = self.next_must(Token::RightParen)?;

                return Ok((node, region.combine(end)));
            }
            Token::Identifier if self.next_is(Token::LeftParen)? => {
                self.next()?;
                let (arguments, end) = self.parse_call_arguments()?;
                let name = self.lexer.source[region].to_owned();

                return Ok((
                    HelperNode::new(name, None, arguments, region).into(),
                    region.combine(end),
                ));
            }
            Token::Identifier => return self.parse_accessor(region),
            Token::EndExpression | Token::EndBlock => {
                return Err(Error::syntax(UNEXPECTED_TOKEN)
                    .with_pointer(self.lexer.source, region)
                    .with_help("expected a value before the end of the tag"))
            }
            _ => {
                return Err(Error::syntax(UNEXPECTED_TOKEN)
                    .with_pointer(self.lexer.source, region)
                    .with_help(
                        "expected a value like `\"text\"`, `12`, `true`, `null`, \
                        or a variable like `user.name`",
                    ))
            }
        };

        Ok((node, region))
    }

    /// Parse the path of a variable that begins with the identifier at the
    /// given [`Region`].
    ///
    /// A path made of plain keys becomes an [`ObjectAccessorNode`], a path
    /// with a computed key a [`VariableAccessorNode`].
    fn parse_accessor(&mut self, begin: Region) -> Result<(Node, Region), Error> {
        let name = self.lexer.source[begin].to_owned();
        let mut segments: Vec<Segment> = vec![];
        let mut region = begin;

        loop {
            match self.peek()? {
                Some((Token::Period, _)) => {
                    self.next()?;
                    let (token, key) = self.next_any_must()?;
                    match token {
                        // `items.0.1` is lexed as the number `0.1`.
                        Token::Number => segments.extend(
                            self.lexer.source[key]
                                .split('.')
                                .map(|part| Segment::Name(part.to_owned())),
                        ),
                        Token::Identifier
                        | Token::Keyword(_)
                        | Token::True
                        | Token::False
                        | Token::Null => {
                            segments.push(Segment::Name(self.lexer.source[key].to_owned()))
                        }
                        _ => {
                            return Err(Error::syntax(UNEXPECTED_TOKEN)
                                .with_pointer(self.lexer.source, key)
                                .with_help("expected a key such as `name` in `user.name`"))
                        }
                    }
                    region = region.combine(key);
                }
                Some((Token::LeftBracket, _)) => {
                    self.next()?;
                    let (key, _) = self.parse_ternary()?;
                    let (_, end) = self.next_must(Token::RightBracket)?;
                    region = region.combine(end);

                    let fixed = match &key {
                        Node::Literal(literal) => match literal.value() {
                            Value::String(string) => Some(string.clone()),
                            Value::Number(number) => Some(number.to_string()),
                            _ => None,
                        },
                        _ => None,
                    };
                    segments.push(match fixed {
                        Some(name) => Segment::Name(name),
                        None => Segment::Dynamic(key),
                    });
                }
                _ => break,
            }
        }

        if segments.iter().all(|segment| matches!(segment, Segment::Name(_))) {
            let mut path = vec![name];
            path.extend(segments.into_iter().filter_map(|segment| match segment {
                Segment::Name(name) => Some(name),
                Segment::Dynamic(_) => None,
            }));

            return Ok((ObjectAccessorNode::new(path, region).into(), region));
        }

        Ok((
            VariableAccessorNode::new(name, segments, region).into(),
            region,
        ))
    }

    /// Parse a Keyword.
    ///
    /// # Errors
    ///
    /// Returns an error if the next token is not a Keyword.
    fn parse_keyword(&mut self) -> Result<(Keyword, Region), Error> {
        match self.next_any_must()? {
            (Token::Keyword(keyword), region) => Ok((keyword, region)),
            (token, region) => Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(expected_keyword(token))),
        }
    }

    /// Return an error unless the [`ExpressionKind`] is enabled.
    fn require(&self, kind: ExpressionKind, region: Region) -> Result<(), Error> {
        if self.configuration.allows(kind) {
            return Ok(());
        }

        Err(Error::syntax(DISABLED_EXPRESSION)
            .with_pointer(self.lexer.source, region)
            .with_help(format!(
                "{kind} expressions are not enabled for this rendering context"
            )))
    }

    /// Parse a String from the literal value of the given Region.
    ///
    /// # Errors
    ///
    /// Returns an error if an unrecognized escape character is found.
    fn parse_string(&self, region: Region) -> Result<String, Error> {
        let window = &self.lexer.source[region];
        let inner = &window[1..window.len() - 1];
        if !inner.contains('\\') {
            return Ok(inner.to_owned());
        }

        let mut string = String::with_capacity(inner.len());
        let mut iter = inner.chars();
        while let Some(c) = iter.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            let c = match iter.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some('\\') => '\\',
                Some('"') => '"',
                _ => {
                    return Err(Error::syntax("unexpected escape character")
                        .with_pointer(self.lexer.source, region)
                        .with_help("recognized escapes are `\\n`, `\\r`, `\\t`, `\\\\` and `\\\"`"))
                }
            };
            string.push(c);
        }

        Ok(string)
    }

    /// Return a [`LiteralNode`] holding the number at the given [`Region`].
    ///
    /// # Errors
    ///
    /// Returns an error if the literal value of the Region cannot be converted
    /// to a Value::Number.
    fn parse_number(&self, region: Region) -> Result<Node, Error> {
        let number: Number = self.lexer.source[region].parse().map_err(|_| {
            Error::syntax("unrecognizable number")
                .with_pointer(self.lexer.source, region)
                .with_help(format!(
                    "numbers may begin with `{}` to indicate a negative \
                    number and must not end with a decimal",
                    Operator::Subtract
                ))
        })?;

        Ok(LiteralNode::new(Value::Number(number)).into())
    }

    /// Peek the next token.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the underlying Lexer.
    fn peek(&mut self) -> LexResult {
        match self.buffer {
            Some(next) => Ok(next),
            None => {
                let next = self.lexer.next()?;
                self.buffer = Some(next);

                Ok(next)
            }
        }
    }

    /// Get the next token.
    ///
    /// Prefers to pull a token from the internal buffer first, but will pull from
    /// the lexer when the buffer is empty.
    fn next(&mut self) -> LexResult {
        match self.buffer.take() {
            Some(next) => Ok(next),
            None => self.lexer.next(),
        }
    }

    /// Returns true if the given token matches the upcoming token.
    ///
    /// # Errors
    ///
    /// Propagates any errors reported by the underlying lexer.
    fn next_is(&mut self, expect: Token) -> Result<bool, Error> {
        Ok(self
            .peek()?
            .map(|(token, _)| token == expect)
            .unwrap_or(false))
    }

    /// Get the next token, and compare it to the given token.
    ///
    /// # Errors
    ///
    /// An error is returned if the next token does not match the given token,
    /// or when [next()] returns None.
    fn next_must(&mut self, expect: Token) -> LexResultMust {
        match self.next()? {
            Some((token, region)) if token == expect => Ok((token, region)),
            Some((_, region)) => Err(Error::syntax(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!("expected {expect}"))),
            None => Err(error_eof(self.lexer.source).with_help(format!("expected {expect}"))),
        }
    }

    /// Get the next token.
    ///
    /// Similar to "next()" but requires that a token is returned.
    ///
    /// # Errors
    ///
    /// An error is returned if no more tokens are left.
    fn next_any_must(&mut self) -> LexResultMust {
        match self.next()? {
            Some(next) => Ok(next),
            None => Err(error_eof(self.lexer.source)),
        }
    }
}

/// Merge neighboring text nodes and drop empty ones.
fn compact(nodes: Vec<Node>) -> Vec<Node> {
    let mut compacted: Vec<Node> = Vec::with_capacity(nodes.len());

    for node in nodes {
        match (compacted.last_mut(), node) {
            (_, Node::Text(text)) if text.text().is_empty() => {}
            (Some(Node::Text(previous)), Node::Text(text)) => previous.push_str(text.text()),
            (_, node) => compacted.push(node),
        }
    }

    compacted
}

/// Return a root node holding the nodes of a finished scope.
fn close_scope(children: Vec<Node>) -> Result<Node, Error> {
    let mut root = Node::from(RootNode::new());
    root.set_children(children)?;

    Ok(root)
}
