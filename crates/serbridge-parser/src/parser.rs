//! Recursive-descent parser for type expressions.
//!
//! ```text
//! type      := 'const'? primary ('[' ']')*
//! primary   := wildcard | 'this' | qualified ('<' type (',' type)* '>')?
//! wildcard  := '?' (('extends' | 'super') bound ('&' bound)*)?
//! bound     := type            -- never itself a wildcard
//! qualified := IDENT ('.' IDENT)*
//! ```
//!
//! Array folding and `const` collapsing are applied while parsing, through
//! the [`BoundTemplate`] constructors.

use serbridge_core::{
    BoundTemplate, ClassRef, ParseError, ParseErrorKind, QualifiedName, Substitution, Wildcard,
};

use crate::lexer::{Lexer, Token, TokenKind};

/// Resolves qualified names to classes while parsing.
///
/// Resolution may have side effects (lazily registering the class), hence
/// `&mut self`.
pub trait ClassResolver {
    /// Look up a class by name; `None` means the name is unknown.
    fn resolve_class(&mut self, name: &QualifiedName) -> Option<ClassRef>;
}

impl<F> ClassResolver for F
where
    F: FnMut(&QualifiedName) -> Option<ClassRef>,
{
    fn resolve_class(&mut self, name: &QualifiedName) -> Option<ClassRef> {
        self(name)
    }
}

/// Parser for a single type expression.
///
/// # Example
///
/// ```
/// use serbridge_core::{BoundTemplate, ClassKind, ClassRef, QualifiedName, Substitution};
/// use serbridge_parser::TypeParser;
///
/// let boxed = ClassRef::new(QualifiedName::global("Box"), ClassKind::Class, vec!["T".into()]);
/// let mut resolve = |name: &QualifiedName| (name.simple_name() == "Box").then(|| boxed.clone());
///
/// let mut vars = Substitution::default();
/// vars.insert("T".into(), BoundTemplate::variable("T"));
///
/// let ty = TypeParser::new("Box<T>", &mut resolve)
///     .with_variables(&vars)
///     .parse()
///     .unwrap();
/// assert_eq!(ty, BoundTemplate::class(boxed.clone(), vec![BoundTemplate::variable("T")]));
/// ```
pub struct TypeParser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    resolver: &'a mut dyn ClassResolver,
    variables: Option<&'a Substitution>,
    this: Option<&'a BoundTemplate>,
}

impl<'a> TypeParser<'a> {
    /// Create a parser over `source` resolving class names through `resolver`.
    pub fn new(source: &'a str, resolver: &'a mut dyn ClassResolver) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            resolver,
            variables: None,
            this: None,
        }
    }

    /// In-scope generic parameters; a bare name found here yields its binding.
    pub fn with_variables(mut self, variables: &'a Substitution) -> Self {
        self.variables = Some(variables);
        self
    }

    /// The binding the `this` keyword stands for.
    pub fn with_this(mut self, this: &'a BoundTemplate) -> Self {
        self.this = Some(this);
        self
    }

    /// Parse the whole input as one type expression.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(mut self) -> Result<BoundTemplate, ParseError> {
        let ty = self.parse_type()?;
        let next = self.lexer.peek();
        if next.kind != TokenKind::Eof {
            return Err(self.error(
                ParseErrorKind::TrailingInput,
                &next,
                format!("unexpected {} after complete type", next.kind),
            ));
        }
        Ok(ty)
    }

    fn parse_type(&mut self) -> Result<BoundTemplate, ParseError> {
        let is_const = self.lexer.eat(TokenKind::Const).is_some();
        let start = self.lexer.peek();
        let primary = self.parse_primary()?;

        let extents = self.parse_array_suffix()?;
        if extents > 0 && matches!(primary, BoundTemplate::Any(_)) {
            return Err(self.error(
                ParseErrorKind::WildcardNotAllowed,
                &start,
                "a wildcard cannot be an array element",
            ));
        }

        let ty = BoundTemplate::array(primary, extents);
        Ok(if is_const {
            BoundTemplate::constant(ty)
        } else {
            ty
        })
    }

    fn parse_primary(&mut self) -> Result<BoundTemplate, ParseError> {
        let token = self.lexer.peek();
        match token.kind {
            TokenKind::Question => self.parse_wildcard(),
            TokenKind::This => {
                self.lexer.next_token();
                match self.this {
                    Some(this) => Ok(this.clone()),
                    None => Err(self.error(
                        ParseErrorKind::MissingSelf,
                        &token,
                        "'this' is not available here",
                    )),
                }
            }
            TokenKind::Identifier => self.parse_named(),
            TokenKind::Eof => Err(self.error(
                ParseErrorKind::UnexpectedEof,
                &token,
                "expected a type",
            )),
            TokenKind::Error => Err(self.error(
                ParseErrorKind::UnexpectedChar,
                &token,
                format!("unexpected character '{}'", token.lexeme),
            )),
            _ => Err(self.error(
                ParseErrorKind::UnexpectedToken,
                &token,
                format!("expected a type, found {}", token.kind),
            )),
        }
    }

    fn parse_wildcard(&mut self) -> Result<BoundTemplate, ParseError> {
        self.lexer.next_token();
        let wildcard = if self.lexer.eat(TokenKind::Extends).is_some() {
            Wildcard::extends(self.parse_bounds()?)
        } else if self.lexer.eat(TokenKind::Super).is_some() {
            Wildcard::super_of(self.parse_bounds()?)
        } else {
            Wildcard::unbounded()
        };
        Ok(BoundTemplate::wildcard(wildcard))
    }

    fn parse_bounds(&mut self) -> Result<Vec<BoundTemplate>, ParseError> {
        let mut bounds = Vec::new();
        loop {
            let token = self.lexer.peek();
            if token.kind == TokenKind::Question {
                return Err(self.error(
                    ParseErrorKind::WildcardNotAllowed,
                    &token,
                    "a wildcard bound must name a type",
                ));
            }
            bounds.push(self.parse_type()?);
            if self.lexer.eat(TokenKind::Amp).is_none() {
                return Ok(bounds);
            }
        }
    }

    fn parse_named(&mut self) -> Result<BoundTemplate, ParseError> {
        let first = self.lexer.next_token();
        let mut segments = vec![first.lexeme.to_string()];
        while self.lexer.eat(TokenKind::Dot).is_some() {
            let next = self.lexer.next_token();
            if next.kind != TokenKind::Identifier {
                let kind = if next.kind == TokenKind::Eof {
                    ParseErrorKind::UnexpectedEof
                } else {
                    ParseErrorKind::UnexpectedToken
                };
                return Err(self.error(
                    kind,
                    &next,
                    format!("expected a name segment, found {}", next.kind),
                ));
            }
            segments.push(next.lexeme.to_string());
        }

        let has_arguments = self.lexer.peek().kind == TokenKind::Less;

        if segments.len() == 1 {
            if let Some(binding) = self.variables.and_then(|vars| vars.get(&segments[0])) {
                if has_arguments {
                    let less = self.lexer.peek();
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken,
                        &less,
                        format!("generic parameter '{}' cannot take template arguments", segments[0]),
                    ));
                }
                return Ok(binding.clone());
            }
        }

        let name = match segments.pop() {
            Some(last) => QualifiedName::new(last, segments),
            None => QualifiedName::global(first.lexeme),
        };
        let Some(class) = self.resolver.resolve_class(&name) else {
            return Err(self.error(
                ParseErrorKind::UnknownName,
                &first,
                format!("'{name}' is neither a generic parameter nor a known class"),
            ));
        };

        let bindings = if has_arguments {
            self.parse_template_list()?
        } else {
            Vec::new()
        };
        if !bindings.is_empty() && bindings.len() != class.arity() {
            return Err(self.error(
                ParseErrorKind::ArityMismatch,
                &first,
                format!(
                    "'{name}' declares {} generic parameter(s) but {} were given",
                    class.arity(),
                    bindings.len()
                ),
            ));
        }

        Ok(BoundTemplate::class(class, bindings))
    }

    fn parse_template_list(&mut self) -> Result<Vec<BoundTemplate>, ParseError> {
        self.lexer.next_token();
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type()?);
            let next = self.lexer.next_token();
            match next.kind {
                TokenKind::Comma => continue,
                TokenKind::Greater => return Ok(arguments),
                TokenKind::Eof => {
                    return Err(self.error(
                        ParseErrorKind::UnterminatedTemplateList,
                        &next,
                        "template list is missing its closing '>'",
                    ));
                }
                _ => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken,
                        &next,
                        format!("expected ',' or '>', found {}", next.kind),
                    ));
                }
            }
        }
    }

    fn parse_array_suffix(&mut self) -> Result<usize, ParseError> {
        let mut extents = 0;
        while let Some(open) = self.lexer.eat(TokenKind::LeftBracket) {
            if self.lexer.eat(TokenKind::RightBracket).is_none() {
                return Err(self.error(
                    ParseErrorKind::UnterminatedArray,
                    &open,
                    "expected ']'",
                ));
            }
            extents += 1;
        }
        Ok(extents)
    }

    fn error(&self, kind: ParseErrorKind, at: &Token<'_>, message: impl Into<String>) -> ParseError {
        let remainder = self.source.get(at.offset as usize..).unwrap_or_default();
        ParseError::new(kind, at.span, message, remainder)
    }
}

/// Parse `source` with the given in-scope variables.
pub fn parse_type(
    source: &str,
    variables: &Substitution,
    resolver: &mut dyn ClassResolver,
) -> Result<BoundTemplate, ParseError> {
    TypeParser::new(source, resolver)
        .with_variables(variables)
        .parse()
}
