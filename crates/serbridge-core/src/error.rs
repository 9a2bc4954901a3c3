//! Unified error types for serbridge.
//!
//! Every error in the type model is a fatal configuration or derivation
//! error: a single malformed class aborts the whole generation run.
//!
//! ## Error Hierarchy
//!
//! ```text
//! SerbridgeError (top-level wrapper)
//! ├── ParseError        - Type expression errors (with ParseErrorKind)
//! ├── SelectorError     - Template selector construction errors
//! ├── RegistrationError - Class registry and phase errors
//! └── ResolveError      - Generics resolution and override validation errors
//! ```

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of type expression errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A token appeared where it is not allowed.
    UnexpectedToken,
    /// The expression ended early.
    UnexpectedEof,
    /// A `<` template list was not closed.
    UnterminatedTemplateList,
    /// A `[` was not followed by `]`.
    UnterminatedArray,
    /// A name is neither an in-scope variable nor a known class.
    UnknownName,
    /// A wildcard appeared where a name is required.
    WildcardNotAllowed,
    /// A template list length differs from the class's declared arity.
    ArityMismatch,
    /// Input remained after a complete type expression.
    TrailingInput,
    /// `this` was used without a self binding.
    MissingSelf,
    /// A character outside the grammar.
    UnexpectedChar,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::UnterminatedTemplateList => "unterminated template list",
            ParseErrorKind::UnterminatedArray => "unterminated array brackets",
            ParseErrorKind::UnknownName => "unknown name",
            ParseErrorKind::WildcardNotAllowed => "wildcard not allowed",
            ParseErrorKind::ArityMismatch => "template arity mismatch",
            ParseErrorKind::TrailingInput => "trailing input",
            ParseErrorKind::MissingSelf => "no binding for 'this'",
            ParseErrorKind::UnexpectedChar => "unexpected character",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A type expression error with location and the unparsed remainder.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message} (remaining: '{remainder}')")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// Where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
    /// The source text from the offending token to the end of input.
    pub remainder: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(
        kind: ParseErrorKind,
        span: Span,
        message: impl Into<String>,
        remainder: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            remainder: remainder.into(),
        }
    }

    /// Format the error with the source expression and a caret under the
    /// offending fragment.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!("error at {}: {}\n", self.span, self.kind);
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }
        if let Some(line_text) = source.lines().nth(self.span.line.saturating_sub(1) as usize) {
            output.push_str(&format!("  | {line_text}\n"));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {indent}{pointer}\n"));
        }
        output
    }
}

// ============================================================================
// Selector Errors
// ============================================================================

/// Errors raised while computing a template selector path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// A binding step indexes past the base type's generic arity.
    #[error("binding index {index} out of bounds for '{type_name}' with {arity} generic parameter(s)")]
    IndexOutOfBounds {
        index: usize,
        type_name: String,
        arity: usize,
    },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised by the class registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A different descriptor was registered under an existing name.
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// A class was requested after finalization began without being registered.
    #[error("{name} not in list of classes during post processing")]
    NotRegistered { name: String },

    /// A class could not be found by discovery while collecting.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// An operation was attempted in the wrong phase.
    #[error("cannot {operation} while {phase}")]
    PhaseViolation {
        operation: &'static str,
        phase: &'static str,
    },

    /// The inheritance graph contains a cycle.
    #[error("circular inheritance involving '{0}'")]
    CircularInheritance(String),

    /// A super type or interface is not usable as one.
    #[error("'{class}' cannot inherit from '{supertype}': {reason}")]
    InvalidSupertype {
        class: String,
        supertype: String,
        reason: String,
    },
}

// ============================================================================
// Resolve Errors
// ============================================================================

/// Errors raised while building class models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// A generic parameter's bound transitively references itself.
    #[error("cyclic generic dependency on '{name}'")]
    CyclicGenericDependency { name: String },

    /// The same generic parameter name is declared twice.
    #[error("duplicate generic parameter '{name}' in {owner}")]
    DuplicateGeneric { owner: String, name: String },

    /// Argument names and argument types have different lengths.
    #[error("method '{method}' declares {names} argument name(s) but {types} argument type(s)")]
    ArgumentArityMismatch {
        method: String,
        names: usize,
        types: usize,
    },

    /// A method generic cannot be derived from any argument.
    #[error("generic '{name}' of method '{method}' cannot be derived from any argument")]
    UnresolvableGeneric { method: String, name: String },

    /// Several arguments yield different derivations for the same generic.
    #[error("generic '{name}' of method '{method}' has divergent derivations: {}", candidates.join(" | "))]
    AmbiguousDerivation {
        method: String,
        name: String,
        candidates: Vec<String>,
    },

    /// An override violates the override rules.
    #[error("invalid override of '{overridden}' by '{method}': {reason}")]
    InvalidOverride {
        method: String,
        overridden: String,
        reason: String,
    },

    /// A selector could not be built.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A type expression attached to a class failed to parse.
    #[error("in {class} ({context}): {source}")]
    InvalidTypeExpression {
        class: String,
        context: String,
        #[source]
        source: ParseError,
    },

    /// A registry operation failed while resolving.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

// ============================================================================
// Top-level Error
// ============================================================================

/// The unified error type for all serbridge operations.
///
/// Each variant uses `#[from]` so phase errors convert with `?`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SerbridgeError {
    /// A type expression error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A selector error.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A registry error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A resolution error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl SerbridgeError {
    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, SerbridgeError::Parse(_))
    }

    /// Check if this is a registration error.
    pub fn is_registration(&self) -> bool {
        matches!(self, SerbridgeError::Registration(_))
    }

    /// Check if this is a resolution error.
    pub fn is_resolve(&self) -> bool {
        matches!(self, SerbridgeError::Resolve(_))
    }
}
