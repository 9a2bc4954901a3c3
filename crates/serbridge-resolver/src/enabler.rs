//! Derivation expressions, enabler clauses and template parameter lists.
//!
//! These are the rendering-facing values produced by the method generics
//! resolver. Each renders to target-language text through a [`NameMangler`],
//! but the resolver itself never interpolates method bodies.

use std::fmt;

use serbridge_core::{BoundTemplate, NameMangler, TemplateSelector, Wildcard};

/// How to recover a method generic from one argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Derivation {
    /// Position of the source argument.
    pub argument: usize,
    /// Binding-override variable of that argument.
    pub variable: String,
    /// Path from the argument's type to the generic.
    pub selector: TemplateSelector,
}

impl Derivation {
    /// Render as a dependent-type lookup on the decayed argument type.
    pub fn render(&self, names: &NameMangler) -> String {
        self.selector.render(
            &format!("std::decay_t<{}>", self.variable),
            names.support_namespace(),
        )
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.selector)
    }
}

/// One conjunct of an enabler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnablerClause {
    /// The derived generic satisfies its declared bounds.
    Satisfies { parameter: String, bound: Wildcard },
    /// The declared parameter type can be constructed from the actual argument.
    Constructible {
        parameter_type: BoundTemplate,
        argument: String,
        is_const: bool,
    },
}

impl EnablerClause {
    pub fn render(&self, names: &NameMangler) -> String {
        let ns = names.support_namespace();
        match self {
            EnablerClause::Satisfies { parameter, bound } => format!(
                "{ns}::satisfies_v<{parameter}, {}>",
                BoundTemplate::wildcard(bound.clone()).to_cpp(ns)
            ),
            EnablerClause::Constructible {
                parameter_type,
                argument,
                is_const,
            } => {
                let source = if *is_const {
                    format!("const {argument}&")
                } else {
                    format!("{argument}&&")
                };
                format!(
                    "std::is_constructible_v<{}, {source}>",
                    parameter_type.strip_const().to_cpp(ns)
                )
            }
        }
    }
}

impl fmt::Display for EnablerClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnablerClause::Satisfies { parameter, bound } => {
                write!(f, "{parameter} satisfies {}", BoundTemplate::wildcard(bound.clone()))
            }
            EnablerClause::Constructible {
                parameter_type,
                argument,
                ..
            } => write!(f, "{parameter_type} constructible from {argument}"),
        }
    }
}

/// Conjunction gating a generic method instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Enabler {
    clauses: Vec<EnablerClause>,
}

impl Enabler {
    pub fn new(clauses: Vec<EnablerClause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[EnablerClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as an `enable_if` over the conjunction.
    pub fn render(&self, names: &NameMangler) -> String {
        let condition = if self.clauses.is_empty() {
            "true".to_string()
        } else {
            self.clauses
                .iter()
                .map(|clause| clause.render(names))
                .collect::<Vec<_>>()
                .join(" && ")
        };
        format!("std::enable_if_t<{condition}>")
    }
}

/// Default value of a template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamDefault {
    /// No default; supplied by the call.
    None,
    /// The "derive me" marker.
    Sentinel,
    /// The explicit generic if given, otherwise the derivation.
    Derived {
        generic: String,
        derivation: Derivation,
    },
    /// The enabler.
    Enabler(Enabler),
}

/// One template parameter of a generated method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateParam {
    pub name: String,
    pub default: ParamDefault,
}

impl TemplateParam {
    pub fn render(&self, names: &NameMangler) -> String {
        let ns = names.support_namespace();
        match &self.default {
            ParamDefault::None => format!("typename {}", self.name),
            ParamDefault::Sentinel => {
                format!("typename {} = {}", self.name, names.derive_sentinel())
            }
            ParamDefault::Derived {
                generic,
                derivation,
            } => format!(
                "typename {} = {ns}::derive_or_t<{generic}, {}>",
                self.name,
                derivation.render(names)
            ),
            ParamDefault::Enabler(enabler) => {
                format!("typename {} = {}", self.name, enabler.render(names))
            }
        }
    }
}
