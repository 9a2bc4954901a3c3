//! Override identity: a method's name, `const` qualification and argument
//! types.

use std::fmt;
use std::hash::{Hash, Hasher};

use serbridge_core::{BoundTemplate, QualifiedName, Substitution};

/// The declaration a selector was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodOrigin {
    pub class: QualifiedName,
    /// Position among the class's member declarations.
    pub index: usize,
}

/// Structural identity of a method signature at one point in a hierarchy.
///
/// Two selectors are equal when their overridable identity matches: same
/// name, same `const` qualification, same argument types. The declaring
/// type, the return type and the origin do not take part, so a covariant
/// override has the same selector as the method it overrides.
#[derive(Debug, Clone)]
pub struct OverrideSelector {
    declaring_type: BoundTemplate,
    name: String,
    is_const: bool,
    argument_types: Vec<BoundTemplate>,
    return_type: BoundTemplate,
    origin: Option<MethodOrigin>,
}

impl OverrideSelector {
    pub fn new(
        declaring_type: BoundTemplate,
        name: impl Into<String>,
        is_const: bool,
        argument_types: Vec<BoundTemplate>,
        return_type: BoundTemplate,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            is_const,
            argument_types,
            return_type,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: MethodOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The class the method is declared on, with its own parameters.
    pub fn declaring_type(&self) -> &BoundTemplate {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn argument_types(&self) -> &[BoundTemplate] {
        &self.argument_types
    }

    pub fn return_type(&self) -> &BoundTemplate {
        &self.return_type
    }

    /// Where the selector was declared, when known.
    pub fn origin(&self) -> Option<&MethodOrigin> {
        self.origin.as_ref()
    }

    /// Apply `substitution` to every type position. The origin is kept.
    pub fn rebind(&self, substitution: &Substitution) -> Self {
        Self {
            declaring_type: self.declaring_type.rebind(substitution),
            name: self.name.clone(),
            is_const: self.is_const,
            argument_types: self
                .argument_types
                .iter()
                .map(|ty| ty.rebind(substitution))
                .collect(),
            return_type: self.return_type.rebind(substitution),
            origin: self.origin.clone(),
        }
    }
}

impl PartialEq for OverrideSelector {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.is_const == other.is_const
            && self.argument_types == other.argument_types
    }
}

impl Eq for OverrideSelector {}

impl Hash for OverrideSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.is_const.hash(state);
        self.argument_types.hash(state);
    }
}

impl fmt::Display for OverrideSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_type, self.name)?;
        for (i, ty) in self.argument_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, ")")?;
        if self.is_const {
            write!(f, " const")?;
        }
        write!(f, " -> {}", self.return_type)
    }
}
