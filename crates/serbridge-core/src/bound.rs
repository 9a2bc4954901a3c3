//! The template binding model.
//!
//! A [`BoundTemplate`] is the structural representation of a type position:
//! a generic parameter reference, a (possibly generic) class instantiation,
//! an array, a wildcard, or a `const`-qualified type. Values are immutable
//! and compare structurally.
//!
//! Two construction invariants are enforced by the smart constructors and
//! re-applied by [`BoundTemplate::rebind`]:
//!
//! - arrays never nest: an array of arrays collapses into one node with the
//!   summed extents, and a `const` array element is hoisted to a `const`
//!   around the folded array
//! - `const` never nests: `const const T` collapses into `const T`

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::{ClassRef, QualifiedName};

/// Map from generic parameter name to its replacement.
pub type Substitution = FxHashMap<String, BoundTemplate>;

/// A fully or partially instantiated generic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundTemplate {
    /// An unresolved reference to a generic parameter.
    Variable(VariableBinding),
    /// A class instantiated with an ordered list of bindings (possibly empty).
    Class(ClassBinding),
    /// An array with one or more extents.
    Array(ArrayBinding),
    /// An unbound position constrained by lower and upper bounds.
    Any(Wildcard),
    /// A `const`-qualified type.
    Const(ConstBinding),
}

/// Reference to a generic parameter by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableBinding {
    name: String,
}

impl VariableBinding {
    /// The referenced parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A class instantiated with bindings for its generic parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassBinding {
    class: ClassRef,
    bindings: Vec<BoundTemplate>,
}

impl ClassBinding {
    /// The instantiated class.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// The bindings, one per generic parameter (empty for non-generic or raw uses).
    pub fn bindings(&self) -> &[BoundTemplate] {
        &self.bindings
    }

    /// A generic class used without bindings.
    pub fn is_raw(&self) -> bool {
        self.bindings.is_empty() && self.class.is_generic()
    }

    /// Map the class's declared parameter names to this instantiation's bindings.
    ///
    /// Returns an empty substitution for raw or non-generic uses.
    pub fn substitution(&self) -> Substitution {
        self.class
            .params()
            .iter()
            .cloned()
            .zip(self.bindings.iter().cloned())
            .collect()
    }
}

/// An array of `element` with `extents` dimensions.
///
/// `element` is never itself an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayBinding {
    element: Box<BoundTemplate>,
    extents: usize,
}

impl ArrayBinding {
    /// The (non-array) element type.
    pub fn element(&self) -> &BoundTemplate {
        &self.element
    }

    /// Number of dimensions.
    pub fn extents(&self) -> usize {
        self.extents
    }
}

/// An unbound position (`?`) with lower (`super`) and upper (`extends`) bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Wildcard {
    super_types: Vec<BoundTemplate>,
    extend_types: Vec<BoundTemplate>,
}

impl Wildcard {
    /// Create a wildcard from lower and upper bounds.
    ///
    /// Bounds that are themselves wildcards are flattened into this one and
    /// duplicate bounds are dropped, keeping first occurrence order.
    pub fn new(super_types: Vec<BoundTemplate>, extend_types: Vec<BoundTemplate>) -> Self {
        let mut wildcard = Self::default();
        for ty in extend_types {
            wildcard.push_extends(ty);
        }
        for ty in super_types {
            wildcard.push_super(ty);
        }
        wildcard
    }

    /// The unconstrained wildcard `?`.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `? extends A & B ...`
    pub fn extends(bounds: Vec<BoundTemplate>) -> Self {
        Self::new(Vec::new(), bounds)
    }

    /// `? super A ...`
    pub fn super_of(bounds: Vec<BoundTemplate>) -> Self {
        Self::new(bounds, Vec::new())
    }

    /// Lower bounds.
    pub fn super_types(&self) -> &[BoundTemplate] {
        &self.super_types
    }

    /// Upper bounds.
    pub fn extend_types(&self) -> &[BoundTemplate] {
        &self.extend_types
    }

    /// Whether the wildcard carries no bounds at all.
    pub fn is_unbounded(&self) -> bool {
        self.super_types.is_empty() && self.extend_types.is_empty()
    }

    /// Substitute variables inside the bounds.
    pub fn rebind(&self, substitution: &Substitution) -> Self {
        Self::new(
            self.super_types
                .iter()
                .map(|ty| ty.rebind(substitution))
                .collect(),
            self.extend_types
                .iter()
                .map(|ty| ty.rebind(substitution))
                .collect(),
        )
    }

    fn push_extends(&mut self, ty: BoundTemplate) {
        match ty {
            // Only the upper bounds of a nested wildcard constrain this one.
            BoundTemplate::Any(inner) => {
                for bound in inner.extend_types {
                    self.push_extends(bound);
                }
            }
            other => {
                if !self.extend_types.contains(&other) {
                    self.extend_types.push(other);
                }
            }
        }
    }

    fn push_super(&mut self, ty: BoundTemplate) {
        match ty {
            BoundTemplate::Any(inner) => {
                for bound in inner.super_types {
                    self.push_super(bound);
                }
            }
            other => {
                if !self.super_types.contains(&other) {
                    self.super_types.push(other);
                }
            }
        }
    }
}

/// A `const`-qualified type. The inner type is never itself `const`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstBinding {
    inner: Box<BoundTemplate>,
}

impl ConstBinding {
    /// The qualified type.
    pub fn inner(&self) -> &BoundTemplate {
        &self.inner
    }
}

impl BoundTemplate {
    /// Reference a generic parameter.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(VariableBinding { name: name.into() })
    }

    /// Instantiate `class` with `bindings`.
    pub fn class(class: ClassRef, bindings: Vec<BoundTemplate>) -> Self {
        Self::Class(ClassBinding { class, bindings })
    }

    /// A class used without bindings.
    pub fn simple(class: ClassRef) -> Self {
        Self::class(class, Vec::new())
    }

    /// An array of `element` with `extents` dimensions.
    ///
    /// If `element` is already an array the extents are summed into a single
    /// node. A `const` array element moves the `const` outward before
    /// folding. Zero extents yield `element` unchanged.
    pub fn array(element: BoundTemplate, extents: usize) -> Self {
        if extents == 0 {
            return element;
        }
        match element {
            BoundTemplate::Array(inner) => Self::Array(ArrayBinding {
                element: inner.element,
                extents: inner.extents + extents,
            }),
            BoundTemplate::Const(qualified) if qualified.inner.as_array().is_some() => {
                Self::constant(Self::array(*qualified.inner, extents))
            }
            other => Self::Array(ArrayBinding {
                element: Box::new(other),
                extents,
            }),
        }
    }

    /// A wildcard position.
    pub fn wildcard(wildcard: Wildcard) -> Self {
        Self::Any(wildcard)
    }

    /// The unconstrained wildcard `?`.
    pub fn any() -> Self {
        Self::Any(Wildcard::unbounded())
    }

    /// `const`-qualify `inner`; qualifying an already `const` type is a no-op.
    pub fn constant(inner: BoundTemplate) -> Self {
        match inner {
            already @ BoundTemplate::Const(_) => already,
            other => Self::Const(ConstBinding {
                inner: Box::new(other),
            }),
        }
    }

    /// Names of all generic parameters referenced anywhere in this template.
    ///
    /// Empty for fully bound templates.
    pub fn unresolved_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_unresolved(&mut names);
        names
    }

    fn collect_unresolved(&self, names: &mut BTreeSet<String>) {
        match self {
            BoundTemplate::Variable(var) => {
                names.insert(var.name.clone());
            }
            BoundTemplate::Class(class) => {
                for binding in &class.bindings {
                    binding.collect_unresolved(names);
                }
            }
            BoundTemplate::Array(array) => array.element.collect_unresolved(names),
            BoundTemplate::Any(wildcard) => {
                for bound in wildcard.super_types.iter().chain(&wildcard.extend_types) {
                    bound.collect_unresolved(names);
                }
            }
            BoundTemplate::Const(inner) => inner.inner.collect_unresolved(names),
        }
    }

    /// Whether no generic parameter is referenced.
    pub fn is_fully_bound(&self) -> bool {
        match self {
            BoundTemplate::Variable(_) => false,
            BoundTemplate::Class(class) => class.bindings.iter().all(Self::is_fully_bound),
            BoundTemplate::Array(array) => array.element.is_fully_bound(),
            BoundTemplate::Any(wildcard) => wildcard
                .super_types
                .iter()
                .chain(&wildcard.extend_types)
                .all(Self::is_fully_bound),
            BoundTemplate::Const(inner) => inner.inner.is_fully_bound(),
        }
    }

    /// Whether `name` is referenced anywhere in this template.
    pub fn references(&self, name: &str) -> bool {
        match self {
            BoundTemplate::Variable(var) => var.name == name,
            BoundTemplate::Class(class) => class.bindings.iter().any(|b| b.references(name)),
            BoundTemplate::Array(array) => array.element.references(name),
            BoundTemplate::Any(wildcard) => wildcard
                .super_types
                .iter()
                .chain(&wildcard.extend_types)
                .any(|b| b.references(name)),
            BoundTemplate::Const(inner) => inner.inner.references(name),
        }
    }

    /// Replace every variable found in `substitution`.
    ///
    /// Unmapped variables are left untouched and fully bound subtrees are
    /// returned as-is. Rebinding with an empty map is the identity.
    pub fn rebind(&self, substitution: &Substitution) -> BoundTemplate {
        if substitution.is_empty() {
            return self.clone();
        }
        match self {
            BoundTemplate::Variable(var) => substitution
                .get(&var.name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            BoundTemplate::Class(class) => {
                if class.bindings.is_empty() {
                    return self.clone();
                }
                Self::class(
                    class.class.clone(),
                    class
                        .bindings
                        .iter()
                        .map(|b| b.rebind(substitution))
                        .collect(),
                )
            }
            BoundTemplate::Array(array) => {
                Self::array(array.element.rebind(substitution), array.extents)
            }
            BoundTemplate::Any(wildcard) => Self::Any(wildcard.rebind(substitution)),
            BoundTemplate::Const(inner) => Self::constant(inner.inner.rebind(substitution)),
        }
    }

    /// Whether this is a `const`-qualified type.
    pub fn is_const(&self) -> bool {
        matches!(self, BoundTemplate::Const(_))
    }

    /// The type with any `const` qualification removed.
    pub fn strip_const(&self) -> &BoundTemplate {
        match self {
            BoundTemplate::Const(inner) => &inner.inner,
            other => other,
        }
    }

    /// The class binding, looking through `const`.
    pub fn as_class(&self) -> Option<&ClassBinding> {
        match self.strip_const() {
            BoundTemplate::Class(class) => Some(class),
            _ => None,
        }
    }

    /// The array binding, looking through `const`.
    pub fn as_array(&self) -> Option<&ArrayBinding> {
        match self.strip_const() {
            BoundTemplate::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The wildcard, if this is one.
    pub fn as_wildcard(&self) -> Option<&Wildcard> {
        match self {
            BoundTemplate::Any(wildcard) => Some(wildcard),
            _ => None,
        }
    }

    /// The variable name, looking through `const`.
    pub fn as_variable(&self) -> Option<&str> {
        match self.strip_const() {
            BoundTemplate::Variable(var) => Some(&var.name),
            _ => None,
        }
    }

    /// The referenced class, looking through `const`.
    pub fn class_ref(&self) -> Option<&ClassRef> {
        self.as_class().map(ClassBinding::class)
    }

    /// Whether this names exactly the class `name` (looking through `const`).
    pub fn is_class_named(&self, name: &QualifiedName) -> bool {
        self.class_ref().is_some_and(|class| class.name() == name)
    }

    /// Spell this template for the target language.
    ///
    /// Arrays and wildcards are expressed through helper templates living in
    /// `support_namespace`.
    pub fn to_cpp(&self, support_namespace: &str) -> String {
        match self {
            BoundTemplate::Variable(var) => var.name.clone(),
            BoundTemplate::Class(class) => {
                let name = class.class.name().cpp_name();
                if class.bindings.is_empty() {
                    name
                } else {
                    let args: Vec<String> = class
                        .bindings
                        .iter()
                        .map(|b| b.to_cpp(support_namespace))
                        .collect();
                    format!("{name}<{}>", args.join(", "))
                }
            }
            BoundTemplate::Array(array) => format!(
                "{support_namespace}::array<{}, {}>",
                array.element.to_cpp(support_namespace),
                array.extents
            ),
            BoundTemplate::Any(wildcard) => {
                if wildcard.is_unbounded() {
                    return format!("{support_namespace}::any<>");
                }
                let mut groups = Vec::new();
                if !wildcard.extend_types.is_empty() {
                    groups.push(format!(
                        "{support_namespace}::extends<{}>",
                        join_cpp(&wildcard.extend_types, support_namespace)
                    ));
                }
                if !wildcard.super_types.is_empty() {
                    groups.push(format!(
                        "{support_namespace}::super<{}>",
                        join_cpp(&wildcard.super_types, support_namespace)
                    ));
                }
                format!("{support_namespace}::any<{}>", groups.join(", "))
            }
            BoundTemplate::Const(inner) => {
                format!("const {}", inner.inner.to_cpp(support_namespace))
            }
        }
    }
}

fn join_cpp(types: &[BoundTemplate], support_namespace: &str) -> String {
    types
        .iter()
        .map(|ty| ty.to_cpp(support_namespace))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_source(f: &mut fmt::Formatter<'_>, types: &[BoundTemplate], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

/// Source-language spelling, accepted back by the type expression parser.
impl fmt::Display for BoundTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundTemplate::Variable(var) => f.write_str(&var.name),
            BoundTemplate::Class(class) => {
                write!(f, "{}", class.class.name())?;
                if !class.bindings.is_empty() {
                    f.write_str("<")?;
                    join_source(f, &class.bindings, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            BoundTemplate::Array(array) => {
                write!(f, "{}", array.element)?;
                for _ in 0..array.extents {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            BoundTemplate::Any(wildcard) => {
                f.write_str("?")?;
                if !wildcard.extend_types.is_empty() {
                    f.write_str(" extends ")?;
                    join_source(f, &wildcard.extend_types, " & ")?;
                }
                if !wildcard.super_types.is_empty() {
                    f.write_str(" super ")?;
                    join_source(f, &wildcard.super_types, " & ")?;
                }
                Ok(())
            }
            BoundTemplate::Const(inner) => write!(f, "const {}", inner.inner),
        }
    }
}
