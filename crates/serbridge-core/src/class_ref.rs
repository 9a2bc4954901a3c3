use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{ClassKind, QualifiedName};

/// A reference to a registered class.
///
/// Carries everything the type model needs to know about a class without
/// building its full model: its name, its kind, and the names of its declared
/// generic parameters (in declaration order). Identity is the qualified name
/// alone, so references handed out before and after a class is fully built
/// compare equal.
#[derive(Clone)]
pub struct ClassRef {
    inner: Arc<ClassRefData>,
}

struct ClassRefData {
    name: QualifiedName,
    kind: ClassKind,
    params: Vec<String>,
}

impl ClassRef {
    /// Create a reference to a class with the given generic parameter names.
    pub fn new(name: QualifiedName, kind: ClassKind, params: Vec<String>) -> Self {
        Self {
            inner: Arc::new(ClassRefData { name, kind, params }),
        }
    }

    /// Create a reference to a non-generic class.
    pub fn simple(name: impl Into<QualifiedName>) -> Self {
        Self::new(name.into(), ClassKind::Class, Vec::new())
    }

    /// Create a reference to a primitive type (`int`, `boolean`, ...).
    pub fn primitive(name: &str) -> Self {
        Self::new(QualifiedName::global(name), ClassKind::Primitive, Vec::new())
    }

    /// The qualified name of the class.
    #[inline]
    pub fn name(&self) -> &QualifiedName {
        &self.inner.name
    }

    /// The kind of the class.
    #[inline]
    pub fn kind(&self) -> ClassKind {
        self.inner.kind
    }

    /// Declared generic parameter names, in declaration order.
    #[inline]
    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    /// Number of declared generic parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.inner.params.len()
    }

    /// Whether this class declares any generic parameters.
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.inner.params.is_empty()
    }

    /// Whether this is a primitive type.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        self.inner.kind == ClassKind::Primitive
    }

    /// Whether this is an interface.
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.inner.kind == ClassKind::Interface
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.name == other.inner.name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.params.is_empty() {
            write!(f, "{}", self.inner.name)
        } else {
            write!(f, "{}<{}>", self.inner.name, self.inner.params.join(", "))
        }
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.name)
    }
}
