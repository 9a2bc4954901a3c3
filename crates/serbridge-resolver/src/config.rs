//! Resolver settings.

use serbridge_core::{NameMangler, QualifiedName};

/// The primitive types every run knows about.
pub const DEFAULT_PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Settings for a resolver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// The universal top type, stripped from generic bounds.
    pub top_type: QualifiedName,
    /// Builtin primitive type names.
    pub primitives: Vec<String>,
    /// Generated-name conventions.
    pub names: NameMangler,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            top_type: QualifiedName::from_dotted("java.lang.Object"),
            primitives: DEFAULT_PRIMITIVES.iter().map(|p| p.to_string()).collect(),
            names: NameMangler::default(),
        }
    }
}
