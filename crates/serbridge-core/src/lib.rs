//! Core data model for serbridge.
//!
//! This crate holds the value types shared by every stage of the pipeline:
//!
//! - [`BoundTemplate`]: structural representation of a (partially) bound generic type
//! - [`TemplateSelector`]: structural path recovering a bound value from an instantiation
//! - [`ClassRef`] / [`QualifiedName`]: class identity
//! - [`ClassDescriptor`]: the data contract produced by class discovery
//! - [`NameMangler`]: generated-name conventions used by the rendering layer
//! - Error types for every phase
//!
//! All model values are immutable once constructed and cheap to share.

mod bound;
mod class_ref;
mod descriptor;
mod error;
mod names;
mod qualified_name;
mod selector;
mod span;

pub use bound::{
    ArrayBinding, BoundTemplate, ClassBinding, ConstBinding, Substitution, VariableBinding,
    Wildcard,
};
pub use class_ref::ClassRef;
pub use descriptor::{
    ClassDescriptor, ClassKind, FieldDecl, GenericParamDecl, MemberDecl, MethodGenericDecl,
    Modifiers, Visibility,
};
pub use error::{
    ParseError, ParseErrorKind, RegistrationError, ResolveError, SelectorError, SerbridgeError,
};
pub use names::NameMangler;
pub use qualified_name::QualifiedName;
pub use selector::TemplateSelector;
pub use span::Span;
