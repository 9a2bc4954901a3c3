//! Generics resolution and override validation for serbridge.
//!
//! ## Architecture
//!
//! - **Collect**: parse every descriptor type expression, lazily registering
//!   the classes they name, and record the inheritance graph
//! - **Finalize**: build one [`ClassModel`] per class, supertypes first
//!
//! ## Modules
//!
//! - [`class_generics`]: ordering and erasure of generic parameters
//! - [`method_generics`]: derivation of method generics from arguments
//! - [`enabler`]: derivation expressions, enabler clauses, template parameters
//! - [`overrides`]: override selectors, assignability and the override DAG
//! - [`model`]: the resolved class models
//! - [`passes`]: the collect and finalize passes

pub mod class_generics;
mod config;
mod context;
pub mod enabler;
mod members;
pub mod method_generics;
pub mod model;
pub mod overrides;
pub mod passes;

pub use class_generics::{ClassGenerics, ClassTemplateArgument};
pub use config::{DEFAULT_PRIMITIVES, ResolverConfig};
pub use context::Resolver;
pub use enabler::{Derivation, Enabler, EnablerClause, ParamDefault, TemplateParam};
pub use members::{MemberProvider, NoExtraMembers};
pub use method_generics::MethodGenerics;
pub use model::{ClassModel, DispatchEntry, FieldModel, MethodModel};
pub use overrides::{
    ChangedTypes, HierarchyView, ImplementedClassMethod, MethodOrigin, MethodSpec, OverrideSelector,
    is_assignable,
};
pub use passes::{CollectOutput, CollectPass, FinalizeOutput, FinalizePass};
