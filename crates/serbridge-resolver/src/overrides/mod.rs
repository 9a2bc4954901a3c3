//! Override resolution.
//!
//! Every virtual method is wrapped, at each class that declares or overrides
//! it, in an [`ImplementedClassMethod`]. Overrides are matched by
//! [`OverrideSelector`], which identifies a signature independently of its
//! return type, and validated across erasure boundaries through a
//! [`HierarchyView`].

mod hierarchy;
mod implemented;
mod selector;

pub use hierarchy::{HierarchyView, is_assignable, satisfies};
pub use implemented::{ChangedTypes, ImplementedClassMethod, MethodSpec};
pub use selector::{MethodOrigin, OverrideSelector};
