//! Resolver passes.
//!
//! - [`CollectPass`]: closes the registry over referenced classes and
//!   records inheritance
//! - [`FinalizePass`]: builds every class model, supertypes first

mod collect;
mod finalize;
mod scope;

pub use collect::{CollectOutput, CollectPass};
pub use finalize::{FinalizeOutput, FinalizePass};
