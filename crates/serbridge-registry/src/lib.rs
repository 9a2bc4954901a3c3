//! Class registry for serbridge.
//!
//! Holds the one canonical entry per source class, the phase machine that
//! governs when classes may still be added, and the inheritance graph that
//! orders model construction.

mod inheritance;
mod registry;
mod source;

pub use inheritance::InheritanceGraph;
pub use registry::{ClassId, ClassRegistry, ModelState, Phase};
pub use source::{ClassSource, InMemoryClassSource, NoClassSource};
