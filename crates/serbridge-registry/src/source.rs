//! Class discovery.
//!
//! A [`ClassSource`] enumerates the classes a run should generate and answers
//! lookups for classes that are only referenced (field types, bounds,
//! supertypes). The registry consults it while collecting.

use rustc_hash::FxHashMap;
use serbridge_core::{ClassDescriptor, QualifiedName};

/// A provider of class descriptors.
pub trait ClassSource {
    /// Find the descriptor for `name`, if the source knows it.
    fn find(&self, name: &QualifiedName) -> Option<ClassDescriptor>;

    /// Every descriptor this source offers, in a stable order.
    fn descriptors(&self) -> Vec<ClassDescriptor>;
}

/// A source that knows no classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassSource;

impl ClassSource for NoClassSource {
    fn find(&self, _name: &QualifiedName) -> Option<ClassDescriptor> {
        None
    }

    fn descriptors(&self) -> Vec<ClassDescriptor> {
        Vec::new()
    }
}

/// An in-memory source backed by a list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassSource {
    descriptors: Vec<ClassDescriptor>,
    index: FxHashMap<QualifiedName, usize>,
}

impl InMemoryClassSource {
    pub fn new(descriptors: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        let mut source = Self::default();
        for descriptor in descriptors {
            source.push(descriptor);
        }
        source
    }

    /// Parse a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let descriptors: Vec<ClassDescriptor> = serde_json::from_str(json)?;
        Ok(Self::new(descriptors))
    }

    /// Add a descriptor; a later descriptor with the same name replaces the earlier one.
    pub fn push(&mut self, descriptor: ClassDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&slot) => self.descriptors[slot] = descriptor,
            None => {
                self.index
                    .insert(descriptor.name.clone(), self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl ClassSource for InMemoryClassSource {
    fn find(&self, name: &QualifiedName) -> Option<ClassDescriptor> {
        self.index
            .get(name)
            .map(|&slot| self.descriptors[slot].clone())
    }

    fn descriptors(&self) -> Vec<ClassDescriptor> {
        self.descriptors.clone()
    }
}
