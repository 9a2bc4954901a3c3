//! Resolved class models.
//!
//! A [`ClassModel`] is the read-only view the rendering layer consumes. It is
//! built once per class by the finalize pass and never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use serbridge_core::{
    BoundTemplate, ClassDescriptor, ClassKind, ClassRef, QualifiedName, Substitution, Visibility,
};
use serbridge_registry::ClassRegistry;

use crate::class_generics::ClassGenerics;
use crate::method_generics::MethodGenerics;
use crate::overrides::{ChangedTypes, HierarchyView, ImplementedClassMethod};

/// A serializable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModel {
    pub name: String,
    pub ty: BoundTemplate,
    pub transient: bool,
}

/// One member declaration with every type position resolved.
#[derive(Debug, Clone)]
pub struct MethodModel {
    pub name: String,
    /// Position among the class's member declarations.
    pub index: usize,
    pub argument_names: Vec<String>,
    pub argument_types: Vec<BoundTemplate>,
    pub return_type: BoundTemplate,
    pub is_const: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub visibility: Visibility,
    pub body: Option<String>,
    pub doc: Option<String>,
    pub generics: MethodGenerics,
    /// Placement in the override DAG; `None` for static members.
    pub implemented: Option<Arc<ImplementedClassMethod>>,
}

impl MethodModel {
    /// Whether the method overrides anything.
    pub fn is_override(&self) -> bool {
        self.implemented
            .as_ref()
            .is_some_and(|method| !method.overrides().is_empty())
    }
}

/// A virtual method visible on a class, with its erasure changes there.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    pub method: Arc<ImplementedClassMethod>,
    pub changed: ChangedTypes,
}

/// The resolved model of one class.
#[derive(Debug, Clone)]
pub struct ClassModel {
    pub(crate) class: ClassRef,
    pub(crate) descriptor: Arc<ClassDescriptor>,
    pub(crate) generics: ClassGenerics,
    pub(crate) this_binding: BoundTemplate,
    pub(crate) super_class: Option<BoundTemplate>,
    pub(crate) interfaces: Vec<BoundTemplate>,
    pub(crate) ancestors: BTreeMap<QualifiedName, BoundTemplate>,
    pub(crate) fields: Vec<FieldModel>,
    pub(crate) methods: Vec<MethodModel>,
    pub(crate) virtual_methods: Vec<Arc<ImplementedClassMethod>>,
    pub(crate) dispatch: Vec<DispatchEntry>,
    pub(crate) includes: Vec<String>,
}

impl ClassModel {
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn name(&self) -> &QualifiedName {
        self.class.name()
    }

    pub fn kind(&self) -> ClassKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.descriptor.is_final()
    }

    /// Canonical generic parameters with their resolution order and erasures.
    pub fn generics(&self) -> &ClassGenerics {
        &self.generics
    }

    /// The class instantiated with its own parameters.
    pub fn this_binding(&self) -> &BoundTemplate {
        &self.this_binding
    }

    /// The direct super class; `None` for interfaces and the top type.
    pub fn super_class(&self) -> Option<&BoundTemplate> {
        self.super_class.as_ref()
    }

    pub fn interfaces(&self) -> &[BoundTemplate] {
        &self.interfaces
    }

    /// Every ancestor (the class itself included) instantiated in terms of
    /// this class's parameters.
    pub fn ancestors(&self) -> &BTreeMap<QualifiedName, BoundTemplate> {
        &self.ancestors
    }

    pub fn ancestor(&self, name: &QualifiedName) -> Option<&BoundTemplate> {
        self.ancestors.get(name)
    }

    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodModel] {
        &self.methods
    }

    /// Declared methods named `name`, in declaration order.
    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MethodModel> + 'a {
        self.methods.iter().filter(move |method| method.name == name)
    }

    /// The most derived placement of every virtual method visible here.
    pub fn virtual_methods(&self) -> &[Arc<ImplementedClassMethod>] {
        &self.virtual_methods
    }

    pub fn dispatch(&self) -> &[DispatchEntry] {
        &self.dispatch
    }

    pub fn serial_version_uid(&self) -> Option<i64> {
        self.descriptor.serial_version_uid
    }

    pub fn enum_constants(&self) -> &[String] {
        &self.descriptor.enum_constants
    }

    /// Headers requested by member declarations, sorted and deduplicated.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }
}

/// Ancestry of a class still under construction.
pub(crate) struct Scaffold<'a> {
    pub(crate) name: &'a QualifiedName,
    pub(crate) ancestors: &'a BTreeMap<QualifiedName, BoundTemplate>,
    pub(crate) erased: &'a Substitution,
}

/// [`HierarchyView`] over the finished models in the registry, plus the
/// class being built.
pub(crate) struct ModelHierarchy<'a> {
    pub(crate) registry: &'a ClassRegistry<ClassModel>,
    pub(crate) scaffold: Option<Scaffold<'a>>,
}

impl ModelHierarchy<'_> {
    fn scaffold_for(&self, class: &QualifiedName) -> Option<&Scaffold<'_>> {
        self.scaffold.as_ref().filter(|scaffold| scaffold.name == class)
    }
}

impl HierarchyView for ModelHierarchy<'_> {
    fn top_type(&self) -> &QualifiedName {
        self.registry.top_type()
    }

    fn ancestor_binding(
        &self,
        class: &QualifiedName,
        ancestor: &QualifiedName,
    ) -> Option<BoundTemplate> {
        if let Some(scaffold) = self.scaffold_for(class) {
            return scaffold.ancestors.get(ancestor).cloned();
        }
        self.registry
            .model_by_name(class)
            .and_then(|model| model.ancestors.get(ancestor).cloned())
    }

    fn erased_bindings(&self, class: &QualifiedName) -> Substitution {
        if let Some(scaffold) = self.scaffold_for(class) {
            return scaffold.erased.clone();
        }
        self.registry
            .model_by_name(class)
            .map(|model| model.generics.erased().clone())
            .unwrap_or_default()
    }
}
