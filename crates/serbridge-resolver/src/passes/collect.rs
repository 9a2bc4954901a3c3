//! Collect Pass - Discover every referenced class and record inheritance.
//!
//! Runs while the registry is still collecting. Every type expression of
//! every registered descriptor is parsed once, which lazily registers the
//! classes it names from the [`ClassSource`]. Newly registered classes are
//! visited in turn, so after this pass the registry holds the complete
//! closure of referenced classes and the inheritance graph is complete.
//!
//! ## Algorithm
//!
//! 1. Walk the registry in registration order (the list grows while walking)
//! 2. For each class with a descriptor:
//!    - Parse generic bounds, supertypes and fields in the class scope
//!    - Parse member signatures in the class scope extended by the member's
//!      own generics
//!    - Record an inheritance edge for each direct supertype; classes without
//!      a declared super class, and interfaces, inherit the top type

use serbridge_core::{BoundTemplate, ClassKind, ResolveError, Substitution};
use serbridge_registry::{ClassId, ClassRegistry, ClassSource};

use super::scope::{Scope, this_binding, variables_for};
use crate::model::ClassModel;

/// Output of the collect pass.
#[derive(Debug, Default)]
pub struct CollectOutput {
    /// Number of classes visited.
    pub classes_collected: usize,
    /// Number of inheritance edges recorded.
    pub edges_added: usize,
}

/// Collect Pass - closes the registry over referenced classes.
pub struct CollectPass<'reg> {
    registry: &'reg mut ClassRegistry<ClassModel>,
    source: &'reg dyn ClassSource,
}

impl<'reg> CollectPass<'reg> {
    pub fn new(
        registry: &'reg mut ClassRegistry<ClassModel>,
        source: &'reg dyn ClassSource,
    ) -> Self {
        Self { registry, source }
    }

    /// Run the collect pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<CollectOutput, ResolveError> {
        let mut output = CollectOutput::default();

        let mut next = 0;
        while next < self.registry.len() {
            let id = ClassId::new(next as u32);
            next += 1;
            if !self.registry.has_descriptor(id) {
                continue;
            }
            self.collect_class(id, &mut output)?;
            output.classes_collected += 1;
        }

        tracing::debug!(
            target: "serbridge.resolver",
            classes = output.classes_collected,
            edges = output.edges_added,
            "collected classes"
        );
        Ok(output)
    }

    fn collect_class(
        &mut self,
        id: ClassId,
        output: &mut CollectOutput,
    ) -> Result<(), ResolveError> {
        let Some(descriptor) = self.registry.descriptor(id).cloned() else {
            return Ok(());
        };
        let class = self.registry.class_ref(id).clone();
        let variables = variables_for(class.params().iter().map(String::as_str));
        let this = this_binding(&class);
        let scope = Scope {
            class: class.name(),
            variables: &variables,
            this: &this,
        };

        for generic in &descriptor.generics {
            for bound in &generic.bounds {
                scope.parse(
                    self.registry,
                    self.source,
                    &format!("bound of {}", generic.name),
                    bound,
                )?;
            }
        }

        let mut supertypes = Vec::new();
        if let Some(super_class) = &descriptor.super_class {
            let super_class =
                scope.parse_class(self.registry, self.source, "super class", super_class)?;
            supertypes.push(super_class);
        }
        for interface in &descriptor.interfaces {
            supertypes.push(scope.parse_class(self.registry, self.source, "interface", interface)?);
        }

        for field in &descriptor.fields {
            scope.parse(
                self.registry,
                self.source,
                &format!("field {}", field.name),
                &field.ty,
            )?;
        }

        for member in &descriptor.members {
            let mut member_variables: Substitution = variables.clone();
            member_variables.extend(variables_for(member.generics.iter().map(|g| g.name.as_str())));
            let member_scope = Scope {
                variables: &member_variables,
                ..scope
            };
            let expressions = member
                .generics
                .iter()
                .map(|g| (format!("generic {} of {}", g.name, member.name), g.ty.as_str()))
                .chain(
                    member
                        .argument_types
                        .iter()
                        .enumerate()
                        .map(|(i, ty)| (format!("argument {i} of {}", member.name), ty.as_str())),
                )
                .chain(std::iter::once((
                    format!("return of {}", member.name),
                    member.return_type.as_str(),
                )));
            for (context, text) in expressions {
                if text.trim().is_empty() {
                    continue;
                }
                member_scope.parse(self.registry, self.source, &context, text)?;
            }
            if let Some(tag) = &member.covariant_tag {
                member_scope.parse_class(
                    self.registry,
                    self.source,
                    &format!("tag of {}", member.name),
                    tag,
                )?;
            }
        }

        let is_top = class.name() == self.registry.top_type();
        let needs_top = !is_top
            && (descriptor.kind == ClassKind::Interface || descriptor.super_class.is_none());
        if needs_top {
            let top = self.registry.top_type().clone();
            let top = self.registry.resolve(&top, self.source)?;
            supertypes.push(BoundTemplate::simple(top));
        }

        for supertype in &supertypes {
            let Some(supertype_id) = supertype
                .class_ref()
                .and_then(|class| self.registry.lookup(class.name()))
            else {
                continue;
            };
            self.registry.add_inheritance(supertype_id, id)?;
            output.edges_added += 1;
        }
        Ok(())
    }
}
