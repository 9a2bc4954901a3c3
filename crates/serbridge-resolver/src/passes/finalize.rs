//! Finalize Pass - Build the model of every registered class.
//!
//! Runs once the registry has left the collecting phase, so every name a
//! descriptor mentions must already be registered; a name that is not is a
//! fatal "not in list of classes during post processing" error.
//!
//! ## Algorithm
//!
//! 1. Order classes by inheritance (supertypes first)
//! 2. For each class in order:
//!    - Resolve the class generics (order, constraints, erasures)
//!    - Parse supertypes, fields and member signatures
//!    - Instantiate every ancestor in terms of the class's own parameters,
//!      reading the already finished supertype models
//!    - Resolve each member's generics and place it in the override DAG
//!    - Compute the virtual method table and its erasure changes
//! 3. Because classes are processed supertypes first, every supertype model
//!    is ready when its subtypes are built

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serbridge_core::{
    BoundTemplate, ClassDescriptor, ClassKind, ClassRef, MemberDecl, QualifiedName,
    RegistrationError, ResolveError, Substitution,
};
use serbridge_registry::{ClassId, ClassRegistry, ClassSource};

use super::scope::{Scope, this_binding, variables_for};
use crate::class_generics::{ClassGenerics, ClassTemplateArgument};
use crate::config::ResolverConfig;
use crate::method_generics::MethodGenerics;
use crate::model::{ClassModel, DispatchEntry, FieldModel, MethodModel, ModelHierarchy, Scaffold};
use crate::overrides::{ImplementedClassMethod, MethodOrigin, MethodSpec, OverrideSelector};

/// Output of the finalize pass.
#[derive(Debug, Default)]
pub struct FinalizeOutput {
    /// Number of class models built.
    pub classes_built: usize,
    /// Number of member declarations resolved.
    pub methods_resolved: usize,
    /// Number of members placed as overrides of inherited methods.
    pub overrides_linked: usize,
}

/// A member declaration with its type positions parsed.
struct ParsedMember {
    index: usize,
    decl: MemberDecl,
    generics: Vec<(String, BoundTemplate)>,
    argument_types: Vec<BoundTemplate>,
    return_type: BoundTemplate,
    tag: Option<ClassRef>,
}

/// Everything parsed for one class, before any model is consulted.
struct ParsedClass {
    generics: ClassGenerics,
    this: BoundTemplate,
    super_class: Option<BoundTemplate>,
    interfaces: Vec<BoundTemplate>,
    /// Direct supertypes including an implicit top type.
    supertypes: Vec<BoundTemplate>,
    fields: Vec<FieldModel>,
    members: Vec<ParsedMember>,
}

/// Finalize Pass - builds class models in inheritance order.
pub struct FinalizePass<'reg> {
    registry: &'reg mut ClassRegistry<ClassModel>,
    source: &'reg dyn ClassSource,
    config: &'reg ResolverConfig,
}

impl<'reg> FinalizePass<'reg> {
    pub fn new(
        registry: &'reg mut ClassRegistry<ClassModel>,
        source: &'reg dyn ClassSource,
        config: &'reg ResolverConfig,
    ) -> Self {
        Self {
            registry,
            source,
            config,
        }
    }

    /// Run the finalize pass.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Result<FinalizeOutput, ResolveError> {
        let mut output = FinalizeOutput::default();

        for id in self.registry.build_order()? {
            self.registry.begin_build(id)?;
            match self.build_class(id, &mut output) {
                Ok(model) => {
                    self.registry.complete(id, model)?;
                    output.classes_built += 1;
                }
                Err(err) => {
                    self.registry.abort_build(id);
                    return Err(err);
                }
            }
        }

        tracing::debug!(
            target: "serbridge.resolver",
            classes = output.classes_built,
            methods = output.methods_resolved,
            overrides = output.overrides_linked,
            "finalized class models"
        );
        Ok(output)
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn build_class(
        &mut self,
        id: ClassId,
        output: &mut FinalizeOutput,
    ) -> Result<ClassModel, ResolveError> {
        let class = self.registry.class_ref(id).clone();
        let descriptor = self
            .registry
            .descriptor(id)
            .cloned()
            .ok_or_else(|| RegistrationError::ClassNotFound(class.name().to_string()))?;
        tracing::debug!(
            target: "serbridge.resolver",
            class = %class.name(),
            "building class model"
        );

        // Phase 1: parse every type position (the registry resolves names)
        let parsed = self.parse_class(&class, &descriptor)?;

        // Phase 2: relate to the finished supertype models
        let ancestors = self.ancestors(&class, &parsed)?;
        let hierarchy = ModelHierarchy {
            registry: self.registry,
            scaffold: Some(Scaffold {
                name: class.name(),
                ancestors: &ancestors,
                erased: parsed.generics.erased(),
            }),
        };

        let inherited = inherited_virtual_methods(&hierarchy, &parsed.supertypes);
        let mut methods = Vec::with_capacity(parsed.members.len());
        let mut overridden: Vec<Arc<ImplementedClassMethod>> = Vec::new();
        for member in parsed.members {
            let argument_names = member.decl.argument_names.clone();
            let generics = MethodGenerics::new(
                &member.decl.name,
                member.generics,
                &member.argument_types,
                &self.config.top_type,
                &self.config.names,
            )?;

            let implemented = if member.decl.is_static {
                None
            } else {
                let selector = OverrideSelector::new(
                    parsed.this.clone(),
                    member.decl.name.clone(),
                    member.decl.is_const,
                    member.argument_types.clone(),
                    member.return_type.clone(),
                )
                .with_origin(MethodOrigin {
                    class: class.name().clone(),
                    index: member.index,
                });
                let own = selector.rebind(generics.erased_method_generics());
                let overrides: Vec<Arc<ImplementedClassMethod>> = inherited
                    .iter()
                    .filter(|candidate| {
                        candidate.selector().name() == own.name()
                            && candidate
                                .view_from(&class, &hierarchy)
                                .is_some_and(|view| view.argument_types() == own.argument_types())
                    })
                    .cloned()
                    .collect();
                for method in &overrides {
                    tracing::trace!(
                        target: "serbridge.resolver",
                        class = %class.name(),
                        method = %own,
                        overrides = %method.selector(),
                        "matched override"
                    );
                }
                output.overrides_linked += usize::from(!overrides.is_empty());
                overridden.extend(overrides.iter().cloned());

                let spec = MethodSpec {
                    class: class.clone(),
                    this: parsed.this.clone(),
                    selector,
                    tag: member.tag,
                    is_virtual: member.decl.is_virtual,
                    class_erasure: parsed.generics.erased().clone(),
                    method_erasure: generics.erased_method_generics().clone(),
                };
                Some(Arc::new(ImplementedClassMethod::new(spec, overrides, &hierarchy)?))
            };

            output.methods_resolved += 1;
            methods.push(MethodModel {
                name: member.decl.name,
                index: member.index,
                argument_names,
                argument_types: member.argument_types,
                return_type: member.return_type,
                is_const: member.decl.is_const,
                is_static: member.decl.is_static,
                is_virtual: member.decl.is_virtual,
                visibility: member.decl.visibility,
                body: member.decl.body,
                doc: member.decl.doc,
                generics,
                implemented,
            });
        }

        let mut virtual_methods: Vec<Arc<ImplementedClassMethod>> = inherited
            .into_iter()
            .filter(|method| !overridden.contains(method))
            .collect();
        for method in &methods {
            if let Some(implemented) = &method.implemented {
                if implemented.is_virtual() && !virtual_methods.contains(implemented) {
                    virtual_methods.push(Arc::clone(implemented));
                }
            }
        }

        let dispatch = virtual_methods
            .iter()
            .map(|method| DispatchEntry {
                method: Arc::clone(method),
                changed: method
                    .has_changed_types(&class, &hierarchy)
                    .unwrap_or_default(),
            })
            .collect();

        let includes: BTreeSet<String> = descriptor
            .members
            .iter()
            .flat_map(|member| member.includes.iter().cloned())
            .collect();

        Ok(ClassModel {
            class,
            descriptor,
            generics: parsed.generics,
            this_binding: parsed.this,
            super_class: parsed.super_class,
            interfaces: parsed.interfaces,
            ancestors,
            fields: parsed.fields,
            methods,
            virtual_methods,
            dispatch,
            includes: includes.into_iter().collect(),
        })
    }

    fn parse_class(
        &mut self,
        class: &ClassRef,
        descriptor: &ClassDescriptor,
    ) -> Result<ParsedClass, ResolveError> {
        let variables = variables_for(class.params().iter().map(String::as_str));
        let this = this_binding(class);
        let scope = Scope {
            class: class.name(),
            variables: &variables,
            this: &this,
        };

        let mut arguments = Vec::with_capacity(descriptor.generics.len());
        for generic in &descriptor.generics {
            let context = format!("bound of {}", generic.name);
            let bounds = generic
                .bounds
                .iter()
                .map(|bound| scope.parse(self.registry, self.source, &context, bound))
                .collect::<Result<Vec<_>, _>>()?;
            arguments.push(ClassTemplateArgument::new(generic.name.clone(), bounds));
        }
        let generics =
            ClassGenerics::new(&class.name().to_string(), arguments, &self.config.top_type)?;

        let top = &self.config.top_type;
        let is_top = class.name() == top;
        let super_class = match &descriptor.super_class {
            Some(text) => Some(scope.parse_class(self.registry, self.source, "super class", text)?),
            None if is_top || descriptor.kind == ClassKind::Interface => None,
            None => Some(self.top_binding()?),
        };
        let interfaces = descriptor
            .interfaces
            .iter()
            .map(|text| scope.parse_class(self.registry, self.source, "interface", text))
            .collect::<Result<Vec<_>, _>>()?;

        let mut supertypes: Vec<BoundTemplate> =
            super_class.iter().chain(&interfaces).cloned().collect();
        if !is_top && descriptor.kind == ClassKind::Interface {
            supertypes.push(self.top_binding()?);
        }

        let fields = descriptor
            .fields
            .iter()
            .map(|field| {
                let context = format!("field {}", field.name);
                let ty = scope.parse(self.registry, self.source, &context, &field.ty)?;
                Ok(FieldModel {
                    name: field.name.clone(),
                    ty,
                    transient: field.transient,
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;

        let mut members = Vec::with_capacity(descriptor.members.len());
        for (index, decl) in descriptor.members.iter().enumerate() {
            if decl.argument_names.len() != decl.argument_types.len() {
                return Err(ResolveError::ArgumentArityMismatch {
                    method: decl.name.clone(),
                    names: decl.argument_names.len(),
                    types: decl.argument_types.len(),
                });
            }

            let mut member_variables: Substitution = variables.clone();
            member_variables.extend(variables_for(decl.generics.iter().map(|g| g.name.as_str())));
            let member_scope = Scope {
                variables: &member_variables,
                ..scope
            };

            let mut generics = Vec::with_capacity(decl.generics.len());
            for generic in &decl.generics {
                let bound = if generic.ty.trim().is_empty() {
                    BoundTemplate::any()
                } else {
                    member_scope.parse(
                        self.registry,
                        self.source,
                        &format!("generic {} of {}", generic.name, decl.name),
                        &generic.ty,
                    )?
                };
                generics.push((generic.name.clone(), bound));
            }
            let argument_types = decl
                .argument_types
                .iter()
                .enumerate()
                .map(|(i, ty)| {
                    let context = format!("argument {i} of {}", decl.name);
                    member_scope.parse(self.registry, self.source, &context, ty)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let return_type = member_scope.parse(
                self.registry,
                self.source,
                &format!("return of {}", decl.name),
                &decl.return_type,
            )?;
            let tag = match &decl.covariant_tag {
                Some(text) => {
                    let context = format!("tag of {}", decl.name);
                    member_scope
                        .parse_class(self.registry, self.source, &context, text)?
                        .class_ref()
                        .cloned()
                }
                None => None,
            };

            members.push(ParsedMember {
                index,
                decl: decl.clone(),
                generics,
                argument_types,
                return_type,
                tag,
            });
        }

        Ok(ParsedClass {
            generics,
            this,
            super_class,
            interfaces,
            supertypes,
            fields,
            members,
        })
    }

    fn top_binding(&mut self) -> Result<BoundTemplate, ResolveError> {
        let top = self.registry.resolve(&self.config.top_type, self.source)?;
        Ok(BoundTemplate::simple(top))
    }

    /// Every ancestor of `class` instantiated in terms of its parameters.
    ///
    /// A raw supertype is read through its erasures. Direct supertypes are
    /// visited in declaration order and the first instantiation of an
    /// ancestor wins.
    fn ancestors(
        &self,
        class: &ClassRef,
        parsed: &ParsedClass,
    ) -> Result<BTreeMap<QualifiedName, BoundTemplate>, ResolveError> {
        let mut ancestors = BTreeMap::new();
        ancestors.insert(class.name().clone(), parsed.this.clone());

        for supertype in &parsed.supertypes {
            let Some(binding) = supertype.as_class() else {
                continue;
            };
            let model = self
                .registry
                .model_by_name(binding.class().name())
                .ok_or_else(|| RegistrationError::NotRegistered {
                    name: binding.class().name().to_string(),
                })?;
            let substitution = if binding.is_raw() {
                model.generics().erased().clone()
            } else {
                binding.substitution()
            };
            for (name, ancestor) in model.ancestors() {
                ancestors
                    .entry(name.clone())
                    .or_insert_with(|| ancestor.rebind(&substitution));
            }
        }
        Ok(ancestors)
    }
}

/// The virtual methods of the direct supertypes, each once.
fn inherited_virtual_methods(
    hierarchy: &ModelHierarchy<'_>,
    supertypes: &[BoundTemplate],
) -> Vec<Arc<ImplementedClassMethod>> {
    let mut inherited: Vec<Arc<ImplementedClassMethod>> = Vec::new();
    for supertype in supertypes {
        let Some(model) = supertype
            .class_ref()
            .and_then(|class| hierarchy.registry.model_by_name(class.name()))
        else {
            continue;
        };
        for method in model.virtual_methods() {
            if !inherited.contains(method) {
                inherited.push(Arc::clone(method));
            }
        }
    }
    inherited
}
