//! Method generics resolution.
//!
//! A generic method is emitted as a template whose generic parameters are
//! derived from the types of the actual arguments. For every method generic
//! the resolver finds where it occurs inside the declared argument types,
//! gives each contributing argument its own template parameter, derives the
//! generic from that parameter through a [`TemplateSelector`], and gates the
//! instantiation with an [`Enabler`].
//!
//! ```text
//! <R extends Number> void accept(R value)
//!
//! template <typename R = derive, typename Arg0,
//!           typename R_ = derive_or_t<R, std::decay_t<Arg0>>,
//!           typename Enable = std::enable_if_t<satisfies_v<R_, ...> && ...>>
//! void accept(Arg0&& value);
//! ```

use serbridge_core::{
    BoundTemplate, NameMangler, QualifiedName, ResolveError, Substitution, TemplateSelector,
};

use crate::class_generics::{ClassGenerics, ClassTemplateArgument};
use crate::enabler::{Derivation, Enabler, EnablerClause, ParamDefault, TemplateParam};

/// Resolved generics of one method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodGenerics {
    declared: Vec<(String, BoundTemplate)>,
    generics: ClassGenerics,
    argument_bindings: Vec<Option<String>>,
    derivation_map: Vec<(String, Vec<Derivation>)>,
    derived: Substitution,
    template_params: Vec<TemplateParam>,
    enabler: Option<Enabler>,
}

impl MethodGenerics {
    /// Passthrough for a non-generic method with `arity` arguments.
    pub fn identity(arity: usize) -> Self {
        Self {
            argument_bindings: vec![None; arity],
            ..Self::default()
        }
    }

    /// Resolve the generics `declared` by `method` against its argument types.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn new(
        method: &str,
        declared: Vec<(String, BoundTemplate)>,
        argument_types: &[BoundTemplate],
        top_type: &QualifiedName,
        names: &NameMangler,
    ) -> Result<Self, ResolveError> {
        if declared.is_empty() {
            return Ok(Self::identity(argument_types.len()));
        }

        let generics = ClassGenerics::new(
            method,
            declared
                .iter()
                .map(|(name, bound)| {
                    ClassTemplateArgument::from_template(name.clone(), bound.clone())
                })
                .collect(),
            top_type,
        )?;

        // generic name -> every (argument, selector) locating it
        let mut found: Vec<(String, Vec<Derivation>)> = declared
            .iter()
            .map(|(name, _)| (name.clone(), Vec::new()))
            .collect();
        let mut argument_bindings = vec![None; argument_types.len()];
        for (index, argument_type) in argument_types.iter().enumerate() {
            let variable = names.argument_binding(index);
            for (name, derivations) in &mut found {
                for selector in TemplateSelector::find(argument_type, name)? {
                    derivations.push(Derivation {
                        argument: index,
                        variable: variable.clone(),
                        selector,
                    });
                    argument_bindings[index] = Some(variable.clone());
                }
            }
        }

        let derived: Substitution = declared
            .iter()
            .map(|(name, _)| (name.clone(), BoundTemplate::variable(names.derived(name))))
            .collect();

        let mut derivation_map = Vec::with_capacity(declared.len());
        let mut derived_params = Vec::with_capacity(declared.len());
        let mut clauses = Vec::new();
        for name in generics.resolution_order() {
            let candidates = found
                .iter()
                .find(|(generic, _)| generic == name)
                .map(|(_, candidates)| candidates.clone())
                .unwrap_or_default();
            let Some(chosen) = candidates.first().cloned() else {
                return Err(ResolveError::UnresolvableGeneric {
                    method: method.to_string(),
                    name: name.clone(),
                });
            };
            if candidates.iter().any(|c| c.selector != chosen.selector) {
                return Err(ResolveError::AmbiguousDerivation {
                    method: method.to_string(),
                    name: name.clone(),
                    candidates: candidates.iter().map(|c| c.render(names)).collect(),
                });
            }
            tracing::trace!(
                target: "serbridge.resolver",
                method,
                generic = %name,
                derivation = %chosen,
                "derived method generic"
            );

            if let Some(bound) = generics.constraint(name) {
                clauses.push(EnablerClause::Satisfies {
                    parameter: names.derived(name),
                    bound: bound.rebind(&derived),
                });
            }
            derived_params.push(TemplateParam {
                name: names.derived(name),
                default: ParamDefault::Derived {
                    generic: name.clone(),
                    derivation: chosen,
                },
            });
            derivation_map.push((name.clone(), candidates));
        }

        for (index, binding) in argument_bindings.iter().enumerate() {
            if let Some(argument) = binding {
                let declared_type = &argument_types[index];
                clauses.push(EnablerClause::Constructible {
                    parameter_type: declared_type.rebind(&derived),
                    argument: argument.clone(),
                    is_const: declared_type.is_const(),
                });
            }
        }
        let enabler = Enabler::new(clauses);

        let mut template_params: Vec<TemplateParam> = declared
            .iter()
            .map(|(name, _)| TemplateParam {
                name: name.clone(),
                default: ParamDefault::Sentinel,
            })
            .collect();
        template_params.extend(argument_bindings.iter().flatten().map(|argument| TemplateParam {
            name: argument.clone(),
            default: ParamDefault::None,
        }));
        template_params.extend(derived_params);
        template_params.push(TemplateParam {
            name: names.enabler_name().to_string(),
            default: ParamDefault::Enabler(enabler.clone()),
        });

        Ok(Self {
            declared,
            generics,
            argument_bindings,
            derivation_map,
            derived,
            template_params,
            enabler: Some(enabler),
        })
    }

    /// Whether the method declares any generics.
    pub fn is_generic(&self) -> bool {
        !self.declared.is_empty()
    }

    /// Declared generics with their bound templates, in declaration order.
    pub fn declared(&self) -> &[(String, BoundTemplate)] {
        &self.declared
    }

    /// Method generics mapped to their erasures; no erasure mentions another
    /// method generic.
    pub fn erased_method_generics(&self) -> &Substitution {
        self.generics.erased()
    }

    /// Generic names, dependencies first.
    pub fn resolution_order(&self) -> &[String] {
        self.generics.resolution_order()
    }

    /// Binding-override variable of every argument (`None` for arguments that
    /// locate no generic).
    pub fn argument_bindings(&self) -> &[Option<String>] {
        &self.argument_bindings
    }

    pub fn argument_binding(&self, index: usize) -> Option<&str> {
        self.argument_bindings.get(index)?.as_deref()
    }

    /// Every candidate derivation per generic, in resolution order.
    pub fn derivation_map(&self) -> &[(String, Vec<Derivation>)] {
        &self.derivation_map
    }

    /// Candidate derivations of one generic.
    pub fn derivations(&self, name: &str) -> &[Derivation] {
        self.derivation_map
            .iter()
            .find(|(generic, _)| generic == name)
            .map(|(_, candidates)| candidates.as_slice())
            .unwrap_or_default()
    }

    /// Method generics mapped to their derived-slot variables.
    pub fn derived_substitution(&self) -> &Substitution {
        &self.derived
    }

    /// The emitted template parameters, in order.
    pub fn template_params(&self) -> &[TemplateParam] {
        &self.template_params
    }

    pub fn enabler(&self) -> Option<&Enabler> {
        self.enabler.as_ref()
    }

    /// Render the `template <...>` header; empty for non-generic methods.
    pub fn render_header(&self, names: &NameMangler) -> String {
        if self.template_params.is_empty() {
            return String::new();
        }
        let params: Vec<String> = self
            .template_params
            .iter()
            .map(|param| param.render(names))
            .collect();
        format!("template <{}>", params.join(", "))
    }
}
