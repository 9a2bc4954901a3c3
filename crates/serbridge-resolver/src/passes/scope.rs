//! Parsing descriptor type expressions against the registry.

use serbridge_core::{
    BoundTemplate, ClassRef, QualifiedName, RegistrationError, ResolveError, Substitution,
};
use serbridge_parser::{ClassResolver, TypeParser};
use serbridge_registry::{ClassRegistry, ClassSource};

/// Resolves names through the registry, remembering the first failure.
struct RegistryResolver<'a, M> {
    registry: &'a mut ClassRegistry<M>,
    source: &'a dyn ClassSource,
    failure: Option<RegistrationError>,
}

impl<M> ClassResolver for RegistryResolver<'_, M> {
    fn resolve_class(&mut self, name: &QualifiedName) -> Option<ClassRef> {
        match self.registry.resolve(name, self.source) {
            Ok(class) => Some(class),
            Err(err) => {
                self.failure.get_or_insert(err);
                None
            }
        }
    }
}

/// The names visible to one type expression.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) class: &'a QualifiedName,
    pub(crate) variables: &'a Substitution,
    pub(crate) this: &'a BoundTemplate,
}

impl Scope<'_> {
    /// Parse `text`; `context` names the position for error messages.
    ///
    /// A registry failure behind an unknown name is reported as itself, so
    /// that a class missing after collection surfaces as "not registered".
    pub(crate) fn parse<M>(
        &self,
        registry: &mut ClassRegistry<M>,
        source: &dyn ClassSource,
        context: &str,
        text: &str,
    ) -> Result<BoundTemplate, ResolveError> {
        let mut resolver = RegistryResolver {
            registry,
            source,
            failure: None,
        };
        let parsed = TypeParser::new(text, &mut resolver)
            .with_variables(self.variables)
            .with_this(self.this)
            .parse();
        match parsed {
            Ok(ty) => Ok(ty),
            Err(err) => match resolver.failure {
                Some(failure) => Err(failure.into()),
                None => Err(ResolveError::InvalidTypeExpression {
                    class: self.class.to_string(),
                    context: context.to_string(),
                    source: err,
                }),
            },
        }
    }

    /// Parse `text` as a class type.
    pub(crate) fn parse_class<M>(
        &self,
        registry: &mut ClassRegistry<M>,
        source: &dyn ClassSource,
        context: &str,
        text: &str,
    ) -> Result<BoundTemplate, ResolveError> {
        let ty = self.parse(registry, source, context, text)?;
        if ty.as_class().is_none() {
            return Err(RegistrationError::InvalidSupertype {
                class: self.class.to_string(),
                supertype: ty.to_string(),
                reason: format!("{context} must be a class type"),
            }
            .into());
        }
        Ok(ty)
    }
}

/// `names` mapped to variables of the same name.
pub(crate) fn variables_for<'a>(names: impl IntoIterator<Item = &'a str>) -> Substitution {
    names
        .into_iter()
        .map(|name| (name.to_string(), BoundTemplate::variable(name)))
        .collect()
}

/// `class` instantiated with its own parameters.
pub(crate) fn this_binding(class: &ClassRef) -> BoundTemplate {
    BoundTemplate::class(
        class.clone(),
        class.params().iter().map(BoundTemplate::variable).collect(),
    )
}
