//! The resolver: one generation run over a set of classes.

use std::sync::Arc;

use serbridge_core::{
    BoundTemplate, ClassDescriptor, QualifiedName, RegistrationError, ResolveError, Substitution,
};
use serbridge_registry::{ClassId, ClassRegistry, ClassSource, NoClassSource, Phase};

use crate::config::ResolverConfig;
use crate::members::{MemberProvider, NoExtraMembers, ProvidedSource, with_extra_members};
use crate::model::ClassModel;
use crate::passes::{CollectPass, FinalizePass};

/// Drives the Collecting → Finalizing → Emitting machine.
///
/// Classes are added while collecting, either explicitly or lazily through
/// the [`ClassSource`] when another class mentions them. [`finalize`]
/// closes the class set and builds every model; afterwards the resolver is
/// read-only.
///
/// [`finalize`]: Resolver::finalize
pub struct Resolver {
    config: ResolverConfig,
    registry: ClassRegistry<ClassModel>,
    source: Box<dyn ClassSource>,
    members: Box<dyn MemberProvider>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        let registry = ClassRegistry::new(config.top_type.clone(), config.primitives.as_slice());
        Self {
            config,
            registry,
            source: Box::new(NoClassSource),
            members: Box::new(NoExtraMembers),
        }
    }

    /// Discover referenced classes from `source`.
    pub fn with_source(mut self, source: impl ClassSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Contribute extra member declarations to every class.
    pub fn with_members(mut self, members: impl MemberProvider + 'static) -> Self {
        self.members = Box::new(members);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.registry.phase()
    }

    /// Read access to the class registry.
    pub fn registry(&self) -> &ClassRegistry<ClassModel> {
        &self.registry
    }

    /// Add a class to generate.
    pub fn add_class(&mut self, descriptor: ClassDescriptor) -> Result<ClassId, ResolveError> {
        let descriptor = with_extra_members(descriptor, self.members.as_ref());
        Ok(self.registry.register(descriptor)?)
    }

    /// Add every class the source offers.
    pub fn add_all_from_source(&mut self) -> Result<usize, ResolveError> {
        let descriptors = self.source.descriptors();
        let count = descriptors.len();
        for descriptor in descriptors {
            self.add_class(descriptor)?;
        }
        Ok(count)
    }

    /// Resolve `name`, registering it from the source while collecting.
    pub fn require_class(&mut self, name: &QualifiedName) -> Result<ClassId, ResolveError> {
        let source = ProvidedSource {
            source: self.source.as_ref(),
            members: self.members.as_ref(),
        };
        let class = self.registry.resolve(name, &source)?;
        self.registry
            .lookup(class.name())
            .ok_or_else(|| RegistrationError::ClassNotFound(name.to_string()).into())
    }

    /// Parse a free-standing type expression against the registered classes.
    ///
    /// While collecting, unknown names are registered from the source.
    pub fn parse_type(
        &mut self,
        text: &str,
        variables: &Substitution,
    ) -> Result<BoundTemplate, ResolveError> {
        let source = ProvidedSource {
            source: self.source.as_ref(),
            members: self.members.as_ref(),
        };
        let registry = &mut self.registry;
        let mut failure = None;
        let mut resolve = |name: &QualifiedName| match registry.resolve(name, &source) {
            Ok(class) => Some(class),
            Err(err) => {
                failure.get_or_insert(err);
                None
            }
        };
        let parsed = serbridge_parser::parse_type(text, variables, &mut resolve);
        parsed.map_err(|err| match failure {
            Some(failure) => failure.into(),
            None => ResolveError::InvalidTypeExpression {
                class: String::new(),
                context: "type expression".to_string(),
                source: err,
            },
        })
    }

    /// Close the class set and build every class model.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finalize(&mut self) -> Result<(), ResolveError> {
        let source = ProvidedSource {
            source: self.source.as_ref(),
            members: self.members.as_ref(),
        };
        CollectPass::new(&mut self.registry, &source).run()?;
        self.registry.begin_finalize()?;
        FinalizePass::new(&mut self.registry, &source, &self.config).run()?;
        self.registry.begin_emitting()?;
        Ok(())
    }

    /// The model of `name`, once finalized.
    pub fn model(&self, name: &QualifiedName) -> Option<&Arc<ClassModel>> {
        self.registry.model_by_name(name)
    }

    /// Every finished model, in registration order.
    pub fn models(&self) -> impl Iterator<Item = &Arc<ClassModel>> + '_ {
        self.registry.ids().filter_map(|id| self.registry.model(id))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
