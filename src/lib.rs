//! serbridge: resolve Java-style generic class models into C++ template
//! signatures.
//!
//! The [`Generator`] ties the pipeline together:
//!
//! 1. Load a [`GeneratorConfig`] (TOML)
//! 2. Add class descriptors, explicitly or through a [`ClassSource`]
//! 3. [`generate`](Generator::generate) collects, finalizes and returns the
//!    read-only [`Resolver`] holding every [`ClassModel`]
//!
//! ## Example
//!
//! ```
//! use serbridge::{ClassDescriptor, Generator, GeneratorConfig, MemberDecl};
//!
//! let mut generator = Generator::new(GeneratorConfig::default());
//! generator
//!     .add_class(
//!         ClassDescriptor::class("demo.Box")
//!             .with_generic("T", Vec::<String>::new())
//!             .with_field("value", "T")
//!             .with_member(MemberDecl::method("get", "T").constant()),
//!     )
//!     .unwrap();
//! let resolver = generator.generate().unwrap();
//!
//! let model = resolver.model(&"demo.Box".into()).unwrap();
//! assert_eq!(model.fields()[0].ty.to_string(), "T");
//! assert_eq!(model.virtual_methods().len(), 1);
//! ```

mod config;
mod error;
pub mod logging;

pub use config::{GeneratorConfig, NamingConfig};
pub use error::{ConfigError, GeneratorError};

pub use serbridge_core::{
    BoundTemplate, ClassDescriptor, ClassKind, ClassRef, FieldDecl, GenericParamDecl, MemberDecl,
    MethodGenericDecl, Modifiers, NameMangler, ParseError, QualifiedName, RegistrationError,
    ResolveError, SelectorError, SerbridgeError, Substitution, TemplateSelector, Visibility,
    Wildcard,
};
pub use serbridge_parser::{ClassResolver, TypeParser, parse_type};
pub use serbridge_registry::{ClassSource, InMemoryClassSource, NoClassSource, Phase};
pub use serbridge_resolver::{
    ChangedTypes, ClassGenerics, ClassModel, DispatchEntry, Enabler, EnablerClause, FieldModel,
    ImplementedClassMethod, MemberProvider, MethodGenerics, MethodModel, OverrideSelector,
    Resolver, ResolverConfig, TemplateParam,
};

/// One generation run.
pub struct Generator {
    resolver: Resolver,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            resolver: Resolver::new(config.into_resolver_config()),
        }
    }

    /// Discover referenced classes from `source`.
    pub fn with_source(self, source: impl ClassSource + 'static) -> Self {
        Self {
            resolver: self.resolver.with_source(source),
        }
    }

    /// Contribute extra member declarations to every class.
    pub fn with_members(self, members: impl MemberProvider + 'static) -> Self {
        Self {
            resolver: self.resolver.with_members(members),
        }
    }

    pub fn add_class(&mut self, descriptor: ClassDescriptor) -> Result<(), GeneratorError> {
        self.resolver.add_class(descriptor)?;
        Ok(())
    }

    /// Add every descriptor of a JSON array.
    pub fn add_json(&mut self, json: &str) -> Result<usize, GeneratorError> {
        let descriptors: Vec<ClassDescriptor> = serde_json::from_str(json)?;
        let count = descriptors.len();
        for descriptor in descriptors {
            self.add_class(descriptor)?;
        }
        Ok(count)
    }

    /// Add every class the source offers.
    pub fn add_all_from_source(&mut self) -> Result<usize, GeneratorError> {
        Ok(self.resolver.add_all_from_source()?)
    }

    /// Collect and finalize, returning the read-only resolver.
    pub fn generate(mut self) -> Result<Resolver, GeneratorError> {
        tracing::debug!(
            target: "serbridge",
            classes = self.resolver.registry().len(),
            "generating class models"
        );
        self.resolver.finalize()?;
        tracing::debug!(
            target: "serbridge",
            models = self.resolver.models().count(),
            "generation complete"
        );
        Ok(self.resolver)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("resolver", &self.resolver)
            .finish()
    }
}
