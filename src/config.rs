//! Generator configuration, loaded from TOML.
//!
//! ```toml
//! top_type = "java.lang.Object"
//! primitives = ["boolean", "int", "void"]
//! support_namespace = "serbridge"
//!
//! [naming]
//! derived_suffix = "_"
//! argument_prefix = "Arg"
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serbridge_core::{NameMangler, QualifiedName};
use serbridge_resolver::{DEFAULT_PRIMITIVES, ResolverConfig};

use crate::error::ConfigError;

/// Names the generator invents in rendered templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Appended to a method generic to name its derived slot.
    pub derived_suffix: String,
    /// Prefix of per-argument binding parameters.
    pub argument_prefix: String,
    /// Name of the trailing enabler parameter.
    pub enabler_name: String,
    /// Prefix of alternate generic parameter spellings.
    pub mangle_prefix: String,
    /// The "derive me" default of method generics.
    pub derive_sentinel: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            derived_suffix: "_".to_string(),
            argument_prefix: "Arg".to_string(),
            enabler_name: "Enable".to_string(),
            mangle_prefix: "T_".to_string(),
            derive_sentinel: "serbridge::derive".to_string(),
        }
    }
}

/// Settings of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Dotted name of the universal top type.
    pub top_type: String,
    pub primitives: Vec<String>,
    /// Namespace of the support library used by rendered lookups.
    pub support_namespace: String,
    pub naming: NamingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            top_type: "java.lang.Object".to_string(),
            primitives: DEFAULT_PRIMITIVES.iter().map(|p| p.to_string()).collect(),
            support_namespace: "serbridge".to_string(),
            naming: NamingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.top_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "top_type must not be empty".to_string(),
            ));
        }
        if self.support_namespace.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "support_namespace must not be empty".to_string(),
            ));
        }
        if self.naming.derived_suffix.is_empty() && self.naming.mangle_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "derived_suffix and mangle_prefix cannot both be empty".to_string(),
            ));
        }
        if let Some(primitive) = self.primitives.iter().find(|p| p.contains('.')) {
            return Err(ConfigError::Invalid(format!(
                "primitive '{primitive}' must be a simple name"
            )));
        }
        Ok(())
    }

    /// The settings handed to the resolver.
    pub fn into_resolver_config(self) -> ResolverConfig {
        let naming = self.naming;
        ResolverConfig {
            top_type: QualifiedName::from_dotted(&self.top_type),
            primitives: self.primitives,
            names: NameMangler::new(
                naming.derived_suffix,
                naming.argument_prefix,
                naming.enabler_name,
                naming.mangle_prefix,
                naming.derive_sentinel,
                self.support_namespace,
            ),
        }
    }
}
