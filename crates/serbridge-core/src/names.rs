//! Generated-name conventions.

/// Produces the auxiliary names used in generated templates.
///
/// Generated code mixes declared parameter names with names the generator
/// invents (derived slots, per-argument bindings, the enabler). The mangler
/// keeps the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMangler {
    derived_suffix: String,
    argument_prefix: String,
    enabler_name: String,
    mangle_prefix: String,
    derive_sentinel: String,
    support_namespace: String,
}

impl Default for NameMangler {
    fn default() -> Self {
        Self {
            derived_suffix: "_".to_string(),
            argument_prefix: "Arg".to_string(),
            enabler_name: "Enable".to_string(),
            mangle_prefix: "T_".to_string(),
            derive_sentinel: "serbridge::derive".to_string(),
            support_namespace: "serbridge".to_string(),
        }
    }
}

impl NameMangler {
    pub fn new(
        derived_suffix: impl Into<String>,
        argument_prefix: impl Into<String>,
        enabler_name: impl Into<String>,
        mangle_prefix: impl Into<String>,
        derive_sentinel: impl Into<String>,
        support_namespace: impl Into<String>,
    ) -> Self {
        Self {
            derived_suffix: derived_suffix.into(),
            argument_prefix: argument_prefix.into(),
            enabler_name: enabler_name.into(),
            mangle_prefix: mangle_prefix.into(),
            derive_sentinel: derive_sentinel.into(),
            support_namespace: support_namespace.into(),
        }
    }

    /// Alternate spelling of a parameter name that cannot collide with it.
    pub fn mangled(&self, name: &str) -> String {
        format!("{}{name}", self.mangle_prefix)
    }

    /// Name of the slot holding the derived value of a method generic.
    pub fn derived(&self, name: &str) -> String {
        format!("{name}{}", self.derived_suffix)
    }

    /// Name of the binding-override variable for the argument at `index`.
    pub fn argument_binding(&self, index: usize) -> String {
        format!("{}{index}", self.argument_prefix)
    }

    pub fn enabler_name(&self) -> &str {
        &self.enabler_name
    }

    /// Default value marking a method generic as "derive me".
    pub fn derive_sentinel(&self) -> &str {
        &self.derive_sentinel
    }

    /// Namespace of the helper templates used in rendered lookups.
    pub fn support_namespace(&self) -> &str {
        &self.support_namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conventions() {
        let names = NameMangler::default();
        assert_eq!(names.mangled("T"), "T_T");
        assert_eq!(names.derived("R"), "R_");
        assert_eq!(names.argument_binding(2), "Arg2");
        assert_eq!(names.enabler_name(), "Enable");
        assert_eq!(names.derive_sentinel(), "serbridge::derive");
    }

    #[test]
    fn custom_conventions() {
        let names = NameMangler::new("_d", "A", "En", "M_", "sb::derive", "sb");
        assert_eq!(names.derived("R"), "R_d");
        assert_eq!(names.argument_binding(0), "A0");
        assert_eq!(names.support_namespace(), "sb");
    }
}
