//! Template selectors.
//!
//! A [`TemplateSelector`] describes how to recover the value bound to one
//! generic parameter from a concrete instantiation: peel off array extents,
//! step into the binding at some index of some base class, and so on until the
//! parameter itself is reached. Selectors are computed structurally and
//! rendered as dependent-type lookups; nothing is evaluated here.

use std::fmt;

use crate::{BoundTemplate, ClassRef, SelectorError};

/// A structural path to a bound value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSelector {
    /// The value itself.
    Type,
    /// Remove `remove_extents` array dimensions, then continue with `next`.
    Array {
        remove_extents: usize,
        next: Box<TemplateSelector>,
    },
    /// Take binding `index` of `base`, then continue with `next`.
    Binding {
        base: ClassRef,
        index: usize,
        next: Box<TemplateSelector>,
    },
}

impl TemplateSelector {
    /// Build a binding step, checking `index` against the arity of `base`.
    pub fn binding(
        base: ClassRef,
        index: usize,
        next: TemplateSelector,
    ) -> Result<Self, SelectorError> {
        if index >= base.arity() {
            return Err(SelectorError::IndexOutOfBounds {
                index,
                type_name: base.name().to_string(),
                arity: base.arity(),
            });
        }
        Ok(TemplateSelector::Binding {
            base,
            index,
            next: Box::new(next),
        })
    }

    /// Build an array step.
    pub fn array(remove_extents: usize, next: TemplateSelector) -> Self {
        TemplateSelector::Array {
            remove_extents,
            next: Box::new(next),
        }
    }

    /// Every selector leading from `instantiation` to the variable `target`.
    ///
    /// `const` is looked through and wildcard positions never yield a
    /// selector. Results follow binding order, depth first.
    pub fn find(
        instantiation: &BoundTemplate,
        target: &str,
    ) -> Result<Vec<TemplateSelector>, SelectorError> {
        let mut found = Vec::new();
        match instantiation {
            BoundTemplate::Variable(var) => {
                if var.name() == target {
                    found.push(TemplateSelector::Type);
                }
            }
            BoundTemplate::Const(inner) => return Self::find(inner.inner(), target),
            BoundTemplate::Array(array) => {
                for next in Self::find(array.element(), target)? {
                    found.push(Self::array(array.extents(), next));
                }
            }
            BoundTemplate::Class(class) => {
                for (index, binding) in class.bindings().iter().enumerate() {
                    for next in Self::find(binding, target)? {
                        found.push(Self::binding(class.class().clone(), index, next)?);
                    }
                }
            }
            BoundTemplate::Any(_) => {}
        }
        Ok(found)
    }

    /// Follow this selector through a concrete value.
    ///
    /// Binding steps require `value` to instantiate exactly the step's base
    /// class. Returns `None` when the shape does not match.
    pub fn apply(&self, value: &BoundTemplate) -> Option<BoundTemplate> {
        match self {
            TemplateSelector::Type => Some(value.clone()),
            TemplateSelector::Array {
                remove_extents,
                next,
            } => {
                let array = value.as_array()?;
                if array.extents() < *remove_extents {
                    return None;
                }
                let rest = BoundTemplate::array(
                    array.element().clone(),
                    array.extents() - remove_extents,
                );
                next.apply(&rest)
            }
            TemplateSelector::Binding { base, index, next } => {
                let class = value.as_class()?;
                if class.class() != base {
                    return None;
                }
                next.apply(class.bindings().get(*index)?)
            }
        }
    }

    /// Number of steps before the terminal.
    pub fn depth(&self) -> usize {
        match self {
            TemplateSelector::Type => 0,
            TemplateSelector::Array { next, .. } | TemplateSelector::Binding { next, .. } => {
                1 + next.depth()
            }
        }
    }

    /// Render as a dependent-type lookup applied to `subject`.
    ///
    /// Helper templates are taken from `support_namespace`.
    pub fn render(&self, subject: &str, support_namespace: &str) -> String {
        match self {
            TemplateSelector::Type => subject.to_string(),
            TemplateSelector::Array {
                remove_extents,
                next,
            } => next.render(
                &format!("{support_namespace}::remove_extents_t<{subject}, {remove_extents}>"),
                support_namespace,
            ),
            TemplateSelector::Binding { base, index, next } => next.render(
                &format!(
                    "typename {support_namespace}::binding<{}, {index}, {subject}>::type",
                    base.name().cpp_name()
                ),
                support_namespace,
            ),
        }
    }
}

impl fmt::Display for TemplateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSelector::Type => f.write_str("type"),
            TemplateSelector::Array {
                remove_extents,
                next,
            } => write!(f, "array({remove_extents}) -> {next}"),
            TemplateSelector::Binding { base, index, next } => {
                write!(f, "binding({}, {index}) -> {next}", base.name())
            }
        }
    }
}
