//! Class generics resolution.
//!
//! Orders a list of generic parameters so that every parameter comes after
//! the parameters its bounds mention, and canonicalizes each parameter's
//! bounds into a single [`Wildcard`].
//!
//! The same algorithm resolves method-level generics; see
//! [`MethodGenerics`](crate::MethodGenerics).

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serbridge_core::{
    BoundTemplate, NameMangler, QualifiedName, ResolveError, Substitution, Wildcard,
};

/// A declared generic parameter and its bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTemplateArgument {
    name: String,
    extend_bounds: Vec<BoundTemplate>,
    super_bounds: Vec<BoundTemplate>,
}

impl ClassTemplateArgument {
    /// A parameter with upper bounds.
    pub fn new(name: impl Into<String>, extend_bounds: Vec<BoundTemplate>) -> Self {
        Self {
            name: name.into(),
            extend_bounds,
            super_bounds: Vec::new(),
        }
    }

    /// A parameter described by a single template.
    ///
    /// A wildcard contributes its bounds; any other template becomes the sole
    /// upper bound.
    pub fn from_template(name: impl Into<String>, template: BoundTemplate) -> Self {
        match template {
            BoundTemplate::Any(wildcard) => Self {
                name: name.into(),
                extend_bounds: wildcard.extend_types().to_vec(),
                super_bounds: wildcard.super_types().to_vec(),
            },
            other => Self::new(name, vec![other]),
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper bounds, as declared.
    pub fn extend_bounds(&self) -> &[BoundTemplate] {
        &self.extend_bounds
    }

    /// Lower bounds, as declared.
    pub fn super_bounds(&self) -> &[BoundTemplate] {
        &self.super_bounds
    }

    /// Every variable name mentioned by the bounds.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.extend_bounds
            .iter()
            .chain(&self.super_bounds)
            .flat_map(BoundTemplate::unresolved_names)
            .collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolved generic parameters of one class (or method).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassGenerics {
    arguments: Vec<ClassTemplateArgument>,
    constraints: FxHashMap<String, Option<Wildcard>>,
    order: Vec<String>,
    erased: Substitution,
}

impl ClassGenerics {
    /// Resolve `arguments`, declared by `owner`.
    ///
    /// Fails on duplicate names and on any dependency cycle, including a
    /// parameter whose bound mentions itself.
    pub fn new(
        owner: &str,
        arguments: Vec<ClassTemplateArgument>,
        top_type: &QualifiedName,
    ) -> Result<Self, ResolveError> {
        let mut seen = BTreeSet::new();
        for argument in &arguments {
            if !seen.insert(argument.name.as_str()) {
                return Err(ResolveError::DuplicateGeneric {
                    owner: owner.to_string(),
                    name: argument.name.clone(),
                });
            }
        }

        let order = resolution_order(&arguments)?;

        let constraints: FxHashMap<String, Option<Wildcard>> = arguments
            .iter()
            .map(|argument| {
                let extends: Vec<BoundTemplate> = argument
                    .extend_bounds
                    .iter()
                    .filter(|bound| !bound.is_class_named(top_type))
                    .cloned()
                    .collect();
                let constraint = if extends.is_empty() && argument.super_bounds.is_empty() {
                    None
                } else {
                    Some(Wildcard::new(argument.super_bounds.clone(), extends))
                };
                (argument.name.clone(), constraint)
            })
            .collect();

        let mut erased = Substitution::default();
        for name in &order {
            let erasure = match constraints.get(name).and_then(Option::as_ref) {
                Some(constraint) => BoundTemplate::wildcard(constraint.rebind(&erased)),
                None => BoundTemplate::any(),
            };
            erased.insert(name.clone(), erasure);
        }

        tracing::trace!(
            target: "serbridge.resolver",
            owner,
            order = ?order,
            "resolved generic parameters"
        );

        Ok(Self {
            arguments,
            constraints,
            order,
            erased,
        })
    }

    /// No generic parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Declared arguments, in declaration order.
    pub fn arguments(&self) -> &[ClassTemplateArgument] {
        &self.arguments
    }

    /// Parameter names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|a| a.name.as_str())
    }

    /// Whether `name` is one of the declared parameters.
    pub fn is_declared(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    /// The canonical bound of `name`; `None` when unconstrained or undeclared.
    pub fn constraint(&self, name: &str) -> Option<&Wildcard> {
        self.constraints.get(name).and_then(Option::as_ref)
    }

    /// Parameter names, dependencies first.
    pub fn resolution_order(&self) -> &[String] {
        &self.order
    }

    /// Every parameter mapped to its erasure.
    pub fn erased(&self) -> &Substitution {
        &self.erased
    }

    /// Erasures in declaration order.
    pub fn erased_bindings(&self) -> Vec<BoundTemplate> {
        self.arguments
            .iter()
            .map(|a| {
                self.erased
                    .get(&a.name)
                    .cloned()
                    .unwrap_or_else(BoundTemplate::any)
            })
            .collect()
    }

    /// Every parameter mapped to a variable of the same name.
    pub fn variables(&self) -> Substitution {
        self.arguments
            .iter()
            .map(|a| (a.name.clone(), BoundTemplate::variable(a.name.clone())))
            .collect()
    }

    /// Alternate spellings of the parameter names, in declaration order.
    pub fn mangled_names(&self, names: &NameMangler) -> Vec<String> {
        self.arguments.iter().map(|a| names.mangled(&a.name)).collect()
    }
}

/// Depth-first ordering with an in-progress set.
fn resolution_order(arguments: &[ClassTemplateArgument]) -> Result<Vec<String>, ResolveError> {
    fn visit(
        index: usize,
        arguments: &[ClassTemplateArgument],
        marks: &mut [Option<Mark>],
        order: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        match marks[index] {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(ResolveError::CyclicGenericDependency {
                    name: arguments[index].name.clone(),
                });
            }
            None => {}
        }
        marks[index] = Some(Mark::InProgress);
        let dependencies = arguments[index].dependencies();
        for (other, argument) in arguments.iter().enumerate() {
            if dependencies.contains(&argument.name) {
                visit(other, arguments, marks, order)?;
            }
        }
        marks[index] = Some(Mark::Done);
        order.push(arguments[index].name.clone());
        Ok(())
    }

    let mut marks = vec![None; arguments.len()];
    let mut order = Vec::with_capacity(arguments.len());
    for index in 0..arguments.len() {
        visit(index, arguments, &mut marks, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serbridge_core::{ClassKind, ClassRef};

    fn top() -> QualifiedName {
        QualifiedName::from_dotted("java.lang.Object")
    }

    fn class(name: &str) -> BoundTemplate {
        BoundTemplate::simple(ClassRef::simple(name))
    }

    fn list_of(inner: BoundTemplate) -> BoundTemplate {
        BoundTemplate::class(
            ClassRef::new(
                QualifiedName::from_dotted("java.util.List"),
                ClassKind::Interface,
                vec!["E".into()],
            ),
            vec![inner],
        )
    }

    fn var(name: &str) -> BoundTemplate {
        BoundTemplate::variable(name)
    }

    #[test]
    fn order_puts_dependencies_first() {
        let generics = ClassGenerics::new(
            "demo.Graph",
            vec![
                ClassTemplateArgument::new("A", vec![list_of(var("B"))]),
                ClassTemplateArgument::new("B", vec![var("C")]),
                ClassTemplateArgument::new("C", vec![]),
                ClassTemplateArgument::new("D", vec![]),
            ],
            &top(),
        )
        .unwrap();
        assert_eq!(generics.resolution_order(), ["C", "B", "A", "D"]);
        assert_eq!(generics.names().collect::<Vec<_>>(), ["A", "B", "C", "D"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = ClassGenerics::new(
            "demo.Sorted",
            vec![ClassTemplateArgument::new(
                "T",
                vec![BoundTemplate::class(
                    ClassRef::new(
                        QualifiedName::from_dotted("java.lang.Comparable"),
                        ClassKind::Interface,
                        vec!["T".into()],
                    ),
                    vec![var("T")],
                )],
            )],
            &top(),
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::CyclicGenericDependency { name: "T".into() });
    }

    #[test]
    fn mutual_reference_is_a_cycle() {
        let err = ClassGenerics::new(
            "demo.Pair",
            vec![
                ClassTemplateArgument::new("A", vec![var("B")]),
                ClassTemplateArgument::new("B", vec![var("A")]),
            ],
            &top(),
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::CyclicGenericDependency { name: "A".into() });
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = ClassGenerics::new(
            "demo.Dup",
            vec![
                ClassTemplateArgument::new("T", vec![]),
                ClassTemplateArgument::new("T", vec![]),
            ],
            &top(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateGeneric { ref name, .. } if name == "T"));
    }

    #[test]
    fn top_type_bounds_are_unconstrained() {
        let generics = ClassGenerics::new(
            "demo.Box",
            vec![
                ClassTemplateArgument::new("T", vec![class("java.lang.Object")]),
                ClassTemplateArgument::new("N", vec![class("java.lang.Object"), class("java.lang.Number")]),
            ],
            &top(),
        )
        .unwrap();
        assert_eq!(generics.constraint("T"), None);
        assert_eq!(
            generics.constraint("N"),
            Some(&Wildcard::extends(vec![class("java.lang.Number")]))
        );
        assert_eq!(generics.erased()["T"], BoundTemplate::any());
    }

    #[test]
    fn erasures_substitute_earlier_parameters() {
        let generics = ClassGenerics::new(
            "demo.Chain",
            vec![
                ClassTemplateArgument::new("A", vec![var("B")]),
                ClassTemplateArgument::new("B", vec![class("java.lang.Number")]),
            ],
            &top(),
        )
        .unwrap();
        let number = BoundTemplate::wildcard(Wildcard::extends(vec![class("java.lang.Number")]));
        assert_eq!(generics.erased()["A"], number);
        assert_eq!(generics.erased()["B"], number);
        assert_eq!(generics.erased_bindings(), vec![number.clone(), number]);
        for erasure in generics.erased().values() {
            assert!(erasure.is_fully_bound());
        }
    }

    #[test]
    fn wildcard_templates_keep_lower_bounds() {
        let argument = ClassTemplateArgument::from_template(
            "R",
            BoundTemplate::wildcard(Wildcard::super_of(vec![class("java.lang.Integer")])),
        );
        assert!(argument.extend_bounds().is_empty());
        assert_eq!(argument.super_bounds(), [class("java.lang.Integer")]);

        let generics = ClassGenerics::new("m", vec![argument], &top()).unwrap();
        assert_eq!(
            generics.constraint("R"),
            Some(&Wildcard::super_of(vec![class("java.lang.Integer")]))
        );
    }

    #[test]
    fn undeclared_names_are_not_dependencies() {
        // `T` belongs to the enclosing class, not to this parameter list.
        let generics = ClassGenerics::new(
            "demo.Box.map",
            vec![ClassTemplateArgument::new("R", vec![list_of(var("T"))])],
            &top(),
        )
        .unwrap();
        assert_eq!(generics.resolution_order(), ["R"]);
        assert!(generics.erased()["R"].references("T"));
    }

    #[test]
    fn mangled_names() {
        let generics = ClassGenerics::new(
            "demo.Map",
            vec![
                ClassTemplateArgument::new("K", vec![]),
                ClassTemplateArgument::new("V", vec![]),
            ],
            &top(),
        )
        .unwrap();
        assert_eq!(generics.mangled_names(&NameMangler::default()), ["T_K", "T_V"]);
        assert_eq!(generics.variables()["K"], var("K"));
    }
}
