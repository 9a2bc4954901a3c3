//! Virtual methods placed on their classes, linked to what they override.
//!
//! Placement validates the whole override closure, including covariant
//! returns and their tags.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serbridge_core::{BoundTemplate, ClassRef, ResolveError, Substitution};

use super::hierarchy::{HierarchyView, is_assignable};
use super::selector::OverrideSelector;

/// Everything needed to place one method declaration on its class.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// The declaring class.
    pub class: ClassRef,
    /// The declaring class instantiated with its own parameters.
    pub this: BoundTemplate,
    pub selector: OverrideSelector,
    /// Tag of a covariant return, parsed as a class type.
    pub tag: Option<ClassRef>,
    pub is_virtual: bool,
    /// Class parameters mapped to their erasures.
    pub class_erasure: Substitution,
    /// Method generics mapped to their erasures.
    pub method_erasure: Substitution,
}

/// Which parts of a signature differ from naive erasure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangedTypes {
    pub arguments: bool,
    pub return_type: bool,
}

impl ChangedTypes {
    /// Whether either part changed.
    pub fn any(&self) -> bool {
        self.arguments || self.return_type
    }
}

/// A virtual method as placed on one class, with the methods it overrides.
///
/// Nodes form a DAG across ancestor classes. Two nodes are equal when they
/// sit on the same class and share the same erased signature.
#[derive(Debug, Clone)]
pub struct ImplementedClassMethod {
    class: ClassRef,
    this: BoundTemplate,
    tag: Option<ClassRef>,
    selector: OverrideSelector,
    erased: OverrideSelector,
    class_erasure: Substitution,
    method_erasure: Substitution,
    is_virtual: bool,
    covariant: bool,
    overrides: Vec<Arc<ImplementedClassMethod>>,
}

impl ImplementedClassMethod {
    /// Place `spec` on its class, overriding `overrides`.
    ///
    /// Validates the complete override closure: names and `const` match,
    /// non-virtual methods override nothing, covariant returns are assignable
    /// and tagged with the declaring class or an overridden method's tag, and
    /// non-covariant methods carry no tag.
    pub fn new(
        spec: MethodSpec,
        overrides: Vec<Arc<ImplementedClassMethod>>,
        hierarchy: &dyn HierarchyView,
    ) -> Result<Self, ResolveError> {
        let MethodSpec {
            class,
            this,
            selector,
            tag,
            is_virtual,
            class_erasure,
            method_erasure,
        } = spec;
        let erased = selector.rebind(&method_erasure).rebind(&class_erasure);
        let invalid = |overridden: &OverrideSelector, reason: &str| ResolveError::InvalidOverride {
            method: selector.to_string(),
            overridden: overridden.to_string(),
            reason: reason.to_string(),
        };

        if !is_virtual {
            if let Some(first) = overrides.first() {
                return Err(invalid(&first.selector, "a non-virtual method cannot override"));
            }
        }

        let closure = closure_of(&overrides);
        for overridden in &closure {
            if overridden.selector.name() != selector.name()
                || overridden.selector.is_const() != selector.is_const()
            {
                return Err(invalid(
                    &overridden.selector,
                    "an override must preserve name and const qualification",
                ));
            }
        }

        let covariant = closure
            .iter()
            .any(|overridden| overridden.erased.return_type() != erased.return_type());

        if covariant {
            let own_return = selector.rebind(&method_erasure).return_type().clone();
            for overridden in &overrides {
                let Some(view) = overridden.view_from(&class, hierarchy) else {
                    return Err(invalid(
                        &overridden.selector,
                        "the overridden method is not declared by an ancestor",
                    ));
                };
                if !is_assignable(&own_return, view.return_type(), &class_erasure, hierarchy) {
                    return Err(invalid(
                        &overridden.selector,
                        "the covariant return type is not assignable to the overridden return type",
                    ));
                }
            }
            let Some(tag) = &tag else {
                return Err(invalid(
                    &closure[0].selector,
                    "a covariant return requires a tag",
                ));
            };
            let accepted = tag == &class
                || closure
                    .iter()
                    .any(|overridden| overridden.tag.as_ref() == Some(tag));
            if !accepted {
                return Err(invalid(
                    &closure[0].selector,
                    &format!(
                        "tag {} is neither the declaring class nor the tag of an overridden method",
                        tag.name()
                    ),
                ));
            }
        } else if let Some(tag) = &tag {
            let reason = format!("tag {} on a method without a covariant return", tag.name());
            return Err(match closure.first() {
                Some(first) => invalid(&first.selector, &reason),
                None => ResolveError::InvalidOverride {
                    method: selector.to_string(),
                    overridden: String::new(),
                    reason,
                },
            });
        }

        tracing::trace!(
            target: "serbridge.resolver",
            class = %class.name(),
            method = %selector,
            overrides = overrides.len(),
            covariant,
            "placed virtual method"
        );

        Ok(Self {
            class,
            this,
            tag,
            selector,
            erased,
            class_erasure,
            method_erasure,
            is_virtual,
            covariant,
            overrides,
        })
    }

    /// The class the method is placed on.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn this(&self) -> &BoundTemplate {
        &self.this
    }

    /// Tag of a covariant return.
    pub fn tag(&self) -> Option<&ClassRef> {
        self.tag.as_ref()
    }

    /// The declared signature.
    pub fn selector(&self) -> &OverrideSelector {
        &self.selector
    }

    /// The signature with class and method generics replaced by their
    /// erasures.
    pub fn erased_selector(&self) -> &OverrideSelector {
        &self.erased
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Whether the erased return type differs from an overridden method's.
    pub fn is_covariant(&self) -> bool {
        self.covariant
    }

    /// Directly overridden methods.
    pub fn overrides(&self) -> &[Arc<ImplementedClassMethod>] {
        &self.overrides
    }

    /// The canonical form of this method: its selector is the erased
    /// selector.
    pub fn erased_method(&self) -> Self {
        Self {
            selector: self.erased.clone(),
            ..self.clone()
        }
    }

    /// This method's signature as seen from `implementing`, in terms of
    /// `implementing`'s generic parameters.
    ///
    /// A raw ancestor use falls back to the erasures of this method's class.
    pub fn view_from(
        &self,
        implementing: &ClassRef,
        hierarchy: &dyn HierarchyView,
    ) -> Option<OverrideSelector> {
        let binding = hierarchy.ancestor_binding(implementing.name(), self.class.name())?;
        let substitution = match binding.as_class() {
            Some(class) if !class.is_raw() => class.substitution(),
            _ => hierarchy.erased_bindings(self.class.name()),
        };
        Some(
            self.selector
                .rebind(&self.method_erasure)
                .rebind(&substitution),
        )
    }

    /// Compare this method, erased at `implementing`, with its own erasure.
    ///
    /// Returns `None` when this method's class is not an ancestor of
    /// `implementing`.
    pub fn has_changed_types(
        &self,
        implementing: &ClassRef,
        hierarchy: &dyn HierarchyView,
    ) -> Option<ChangedTypes> {
        let view = self
            .view_from(implementing, hierarchy)?
            .rebind(&hierarchy.erased_bindings(implementing.name()));
        Some(ChangedTypes {
            arguments: view.argument_types() != self.erased.argument_types(),
            return_type: view.return_type() != self.erased.return_type(),
        })
    }

    /// Every transitively overridden method, depth first, each once.
    pub fn all_overridden_methods(&self) -> Vec<Arc<ImplementedClassMethod>> {
        closure_of(&self.overrides)
    }

    /// Specialize the declared signature. The erased signature, and with it
    /// the node's identity, is unchanged.
    pub fn rebind(&self, substitution: &Substitution) -> Self {
        Self {
            this: self.this.rebind(substitution),
            selector: self.selector.rebind(substitution),
            ..self.clone()
        }
    }
}

fn closure_of(roots: &[Arc<ImplementedClassMethod>]) -> Vec<Arc<ImplementedClassMethod>> {
    fn visit(
        node: &Arc<ImplementedClassMethod>,
        seen: &mut FxHashSet<Arc<ImplementedClassMethod>>,
        out: &mut Vec<Arc<ImplementedClassMethod>>,
    ) {
        if !seen.insert(Arc::clone(node)) {
            return;
        }
        out.push(Arc::clone(node));
        for next in &node.overrides {
            visit(next, seen, out);
        }
    }

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for root in roots {
        visit(root, &mut seen, &mut out);
    }
    out
}

impl PartialEq for ImplementedClassMethod {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.erased == other.erased
    }
}

impl Eq for ImplementedClassMethod {}

impl Hash for ImplementedClassMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.erased.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::super::hierarchy::testing::TestHierarchy;
    use super::*;
    use pretty_assertions::assert_eq;
    use serbridge_core::{ClassKind, QualifiedName, Wildcard};

    fn class(name: &str, params: &[&str]) -> ClassRef {
        ClassRef::new(
            QualifiedName::from_dotted(name),
            ClassKind::Class,
            params.iter().map(|p| p.to_string()).collect(),
        )
    }

    fn this_of(class: &ClassRef) -> BoundTemplate {
        BoundTemplate::class(
            class.clone(),
            class.params().iter().map(BoundTemplate::variable).collect(),
        )
    }

    fn erasure_of(class: &ClassRef) -> Substitution {
        class
            .params()
            .iter()
            .map(|p| (p.clone(), BoundTemplate::any()))
            .collect()
    }

    fn spec(
        class: &ClassRef,
        name: &str,
        args: Vec<BoundTemplate>,
        ret: BoundTemplate,
        tag: Option<ClassRef>,
    ) -> MethodSpec {
        MethodSpec {
            class: class.clone(),
            this: this_of(class),
            selector: OverrideSelector::new(this_of(class), name, false, args, ret),
            tag,
            is_virtual: true,
            class_erasure: erasure_of(class),
            method_erasure: Substitution::default(),
        }
    }

    struct Fixture {
        hierarchy: TestHierarchy,
        base: ClassRef,
        derived: ClassRef,
        other: ClassRef,
        number: BoundTemplate,
        integer: BoundTemplate,
    }

    fn fixture() -> Fixture {
        let mut hierarchy = TestHierarchy::new();
        let object = BoundTemplate::simple(ClassRef::simple("java.lang.Object"));
        let number = class("java.lang.Number", &[]);
        let integer = class("java.lang.Integer", &[]);
        let base = class("demo.Base", &[]);
        let derived = class("demo.Derived", &[]);
        let other = class("demo.Other", &[]);
        hierarchy.declare(&number, &[object.clone()]);
        hierarchy.declare(&integer, &[BoundTemplate::simple(number.clone())]);
        hierarchy.declare(&base, &[object.clone()]);
        hierarchy.declare(&derived, &[BoundTemplate::simple(base.clone())]);
        hierarchy.declare(&other, &[object]);
        Fixture {
            hierarchy,
            base,
            derived,
            other,
            number: BoundTemplate::simple(number),
            integer: BoundTemplate::simple(integer),
        }
    }

    fn base_get(f: &Fixture) -> Arc<ImplementedClassMethod> {
        Arc::new(
            ImplementedClassMethod::new(
                spec(&f.base, "get", vec![], f.number.clone(), None),
                vec![],
                &f.hierarchy,
            )
            .unwrap(),
        )
    }

    #[test]
    fn covariant_override_tagged_with_declaring_class() {
        let f = fixture();
        let base = base_get(&f);
        let derived = ImplementedClassMethod::new(
            spec(&f.derived, "get", vec![], f.integer.clone(), Some(f.derived.clone())),
            vec![base.clone()],
            &f.hierarchy,
        )
        .unwrap();
        assert!(derived.is_covariant());
        assert_eq!(derived.tag(), Some(&f.derived));
        assert_eq!(derived.all_overridden_methods(), vec![base]);
    }

    fn bounded_get(bound: Option<BoundTemplate>, tag: bool) -> MethodSpec {
        let num_box = class("demo.NumBox", &["T"]);
        let tag = tag.then(|| num_box.clone());
        let mut method = spec(&num_box, "get", vec![], BoundTemplate::variable("T"), tag);
        let erasure = match bound {
            Some(bound) => BoundTemplate::wildcard(Wildcard::extends(vec![bound])),
            None => BoundTemplate::any(),
        };
        method.class_erasure = [("T".to_string(), erasure)].into_iter().collect();
        method
    }

    fn declare_num_box(f: &mut Fixture) {
        let num_box = class("demo.NumBox", &["T"]);
        f.hierarchy
            .declare(&num_box, &[BoundTemplate::simple(f.base.clone())]);
    }

    #[test]
    fn bounded_variable_return_overrides_its_bound() {
        let mut f = fixture();
        declare_num_box(&mut f);
        let base = base_get(&f);
        let method = ImplementedClassMethod::new(
            bounded_get(Some(f.number.clone()), true),
            vec![base.clone()],
            &f.hierarchy,
        )
        .unwrap();
        assert!(method.is_covariant());
        assert_eq!(method.all_overridden_methods(), vec![base.clone()]);
        assert_eq!(
            method.erased_selector().return_type(),
            &BoundTemplate::wildcard(Wildcard::extends(vec![f.number.clone()]))
        );

        // Narrower bounds are assignable too.
        assert!(
            ImplementedClassMethod::new(
                bounded_get(Some(f.integer.clone()), true),
                vec![base.clone()],
                &f.hierarchy,
            )
            .is_ok()
        );

        let err = ImplementedClassMethod::new(
            bounded_get(Some(f.number.clone()), false),
            vec![base],
            &f.hierarchy,
        )
        .unwrap_err();
        match err {
            ResolveError::InvalidOverride { reason, .. } => assert!(reason.contains("requires a tag")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bounded_variable_return_must_fit_the_overridden_type() {
        let mut f = fixture();
        declare_num_box(&mut f);
        let base_integer = Arc::new(
            ImplementedClassMethod::new(
                spec(&f.base, "get", vec![], f.integer.clone(), None),
                vec![],
                &f.hierarchy,
            )
            .unwrap(),
        );
        let err = ImplementedClassMethod::new(
            bounded_get(Some(f.number.clone()), true),
            vec![base_integer],
            &f.hierarchy,
        )
        .unwrap_err();
        match err {
            ResolveError::InvalidOverride { reason, .. } => assert!(reason.contains("not assignable")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unbounded_variable_return_overrides_the_top_type() {
        let mut f = fixture();
        declare_num_box(&mut f);
        let object = BoundTemplate::simple(ClassRef::simple("java.lang.Object"));
        let base_object = Arc::new(
            ImplementedClassMethod::new(
                spec(&f.base, "get", vec![], object, None),
                vec![],
                &f.hierarchy,
            )
            .unwrap(),
        );
        let method = ImplementedClassMethod::new(
            bounded_get(None, true),
            vec![base_object.clone()],
            &f.hierarchy,
        )
        .unwrap();
        assert!(method.is_covariant());

        let err = ImplementedClassMethod::new(
            bounded_get(None, true),
            vec![base_get(&f)],
            &f.hierarchy,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOverride { .. }));
    }

    #[test]
    fn covariant_override_with_unrelated_tag_fails() {
        let f = fixture();
        let err = ImplementedClassMethod::new(
            spec(&f.derived, "get", vec![], f.integer.clone(), Some(f.other.clone())),
            vec![base_get(&f)],
            &f.hierarchy,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOverride { .. }));
    }

    #[test]
    fn covariant_override_needs_a_tag() {
        let f = fixture();
        let err = ImplementedClassMethod::new(
            spec(&f.derived, "get", vec![], f.integer.clone(), None),
            vec![base_get(&f)],
            &f.hierarchy,
        )
        .unwrap_err();
        match err {
            ResolveError::InvalidOverride { reason, .. } => assert!(reason.contains("requires a tag")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn covariant_return_must_narrow() {
        let f = fixture();
        let string = BoundTemplate::simple(ClassRef::simple("java.lang.String"));
        let err = ImplementedClassMethod::new(
            spec(&f.derived, "get", vec![], string, Some(f.derived.clone())),
            vec![base_get(&f)],
            &f.hierarchy,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOverride { .. }));
    }

    #[test]
    fn inherited_tag_is_accepted() {
        let mut f = fixture();
        let leaf = class("demo.Leaf", &[]);
        f.hierarchy
            .declare(&leaf, &[BoundTemplate::simple(f.derived.clone())]);
        let derived = Arc::new(
            ImplementedClassMethod::new(
                spec(&f.derived, "get", vec![], f.integer.clone(), Some(f.derived.clone())),
                vec![base_get(&f)],
                &f.hierarchy,
            )
            .unwrap(),
        );
        let leaf_method = ImplementedClassMethod::new(
            spec(&leaf, "get", vec![], f.integer.clone(), Some(f.derived.clone())),
            vec![derived],
            &f.hierarchy,
        )
        .unwrap();
        assert!(leaf_method.is_covariant());
        assert_eq!(leaf_method.all_overridden_methods().len(), 2);
    }

    #[test]
    fn non_covariant_method_rejects_a_tag() {
        let f = fixture();
        let err = ImplementedClassMethod::new(
            spec(&f.derived, "get", vec![], f.number.clone(), Some(f.derived.clone())),
            vec![base_get(&f)],
            &f.hierarchy,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOverride { .. }));

        let err = ImplementedClassMethod::new(
            spec(&f.base, "size", vec![], f.number.clone(), Some(f.base.clone())),
            vec![],
            &f.hierarchy,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOverride { .. }));
    }

    #[test]
    fn name_const_and_virtuality_are_checked() {
        let f = fixture();
        let base = base_get(&f);

        let mut renamed = spec(&f.derived, "fetch", vec![], f.number.clone(), None);
        renamed.selector = OverrideSelector::new(this_of(&f.derived), "fetch", false, vec![], f.number.clone());
        assert!(ImplementedClassMethod::new(renamed, vec![base.clone()], &f.hierarchy).is_err());

        let mut constant = spec(&f.derived, "get", vec![], f.number.clone(), None);
        constant.selector = OverrideSelector::new(this_of(&f.derived), "get", true, vec![], f.number.clone());
        assert!(ImplementedClassMethod::new(constant, vec![base.clone()], &f.hierarchy).is_err());

        let mut final_method = spec(&f.derived, "get", vec![], f.number.clone(), None);
        final_method.is_virtual = false;
        assert!(ImplementedClassMethod::new(final_method, vec![base], &f.hierarchy).is_err());
    }

    #[test]
    fn erased_method_is_stable() {
        let mut hierarchy = TestHierarchy::new();
        let boxed = class("demo.Box", &["T"]);
        hierarchy.declare(&boxed, &[]);
        let t = BoundTemplate::variable("T");
        let method = ImplementedClassMethod::new(
            spec(&boxed, "set", vec![t.clone()], t, None),
            vec![],
            &hierarchy,
        )
        .unwrap();
        let once = method.erased_method();
        assert_eq!(once.selector().argument_types(), [BoundTemplate::any()]);
        let twice = once.erased_method();
        assert_eq!(twice, once);
        assert_eq!(twice.selector().argument_types(), once.selector().argument_types());
        assert_eq!(twice.selector().return_type(), once.selector().return_type());
        assert_eq!(once, method);
    }

    #[test]
    fn changed_types_are_reported_independently() {
        let mut hierarchy = TestHierarchy::new();
        let string = BoundTemplate::simple(ClassRef::simple("java.lang.String"));
        let boxed = class("demo.Box", &["T"]);
        let string_box = class("demo.StringBox", &[]);
        let pair = class("demo.Pair", &["A", "B"]);
        hierarchy.declare(&boxed, &[]);
        hierarchy.declare(&string_box, &[BoundTemplate::class(boxed.clone(), vec![string.clone()])]);
        hierarchy.declare(&pair, &[BoundTemplate::class(boxed.clone(), vec![BoundTemplate::variable("A")])]);

        let t = BoundTemplate::variable("T");
        let int = BoundTemplate::simple(ClassRef::primitive("int"));
        let get = ImplementedClassMethod::new(spec(&boxed, "get", vec![], t.clone(), None), vec![], &hierarchy).unwrap();
        let set = ImplementedClassMethod::new(
            spec(&boxed, "set", vec![t.clone()], BoundTemplate::simple(ClassRef::primitive("void")), None),
            vec![],
            &hierarchy,
        )
        .unwrap();
        let size = ImplementedClassMethod::new(spec(&boxed, "size", vec![], int, None), vec![], &hierarchy).unwrap();

        let at_string_box = get.has_changed_types(&string_box, &hierarchy).unwrap();
        assert_eq!(at_string_box, ChangedTypes { arguments: false, return_type: true });
        let at_string_box = set.has_changed_types(&string_box, &hierarchy).unwrap();
        assert_eq!(at_string_box, ChangedTypes { arguments: true, return_type: false });
        assert!(!size.has_changed_types(&string_box, &hierarchy).unwrap().any());

        // A generic subclass erases back to the same signature.
        assert!(!get.has_changed_types(&pair, &hierarchy).unwrap().any());
        assert!(!get.has_changed_types(&boxed, &hierarchy).unwrap().any());

        let unrelated = class("demo.Unrelated", &[]);
        hierarchy.declare(&unrelated, &[]);
        assert_eq!(get.has_changed_types(&unrelated, &hierarchy), None);

        assert_eq!(
            get.view_from(&string_box, &hierarchy).unwrap().return_type(),
            &string
        );
    }

    #[test]
    fn closure_is_deduplicated_across_diamonds() {
        let mut hierarchy = TestHierarchy::new();
        let root = class("demo.Root", &[]);
        let left = class("demo.Left", &[]);
        let right = class("demo.Right", &[]);
        let bottom = class("demo.Bottom", &[]);
        let void = BoundTemplate::simple(ClassRef::primitive("void"));
        hierarchy.declare(&root, &[]);
        hierarchy.declare(&left, &[BoundTemplate::simple(root.clone())]);
        hierarchy.declare(&right, &[BoundTemplate::simple(root.clone())]);
        hierarchy.declare(
            &bottom,
            &[BoundTemplate::simple(left.clone()), BoundTemplate::simple(right.clone())],
        );

        let place = |class: &ClassRef, overrides: Vec<Arc<ImplementedClassMethod>>| {
            Arc::new(
                ImplementedClassMethod::new(spec(class, "run", vec![], void.clone(), None), overrides, &hierarchy)
                    .unwrap(),
            )
        };
        let root_run = place(&root, vec![]);
        let left_run = place(&left, vec![root_run.clone()]);
        let right_run = place(&right, vec![root_run.clone()]);
        let bottom_run = place(&bottom, vec![left_run.clone(), right_run.clone()]);

        assert_eq!(
            bottom_run.all_overridden_methods(),
            vec![left_run, root_run, right_run]
        );
    }

    #[test]
    fn rebind_keeps_identity() {
        let mut hierarchy = TestHierarchy::new();
        let boxed = class("demo.Box", &["T"]);
        hierarchy.declare(&boxed, &[]);
        let t = BoundTemplate::variable("T");
        let method = ImplementedClassMethod::new(spec(&boxed, "get", vec![], t, None), vec![], &hierarchy).unwrap();
        let mut subst = Substitution::default();
        let string = BoundTemplate::simple(ClassRef::simple("java.lang.String"));
        subst.insert("T".into(), string.clone());
        let specialized = method.rebind(&subst);
        assert_eq!(specialized.selector().return_type(), &string);
        assert_eq!(specialized, method);
    }
}
