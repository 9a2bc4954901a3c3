//! Read access to the class hierarchy, and assignment compatibility on top
//! of it.

use serbridge_core::{BoundTemplate, QualifiedName, Substitution, Wildcard};

/// What override resolution needs to know about the hierarchy.
pub trait HierarchyView {
    /// The universal top type.
    fn top_type(&self) -> &QualifiedName;

    /// How `class` instantiates `ancestor`, in terms of `class`'s own
    /// generic parameters.
    ///
    /// A class is its own ancestor, instantiated with its parameters.
    /// Returns `None` when `ancestor` is not a supertype of `class`.
    fn ancestor_binding(&self, class: &QualifiedName, ancestor: &QualifiedName)
    -> Option<BoundTemplate>;

    /// `class`'s generic parameters mapped to their erasures.
    fn erased_bindings(&self, class: &QualifiedName) -> Substitution;
}

/// Whether a value of type `from` can be used where `to` is expected.
///
/// `const` is ignored on both sides. Generic bindings must match exactly,
/// except where `to` binds a wildcard, which accepts every binding inside
/// its bounds. Raw types are compatible with every instantiation.
///
/// `bounds` maps the type variables in scope to their erasures. A variable
/// is assignable wherever one of its upper bounds is.
pub fn is_assignable(
    from: &BoundTemplate,
    to: &BoundTemplate,
    bounds: &Substitution,
    hierarchy: &dyn HierarchyView,
) -> bool {
    let from = from.strip_const();
    let to = to.strip_const();
    if from == to {
        return true;
    }

    match (from, to) {
        (_, BoundTemplate::Any(wildcard)) => satisfies(from, wildcard, bounds, hierarchy),
        (BoundTemplate::Any(wildcard), _) => {
            to.is_class_named(hierarchy.top_type())
                || wildcard
                    .extend_types()
                    .iter()
                    .any(|bound| is_assignable(bound, to, bounds, hierarchy))
        }
        (_, BoundTemplate::Class(target)) if target.class().name() == hierarchy.top_type() => {
            !from.class_ref().is_some_and(|class| class.is_primitive())
        }
        (BoundTemplate::Variable(variable), _) => match bounds.get(variable.name()) {
            Some(erasure) if erasure.as_variable().is_none() => {
                is_assignable(erasure, to, bounds, hierarchy)
            }
            _ => false,
        },
        (BoundTemplate::Array(source), BoundTemplate::Array(target)) => {
            source.extents() == target.extents()
                && is_assignable(source.element(), target.element(), bounds, hierarchy)
        }
        (BoundTemplate::Class(source), BoundTemplate::Class(target)) => {
            let Some(binding) =
                hierarchy.ancestor_binding(source.class().name(), target.class().name())
            else {
                return false;
            };
            if source.is_raw() || target.is_raw() {
                return true;
            }
            let viewed = binding.rebind(&source.substitution());
            let Some(viewed) = viewed.as_class() else {
                return false;
            };
            if viewed.is_raw() {
                return true;
            }
            viewed.bindings().len() == target.bindings().len()
                && viewed
                    .bindings()
                    .iter()
                    .zip(target.bindings())
                    .all(|(actual, expected)| match expected {
                        BoundTemplate::Any(wildcard) => {
                            satisfies(actual, wildcard, bounds, hierarchy)
                        }
                        other => actual == other,
                    })
        }
        _ => false,
    }
}

/// Whether `ty` lies within the bounds of `wildcard`.
pub fn satisfies(
    ty: &BoundTemplate,
    wildcard: &Wildcard,
    bounds: &Substitution,
    hierarchy: &dyn HierarchyView,
) -> bool {
    wildcard
        .extend_types()
        .iter()
        .all(|bound| is_assignable(ty, bound, bounds, hierarchy))
        && wildcard
            .super_types()
            .iter()
            .all(|bound| is_assignable(bound, ty, bounds, hierarchy))
}


#[cfg(test)]
mod tests {
    use super::testing::TestHierarchy;
    use super::*;
    use serbridge_core::{ClassKind, ClassRef};

    fn class(name: &str, params: &[&str]) -> ClassRef {
        ClassRef::new(
            QualifiedName::from_dotted(name),
            ClassKind::Class,
            params.iter().map(|p| p.to_string()).collect(),
        )
    }

    struct Fixture {
        hierarchy: TestHierarchy,
        number: BoundTemplate,
        integer: BoundTemplate,
        string: BoundTemplate,
        object: BoundTemplate,
        list: ClassRef,
        array_list: ClassRef,
    }

    fn fixture() -> Fixture {
        let mut hierarchy = TestHierarchy::new();
        let object = BoundTemplate::simple(ClassRef::simple("java.lang.Object"));
        let number_ref = class("java.lang.Number", &[]);
        let integer_ref = class("java.lang.Integer", &[]);
        let string_ref = class("java.lang.String", &[]);
        let list = class("java.util.List", &["E"]);
        let array_list = class("java.util.ArrayList", &["T"]);

        hierarchy.declare(&number_ref, &[object.clone()]);
        hierarchy.declare(&integer_ref, &[BoundTemplate::simple(number_ref.clone())]);
        hierarchy.declare(&string_ref, &[object.clone()]);
        hierarchy.declare(&list, &[object.clone()]);
        hierarchy.declare(
            &array_list,
            &[BoundTemplate::class(list.clone(), vec![BoundTemplate::variable("T")])],
        );

        Fixture {
            hierarchy,
            number: BoundTemplate::simple(number_ref),
            integer: BoundTemplate::simple(integer_ref),
            string: BoundTemplate::simple(string_ref),
            object,
            list,
            array_list,
        }
    }

    #[test]
    fn subclasses_and_top_type() {
        let f = fixture();
        let h = &f.hierarchy;
        let none = Substitution::default();
        assert!(is_assignable(&f.integer, &f.number, &none, h));
        assert!(!is_assignable(&f.number, &f.integer, &none, h));
        assert!(!is_assignable(&f.string, &f.number, &none, h));
        assert!(is_assignable(&f.string, &f.object, &none, h));

        let int = BoundTemplate::simple(ClassRef::primitive("int"));
        assert!(!is_assignable(&int, &f.object, &none, h));
        assert!(is_assignable(&BoundTemplate::array(int, 1), &f.object, &none, h));
        assert!(is_assignable(&BoundTemplate::constant(f.integer.clone()), &f.number, &none, h));
    }

    #[test]
    fn generic_bindings_are_invariant_unless_wildcarded() {
        let f = fixture();
        let h = &f.hierarchy;
        let none = Substitution::default();
        let list_of = |b: BoundTemplate| BoundTemplate::class(f.list.clone(), vec![b]);
        let array_list_of = |b: BoundTemplate| BoundTemplate::class(f.array_list.clone(), vec![b]);

        assert!(is_assignable(&array_list_of(f.integer.clone()), &list_of(f.integer.clone()), &none, h));
        assert!(!is_assignable(&array_list_of(f.integer.clone()), &list_of(f.number.clone()), &none, h));

        let extends_number = BoundTemplate::wildcard(Wildcard::extends(vec![f.number.clone()]));
        assert!(is_assignable(&array_list_of(f.integer.clone()), &list_of(extends_number.clone()), &none, h));
        assert!(!is_assignable(&array_list_of(f.string.clone()), &list_of(extends_number.clone()), &none, h));

        let super_integer = BoundTemplate::wildcard(Wildcard::super_of(vec![f.integer.clone()]));
        assert!(is_assignable(&list_of(f.number.clone()), &list_of(super_integer.clone()), &none, h));
        assert!(!is_assignable(&list_of(f.string.clone()), &list_of(super_integer), &none, h));

        // Nested wildcards compare through their upper bounds.
        let extends_integer = BoundTemplate::wildcard(Wildcard::extends(vec![f.integer.clone()]));
        assert!(is_assignable(&list_of(extends_integer), &list_of(extends_number), &none, h));

        // Raw on either side.
        assert!(is_assignable(&BoundTemplate::simple(f.array_list.clone()), &list_of(f.string.clone()), &none, h));
        assert!(is_assignable(&array_list_of(f.string.clone()), &BoundTemplate::simple(f.list.clone()), &none, h));
        assert!(!is_assignable(&list_of(f.string.clone()), &array_list_of(f.string.clone()), &none, h));
    }

    #[test]
    fn arrays_need_matching_extents() {
        let f = fixture();
        let h = &f.hierarchy;
        let none = Substitution::default();
        let integers = BoundTemplate::array(f.integer.clone(), 2);
        assert!(is_assignable(&integers, &BoundTemplate::array(f.number.clone(), 2), &none, h));
        assert!(!is_assignable(&integers, &BoundTemplate::array(f.number.clone(), 1), &none, h));
    }

    #[test]
    fn wildcard_sources_use_their_upper_bounds() {
        let f = fixture();
        let h = &f.hierarchy;
        let none = Substitution::default();
        let any = BoundTemplate::any();
        assert!(is_assignable(&any, &f.object, &none, h));
        assert!(!is_assignable(&any, &f.number, &none, h));
        let extends_integer = BoundTemplate::wildcard(Wildcard::extends(vec![f.integer.clone()]));
        assert!(is_assignable(&extends_integer, &f.number, &none, h));
        assert!(satisfies(&f.integer, &Wildcard::unbounded(), &none, h));
    }

    #[test]
    fn variables_use_their_erasures() {
        let f = fixture();
        let h = &f.hierarchy;
        let t = BoundTemplate::variable("T");
        let bounds: Substitution = [
            (
                "T".to_string(),
                BoundTemplate::wildcard(Wildcard::extends(vec![f.integer.clone()])),
            ),
            ("U".to_string(), BoundTemplate::any()),
        ]
        .into_iter()
        .collect();

        assert!(is_assignable(&t, &f.number, &bounds, h));
        assert!(!is_assignable(&t, &f.string, &bounds, h));
        assert!(is_assignable(&t, &f.object, &bounds, h));

        let u = BoundTemplate::variable("U");
        assert!(is_assignable(&u, &f.object, &bounds, h));
        assert!(!is_assignable(&u, &f.number, &bounds, h));

        // Out of scope.
        let v = BoundTemplate::variable("V");
        assert!(!is_assignable(&v, &f.number, &bounds, h));
        assert!(!is_assignable(&t, &f.number, &Substitution::default(), h));
    }
}
