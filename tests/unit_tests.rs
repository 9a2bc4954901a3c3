//! End-to-end tests for serbridge using `Generator` as the entry point.
//!
//! These tests run the full pipeline (discovery, collection, finalization)
//! over descriptor files in `test_descriptors/`.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serbridge::{
    BoundTemplate, ClassDescriptor, Generator, GeneratorConfig, GeneratorError,
    InMemoryClassSource, MemberDecl, Phase, QualifiedName, RegistrationError, ResolveError,
    Resolver, SerbridgeError, Substitution,
};

/// Path of a file in the test_descriptors directory.
fn descriptor_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_descriptors")
        .join(filename)
}

/// Load a file from the test_descriptors directory.
fn load_descriptors(filename: &str) -> String {
    let path = descriptor_path(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// A generator that discovers library classes from `jdk.json`.
fn generator_with(config: GeneratorConfig) -> Generator {
    let source = InMemoryClassSource::from_json(&load_descriptors("jdk.json"))
        .expect("Failed to parse jdk.json");
    Generator::new(config).with_source(source)
}

/// Generate models for one descriptor file.
fn generate(filename: &str) -> Resolver {
    let mut generator = generator_with(GeneratorConfig::default());
    generator
        .add_json(&load_descriptors(filename))
        .expect("Failed to add descriptors");
    generator.generate().expect("Failed to generate models")
}

/// Generate models for a list of descriptors, returning the error.
fn generate_err(descriptors: Vec<ClassDescriptor>) -> GeneratorError {
    let mut generator = generator_with(GeneratorConfig::default());
    for descriptor in descriptors {
        generator.add_class(descriptor).expect("Failed to add class");
    }
    generator.generate().expect_err("generation should fail")
}

fn name(dotted: &str) -> QualifiedName {
    QualifiedName::from_dotted(dotted)
}

// =============================================================================
// Generic Containers
// =============================================================================

#[test]
fn test_box_fields_and_methods() {
    serbridge::logging::init("serbridge=debug");
    let resolver = generate("boxes.json");
    assert_eq!(resolver.phase(), Phase::Emitting);

    let model = resolver.model(&name("demo.Box")).unwrap();
    assert_eq!(model.generics().len(), 1);
    assert_eq!(model.this_binding().to_string(), "demo.Box<T>");
    assert_eq!(model.super_class().unwrap().to_string(), "java.lang.Object");

    let fields: Vec<(String, String, bool)> = model
        .fields()
        .iter()
        .map(|f| (f.name.clone(), f.ty.to_string(), f.transient))
        .collect();
    assert_eq!(
        fields,
        [
            ("value".to_string(), "T".to_string(), false),
            ("cache".to_string(), "T[]".to_string(), true),
        ]
    );

    let virtuals: Vec<&str> = model
        .virtual_methods()
        .iter()
        .map(|m| m.selector().name())
        .collect();
    assert_eq!(virtuals, ["get", "set"]);
}

#[test]
fn test_ancestors_are_instantiated_through_the_chain() {
    let resolver = generate("boxes.json");

    let number_box = resolver.model(&name("demo.NumberBox")).unwrap();
    assert_eq!(number_box.ancestor(&name("demo.Box")).unwrap().to_string(), "demo.Box<N>");

    let int_box = resolver.model(&name("demo.IntBox")).unwrap();
    assert!(int_box.generics().is_empty());
    assert_eq!(
        int_box.ancestor(&name("demo.Box")).unwrap().to_string(),
        "demo.Box<java.lang.Integer>"
    );
    assert_eq!(
        int_box.ancestor(&name("demo.NumberBox")).unwrap().to_string(),
        "demo.NumberBox<java.lang.Integer>"
    );
    assert!(int_box.ancestor(&name("java.lang.Object")).is_some());
}

#[test]
fn test_dispatch_reports_changed_erasures() {
    let resolver = generate("boxes.json");

    let changed = |class: &str, method: &str| {
        let model = resolver.model(&name(class)).unwrap();
        let entry = model
            .dispatch()
            .iter()
            .find(|entry| entry.method.selector().name() == method)
            .unwrap_or_else(|| panic!("{class} has no {method}"));
        (entry.changed.arguments, entry.changed.return_type)
    };

    assert_eq!(changed("demo.Box", "get"), (false, false));
    assert_eq!(changed("demo.Box", "set"), (false, false));
    assert_eq!(changed("demo.NumberBox", "get"), (false, true));
    assert_eq!(changed("demo.NumberBox", "set"), (true, false));
    assert_eq!(changed("demo.IntBox", "get"), (false, true));
    assert_eq!(changed("demo.IntBox", "set"), (true, false));
}

#[test]
fn test_erased_identity_is_stable_under_rebinding() {
    let resolver = generate("boxes.json");
    let model = resolver.model(&name("demo.Box")).unwrap();
    let get = &model.virtual_methods()[0];
    assert_eq!(get.erased_selector().return_type().to_string(), "java.lang.Object");

    let integer = resolver
        .registry()
        .class_by_name(&name("java.lang.Integer"))
        .cloned()
        .unwrap();
    let substitution: Substitution = [("T".to_string(), BoundTemplate::simple(integer))]
        .into_iter()
        .collect();
    let rebound = get.rebind(&substitution);
    assert_eq!(rebound.selector().return_type().to_string(), "java.lang.Integer");
    assert_eq!(rebound.erased_selector(), get.erased_selector());
    assert_eq!(&rebound, get.as_ref());
}

#[test]
fn test_library_classes_are_discovered() {
    let resolver = generate("boxes.json");
    for discovered in ["java.lang.Number", "java.lang.Integer", "java.util.List"] {
        assert!(resolver.model(&name(discovered)).is_some(), "{discovered}");
    }
    assert!(resolver.model(&name("java.lang.String")).is_none());

    let integer = resolver.model(&name("java.lang.Integer")).unwrap();
    assert_eq!(integer.serial_version_uid(), Some(1360826667806852920));
    let list = resolver.model(&name("java.util.List")).unwrap();
    assert!(list.is_abstract());
    assert_eq!(list.interfaces().len(), 0);
}

// =============================================================================
// Method Generics
// =============================================================================

#[test]
fn test_method_generic_derived_from_container_argument() {
    let resolver = generate("boxes.json");
    let model = resolver.model(&name("demo.IntBox")).unwrap();
    let add_all = model.methods_named("addAll").next().unwrap();

    assert!(add_all.generics.is_generic());
    assert!(!add_all.is_override());
    assert_eq!(add_all.generics.argument_binding(0), Some("Arg0"));
    let params: Vec<&str> = add_all
        .generics
        .template_params()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(params, ["R", "Arg0", "R_", "Enable"]);

    let header = add_all.generics.render_header(&resolver.config().names);
    assert!(header.starts_with("template <typename R = serbridge::derive"), "{header}");
    assert!(header.contains("serbridge::satisfies_v<R_"), "{header}");

    // Non-virtual members are placed but never dispatched.
    assert!(
        model
            .virtual_methods()
            .iter()
            .all(|m| m.selector().name() != "addAll")
    );
    assert_eq!(model.includes(), ["<numeric>", "<vector>"]);
}

#[test]
fn test_configured_names_reach_rendered_headers() {
    let config = GeneratorConfig::load_from_path(descriptor_path("serbridge.toml"))
        .expect("Failed to load serbridge.toml");
    let mut generator = generator_with(config);
    generator.add_json(&load_descriptors("boxes.json")).unwrap();
    let resolver = generator.generate().unwrap();

    let model = resolver.model(&name("demo.IntBox")).unwrap();
    let add_all = model.methods_named("addAll").next().unwrap();
    let header = add_all.generics.render_header(&resolver.config().names);
    assert!(header.contains("typename In0"), "{header}");
    assert!(header.contains("typename Check = std::enable_if_t<bridge::"), "{header}");
}

#[test]
fn test_underivable_method_generic_is_fatal() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Factory")
            .with_member(MemberDecl::method("make", "T").generic("T", "?")),
    ]);
    assert!(matches!(
        err.model_error(),
        Some(SerbridgeError::Resolve(ResolveError::UnresolvableGeneric { .. }))
    ));
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_covariant_override_tagged_with_declaring_class() {
    let resolver = generate("shapes.json");
    let circle = resolver.model(&name("demo.Circle")).unwrap();

    let copy = circle.methods_named("copy").next().unwrap();
    assert!(copy.is_override());
    let implemented = copy.implemented.as_ref().unwrap();
    assert!(implemented.is_covariant());
    assert_eq!(implemented.tag().unwrap().name(), &name("demo.Circle"));
    assert_eq!(
        implemented.overrides()[0].class().name(),
        &name("demo.Shape")
    );

    let area = circle.methods_named("area").next().unwrap();
    assert!(area.is_override());
    assert!(!area.implemented.as_ref().unwrap().is_covariant());

    let virtuals: Vec<String> = circle
        .virtual_methods()
        .iter()
        .map(|m| format!("{}.{}", m.class().name(), m.selector().name()))
        .collect();
    assert_eq!(virtuals, ["demo.Circle.copy", "demo.Circle.area"]);
}

#[test]
fn test_covariant_override_may_reuse_an_inherited_tag() {
    let resolver = generate("shapes.json");
    let small = resolver.model(&name("demo.SmallCircle")).unwrap();
    let copy = small.methods_named("copy").next().unwrap();
    let implemented = copy.implemented.as_ref().unwrap();

    let closure: Vec<String> = implemented
        .all_overridden_methods()
        .iter()
        .map(|m| m.class().name().to_string())
        .collect();
    assert_eq!(closure, ["demo.Circle", "demo.Shape"]);
    assert_eq!(implemented.selector(), implemented.overrides()[0].selector());
}

#[test]
fn test_inherited_methods_without_overrides() {
    let resolver = generate("shapes.json");
    let square = resolver.model(&name("demo.Square")).unwrap();
    assert!(square.methods().is_empty());
    let virtuals: Vec<String> = square
        .virtual_methods()
        .iter()
        .map(|m| m.class().name().to_string())
        .collect();
    assert_eq!(virtuals, ["demo.Shape", "demo.Shape"]);
    assert!(square.dispatch().iter().all(|entry| !entry.changed.any()));
}

#[test]
fn test_covariant_override_with_unrelated_tag_fails() {
    let mut generator = generator_with(GeneratorConfig::default());
    generator.add_json(&load_descriptors("shapes.json")).unwrap();
    generator
        .add_class(
            ClassDescriptor::class("demo.Oval")
                .extends("demo.Shape")
                .with_member(
                    MemberDecl::method("copy", "demo.Oval")
                        .constant()
                        .tagged("demo.Square"),
                ),
        )
        .unwrap();
    let err = generator.generate().unwrap_err();
    match err.model_error() {
        Some(SerbridgeError::Resolve(ResolveError::InvalidOverride { reason, .. })) => {
            assert!(reason.contains("demo.Square"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_covariant_override_without_tag_fails() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Base").with_member(MemberDecl::method("me", "demo.Base")),
        ClassDescriptor::class("demo.Derived")
            .extends("demo.Base")
            .with_member(MemberDecl::method("me", "demo.Derived")),
    ]);
    assert!(err.to_string().contains("requires a tag"), "{err}");
}

#[test]
fn test_const_mismatch_is_an_invalid_override() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Base").with_member(MemberDecl::method("size", "int").constant()),
        ClassDescriptor::class("demo.Derived")
            .extends("demo.Base")
            .with_member(MemberDecl::method("size", "int")),
    ]);
    assert!(matches!(
        err.model_error(),
        Some(SerbridgeError::Resolve(ResolveError::InvalidOverride { .. }))
    ));
}

/// `demo.Base` returning `base_return` from `get`, and `demo.NumBox<T>`
/// overriding it with a tagged `T get()`.
fn variable_return_override(
    bounds: &[&str],
    base_return: &str,
) -> Result<Resolver, GeneratorError> {
    let mut generator = generator_with(GeneratorConfig::default());
    for class in [
        ClassDescriptor::class("demo.Base").with_member(MemberDecl::method("get", base_return)),
        ClassDescriptor::class("demo.NumBox")
            .with_generic("T", bounds.iter().copied())
            .extends("demo.Base")
            .with_member(MemberDecl::method("get", "T").tagged("demo.NumBox")),
    ] {
        generator.add_class(class).expect("Failed to add class");
    }
    generator.generate()
}

#[test]
fn test_bounded_variable_return_overrides_its_bound() {
    let resolver = variable_return_override(&["java.lang.Number"], "java.lang.Number")
        .expect("Failed to generate models");
    let model = resolver.model(&name("demo.NumBox")).unwrap();
    let get = model.methods_named("get").next().unwrap();
    assert!(get.is_override());
    let implemented = get.implemented.as_ref().unwrap();
    assert!(implemented.is_covariant());
    assert_eq!(
        implemented.erased_selector().return_type().to_string(),
        "? extends java.lang.Number"
    );

    let err = variable_return_override(&["java.lang.Number"], "java.lang.Integer")
        .expect_err("generation should fail");
    assert!(err.to_string().contains("not assignable"), "{err}");
}

#[test]
fn test_top_bounded_variable_return_overrides_the_top_type() {
    let resolver = variable_return_override(&["java.lang.Object"], "java.lang.Object")
        .expect("Failed to generate models");
    let model = resolver.model(&name("demo.NumBox")).unwrap();
    let get = model.methods_named("get").next().unwrap();
    assert!(get.is_override());
    assert_eq!(model.generics().len(), 1);

    let err = variable_return_override(&[], "java.lang.Number")
        .expect_err("generation should fail");
    assert!(err.to_string().contains("not assignable"), "{err}");
}

// =============================================================================
// Failure Modes
// =============================================================================

#[test]
fn test_mutually_dependent_generics_are_a_cycle() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Pair")
            .with_generic("A", ["B"])
            .with_generic("B", ["A"]),
    ]);
    assert_eq!(err.to_string(), "cyclic generic dependency on 'A'");
}

#[test]
fn test_circular_inheritance_is_rejected() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Ping").extends("demo.Pong"),
        ClassDescriptor::class("demo.Pong").extends("demo.Ping"),
    ]);
    assert!(matches!(
        err.model_error(),
        Some(SerbridgeError::Registration(RegistrationError::CircularInheritance(_)))
    ));
}

#[test]
fn test_unknown_class_is_not_found() {
    let err = generate_err(vec![
        ClassDescriptor::class("demo.Holder").with_field("missing", "demo.Missing"),
    ]);
    assert!(matches!(
        err.model_error(),
        Some(SerbridgeError::Registration(RegistrationError::ClassNotFound(_)))
    ));
}

#[test]
fn test_classes_are_closed_after_generation() {
    let mut resolver = generate("boxes.json");
    let err = resolver
        .parse_type("java.lang.String", &Substitution::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "java.lang.String not in list of classes during post processing"
    );
    let err = GeneratorError::from(err);
    assert!(err.model_error().is_some_and(SerbridgeError::is_registration));
}

#[test]
fn test_malformed_descriptors_are_reported() {
    let mut generator = generator_with(GeneratorConfig::default());
    let err = generator.add_json("[{ \"kind\": \"class\" }]").unwrap_err();
    assert!(matches!(err, GeneratorError::Descriptors(_)));
    assert!(err.model_error().is_none());
}
