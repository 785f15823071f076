//! Integration tests for the class handle wrapper
//!
//! Every query on a `ClassHandle` must agree with the wrapped `Class`.

use jreflect::{
    Annotation, Class, ClassDescriptor, ClassHandle, ConstructorDescriptor, FieldDescriptor,
    GenericType, MethodDescriptor, Modifiers, Nesting, Object, ReflectError, Runtime,
    TypeVariable,
};

/// `com.acme.Shape` (interface), `com.acme.AbstractShape` (abstract),
/// `com.acme.Circle extends AbstractShape`, `com.acme.Unrelated`
fn shapes(runtime: &Runtime) {
    let loader = runtime.system_loader();
    loader
        .define_class(
            ClassDescriptor::interface("com.acme.Shape").method(MethodDescriptor::new(
                "area",
                vec![],
                "double",
                Modifiers::PUBLIC | Modifiers::ABSTRACT,
            )),
        )
        .unwrap();
    loader
        .define_class(
            ClassDescriptor::class("com.acme.AbstractShape")
                .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
                .implements("com.acme.Shape")
                .constructor(ConstructorDescriptor::public(vec![]))
                .field(FieldDescriptor::new("id", "long", Modifiers::PUBLIC))
                .field(FieldDescriptor::new("cache", "java.lang.Object", Modifiers::PRIVATE)),
        )
        .unwrap();
    loader
        .define_class(
            ClassDescriptor::class("com.acme.Circle")
                .extends("com.acme.AbstractShape")
                .constructor(ConstructorDescriptor::public(vec![]))
                .constructor(ConstructorDescriptor::new(vec!["double".to_string()], Modifiers::PRIVATE))
                .field(FieldDescriptor::new("radius", "double", Modifiers::PUBLIC))
                .field(FieldDescriptor::new("secret", "java.lang.String", Modifiers::PRIVATE))
                .field(FieldDescriptor::new("ORIGIN", "com.acme.Circle", Modifiers::PUBLIC | Modifiers::STATIC))
                .method(MethodDescriptor::new("area", vec![], "double", Modifiers::PUBLIC))
                .method(MethodDescriptor::new("grow", vec!["double".to_string()], "void", Modifiers::PRIVATE)),
        )
        .unwrap();
    loader
        .define_class(
            ClassDescriptor::class("com.acme.Unrelated").constructor(ConstructorDescriptor::public(vec![])),
        )
        .unwrap();
}

fn handle(runtime: &Runtime, name: &str) -> ClassHandle {
    ClassHandle::for_name(runtime, name).unwrap()
}

// ============================================================================
// Naming and resolution
// ============================================================================

mod naming {
    use super::*;

    #[test]
    fn test_name_matches_wrapped_class() {
        let runtime = Runtime::new();
        shapes(&runtime);

        for name in ["com.acme.Shape", "com.acme.Circle", "java.lang.String", "[I", "[Lcom.acme.Circle;"] {
            let handle = handle(&runtime, name);
            assert_eq!(handle.name(), handle.class().name());
            assert_eq!(handle.name(), name);
        }

        let int = runtime.primitive("int").unwrap();
        assert_eq!(ClassHandle::new(int.clone()).name(), int.name());
    }

    #[test]
    fn test_for_name_undefined_fails() {
        let runtime = Runtime::new();
        let err = ClassHandle::for_name(&runtime, "com.acme.Nowhere").unwrap_err();
        assert_eq!(err, ReflectError::ClassNotFound("com.acme.Nowhere".to_string()));
        assert!(err.is_resolution_failure());
    }

    #[test]
    fn test_for_name_with_explicit_loader() {
        let runtime = Runtime::new();
        let plugins = runtime.new_loader("plugins", &runtime.system_loader()).unwrap();
        plugins
            .define_class(ClassDescriptor::class("com.plugin.Entry"))
            .unwrap();

        let entry = ClassHandle::for_name_with(&runtime, "com.plugin.Entry", false, Some(&plugins)).unwrap();
        assert_eq!(entry.class_loader().unwrap(), Some(plugins));
        assert!(ClassHandle::for_name(&runtime, "com.plugin.Entry").is_err());
    }

    #[test]
    fn test_for_name_with_loader_of_other_runtime() {
        let runtime = Runtime::new();
        let other = Runtime::new();
        other
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.Elsewhere"))
            .unwrap();

        let err = ClassHandle::for_name_with(&runtime, "com.acme.Elsewhere", false, Some(&other.system_loader()))
            .unwrap_err();
        assert!(matches!(err, ReflectError::IllegalArgument(_)));
    }

    #[test]
    fn test_for_name_after_panicking_initializer() {
        let runtime = Runtime::new();
        runtime
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.Fragile").with_initializer(|| panic!("boom")))
            .unwrap();

        let first = ClassHandle::for_name(&runtime, "com.acme.Fragile").unwrap_err();
        assert!(matches!(first, ReflectError::ExceptionInInitializer { .. }));
        let second = ClassHandle::for_name(&runtime, "com.acme.Fragile").unwrap_err();
        assert!(matches!(second, ReflectError::NoClassDefFound(_)));

        // Loading without initialization still works, but the class never initialized
        let system = runtime.system_loader();
        let handle = ClassHandle::for_name_with(&runtime, "com.acme.Fragile", false, Some(&system)).unwrap();
        assert!(!handle.class().is_initialized());
    }

    #[test]
    fn test_for_name_runs_initializer_only_when_asked() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let runtime = Runtime::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        runtime
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.Lazy").with_initializer(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        let system = runtime.system_loader();
        ClassHandle::for_name_with(&runtime, "com.acme.Lazy", false, Some(&system)).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        ClassHandle::for_name(&runtime, "com.acme.Lazy").unwrap();
        ClassHandle::for_name(&runtime, "com.acme.Lazy").unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_initializer_through_for_name() {
        let runtime = Runtime::new();
        runtime
            .system_loader()
            .define_class(
                ClassDescriptor::class("com.acme.Broken").with_initializer(|| Err("bad config".to_string())),
            )
            .unwrap();

        assert_eq!(
            ClassHandle::for_name(&runtime, "com.acme.Broken").unwrap_err(),
            ReflectError::ExceptionInInitializer {
                class: "com.acme.Broken".to_string(),
                message: "bad config".to_string(),
            }
        );
        assert!(matches!(
            ClassHandle::for_name(&runtime, "com.acme.Broken"),
            Err(ReflectError::NoClassDefFound(_))
        ));
    }

    #[test]
    fn test_nested_names() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        loader
            .define_class(ClassDescriptor::class("com.acme.Map").member_class("com.acme.Map$Entry"))
            .unwrap();
        loader
            .define_class(
                ClassDescriptor::interface("com.acme.Map$Entry").nested(Nesting::Member {
                    declaring: "com.acme.Map".to_string(),
                }),
            )
            .unwrap();

        let entry = handle(&runtime, "com.acme.Map$Entry");
        assert_eq!(entry.simple_name(), "Entry");
        assert_eq!(entry.canonical_name().as_deref(), Some("com.acme.Map.Entry"));
        assert!(entry.is_member_class());
        assert_eq!(entry.declaring_class().unwrap().name(), "com.acme.Map");
        assert_eq!(entry.to_string(), "interface com.acme.Map$Entry");
    }
}

// ============================================================================
// Assignability and casting
// ============================================================================

mod relationships {
    use super::*;

    #[test]
    fn test_assignable_from_parent_child() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let shape = handle(&runtime, "com.acme.Shape");
        let base = handle(&runtime, "com.acme.AbstractShape");
        let circle = handle(&runtime, "com.acme.Circle");
        let unrelated = handle(&runtime, "com.acme.Unrelated");

        assert!(shape.is_assignable_from(circle.class()));
        assert!(base.is_assignable_from(circle.class()));
        assert!(circle.is_assignable_from(circle.class()));
        assert!(!circle.is_assignable_from(base.class()));
        assert!(!shape.is_assignable_from(unrelated.class()));
        assert!(!unrelated.is_assignable_from(circle.class()));
    }

    #[test]
    fn test_cast_returns_same_reference() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let shape = handle(&runtime, "com.acme.Shape");
        let circle = handle(&runtime, "com.acme.Circle");
        let unrelated = handle(&runtime, "com.acme.Unrelated");

        let obj = circle.new_instance().unwrap();
        let cast = shape.cast(Some(obj.clone())).unwrap().unwrap();
        assert!(Object::same(&cast, &obj));

        let other = unrelated.new_instance().unwrap();
        assert!(matches!(
            shape.cast(Some(other)),
            Err(ReflectError::ClassCast(_))
        ));
        assert!(shape.cast(None).unwrap().is_none());
    }

    #[test]
    fn test_as_subclass() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let shape = handle(&runtime, "com.acme.Shape");
        let circle = handle(&runtime, "com.acme.Circle");

        assert_eq!(&circle.as_subclass(shape.class()).unwrap(), circle.class());
        assert!(matches!(
            shape.as_subclass(circle.class()),
            Err(ReflectError::ClassCast(_))
        ));
    }

    #[test]
    fn test_supertypes() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");
        let base = handle(&runtime, "com.acme.AbstractShape");

        assert_eq!(circle.superclass().as_ref(), Some(base.class()));
        assert!(circle.interfaces().is_empty());
        assert_eq!(base.interfaces()[0].name(), "com.acme.Shape");
        assert!(handle(&runtime, "com.acme.Shape").superclass().is_none());
    }

    #[test]
    fn test_generic_supertypes() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        loader
            .define_class(
                ClassDescriptor::class("com.acme.Box")
                    .type_parameter(TypeVariable::new("T"))
                    .implements("java.lang.Comparable")
                    .with_generic_interface(GenericType::parameterized(
                        "java.lang.Comparable",
                        vec![GenericType::parameterized("com.acme.Box", vec![GenericType::variable("T")])],
                    )),
            )
            .unwrap();

        let boxed = handle(&runtime, "com.acme.Box");
        assert_eq!(boxed.type_parameters()[0].name, "T");
        assert_eq!(boxed.generic_superclass(), Some(GenericType::class("java.lang.Object")));
        assert_eq!(
            boxed.generic_interfaces()[0].to_string(),
            "java.lang.Comparable<com.acme.Box<T>>"
        );
    }
}

// ============================================================================
// Members
// ============================================================================

mod members {
    use super::*;

    fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
        let mut out: Vec<String> = items.iter().map(|i| name(i).to_string()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_declared_fields_cover_public_declared_fields() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");

        let declared = circle.declared_fields().unwrap();
        let public_declared: Vec<_> = circle
            .fields()
            .into_iter()
            .filter(|f| f.declaring_class() == circle.class())
            .collect();

        for field in &public_declared {
            assert!(declared.contains(field), "{} missing", field);
        }
        assert!(declared.len() > public_declared.len());
        assert_eq!(names(&declared, |f| f.name()), vec!["ORIGIN", "radius", "secret"]);
    }

    #[test]
    fn test_fields_include_inherited_public() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");

        assert_eq!(names(&circle.fields(), |f| f.name()), vec!["ORIGIN", "id", "radius"]);
        assert_eq!(circle.field("id").unwrap().declaring_class().name(), "com.acme.AbstractShape");
        assert!(matches!(circle.field("secret"), Err(ReflectError::NoSuchField(_))));
        assert!(matches!(circle.field("cache"), Err(ReflectError::NoSuchField(_))));
        assert!(matches!(circle.declared_field("id"), Err(ReflectError::NoSuchField(_))));
        assert_eq!(circle.declared_field("secret").unwrap().get_type().unwrap().name(), "java.lang.String");
    }

    #[test]
    fn test_methods() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");
        let double = runtime.primitive("double").unwrap();

        // Circle.area overrides Shape.area
        let area = circle.method("area", &[]).unwrap();
        assert_eq!(area.declaring_class(), circle.class());
        assert_eq!(circle.methods().iter().filter(|m| m.name() == "area").count(), 1);

        // Object's public methods are inherited
        assert!(circle.method("toString", &[]).is_ok());
        assert!(circle.method("clone", &[]).is_err());

        assert!(matches!(
            circle.method("grow", &[double.clone()]),
            Err(ReflectError::NoSuchMethod(_))
        ));
        let grow = circle.declared_method("grow", &[double.clone()]).unwrap();
        assert!(grow.modifiers().is_private());
        assert_eq!(grow.return_type().unwrap(), runtime.primitive("void").unwrap());
        assert_eq!(names(&circle.declared_methods().unwrap(), |m| m.name()), vec!["area", "grow"]);
    }

    #[test]
    fn test_constructors() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");
        let double = runtime.primitive("double").unwrap();

        assert_eq!(circle.constructors().len(), 1);
        assert_eq!(circle.declared_constructors().unwrap().len(), 2);
        assert!(circle.constructor(&[double.clone()]).is_err());
        assert!(circle.declared_constructor(&[double]).unwrap().modifiers().is_private());
        assert_eq!(circle.constructor(&[]).unwrap().to_string(), "public com.acme.Circle()");
    }

    #[test]
    fn test_classes() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        loader
            .define_class(
                ClassDescriptor::class("com.acme.Outer")
                    .member_class("com.acme.Outer$Open")
                    .member_class("com.acme.Outer$Closed"),
            )
            .unwrap();
        loader
            .define_class(ClassDescriptor::class("com.acme.Outer$Open").nested(Nesting::Member {
                declaring: "com.acme.Outer".to_string(),
            }))
            .unwrap();
        loader
            .define_class(
                ClassDescriptor::class("com.acme.Outer$Closed")
                    .with_modifiers(Modifiers::PRIVATE)
                    .nested(Nesting::Member {
                        declaring: "com.acme.Outer".to_string(),
                    }),
            )
            .unwrap();
        loader
            .define_class(ClassDescriptor::class("com.acme.Sub").extends("com.acme.Outer"))
            .unwrap();

        let outer = handle(&runtime, "com.acme.Outer");
        let sub = handle(&runtime, "com.acme.Sub");
        assert_eq!(outer.declared_classes().unwrap().len(), 2);
        assert_eq!(outer.classes().unwrap().len(), 1);
        assert_eq!(sub.classes().unwrap()[0].name(), "com.acme.Outer$Open");
        assert!(sub.declared_classes().unwrap().is_empty());
    }
}

// ============================================================================
// Instantiation
// ============================================================================

mod instantiation {
    use super::*;

    #[test]
    fn test_new_instance_accessible_constructor() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");

        let obj = circle.new_instance().unwrap();
        assert_eq!(obj.class(), circle.class());
        assert!(circle.is_instance(Some(&obj)));
        assert!(obj.payload::<()>().is_some());
    }

    #[test]
    fn test_new_instance_interface_and_abstract() {
        let runtime = Runtime::new();
        shapes(&runtime);

        for name in ["com.acme.Shape", "com.acme.AbstractShape", "[I"] {
            assert!(
                matches!(handle(&runtime, name).new_instance(), Err(ReflectError::Instantiation(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_new_instance_failing_factory() {
        let runtime = Runtime::new();
        runtime
            .system_loader()
            .define_class(
                ClassDescriptor::class("com.acme.Flaky").constructor(
                    ConstructorDescriptor::public(vec![]).with_factory(|_| Err("no resources".to_string())),
                ),
            )
            .unwrap();

        assert_eq!(
            handle(&runtime, "com.acme.Flaky").new_instance().unwrap_err(),
            ReflectError::InvocationTarget("no resources".to_string())
        );
    }

    #[test]
    fn test_new_string_from_bootstrap() {
        let runtime = Runtime::new();
        let string = handle(&runtime, "java.lang.String");
        let obj = string.new_instance().unwrap();
        assert_eq!(obj.payload::<String>().map(String::as_str), Some(""));
    }
}

// ============================================================================
// Annotations
// ============================================================================

mod annotations {
    use super::*;

    #[test]
    fn test_annotation_queries() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        loader
            .define_class(ClassDescriptor::annotation_type("com.acme.Entity"))
            .unwrap();
        loader
            .define_class(
                ClassDescriptor::class("com.acme.User")
                    .annotate(Annotation::new("com.acme.Entity"))
                    .annotate(Annotation::new("java.lang.Deprecated")),
            )
            .unwrap();

        let entity = handle(&runtime, "com.acme.Entity");
        let user = handle(&runtime, "com.acme.User");

        assert!(entity.is_annotation());
        assert!(entity.is_interface());
        assert!(user.is_annotation_present(entity.class()));
        assert_eq!(user.annotation(entity.class()).unwrap().annotation_type, "com.acme.Entity");
        assert_eq!(user.annotations(), user.declared_annotations());
        assert_eq!(user.declared_annotations().len(), 2);
    }
}

// ============================================================================
// Referential equivalence
// ============================================================================

mod equivalence {
    use super::*;

    fn assert_equivalent(a: &ClassHandle, b: &ClassHandle) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.simple_name(), b.simple_name());
        assert_eq!(a.canonical_name(), b.canonical_name());
        assert_eq!(a.modifiers(), b.modifiers());
        assert_eq!(a.package(), b.package());
        assert_eq!(a.class_loader().unwrap(), b.class_loader().unwrap());
        assert_eq!(a.superclass(), b.superclass());
        assert_eq!(a.interfaces(), b.interfaces());
        assert_eq!(a.component_type(), b.component_type());
        assert_eq!(a.is_interface(), b.is_interface());
        assert_eq!(a.is_array(), b.is_array());
        assert_eq!(a.is_primitive(), b.is_primitive());
        assert_eq!(a.fields(), b.fields());
        assert_eq!(a.declared_fields().unwrap(), b.declared_fields().unwrap());
        assert_eq!(a.methods(), b.methods());
        assert_eq!(a.declared_methods().unwrap(), b.declared_methods().unwrap());
        assert_eq!(a.constructors(), b.constructors());
        assert_eq!(a.annotations(), b.annotations());
        assert_eq!(a.generic_interfaces(), b.generic_interfaces());
        assert_eq!(a.desired_assertion_status(), b.desired_assertion_status());
        assert_eq!(a, b);
    }

    #[test]
    fn test_two_wrappers_same_class() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let class: Class = runtime.system_loader().load_class("com.acme.Circle").unwrap();

        let a = ClassHandle::new(class.clone());
        let b = ClassHandle::from(class);
        assert_equivalent(&a, &b);

        let c = handle(&runtime, "com.acme.Circle");
        assert_equivalent(&a, &c);

        let ints = handle(&runtime, "[I");
        assert_equivalent(&ints, &ClassHandle::new(ints.class().clone()));
    }

    #[test]
    fn test_wrappers_are_thread_safe() {
        let runtime = Runtime::new();
        shapes(&runtime);
        let circle = handle(&runtime, "com.acme.Circle");

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let circle = circle.clone();
                std::thread::spawn(move || {
                    let obj = circle.new_instance().unwrap();
                    (circle.name().to_string(), circle.is_instance(Some(&obj)))
                })
            })
            .collect();

        for thread in threads {
            assert_eq!(thread.join().unwrap(), ("com.acme.Circle".to_string(), true));
        }
    }
}
