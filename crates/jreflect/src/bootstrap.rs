//! Bootstrap Class Table
//!
//! Core classes every runtime starts with. They are defined in the bootstrap
//! loader before any other loader exists, so user descriptors can extend
//! `java.lang.Object`, implement `java.io.Serializable`, declare enums and
//! annotation types, and box primitive arguments.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::annotation::{Annotation, AnnotationValue, INHERITED};
use crate::class::ClassData;
use crate::descriptor::{ClassDescriptor, ConstructorDescriptor, FieldDescriptor, MethodDescriptor};
use crate::generics::{GenericType, TypeVariable};
use crate::loader::{LoaderData, LoaderId};
use crate::modifiers::Modifiers;
use crate::object::Payload;

/// Well-known core class names
pub mod core_classes {
    pub const OBJECT: &str = "java.lang.Object";
    pub const CLONEABLE: &str = "java.lang.Cloneable";
    pub const SERIALIZABLE: &str = "java.io.Serializable";
    pub const COMPARABLE: &str = "java.lang.Comparable";
    pub const CHAR_SEQUENCE: &str = "java.lang.CharSequence";
    pub const STRING: &str = "java.lang.String";
    pub const NUMBER: &str = "java.lang.Number";
    pub const ENUM: &str = "java.lang.Enum";
    pub const CLASS: &str = "java.lang.Class";
    pub const RUNNABLE: &str = "java.lang.Runnable";
    pub const ANNOTATION: &str = "java.lang.annotation.Annotation";
    pub const INHERITED: &str = super::INHERITED;
    pub const DOCUMENTED: &str = "java.lang.annotation.Documented";
    pub const DEPRECATED: &str = "java.lang.Deprecated";
}

/// Primitive keyword, descriptor code and boxed wrapper class
const PRIMITIVES: [(&str, char, &str); 9] = [
    ("boolean", 'Z', "java.lang.Boolean"),
    ("byte", 'B', "java.lang.Byte"),
    ("char", 'C', "java.lang.Character"),
    ("short", 'S', "java.lang.Short"),
    ("int", 'I', "java.lang.Integer"),
    ("long", 'J', "java.lang.Long"),
    ("float", 'F', "java.lang.Float"),
    ("double", 'D', "java.lang.Double"),
    ("void", 'V', "java.lang.Void"),
];

/// Primitive keyword for an array descriptor code
pub fn primitive_for_code(code: char) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(keyword, _, _)| *keyword)
}

/// Boxed wrapper class name for a primitive keyword
pub fn wrapper_for(keyword: &str) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(k, _, _)| *k == keyword)
        .map(|(_, _, wrapper)| *wrapper)
}

/// Core classes arrays and defaults are built from
pub(crate) struct CoreClasses {
    pub(crate) object: Arc<ClassData>,
    pub(crate) cloneable: Arc<ClassData>,
    pub(crate) serializable: Arc<ClassData>,
}

/// Define the core classes in `loader` and build the primitive table
pub(crate) fn install(
    loader: &LoaderData,
) -> (CoreClasses, FxHashMap<&'static str, Arc<ClassData>>) {
    use core_classes::*;

    let object = define(loader, object_class());
    let cloneable = define(loader, ClassDescriptor::interface(CLONEABLE));
    let serializable = define(loader, ClassDescriptor::interface(SERIALIZABLE));

    define(
        loader,
        ClassDescriptor::interface(COMPARABLE)
            .type_parameter(TypeVariable::new("T"))
            .method(MethodDescriptor::new(
                "compareTo",
                vec![OBJECT.to_string()],
                "int",
                Modifiers::PUBLIC | Modifiers::ABSTRACT,
            )),
    );
    define(
        loader,
        ClassDescriptor::interface(CHAR_SEQUENCE).method(MethodDescriptor::new(
            "length",
            vec![],
            "int",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        )),
    );
    define(
        loader,
        ClassDescriptor::interface(RUNNABLE).method(MethodDescriptor::new(
            "run",
            vec![],
            "void",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        )),
    );

    define(loader, ClassDescriptor::interface(ANNOTATION));
    let runtime_retention = Annotation::new("java.lang.annotation.Retention").with(
        "value",
        AnnotationValue::Enum {
            type_name: "java.lang.annotation.RetentionPolicy".to_string(),
            constant: "RUNTIME".to_string(),
        },
    );
    define(
        loader,
        ClassDescriptor::annotation_type(DOCUMENTED).annotate(runtime_retention.clone()),
    );
    define(
        loader,
        ClassDescriptor::annotation_type(INHERITED)
            .annotate(Annotation::new(DOCUMENTED))
            .annotate(runtime_retention.clone()),
    );
    define(
        loader,
        ClassDescriptor::annotation_type(DEPRECATED)
            .annotate(Annotation::new(DOCUMENTED))
            .annotate(runtime_retention),
    );

    define(
        loader,
        ClassDescriptor::class(STRING)
            .with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
            .implements(SERIALIZABLE)
            .implements(COMPARABLE)
            .implements(CHAR_SEQUENCE)
            .with_generic_interface(GenericType::class(SERIALIZABLE))
            .with_generic_interface(GenericType::parameterized(
                COMPARABLE,
                vec![GenericType::class(STRING)],
            ))
            .with_generic_interface(GenericType::class(CHAR_SEQUENCE))
            .field(FieldDescriptor::new(
                "value",
                "[C",
                Modifiers::PRIVATE | Modifiers::FINAL,
            ))
            .constructor(
                ConstructorDescriptor::public(vec![])
                    .with_factory(|_| Ok(Box::new(String::new()) as Payload)),
            )
            .method(MethodDescriptor::new("length", vec![], "int", Modifiers::PUBLIC))
            .method(MethodDescriptor::new("isEmpty", vec![], "boolean", Modifiers::PUBLIC)),
    );

    define(
        loader,
        ClassDescriptor::class(NUMBER)
            .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .implements(SERIALIZABLE)
            .constructor(ConstructorDescriptor::public(vec![]))
            .method(MethodDescriptor::new(
                "intValue",
                vec![],
                "int",
                Modifiers::PUBLIC | Modifiers::ABSTRACT,
            ))
            .method(MethodDescriptor::new(
                "doubleValue",
                vec![],
                "double",
                Modifiers::PUBLIC | Modifiers::ABSTRACT,
            )),
    );

    for (keyword, _, wrapper) in PRIMITIVES {
        define(loader, wrapper_class(keyword, wrapper));
    }

    define(
        loader,
        ClassDescriptor::class(ENUM)
            .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .implements(COMPARABLE)
            .implements(SERIALIZABLE)
            .type_parameter(TypeVariable::new("E").with_bound(GenericType::parameterized(
                ENUM,
                vec![GenericType::variable("E")],
            )))
            .field(FieldDescriptor::new("name", STRING, Modifiers::PRIVATE | Modifiers::FINAL))
            .field(FieldDescriptor::new("ordinal", "int", Modifiers::PRIVATE | Modifiers::FINAL))
            .constructor(ConstructorDescriptor::new(
                vec![STRING.to_string(), "int".to_string()],
                Modifiers::PROTECTED,
            ))
            .method(MethodDescriptor::new(
                "name",
                vec![],
                STRING,
                Modifiers::PUBLIC | Modifiers::FINAL,
            ))
            .method(MethodDescriptor::new(
                "ordinal",
                vec![],
                "int",
                Modifiers::PUBLIC | Modifiers::FINAL,
            )),
    );

    define(
        loader,
        ClassDescriptor::class(CLASS)
            .with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
            .implements(SERIALIZABLE)
            .type_parameter(TypeVariable::new("T"))
            .method(MethodDescriptor::new("getName", vec![], STRING, Modifiers::PUBLIC)),
    );

    let primitives = PRIMITIVES
        .iter()
        .map(|&(keyword, code, wrapper)| {
            (keyword, Arc::new(ClassData::primitive(keyword, code, wrapper)))
        })
        .collect();

    (
        CoreClasses {
            object,
            cloneable,
            serializable,
        },
        primitives,
    )
}

fn object_class() -> ClassDescriptor {
    use core_classes::{CLASS, OBJECT, STRING};

    ClassDescriptor::class(OBJECT)
        .constructor(ConstructorDescriptor::public(vec![]))
        .method(MethodDescriptor::new(
            "getClass",
            vec![],
            CLASS,
            Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::NATIVE,
        ))
        .method(MethodDescriptor::new(
            "hashCode",
            vec![],
            "int",
            Modifiers::PUBLIC | Modifiers::NATIVE,
        ))
        .method(MethodDescriptor::new(
            "equals",
            vec![OBJECT.to_string()],
            "boolean",
            Modifiers::PUBLIC,
        ))
        .method(MethodDescriptor::new("toString", vec![], STRING, Modifiers::PUBLIC))
        .method(
            MethodDescriptor::new(
                "clone",
                vec![],
                OBJECT,
                Modifiers::PROTECTED | Modifiers::NATIVE,
            )
            .throws("java.lang.CloneNotSupportedException"),
        )
}

/// Boxed wrapper: `Integer` extends `Number`, `Boolean`/`Character`/`Void` extend `Object`
fn wrapper_class(keyword: &str, wrapper: &str) -> ClassDescriptor {
    let numeric = !matches!(keyword, "boolean" | "char" | "void");
    let mut desc = ClassDescriptor::class(wrapper).with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL);

    if keyword == "void" {
        return desc.field(FieldDescriptor::new(
            "TYPE",
            core_classes::CLASS,
            Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
        ));
    }

    if numeric {
        desc = desc.extends(core_classes::NUMBER);
    } else {
        desc = desc.implements(core_classes::SERIALIZABLE);
    }

    desc.implements(core_classes::COMPARABLE)
        .with_generic_interface(GenericType::parameterized(
            core_classes::COMPARABLE,
            vec![GenericType::class(wrapper)],
        ))
        .field(FieldDescriptor::new(
            "TYPE",
            core_classes::CLASS,
            Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
        ))
        .field(FieldDescriptor::new(
            "value",
            keyword,
            Modifiers::PRIVATE | Modifiers::FINAL,
        ))
        .constructor(ConstructorDescriptor::public(vec![keyword.to_string()]))
}

/// Define a bootstrap class whose supertypes were defined before it
fn define(loader: &LoaderData, descriptor: ClassDescriptor) -> Arc<ClassData> {
    let superclass = descriptor
        .effective_superclass()
        .and_then(|name| loader.loaded_class(name));
    let interfaces = descriptor
        .interfaces
        .iter()
        .filter_map(|name| loader.loaded_class(name))
        .collect();

    let name = descriptor.name.clone();
    loader.insert_if_absent(&name, move || {
        ClassData::reference(descriptor, LoaderId::BOOTSTRAP, superclass, interfaces)
    })
}
