//! Class Descriptors
//!
//! A descriptor is the registration-time description of a class: everything a
//! loader needs to materialise a [`Class`](crate::Class). Type references are
//! binary names (`int`, `java.lang.String`, `[I`, `[Ljava.lang.String;`) and
//! are resolved lazily through the defining loader.
//!
//! The data parts serialize with serde so whole class tables can be kept as
//! JSON and fed to [`ClassLoader::define_classes_json`](crate::ClassLoader::define_classes_json).
//! Native hooks (static initializers, constructor and method bodies) are
//! attached in code.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::error::ReflectResult;
use crate::generics::{GenericType, TypeVariable};
use crate::modifiers::Modifiers;
use crate::object::{ObjectRef, Payload};
use crate::package::{ProtectionDomain, Signer};

/// Static initializer body
pub type InitializerFn = dyn Fn() -> Result<(), String> + Send + Sync;

/// Constructor body producing the native payload of a fresh instance
pub type ConstructorFn = dyn Fn(&[Option<ObjectRef>]) -> Result<Payload, String> + Send + Sync;

/// Method body: receiver (`None` for static methods) and arguments
pub type MethodFn =
    dyn Fn(Option<&ObjectRef>, &[Option<ObjectRef>]) -> Result<Option<ObjectRef>, String> + Send + Sync;

macro_rules! native_hook {
    ($name:ident, $fn_ty:ty) => {
        /// Shared native hook
        #[derive(Clone)]
        pub struct $name(pub Arc<$fn_ty>);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(concat!(stringify!($name), "(..)"))
            }
        }
    };
}

native_hook!(Initializer, InitializerFn);
native_hook!(ConstructorImpl, ConstructorFn);
native_hook!(MethodImpl, MethodFn);

/// Where a local or anonymous class was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnclosingScope {
    Method {
        name: String,
        #[serde(default)]
        parameter_types: Vec<String>,
    },
    Constructor {
        #[serde(default)]
        parameter_types: Vec<String>,
    },
    /// Field initializer or static/instance initializer block
    Initializer,
}

/// How a class is nested in another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Nesting {
    #[default]
    TopLevel,
    /// Member of `declaring`
    Member { declaring: String },
    /// Named class declared inside a block
    Local {
        enclosing: String,
        scope: EnclosingScope,
    },
    /// Class instance creation expression with a body
    Anonymous {
        enclosing: String,
        scope: EnclosingScope,
    },
}

impl Nesting {
    /// Immediately enclosing class, if any
    pub fn enclosing_class(&self) -> Option<&str> {
        match self {
            Nesting::TopLevel => None,
            Nesting::Member { declaring } => Some(declaring),
            Nesting::Local { enclosing, .. } | Nesting::Anonymous { enclosing, .. } => {
                Some(enclosing)
            }
        }
    }

    /// Enclosing method or constructor scope for local/anonymous classes
    pub fn scope(&self) -> Option<&EnclosingScope> {
        match self {
            Nesting::Local { scope, .. } | Nesting::Anonymous { scope, .. } => Some(scope),
            _ => None,
        }
    }
}

/// Declared field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Binary name of the field type
    pub type_name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub generic_type: Option<GenericType>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            modifiers,
            annotations: Vec::new(),
            generic_type: None,
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_generic_type(mut self, ty: GenericType) -> Self {
        self.generic_type = Some(ty);
        self
    }
}

/// Declared method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub exception_types: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub generic_return_type: Option<GenericType>,
    #[serde(skip)]
    pub implementation: Option<MethodImpl>,
}

fn void_type() -> String {
    "void".to_string()
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<String>,
        return_type: impl Into<String>,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            return_type: return_type.into(),
            modifiers,
            exception_types: Vec::new(),
            annotations: Vec::new(),
            generic_return_type: None,
            implementation: None,
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn throws(mut self, exception_type: impl Into<String>) -> Self {
        self.exception_types.push(exception_type.into());
        self
    }

    /// Attach a native body used by [`Method::invoke`](crate::Method::invoke)
    pub fn with_impl<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&ObjectRef>, &[Option<ObjectRef>]) -> Result<Option<ObjectRef>, String>
            + Send
            + Sync
            + 'static,
    {
        self.implementation = Some(MethodImpl(Arc::new(body)));
        self
    }
}

/// Declared constructor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(skip)]
    pub factory: Option<ConstructorImpl>,
}

impl ConstructorDescriptor {
    pub fn new(parameter_types: Vec<String>, modifiers: Modifiers) -> Self {
        Self {
            parameter_types,
            modifiers,
            ..Default::default()
        }
    }

    /// Public constructor with the given parameter types
    pub fn public(parameter_types: Vec<String>) -> Self {
        Self::new(parameter_types, Modifiers::PUBLIC)
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Attach the body producing the instance payload
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&[Option<ObjectRef>]) -> Result<Payload, String> + Send + Sync + 'static,
    {
        self.factory = Some(ConstructorImpl(Arc::new(factory)));
        self
    }
}

/// Registration-time description of a class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Binary name, e.g. `com.acme.Outer$Inner`
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Defaults to `java.lang.Object` for classes; ignored for interfaces
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub nesting: Nesting,
    /// Binary names of member classes declared by this class
    #[serde(default)]
    pub member_classes: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDescriptor>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub type_parameters: Vec<TypeVariable>,
    #[serde(default)]
    pub generic_superclass: Option<GenericType>,
    #[serde(default)]
    pub generic_interfaces: Vec<GenericType>,
    #[serde(default)]
    pub signers: Option<Vec<Signer>>,
    #[serde(default)]
    pub protection_domain: Option<ProtectionDomain>,
    #[serde(skip)]
    pub initializer: Option<Initializer>,
}

impl ClassDescriptor {
    /// Public concrete class
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            ..Default::default()
        }
    }

    /// Public interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT,
            ..Default::default()
        }
    }

    /// Public annotation type
    pub fn annotation_type(name: impl Into<String>) -> Self {
        let mut desc = Self::interface(name);
        desc.modifiers |= Modifiers::ANNOTATION;
        desc.interfaces.push("java.lang.annotation.Annotation".to_string());
        desc
    }

    /// Public enum, extending `java.lang.Enum`
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::ENUM,
            superclass: Some("java.lang.Enum".to_string()),
            ..Default::default()
        }
    }

    /// Parse a single descriptor from JSON
    pub fn from_json(json: &str) -> ReflectResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn nested(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn member_class(mut self, name: impl Into<String>) -> Self {
        self.member_classes.push(name.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn type_parameter(mut self, param: TypeVariable) -> Self {
        self.type_parameters.push(param);
        self
    }

    pub fn with_generic_superclass(mut self, ty: GenericType) -> Self {
        self.generic_superclass = Some(ty);
        self
    }

    pub fn with_generic_interface(mut self, ty: GenericType) -> Self {
        self.generic_interfaces.push(ty);
        self
    }

    pub fn signed_by(mut self, signer: Signer) -> Self {
        self.signers.get_or_insert_with(Vec::new).push(signer);
        self
    }

    pub fn with_protection_domain(mut self, domain: ProtectionDomain) -> Self {
        self.protection_domain = Some(domain);
        self
    }

    /// Attach a static initializer run on first initialization
    pub fn with_initializer<F>(mut self, init: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.initializer = Some(Initializer(Arc::new(init)));
        self
    }

    /// Superclass name after applying the `java.lang.Object` default
    pub fn effective_superclass(&self) -> Option<&str> {
        if self.modifiers.is_interface() || self.name == "java.lang.Object" {
            return None;
        }
        Some(self.superclass.as_deref().unwrap_or("java.lang.Object"))
    }
}
