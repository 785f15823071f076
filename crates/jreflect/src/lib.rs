//! JVM-style class reflection over a registration-time type registry
//!
//! Rust has no live class table, so the types a host exposes are registered
//! up front as [`ClassDescriptor`]s in a [`Runtime`], through a tree of
//! [`ClassLoader`]s. Once defined, a [`Class`] answers the usual reflective
//! queries: names, modifiers, nesting, supertypes, members, annotations,
//! resources and instantiation.
//!
//! [`ClassHandle`] is the thin adapter interpreters and embedding layers hold
//! instead of a [`Class`]. Every method forwards to the identically named
//! [`Class`] query and returns its result or error unchanged.
//!
//! ```ignore
//! let runtime = Runtime::new();
//! runtime.system_loader().define_class(
//!     ClassDescriptor::class("com.acme.Widget")
//!         .constructor(ConstructorDescriptor::public(vec![])),
//! )?;
//!
//! let widget = ClassHandle::for_name(&runtime, "com.acme.Widget")?;
//! assert_eq!(widget.name(), "com.acme.Widget");
//! let obj = widget.new_instance()?;
//! assert!(widget.is_instance(Some(&obj)));
//! ```

pub mod annotation;
pub mod bootstrap;
pub mod class;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod generics;
pub mod handle;
pub mod loader;
pub mod member;
pub mod modifiers;
pub mod object;
pub mod package;
pub mod permissions;
pub mod runtime;

pub use annotation::{Annotation, AnnotationValue};
pub use class::Class;
pub use config::RuntimeConfig;
pub use descriptor::{
    ClassDescriptor, ConstructorDescriptor, EnclosingScope, FieldDescriptor, MethodDescriptor,
    Nesting,
};
pub use error::{ConfigError, ReflectError, ReflectResult};
pub use generics::{GenericType, TypeVariable};
pub use handle::ClassHandle;
pub use loader::{ClassLoader, LoaderId};
pub use member::{Constructor, Field, Method};
pub use modifiers::Modifiers;
pub use object::{Object, ObjectRef, Payload};
pub use package::{Package, ProtectionDomain, Signer};
pub use permissions::{PackageRule, ReflectPermission, SecurityPolicy};
pub use runtime::Runtime;
