//! Class Handle Wrapper
//!
//! [`ClassHandle`] is what embedders hold in place of a [`Class`]. It is set
//! once at construction and forwards every query to the wrapped class
//! verbatim: same arguments, same result, same error. No validation, caching
//! or error translation happens here.

use std::io::Read;

use url::Url;

use crate::annotation::Annotation;
use crate::class::Class;
use crate::error::ReflectResult;
use crate::generics::{GenericType, TypeVariable};
use crate::loader::ClassLoader;
use crate::member::{Constructor, Field, Method};
use crate::modifiers::Modifiers;
use crate::object::ObjectRef;
use crate::package::{Package, ProtectionDomain, Signer};
use crate::runtime::Runtime;

/// Delegating handle to a runtime class
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClassHandle {
    class: Class,
}

impl ClassHandle {
    pub fn new(class: Class) -> Self {
        Self { class }
    }

    /// Resolve `name` through the system loader and initialize it
    pub fn for_name(runtime: &Runtime, name: &str) -> ReflectResult<Self> {
        let loader = runtime.system_loader();
        Self::for_name_with(runtime, name, true, Some(&loader))
    }

    /// Resolve `name` through `loader` (`None` for the bootstrap loader)
    pub fn for_name_with(
        runtime: &Runtime,
        name: &str,
        initialize: bool,
        loader: Option<&ClassLoader>,
    ) -> ReflectResult<Self> {
        runtime.for_name(name, initialize, loader).map(Self::new)
    }

    /// The wrapped class
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn into_class(self) -> Class {
        self.class
    }

    // ===== Identity and metadata =====

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn canonical_name(&self) -> Option<String> {
        self.class.canonical_name()
    }

    pub fn simple_name(&self) -> String {
        self.class.simple_name()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.class.modifiers()
    }

    pub fn package(&self) -> Option<Package> {
        self.class.package()
    }

    pub fn class_loader(&self) -> ReflectResult<Option<ClassLoader>> {
        self.class.class_loader()
    }

    pub fn protection_domain(&self) -> ReflectResult<ProtectionDomain> {
        self.class.protection_domain()
    }

    pub fn enclosing_class(&self) -> Option<Class> {
        self.class.enclosing_class()
    }

    pub fn enclosing_constructor(&self) -> ReflectResult<Option<Constructor>> {
        self.class.enclosing_constructor()
    }

    pub fn enclosing_method(&self) -> ReflectResult<Option<Method>> {
        self.class.enclosing_method()
    }

    pub fn declaring_class(&self) -> Option<Class> {
        self.class.declaring_class()
    }

    pub fn component_type(&self) -> Option<Class> {
        self.class.component_type()
    }

    pub fn generic_superclass(&self) -> Option<GenericType> {
        self.class.generic_superclass()
    }

    pub fn generic_interfaces(&self) -> Vec<GenericType> {
        self.class.generic_interfaces()
    }

    pub fn type_parameters(&self) -> &[TypeVariable] {
        self.class.type_parameters()
    }

    pub fn signers(&self) -> Option<&[Signer]> {
        self.class.signers()
    }

    pub fn desired_assertion_status(&self) -> bool {
        self.class.desired_assertion_status()
    }

    // ===== Predicates =====

    pub fn is_primitive(&self) -> bool {
        self.class.is_primitive()
    }

    pub fn is_array(&self) -> bool {
        self.class.is_array()
    }

    pub fn is_interface(&self) -> bool {
        self.class.is_interface()
    }

    pub fn is_enum(&self) -> bool {
        self.class.is_enum()
    }

    pub fn is_annotation(&self) -> bool {
        self.class.is_annotation()
    }

    pub fn is_synthetic(&self) -> bool {
        self.class.is_synthetic()
    }

    pub fn is_anonymous_class(&self) -> bool {
        self.class.is_anonymous_class()
    }

    pub fn is_local_class(&self) -> bool {
        self.class.is_local_class()
    }

    pub fn is_member_class(&self) -> bool {
        self.class.is_member_class()
    }

    // ===== Relationships =====

    pub fn superclass(&self) -> Option<Class> {
        self.class.superclass()
    }

    pub fn interfaces(&self) -> Vec<Class> {
        self.class.interfaces()
    }

    pub fn classes(&self) -> ReflectResult<Vec<Class>> {
        self.class.classes()
    }

    pub fn declared_classes(&self) -> ReflectResult<Vec<Class>> {
        self.class.declared_classes()
    }

    pub fn is_assignable_from(&self, other: &Class) -> bool {
        self.class.is_assignable_from(other)
    }

    pub fn is_instance(&self, obj: Option<&ObjectRef>) -> bool {
        self.class.is_instance(obj)
    }

    pub fn is_annotation_present(&self, annotation_type: &Class) -> bool {
        self.class.is_annotation_present(annotation_type)
    }

    pub fn cast(&self, obj: Option<ObjectRef>) -> ReflectResult<Option<ObjectRef>> {
        self.class.cast(obj)
    }

    pub fn as_subclass(&self, other: &Class) -> ReflectResult<Class> {
        self.class.as_subclass(other)
    }

    // ===== Members =====

    pub fn field(&self, name: &str) -> ReflectResult<Field> {
        self.class.field(name)
    }

    pub fn declared_field(&self, name: &str) -> ReflectResult<Field> {
        self.class.declared_field(name)
    }

    pub fn fields(&self) -> Vec<Field> {
        self.class.fields()
    }

    pub fn declared_fields(&self) -> ReflectResult<Vec<Field>> {
        self.class.declared_fields()
    }

    pub fn method(&self, name: &str, parameter_types: &[Class]) -> ReflectResult<Method> {
        self.class.method(name, parameter_types)
    }

    pub fn declared_method(&self, name: &str, parameter_types: &[Class]) -> ReflectResult<Method> {
        self.class.declared_method(name, parameter_types)
    }

    pub fn methods(&self) -> Vec<Method> {
        self.class.methods()
    }

    pub fn declared_methods(&self) -> ReflectResult<Vec<Method>> {
        self.class.declared_methods()
    }

    pub fn constructor(&self, parameter_types: &[Class]) -> ReflectResult<Constructor> {
        self.class.constructor(parameter_types)
    }

    pub fn declared_constructor(&self, parameter_types: &[Class]) -> ReflectResult<Constructor> {
        self.class.declared_constructor(parameter_types)
    }

    pub fn constructors(&self) -> Vec<Constructor> {
        self.class.constructors()
    }

    pub fn declared_constructors(&self) -> ReflectResult<Vec<Constructor>> {
        self.class.declared_constructors()
    }

    // ===== Annotations =====

    pub fn annotation(&self, annotation_type: &Class) -> Option<Annotation> {
        self.class.annotation(annotation_type)
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.class.annotations()
    }

    pub fn declared_annotations(&self) -> Vec<Annotation> {
        self.class.declared_annotations()
    }

    // ===== Resources =====

    pub fn resource(&self, name: &str) -> Option<Url> {
        self.class.resource(name)
    }

    pub fn resource_as_stream(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        self.class.resource_as_stream(name)
    }

    // ===== Construction =====

    pub fn new_instance(&self) -> ReflectResult<ObjectRef> {
        self.class.new_instance()
    }
}

impl From<Class> for ClassHandle {
    fn from(class: Class) -> Self {
        Self::new(class)
    }
}

impl std::fmt::Display for ClassHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.class, f)
    }
}

impl std::fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassHandle").field(&self.class).finish()
    }
}
