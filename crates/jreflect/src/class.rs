//! Runtime Classes
//!
//! [`Class`] is the type handle of the registry: one per (binary name,
//! defining loader), compared by identity. It answers every reflective query
//! with JVM visibility rules:
//!
//! - plain member lookups (`field`, `methods`, `constructors`, ...) return
//!   public members, inheritance-inclusive
//! - `declared_*` lookups return members declared directly by the class,
//!   regardless of visibility, and are guarded by
//!   [`ReflectPermission::ACCESS_DECLARED_MEMBERS`]

use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};
use url::Url;

use crate::annotation::{Annotation, INHERITED};
use crate::bootstrap::{core_classes, CoreClasses};
use crate::descriptor::{ClassDescriptor, EnclosingScope, Nesting};
use crate::error::{ReflectError, ReflectResult};
use crate::generics::{GenericType, TypeVariable};
use crate::loader::{ClassLoader, LoaderId};
use crate::member::{Constructor, Field, Method};
use crate::modifiers::Modifiers;
use crate::object::ObjectRef;
use crate::package::{Package, ProtectionDomain, Signer};
use crate::permissions::{package_of, ReflectPermission};
use crate::runtime::Runtime;

/// Kind of type a class describes
pub(crate) enum ClassKind {
    Primitive { code: char, wrapper: &'static str },
    Array { component: Arc<ClassData> },
    Reference,
}

/// Static initialization progress
#[derive(Debug, Clone, PartialEq, Eq)]
enum InitState {
    Uninitialized,
    /// Running on the thread that holds the init lock
    InProgress,
    Initialized,
    Failed(String),
}

/// Immutable class record plus its initialization state
pub(crate) struct ClassData {
    pub(crate) descriptor: ClassDescriptor,
    pub(crate) loader: LoaderId,
    pub(crate) kind: ClassKind,
    pub(crate) superclass: Option<Arc<ClassData>>,
    pub(crate) interfaces: Vec<Arc<ClassData>>,
    init: ReentrantMutex<RefCell<InitState>>,
}

impl ClassData {
    pub(crate) fn reference(
        descriptor: ClassDescriptor,
        loader: LoaderId,
        superclass: Option<Arc<ClassData>>,
        interfaces: Vec<Arc<ClassData>>,
    ) -> Self {
        let state = if descriptor.initializer.is_some() {
            InitState::Uninitialized
        } else {
            InitState::Initialized
        };
        Self {
            descriptor,
            loader,
            kind: ClassKind::Reference,
            superclass,
            interfaces,
            init: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    pub(crate) fn primitive(keyword: &'static str, code: char, wrapper: &'static str) -> Self {
        Self {
            descriptor: ClassDescriptor {
                name: keyword.to_string(),
                modifiers: Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::ABSTRACT,
                ..Default::default()
            },
            loader: LoaderId::BOOTSTRAP,
            kind: ClassKind::Primitive { code, wrapper },
            superclass: None,
            interfaces: Vec::new(),
            init: ReentrantMutex::new(RefCell::new(InitState::Initialized)),
        }
    }

    pub(crate) fn array(name: String, component: Arc<ClassData>, core: &CoreClasses) -> Self {
        let modifiers = component
            .modifiers()
            .intersection(Modifiers::ACCESS_MASK)
            .union(Modifiers::FINAL | Modifiers::ABSTRACT);
        Self {
            descriptor: ClassDescriptor {
                name,
                modifiers,
                superclass: Some(core_classes::OBJECT.to_string()),
                interfaces: vec![
                    core_classes::CLONEABLE.to_string(),
                    core_classes::SERIALIZABLE.to_string(),
                ],
                ..Default::default()
            },
            loader: component.loader,
            kind: ClassKind::Array { component },
            superclass: Some(core.object.clone()),
            interfaces: vec![core.cloneable.clone(), core.serializable.clone()],
            init: ReentrantMutex::new(RefCell::new(InitState::Initialized)),
        }
    }

    fn modifiers(&self) -> Modifiers {
        self.descriptor.modifiers
    }
}

/// A loaded class, primitive type or array type
#[derive(Clone)]
pub struct Class {
    runtime: Runtime,
    data: Arc<ClassData>,
}

impl Class {
    pub(crate) fn from_data(runtime: Runtime, data: Arc<ClassData>) -> Self {
        Self { runtime, data }
    }

    pub(crate) fn data(&self) -> &Arc<ClassData> {
        &self.data
    }

    pub(crate) fn descriptor(&self) -> &ClassDescriptor {
        &self.data.descriptor
    }

    fn wrap(&self, data: &Arc<ClassData>) -> Class {
        Class::from_data(self.runtime.clone(), data.clone())
    }

    /// Runtime this class belongs to
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Loader that defined this class, bootstrap included
    pub fn defining_loader(&self) -> ClassLoader {
        self.runtime.loader(self.data.loader)
    }

    /// Resolve a type name referenced by this class
    pub(crate) fn resolve(&self, type_name: &str) -> ReflectResult<Class> {
        self.runtime.resolve_type(&self.defining_loader(), type_name)
    }

    /// Policy check against the element type's package
    fn check(&self, required: ReflectPermission) -> ReflectResult<()> {
        let mut base = self.clone();
        while let Some(component) = base.component_type() {
            base = component;
        }
        self.runtime.check_permission(base.name(), required)
    }

    // ========================================================================
    // Identity and metadata
    // ========================================================================

    /// Binary name (`com.acme.Outer$Inner`, `int`, `[Ljava.lang.String;`)
    pub fn name(&self) -> &str {
        &self.data.descriptor.name
    }

    /// Name as written in source, or `""` for anonymous classes
    pub fn simple_name(&self) -> String {
        if let Some(component) = self.component_type() {
            return format!("{}[]", component.simple_name());
        }

        let name = self.name();
        match self.descriptor().nesting.enclosing_class() {
            None => name.rsplit('.').next().unwrap_or(name).to_string(),
            Some(enclosing) => {
                let tail = name
                    .strip_prefix(enclosing)
                    .and_then(|rest| rest.strip_prefix('$'))
                    .or_else(|| name.rsplit('$').next())
                    .unwrap_or(name);
                tail.trim_start_matches(|c: char| c.is_ascii_digit()).to_string()
            }
        }
    }

    /// Name as written in an import, `None` for local, anonymous or unnamed-component types
    pub fn canonical_name(&self) -> Option<String> {
        if let Some(component) = self.component_type() {
            return component.canonical_name().map(|c| format!("{}[]", c));
        }
        match &self.descriptor().nesting {
            Nesting::TopLevel => Some(self.name().to_string()),
            Nesting::Member { .. } => {
                let declaring = self.declaring_class()?;
                let outer = declaring.canonical_name()?;
                Some(format!("{}.{}", outer, self.simple_name()))
            }
            Nesting::Local { .. } | Nesting::Anonymous { .. } => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.data.modifiers()
    }

    /// Package of a class or interface; `None` for primitives and arrays
    pub fn package(&self) -> Option<Package> {
        if self.is_primitive() || self.is_array() {
            return None;
        }
        let name = package_of(self.name());
        Some(
            self.defining_loader()
                .package(name)
                .unwrap_or_else(|| Package::named(name)),
        )
    }

    /// Defining loader, `None` for bootstrap classes and primitives
    pub fn class_loader(&self) -> ReflectResult<Option<ClassLoader>> {
        self.check(ReflectPermission::GET_CLASS_LOADER)?;
        if self.data.loader == LoaderId::BOOTSTRAP {
            Ok(None)
        } else {
            Ok(Some(self.defining_loader()))
        }
    }

    pub fn protection_domain(&self) -> ReflectResult<ProtectionDomain> {
        self.check(ReflectPermission::GET_PROTECTION_DOMAIN)?;
        let mut base = self.clone();
        while let Some(component) = base.component_type() {
            base = component;
        }
        Ok(base
            .descriptor()
            .protection_domain
            .clone()
            .unwrap_or_default())
    }

    /// Signers, `None` when unsigned (always for primitives and arrays)
    pub fn signers(&self) -> Option<&[Signer]> {
        self.descriptor().signers.as_deref()
    }

    /// Whether assertions should be enabled for this class
    pub fn desired_assertion_status(&self) -> bool {
        self.defining_loader().desired_assertion_status(self.name())
    }

    pub fn component_type(&self) -> Option<Class> {
        match &self.data.kind {
            ClassKind::Array { component } => Some(self.wrap(component)),
            _ => None,
        }
    }

    /// Array type whose component is this class
    pub fn array_type(&self) -> Class {
        self.runtime.array_of(self)
    }

    /// Descriptor code for primitives (`I`, `Z`, ...)
    pub(crate) fn primitive_code(&self) -> Option<char> {
        match self.data.kind {
            ClassKind::Primitive { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Boxed wrapper class name for primitives
    pub(crate) fn wrapper_name(&self) -> Option<&'static str> {
        match self.data.kind {
            ClassKind::Primitive { wrapper, .. } => Some(wrapper),
            _ => None,
        }
    }

    // ========================================================================
    // Nesting
    // ========================================================================

    /// Immediately enclosing class of a nested class
    pub fn enclosing_class(&self) -> Option<Class> {
        let name = self.descriptor().nesting.enclosing_class()?;
        self.resolve(name).ok()
    }

    /// Class this is a member of; `None` for top-level, local and anonymous classes
    pub fn declaring_class(&self) -> Option<Class> {
        match &self.descriptor().nesting {
            Nesting::Member { declaring } => self.resolve(declaring).ok(),
            _ => None,
        }
    }

    /// Method a local or anonymous class was declared in
    pub fn enclosing_method(&self) -> ReflectResult<Option<Method>> {
        let (enclosing, scope) = match &self.descriptor().nesting {
            Nesting::Local { enclosing, scope } | Nesting::Anonymous { enclosing, scope } => {
                (enclosing, scope)
            }
            _ => return Ok(None),
        };
        let EnclosingScope::Method {
            name,
            parameter_types,
        } = scope
        else {
            return Ok(None);
        };

        let outer = self.resolve(enclosing)?;
        outer.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        outer
            .find_declared_method(name, parameter_types)
            .map(Some)
            .ok_or_else(|| no_such_method(&outer, name, parameter_types))
    }

    /// Constructor a local or anonymous class was declared in
    pub fn enclosing_constructor(&self) -> ReflectResult<Option<Constructor>> {
        let (enclosing, scope) = match &self.descriptor().nesting {
            Nesting::Local { enclosing, scope } | Nesting::Anonymous { enclosing, scope } => {
                (enclosing, scope)
            }
            _ => return Ok(None),
        };
        let EnclosingScope::Constructor { parameter_types } = scope else {
            return Ok(None);
        };

        let outer = self.resolve(enclosing)?;
        outer.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        outer
            .find_declared_constructor(parameter_types)
            .map(Some)
            .ok_or_else(|| no_such_method(&outer, "<init>", parameter_types))
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    pub fn is_primitive(&self) -> bool {
        matches!(self.data.kind, ClassKind::Primitive { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data.kind, ClassKind::Array { .. })
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers().is_interface()
    }

    pub fn is_annotation(&self) -> bool {
        self.modifiers().contains(Modifiers::ANNOTATION)
    }

    /// Declared as an enum (not an enum constant body)
    pub fn is_enum(&self) -> bool {
        self.modifiers().contains(Modifiers::ENUM)
            && self
                .data
                .superclass
                .as_ref()
                .is_some_and(|s| s.descriptor.name == core_classes::ENUM)
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers().contains(Modifiers::SYNTHETIC)
    }

    pub fn is_anonymous_class(&self) -> bool {
        matches!(self.descriptor().nesting, Nesting::Anonymous { .. })
    }

    pub fn is_local_class(&self) -> bool {
        matches!(self.descriptor().nesting, Nesting::Local { .. })
    }

    pub fn is_member_class(&self) -> bool {
        matches!(self.descriptor().nesting, Nesting::Member { .. })
    }

    // ========================================================================
    // Supertypes
    // ========================================================================

    /// Direct superclass; `None` for `Object`, interfaces and primitives
    pub fn superclass(&self) -> Option<Class> {
        self.data.superclass.as_ref().map(|s| self.wrap(s))
    }

    /// Directly implemented (or, for interfaces, extended) interfaces
    pub fn interfaces(&self) -> Vec<Class> {
        self.data.interfaces.iter().map(|i| self.wrap(i)).collect()
    }

    /// Superclass with type arguments, as declared
    pub fn generic_superclass(&self) -> Option<GenericType> {
        let superclass = self.data.superclass.as_ref()?;
        Some(
            self.descriptor()
                .generic_superclass
                .clone()
                .unwrap_or_else(|| GenericType::class(superclass.descriptor.name.clone())),
        )
    }

    /// Interfaces with type arguments, as declared
    pub fn generic_interfaces(&self) -> Vec<GenericType> {
        let declared = &self.descriptor().generic_interfaces;
        if !declared.is_empty() {
            return declared.clone();
        }
        self.data
            .interfaces
            .iter()
            .map(|i| GenericType::class(i.descriptor.name.clone()))
            .collect()
    }

    pub fn type_parameters(&self) -> &[TypeVariable] {
        &self.descriptor().type_parameters
    }

    /// Whether a value of type `other` can be assigned to this type
    pub fn is_assignable_from(&self, other: &Class) -> bool {
        if self == other {
            return true;
        }
        if self.is_primitive() || other.is_primitive() {
            return false;
        }

        if let Some(other_component) = other.component_type() {
            if let Some(component) = self.component_type() {
                return !component.is_primitive()
                    && !other_component.is_primitive()
                    && component.is_assignable_from(&other_component);
            }
            // Arrays are Objects, Cloneable and Serializable only
            return matches!(
                self.name(),
                core_classes::OBJECT | core_classes::CLONEABLE | core_classes::SERIALIZABLE
            ) && self.data.loader == LoaderId::BOOTSTRAP;
        }
        if self.is_array() {
            return false;
        }

        if self.name() == core_classes::OBJECT
            && self.data.loader == LoaderId::BOOTSTRAP
            && other.is_interface()
        {
            return true;
        }

        let target = &self.data;
        let mut stack = vec![other.data.clone()];
        let mut seen: FxHashSet<*const ClassData> = FxHashSet::default();
        while let Some(current) = stack.pop() {
            if Arc::ptr_eq(&current, target) {
                return true;
            }
            if !seen.insert(Arc::as_ptr(&current)) {
                continue;
            }
            if let Some(superclass) = &current.superclass {
                stack.push(superclass.clone());
            }
            stack.extend(current.interfaces.iter().cloned());
        }
        false
    }

    /// Whether `obj` is a non-null instance of this type
    pub fn is_instance(&self, obj: Option<&ObjectRef>) -> bool {
        obj.is_some_and(|obj| self.is_assignable_from(obj.class()))
    }

    /// Checked narrowing: null passes, otherwise `obj` must be an instance
    pub fn cast(&self, obj: Option<ObjectRef>) -> ReflectResult<Option<ObjectRef>> {
        match obj {
            Some(obj) if !self.is_assignable_from(obj.class()) => Err(ReflectError::ClassCast(
                format!("Cannot cast {} to {}", obj.class().name(), self.name()),
            )),
            other => Ok(other),
        }
    }

    /// Checked supertype assertion: returns this class when `other` is one of its supertypes
    pub fn as_subclass(&self, other: &Class) -> ReflectResult<Class> {
        if other.is_assignable_from(self) {
            Ok(self.clone())
        } else {
            Err(ReflectError::ClassCast(self.to_string()))
        }
    }

    /// Superinterfaces of this class and all superclasses, breadth first, no duplicates
    fn all_superinterfaces(&self) -> Vec<Class> {
        let mut out: Vec<Class> = Vec::new();
        let mut seen: FxHashSet<*const ClassData> = FxHashSet::default();
        let mut queue: std::collections::VecDeque<Arc<ClassData>> = Default::default();

        let mut current = Some(self.data.clone());
        while let Some(class) = current {
            queue.extend(class.interfaces.iter().cloned());
            current = class.superclass.clone();
        }

        while let Some(iface) = queue.pop_front() {
            if !seen.insert(Arc::as_ptr(&iface)) {
                continue;
            }
            queue.extend(iface.interfaces.iter().cloned());
            out.push(self.wrap(&iface));
        }
        out
    }

    /// This class followed by its superclass chain
    fn class_chain(&self) -> Vec<Class> {
        let mut chain = vec![self.clone()];
        let mut current = self.data.superclass.clone();
        while let Some(data) = current {
            current = data.superclass.clone();
            chain.push(self.wrap(&data));
        }
        chain
    }

    // ========================================================================
    // Nested classes
    // ========================================================================

    fn member_classes(&self) -> ReflectResult<Vec<Class>> {
        self.descriptor()
            .member_classes
            .iter()
            .map(|name| self.resolve(name))
            .collect()
    }

    /// Public member classes, including those of superclasses
    pub fn classes(&self) -> ReflectResult<Vec<Class>> {
        let mut out = Vec::new();
        for class in self.class_chain() {
            for member in class.member_classes()? {
                if member.modifiers().is_public() {
                    out.push(member);
                }
            }
        }
        Ok(out)
    }

    /// All member classes declared by this class
    pub fn declared_classes(&self) -> ReflectResult<Vec<Class>> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        self.member_classes()
    }

    // ========================================================================
    // Fields
    // ========================================================================

    fn declared_field_list(&self) -> impl Iterator<Item = Field> + '_ {
        (0..self.descriptor().fields.len()).map(move |index| Field::new(self.clone(), index))
    }

    fn find_public_field(&self, name: &str) -> Option<Field> {
        if let Some(field) = self
            .declared_field_list()
            .find(|f| f.name() == name && f.modifiers().is_public())
        {
            return Some(field);
        }
        for iface in self.interfaces() {
            if let Some(field) = iface.find_public_field(name) {
                return Some(field);
            }
        }
        self.superclass()?.find_public_field(name)
    }

    fn collect_public_fields(&self, out: &mut Vec<Field>, seen: &mut FxHashSet<Class>) {
        out.extend(self.declared_field_list().filter(|f| f.modifiers().is_public()));
        for iface in self.interfaces() {
            if seen.insert(iface.clone()) {
                iface.collect_public_fields(out, seen);
            }
        }
        if let Some(superclass) = self.superclass() {
            superclass.collect_public_fields(out, seen);
        }
    }

    /// Public field by name: declared, then superinterfaces, then superclasses
    pub fn field(&self, name: &str) -> ReflectResult<Field> {
        self.find_public_field(name)
            .ok_or_else(|| ReflectError::NoSuchField(name.to_string()))
    }

    /// Every public field, inherited ones included
    pub fn fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_public_fields(&mut out, &mut seen);
        out
    }

    /// Field declared by this class, any visibility
    pub fn declared_field(&self, name: &str) -> ReflectResult<Field> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        self.declared_field_list()
            .find(|f| f.name() == name)
            .ok_or_else(|| ReflectError::NoSuchField(name.to_string()))
    }

    /// Every field declared by this class, any visibility
    pub fn declared_fields(&self) -> ReflectResult<Vec<Field>> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        Ok(self.declared_field_list().collect())
    }

    // ========================================================================
    // Methods
    // ========================================================================

    fn declared_method_list(&self) -> impl Iterator<Item = Method> + '_ {
        (0..self.descriptor().methods.len()).map(move |index| Method::new(self.clone(), index))
    }

    pub(crate) fn find_declared_method(&self, name: &str, parameter_types: &[String]) -> Option<Method> {
        self.declared_method_list()
            .find(|m| m.name() == name && m.parameter_type_names() == parameter_types)
    }

    /// Public method by name and parameter types, searching superclasses then superinterfaces
    pub fn method(&self, name: &str, parameter_types: &[Class]) -> ReflectResult<Method> {
        let params = type_names(parameter_types);

        for class in self.class_chain() {
            if let Some(method) = class
                .find_declared_method(name, &params)
                .filter(|m| m.modifiers().is_public())
            {
                return Ok(method);
            }
        }
        for iface in self.all_superinterfaces() {
            if let Some(method) = iface
                .find_declared_method(name, &params)
                .filter(|m| m.modifiers().is_public() && !m.modifiers().is_static())
            {
                return Ok(method);
            }
        }

        Err(no_such_method(self, name, &params))
    }

    /// Every public method, inherited ones included; overriding hides inherited duplicates
    pub fn methods(&self) -> Vec<Method> {
        let mut out = Vec::new();
        let mut signatures: FxHashSet<(String, Vec<String>)> = FxHashSet::default();

        for class in self.class_chain() {
            for method in class.declared_method_list() {
                if method.modifiers().is_public()
                    && signatures.insert((method.name().to_string(), method.parameter_type_names().to_vec()))
                {
                    out.push(method);
                }
            }
        }
        // Static interface methods are not inherited
        for iface in self.all_superinterfaces() {
            for method in iface.declared_method_list() {
                let mods = method.modifiers();
                if mods.is_public()
                    && !mods.is_static()
                    && signatures.insert((method.name().to_string(), method.parameter_type_names().to_vec()))
                {
                    out.push(method);
                }
            }
        }
        out
    }

    /// Method declared by this class, any visibility
    pub fn declared_method(&self, name: &str, parameter_types: &[Class]) -> ReflectResult<Method> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        let params = type_names(parameter_types);
        self.find_declared_method(name, &params)
            .ok_or_else(|| no_such_method(self, name, &params))
    }

    /// Every method declared by this class, any visibility
    pub fn declared_methods(&self) -> ReflectResult<Vec<Method>> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        Ok(self.declared_method_list().collect())
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    fn declared_constructor_list(&self) -> impl Iterator<Item = Constructor> + '_ {
        (0..self.descriptor().constructors.len())
            .map(move |index| Constructor::new(self.clone(), index))
    }

    pub(crate) fn find_declared_constructor(&self, parameter_types: &[String]) -> Option<Constructor> {
        self.declared_constructor_list()
            .find(|c| c.parameter_type_names() == parameter_types)
    }

    /// Public constructor with the given parameter types
    pub fn constructor(&self, parameter_types: &[Class]) -> ReflectResult<Constructor> {
        let params = type_names(parameter_types);
        self.find_declared_constructor(&params)
            .filter(|c| c.modifiers().is_public())
            .ok_or_else(|| no_such_method(self, "<init>", &params))
    }

    /// Every public constructor
    pub fn constructors(&self) -> Vec<Constructor> {
        self.declared_constructor_list()
            .filter(|c| c.modifiers().is_public())
            .collect()
    }

    /// Constructor declared by this class, any visibility
    pub fn declared_constructor(&self, parameter_types: &[Class]) -> ReflectResult<Constructor> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        let params = type_names(parameter_types);
        self.find_declared_constructor(&params)
            .ok_or_else(|| no_such_method(self, "<init>", &params))
    }

    /// Every constructor declared by this class, any visibility
    pub fn declared_constructors(&self) -> ReflectResult<Vec<Constructor>> {
        self.check(ReflectPermission::ACCESS_DECLARED_MEMBERS)?;
        Ok(self.declared_constructor_list().collect())
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    /// Annotation of the given type, inherited ones included
    pub fn annotation(&self, annotation_type: &Class) -> Option<Annotation> {
        self.annotations_by_owner()
            .into_iter()
            .find(|(owner, a)| is_annotation_of(owner, a, annotation_type))
            .map(|(_, a)| a)
    }

    pub fn is_annotation_present(&self, annotation_type: &Class) -> bool {
        self.annotation(annotation_type).is_some()
    }

    /// Declared annotations plus `@Inherited` annotations of superclasses
    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations_by_owner()
            .into_iter()
            .map(|(_, a)| a)
            .collect()
    }

    /// Annotations written on this class itself
    pub fn declared_annotations(&self) -> Vec<Annotation> {
        self.descriptor().annotations.clone()
    }

    /// Visible annotations paired with the class that declares them
    ///
    /// Annotation type names resolve through the declaring class's loader.
    fn annotations_by_owner(&self) -> Vec<(Class, Annotation)> {
        let mut out: Vec<(Class, Annotation)> = self
            .descriptor()
            .annotations
            .iter()
            .map(|a| (self.clone(), a.clone()))
            .collect();
        let mut seen: Vec<Option<Class>> = out
            .iter()
            .map(|(owner, a)| owner.resolve(&a.annotation_type).ok())
            .collect();

        let mut current = self.superclass();
        while let Some(superclass) = current {
            for annotation in &superclass.descriptor().annotations {
                let Ok(ty) = superclass.resolve(&annotation.annotation_type) else {
                    continue;
                };
                let present = seen.iter().any(|s| s.as_ref() == Some(&ty));
                if !present && is_inherited_annotation_type(&ty) {
                    seen.push(Some(ty));
                    out.push((superclass.clone(), annotation.clone()));
                }
            }
            current = superclass.superclass();
        }
        out
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Absolute resource path for a name relative to this class's package
    fn resolve_resource_name(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut base = self.clone();
        while let Some(component) = base.component_type() {
            base = component;
        }
        match package_of(base.name()) {
            "" => name.to_string(),
            package => format!("{}/{}", package.replace('.', "/"), name),
        }
    }

    /// Locate a resource through the defining loader
    pub fn resource(&self, name: &str) -> Option<Url> {
        let resolved = self.resolve_resource_name(name);
        self.defining_loader().resource(&resolved)
    }

    /// Open a resource through the defining loader
    pub fn resource_as_stream(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        let resolved = self.resolve_resource_name(name);
        self.defining_loader().resource_as_stream(&resolved)
    }

    // ========================================================================
    // Initialization and instantiation
    // ========================================================================

    /// Run static initialization once, superclasses first
    ///
    /// Re-entrant calls from the initializing thread return immediately. A
    /// failed or panicking initializer leaves the class unusable.
    pub(crate) fn initialize(&self) -> ReflectResult<()> {
        if let Some(superclass) = self.superclass() {
            superclass.initialize()?;
        }

        let guard = self.data.init.lock();
        let state = guard.borrow().clone();
        match state {
            InitState::Initialized | InitState::InProgress => Ok(()),
            InitState::Failed(_) => Err(ReflectError::NoClassDefFound(format!(
                "Could not initialize class {}",
                self.name()
            ))),
            InitState::Uninitialized => {
                let Some(initializer) = self.descriptor().initializer.clone() else {
                    *guard.borrow_mut() = InitState::Initialized;
                    return Ok(());
                };

                *guard.borrow_mut() = InitState::InProgress;
                debug!(class = %self.name(), "running static initializer");
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    (initializer.0)()
                }))
                .unwrap_or_else(|panic| Err(panic_message(panic.as_ref())));
                match outcome {
                    Ok(()) => {
                        *guard.borrow_mut() = InitState::Initialized;
                        Ok(())
                    }
                    Err(message) => {
                        warn!(class = %self.name(), error = %message, "static initializer failed");
                        *guard.borrow_mut() = InitState::Failed(message.clone());
                        Err(ReflectError::ExceptionInInitializer {
                            class: self.name().to_string(),
                            message,
                        })
                    }
                }
            }
        }
    }

    /// Whether static initialization completed
    pub fn is_initialized(&self) -> bool {
        *self.data.init.lock().borrow() == InitState::Initialized
    }

    /// Create an instance through the public zero-argument constructor
    pub fn new_instance(&self) -> ReflectResult<ObjectRef> {
        if self.is_interface()
            || self.is_array()
            || self.is_primitive()
            || self.modifiers().is_abstract()
        {
            return Err(ReflectError::Instantiation(self.name().to_string()));
        }

        let constructor = self.find_declared_constructor(&[]).ok_or_else(|| {
            ReflectError::Instantiation(format!("{} has no zero-argument constructor", self.name()))
        })?;
        if !self.modifiers().is_public() || !constructor.modifiers().is_public() {
            return Err(ReflectError::IllegalAccess(format!(
                "cannot access a member of {} with modifiers \"{}\"",
                self.name(),
                constructor.modifiers()
            )));
        }

        constructor.new_instance(&[])
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.data).hash(state);
    }
}

/// `class com.acme.Widget`, `interface com.acme.Shape`, `int`
impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_primitive() {
            f.write_str(self.name())
        } else if self.is_interface() {
            write!(f, "interface {}", self.name())
        } else {
            write!(f, "class {}", self.name())
        }
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("loader", &self.data.loader.0)
            .finish()
    }
}

fn type_names(types: &[Class]) -> Vec<String> {
    types.iter().map(|t| t.name().to_string()).collect()
}

fn no_such_method(class: &Class, name: &str, params: &[String]) -> ReflectError {
    ReflectError::NoSuchMethod(format!("{}.{}({})", class.name(), name, params.join(", ")))
}

/// Whether `annotation`, written on `owner`, is an instance of `annotation_type`
pub(crate) fn is_annotation_of(owner: &Class, annotation: &Annotation, annotation_type: &Class) -> bool {
    annotation.annotation_type == annotation_type.name()
        && owner
            .resolve(&annotation.annotation_type)
            .map_or(false, |ty| ty == *annotation_type)
}

fn is_inherited_annotation_type(ty: &Class) -> bool {
    ty.is_annotation()
        && ty
            .descriptor()
            .annotations
            .iter()
            .any(|a| a.annotation_type == INHERITED)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "initializer panicked".to_string()
    }
}
