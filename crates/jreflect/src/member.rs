//! Reflective member handles
//!
//! [`Field`], [`Method`] and [`Constructor`] are lightweight views into the
//! declaring class's descriptor: the class plus the member's index. Type names
//! are resolved on demand through the declaring class's defining loader.

use crate::annotation::Annotation;
use crate::class::{is_annotation_of, Class};
use crate::descriptor::{ConstructorDescriptor, FieldDescriptor, MethodDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::generics::GenericType;
use crate::modifiers::Modifiers;
use crate::object::{Object, ObjectRef, Payload};

// ============================================================================
// Field
// ============================================================================

/// A field of a class or interface
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Field {
    class: Class,
    index: usize,
}

impl Field {
    pub(crate) fn new(class: Class, index: usize) -> Self {
        Self { class, index }
    }

    fn descriptor(&self) -> &FieldDescriptor {
        &self.class.descriptor().fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.descriptor().modifiers
    }

    pub fn declaring_class(&self) -> &Class {
        &self.class
    }

    /// Binary name of the declared type
    pub fn type_name(&self) -> &str {
        &self.descriptor().type_name
    }

    /// Declared type, resolved through the declaring class's loader
    pub fn get_type(&self) -> ReflectResult<Class> {
        self.class.resolve(self.type_name())
    }

    /// Declared type with type arguments, falling back to the erased type
    pub fn generic_type(&self) -> GenericType {
        self.descriptor()
            .generic_type
            .clone()
            .unwrap_or_else(|| GenericType::class(self.type_name()))
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.descriptor().annotations
    }

    pub fn annotation(&self, annotation_type: &Class) -> Option<&Annotation> {
        find_annotation(&self.class, self.annotations(), annotation_type)
    }
}

/// `public static final int com.acme.Limits.MAX`
impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_modifiers(f, self.modifiers())?;
        write!(
            f,
            "{} {}.{}",
            type_display(self.type_name()),
            self.class.name(),
            self.name()
        )
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field({})", self)
    }
}

// ============================================================================
// Method
// ============================================================================

/// A method of a class or interface
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Method {
    class: Class,
    index: usize,
}

impl Method {
    pub(crate) fn new(class: Class, index: usize) -> Self {
        Self { class, index }
    }

    fn descriptor(&self) -> &MethodDescriptor {
        &self.class.descriptor().methods[self.index]
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.descriptor().modifiers
    }

    pub fn declaring_class(&self) -> &Class {
        &self.class
    }

    /// Binary names of the formal parameter types
    pub fn parameter_type_names(&self) -> &[String] {
        &self.descriptor().parameter_types
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_type_names().len()
    }

    pub fn parameter_types(&self) -> ReflectResult<Vec<Class>> {
        resolve_all(&self.class, self.parameter_type_names())
    }

    pub fn return_type(&self) -> ReflectResult<Class> {
        self.class.resolve(&self.descriptor().return_type)
    }

    pub fn generic_return_type(&self) -> GenericType {
        let desc = self.descriptor();
        desc.generic_return_type
            .clone()
            .unwrap_or_else(|| GenericType::class(desc.return_type.clone()))
    }

    /// Declared checked exceptions
    pub fn exception_types(&self) -> ReflectResult<Vec<Class>> {
        resolve_all(&self.class, &self.descriptor().exception_types)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.descriptor().annotations
    }

    pub fn annotation(&self, annotation_type: &Class) -> Option<&Annotation> {
        find_annotation(&self.class, self.annotations(), annotation_type)
    }

    /// Call the method's native body
    ///
    /// Static methods ignore `receiver` and initialize the declaring class
    /// first. Instance methods need a receiver that is an instance of the
    /// declaring class. A failing body surfaces as
    /// [`ReflectError::InvocationTarget`].
    pub fn invoke(
        &self,
        receiver: Option<&ObjectRef>,
        args: &[Option<ObjectRef>],
    ) -> ReflectResult<Option<ObjectRef>> {
        let mods = self.modifiers();
        if !mods.is_public() || !self.class.modifiers().is_public() {
            return Err(ReflectError::IllegalAccess(format!(
                "cannot access a member of {} with modifiers \"{}\"",
                self.class.name(),
                mods
            )));
        }
        let body = self.descriptor().implementation.clone().ok_or_else(|| {
            ReflectError::IllegalAccess(format!("{} has no implementation", self))
        })?;

        let receiver = if mods.is_static() {
            self.class.initialize()?;
            None
        } else {
            let obj = receiver.ok_or_else(|| {
                ReflectError::IllegalArgument(format!("null receiver for {}", self))
            })?;
            if !self.class.is_instance(Some(obj)) {
                return Err(ReflectError::IllegalArgument(
                    "object is not an instance of declaring class".to_string(),
                ));
            }
            Some(obj)
        };

        check_arguments(&self.class, self.parameter_type_names(), args)?;
        (body.0)(receiver, args).map_err(ReflectError::InvocationTarget)
    }
}

/// `public double com.acme.Point.distance(com.acme.Point) throws java.io.IOException`
impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let desc = self.descriptor();
        write_modifiers(f, self.modifiers())?;
        write!(
            f,
            "{} {}.{}(",
            type_display(&desc.return_type),
            self.class.name(),
            desc.name
        )?;
        write_type_list(f, &desc.parameter_types, ",")?;
        f.write_str(")")?;
        if !desc.exception_types.is_empty() {
            f.write_str(" throws ")?;
            write_type_list(f, &desc.exception_types, ",")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Method({})", self)
    }
}

// ============================================================================
// Constructor
// ============================================================================

/// A constructor of a class
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Constructor {
    class: Class,
    index: usize,
}

impl Constructor {
    pub(crate) fn new(class: Class, index: usize) -> Self {
        Self { class, index }
    }

    fn descriptor(&self) -> &ConstructorDescriptor {
        &self.class.descriptor().constructors[self.index]
    }

    /// Binary name of the declaring class
    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.descriptor().modifiers
    }

    pub fn declaring_class(&self) -> &Class {
        &self.class
    }

    pub fn parameter_type_names(&self) -> &[String] {
        &self.descriptor().parameter_types
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_type_names().len()
    }

    pub fn parameter_types(&self) -> ReflectResult<Vec<Class>> {
        resolve_all(&self.class, self.parameter_type_names())
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.descriptor().annotations
    }

    pub fn annotation(&self, annotation_type: &Class) -> Option<&Annotation> {
        find_annotation(&self.class, self.annotations(), annotation_type)
    }

    /// Construct an instance with the given arguments
    ///
    /// Initializes the declaring class, then runs the factory. Constructors
    /// without a factory produce a `()` payload.
    pub fn new_instance(&self, args: &[Option<ObjectRef>]) -> ReflectResult<ObjectRef> {
        let mods = self.class.modifiers();
        if mods.is_abstract() || mods.is_interface() {
            return Err(ReflectError::Instantiation(self.class.name().to_string()));
        }

        check_arguments(&self.class, self.parameter_type_names(), args)?;
        self.class.initialize()?;

        let payload: Payload = match &self.descriptor().factory {
            Some(factory) => (factory.0)(args).map_err(ReflectError::InvocationTarget)?,
            None => Box::new(()),
        };
        Ok(Object::new(self.class.clone(), payload))
    }
}

/// `public com.acme.Point(int,int)`
impl std::fmt::Display for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_modifiers(f, self.modifiers())?;
        write!(f, "{}(", self.class.name())?;
        write_type_list(f, self.parameter_type_names(), ",")?;
        f.write_str(")")
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Constructor({})", self)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_all(class: &Class, names: &[String]) -> ReflectResult<Vec<Class>> {
    names.iter().map(|name| class.resolve(name)).collect()
}

fn find_annotation<'a>(
    class: &Class,
    annotations: &'a [Annotation],
    annotation_type: &Class,
) -> Option<&'a Annotation> {
    annotations
        .iter()
        .find(|a| is_annotation_of(class, a, annotation_type))
}

/// Arity and type check of call arguments
///
/// Primitive parameters take a non-null instance of their wrapper class.
fn check_arguments(class: &Class, params: &[String], args: &[Option<ObjectRef>]) -> ReflectResult<()> {
    if params.len() != args.len() {
        return Err(ReflectError::IllegalArgument(format!(
            "wrong number of arguments: expected {}, got {}",
            params.len(),
            args.len()
        )));
    }

    for (param, arg) in params.iter().zip(args) {
        let declared = class.resolve(param)?;
        let expected = match declared.wrapper_name() {
            Some(wrapper) => class.resolve(wrapper)?,
            None => declared.clone(),
        };

        let ok = match arg {
            None => !declared.is_primitive(),
            Some(obj) => expected.is_assignable_from(obj.class()),
        };
        if !ok {
            return Err(ReflectError::IllegalArgument(format!(
                "argument type mismatch: expected {}, got {}",
                type_display(param),
                arg.as_ref().map_or("null", |obj| obj.class().name())
            )));
        }
    }
    Ok(())
}

fn write_modifiers(f: &mut std::fmt::Formatter<'_>, mods: Modifiers) -> std::fmt::Result {
    let keywords = mods.difference(Modifiers::INTERFACE).to_string();
    if !keywords.is_empty() {
        write!(f, "{} ", keywords)?;
    }
    Ok(())
}

fn write_type_list(f: &mut std::fmt::Formatter<'_>, names: &[String], sep: &str) -> std::fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        f.write_str(&type_display(name))?;
    }
    Ok(())
}

/// Source form of a binary type name: `[I` becomes `int[]`
pub(crate) fn type_display(name: &str) -> String {
    let element = name.trim_start_matches('[');
    let dims = name.len() - element.len();
    if dims == 0 {
        return name.to_string();
    }

    let base = match element.strip_prefix('L').and_then(|e| e.strip_suffix(';')) {
        Some(class_name) => class_name.to_string(),
        None => element
            .chars()
            .next()
            .and_then(crate::bootstrap::primitive_for_code)
            .unwrap_or(element)
            .to_string(),
    };
    format!("{}{}", base, "[]".repeat(dims))
}
