//! Runtime instances
//!
//! An [`Object`] pairs its runtime class with an opaque native payload. The
//! payload is whatever a constructor implementation produced; classes
//! constructed without an implementation carry `()`.

use std::any::Any;
use std::sync::Arc;

use crate::class::Class;

/// Native state owned by an instance
pub type Payload = Box<dyn Any + Send + Sync>;

/// Shared reference to an instance; `None` in argument lists stands for null
pub type ObjectRef = Arc<Object>;

/// An instance of a registered class
pub struct Object {
    class: Class,
    payload: Payload,
}

impl Object {
    /// Allocate an instance of `class` with the given payload
    ///
    /// No constructor runs; use [`Class::new_instance`] or
    /// [`Constructor::new_instance`](crate::Constructor::new_instance) for that.
    pub fn new(class: Class, payload: Payload) -> ObjectRef {
        Arc::new(Self { class, payload })
    }

    /// The runtime class of this instance
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// Borrow the payload as a concrete type
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Identity comparison for object references
    pub fn same(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:p}", self.class.name(), self as *const Object)
    }
}
