//! Class Runtime
//!
//! The runtime owns the process-wide class table: every class loader, the
//! primitive types and the core classes arrays are built on. Class handles
//! and loaders keep the runtime alive, so it can be dropped freely by its
//! creator.
//!
//! Loaders are created through the runtime and never removed; a
//! [`LoaderId`] therefore stays valid for the life of the runtime that
//! minted it.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::bootstrap::{self, CoreClasses};
use crate::class::{Class, ClassData};
use crate::config::{AssertionConfig, RuntimeConfig};
use crate::error::{ConfigError, ReflectError, ReflectResult};
use crate::loader::{ClassLoader, LoaderData, LoaderId};
use crate::permissions::{ReflectPermission, SecurityPolicy};

/// Default name of the application loader
pub const SYSTEM_LOADER_NAME: &str = "app";

struct RuntimeInner {
    /// Indexed by `LoaderId`
    loaders: RwLock<Vec<Arc<LoaderData>>>,
    /// Primitive types by name (`int`, `void`, ...)
    primitives: FxHashMap<&'static str, Arc<ClassData>>,
    core: CoreClasses,
    policy: RwLock<SecurityPolicy>,
}

/// Shared handle to a class table
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Runtime with a bootstrap loader, an `app` system loader and no restrictions
    pub fn new() -> Self {
        Self::build(
            SecurityPolicy::new(),
            &AssertionConfig::default(),
            SYSTEM_LOADER_NAME,
        )
    }

    /// Runtime configured from a [`RuntimeConfig`]
    pub fn with_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let policy = config.security_policy()?;
        let runtime = Self::build(policy, &config.assertions, &config.loader.system_name);

        let system = runtime.system_loader();
        for dir in &config.loader.resource_dirs {
            system.add_resource_dir(dir);
        }
        debug!(
            system_loader = %config.loader.system_name,
            resource_dirs = config.loader.resource_dirs.len(),
            "runtime configured"
        );
        Ok(runtime)
    }

    fn build(policy: SecurityPolicy, assertions: &AssertionConfig, system_name: &str) -> Self {
        let bootstrap_loader = LoaderData::new(LoaderId::BOOTSTRAP, "bootstrap".to_string(), None);
        let (core, primitives) = bootstrap::install(&bootstrap_loader);

        let system_loader = LoaderData::new(
            LoaderId::SYSTEM,
            system_name.to_string(),
            Some(LoaderId::BOOTSTRAP),
        );
        system_loader.apply_assertion_config(assertions);

        debug!(
            core_classes = bootstrap_loader.loaded_count(),
            primitives = primitives.len(),
            "bootstrap loader installed"
        );

        Self {
            inner: Arc::new(RuntimeInner {
                loaders: RwLock::new(vec![Arc::new(bootstrap_loader), Arc::new(system_loader)]),
                primitives,
                core,
                policy: RwLock::new(policy),
            }),
        }
    }

    /// Loader of the core classes
    pub fn bootstrap_loader(&self) -> ClassLoader {
        self.loader(LoaderId::BOOTSTRAP)
    }

    /// Application loader, child of the bootstrap loader
    pub fn system_loader(&self) -> ClassLoader {
        self.loader(LoaderId::SYSTEM)
    }

    /// Create a loader delegating to `parent`
    ///
    /// `parent` must belong to this runtime.
    pub fn new_loader(&self, name: &str, parent: &ClassLoader) -> ReflectResult<ClassLoader> {
        self.check_owned(parent)?;
        let mut loaders = self.inner.loaders.write();
        let id = LoaderId(loaders.len());
        let data = Arc::new(LoaderData::new(id, name.to_string(), Some(parent.id())));
        loaders.push(data.clone());
        drop(loaders);

        debug!(loader = %name, id = id.0, parent = %parent.name(), "class loader created");
        Ok(ClassLoader::from_data(self.clone(), data))
    }

    /// Reject loaders minted by another runtime
    fn check_owned(&self, loader: &ClassLoader) -> ReflectResult<()> {
        if Arc::ptr_eq(&loader.runtime().inner, &self.inner) {
            Ok(())
        } else {
            Err(ReflectError::IllegalArgument(format!(
                "class loader {} belongs to another runtime",
                loader.name()
            )))
        }
    }

    /// Loader by id
    pub(crate) fn loader(&self, id: LoaderId) -> ClassLoader {
        let data = self.inner.loaders.read()[id.0].clone();
        ClassLoader::from_data(self.clone(), data)
    }

    /// All loaders, bootstrap first
    pub fn loaders(&self) -> Vec<ClassLoader> {
        let loaders = self.inner.loaders.read().clone();
        loaders
            .into_iter()
            .map(|data| ClassLoader::from_data(self.clone(), data))
            .collect()
    }

    /// Primitive type by keyword (`int`, `boolean`, `void`, ...)
    pub fn primitive(&self, name: &str) -> Option<Class> {
        self.inner
            .primitives
            .get(name)
            .map(|data| Class::from_data(self.clone(), data.clone()))
    }

    /// Resolve a class by name and optionally run its static initialization
    ///
    /// `loader = None` resolves through the bootstrap loader. Array descriptors
    /// (`[I`, `[Ljava.lang.String;`) are accepted; primitive keywords are not.
    /// A loader from another runtime is an [`ReflectError::IllegalArgument`].
    pub fn for_name(
        &self,
        name: &str,
        initialize: bool,
        loader: Option<&ClassLoader>,
    ) -> ReflectResult<Class> {
        let class = match loader {
            Some(loader) => {
                self.check_owned(loader)?;
                loader.load_class(name)?
            }
            None => self.bootstrap_loader().load_class(name)?,
        };
        if initialize {
            class.initialize()?;
        }
        Ok(class)
    }

    /// Resolve a type referenced from code defined by `loader`
    ///
    /// Primitive keywords are accepted here, and a missing class is reported
    /// as [`ReflectError::NoClassDefFound`] since the reference was already
    /// linked into a defined class.
    pub(crate) fn resolve_type(&self, loader: &ClassLoader, name: &str) -> ReflectResult<Class> {
        if let Some(primitive) = self.primitive(name) {
            return Ok(primitive);
        }
        loader.load_class(name).map_err(|err| match err {
            ReflectError::ClassNotFound(name) => ReflectError::NoClassDefFound(name),
            other => other,
        })
    }

    /// Array class with the given component type
    pub(crate) fn array_of(&self, component: &Class) -> Class {
        let name = array_name(component);
        let loader = self.loader(component.data().loader);

        if let Some(existing) = loader.data().loaded_class(&name) {
            return Class::from_data(self.clone(), existing);
        }

        let data = loader.data().insert_if_absent(&name, || {
            trace!(class = %name, loader = %loader.name(), "array class synthesized");
            ClassData::array(
                name.clone(),
                component.data().clone(),
                &self.inner.core,
            )
        });
        Class::from_data(self.clone(), data)
    }

    /// Resolve an array descriptor such as `[[Ljava.lang.String;` through `loader`
    pub(crate) fn resolve_array_descriptor(
        &self,
        loader: &ClassLoader,
        descriptor: &str,
    ) -> ReflectResult<Class> {
        let not_found = || ReflectError::ClassNotFound(descriptor.to_string());

        let element = descriptor.trim_start_matches('[');
        let dimensions = descriptor.len() - element.len();

        let mut class = if let Some(body) = element.strip_prefix('L') {
            let name = body.strip_suffix(';').ok_or_else(not_found)?;
            if name.is_empty() || name.starts_with('[') {
                return Err(not_found());
            }
            loader.load_class(name).map_err(|err| match err {
                ReflectError::ClassNotFound(_) => not_found(),
                other => other,
            })?
        } else {
            let mut chars = element.chars();
            let code = chars.next().ok_or_else(not_found)?;
            if chars.next().is_some() || code == 'V' {
                return Err(not_found());
            }
            bootstrap::primitive_for_code(code)
                .and_then(|keyword| self.primitive(keyword))
                .ok_or_else(not_found)?
        };

        for _ in 0..dimensions {
            class = self.array_of(&class);
        }
        Ok(class)
    }

    /// Replace the security policy
    pub fn set_security_policy(&self, policy: SecurityPolicy) {
        *self.inner.policy.write() = policy;
    }

    /// Snapshot of the security policy
    pub fn security_policy(&self) -> SecurityPolicy {
        self.inner.policy.read().clone()
    }

    pub(crate) fn check_permission(
        &self,
        class_name: &str,
        required: ReflectPermission,
    ) -> ReflectResult<()> {
        self.inner.policy.read().check(class_name, required)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("loaders", &self.inner.loaders.read().len())
            .field("primitives", &self.inner.primitives.len())
            .finish()
    }
}

/// JVM binary name of the array type whose component is `component`
fn array_name(component: &Class) -> String {
    if component.is_array() {
        format!("[{}", component.name())
    } else if let Some(code) = component.primitive_code() {
        format!("[{}", code)
    } else {
        format!("[L{};", component.name())
    }
}
