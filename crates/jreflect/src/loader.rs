//! Class Loaders
//!
//! A loader owns the classes it defines, the packages it declares, a set of
//! resources and its assertion settings. Lookups delegate parent-first: a
//! loader only answers for a name after its parent chain (ending at the
//! bootstrap loader) could not.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use url::Url;

use crate::class::{Class, ClassData};
use crate::config::AssertionConfig;
use crate::descriptor::ClassDescriptor;
use crate::error::{ReflectError, ReflectResult};
use crate::package::Package;
use crate::permissions::package_of;
use crate::runtime::Runtime;

/// Index of a loader within its runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(pub usize);

impl LoaderId {
    pub const BOOTSTRAP: Self = Self(0);
    pub const SYSTEM: Self = Self(1);
}

/// Per-loader assertion switches
#[derive(Debug, Default)]
struct AssertionSettings {
    default: bool,
    packages: FxHashMap<String, bool>,
    classes: FxHashMap<String, bool>,
}

#[derive(Debug, Default)]
struct ResourceTable {
    /// In-memory resources by path (`com/acme/app.properties`)
    memory: FxHashMap<String, Arc<[u8]>>,
    /// Directories searched after the in-memory table
    dirs: Vec<PathBuf>,
}

/// Loader state, shared between handles
pub(crate) struct LoaderData {
    id: LoaderId,
    name: String,
    parent: Option<LoaderId>,
    /// Classes defined by this loader (including synthesized arrays of them)
    loaded: RwLock<FxHashMap<String, Arc<ClassData>>>,
    packages: RwLock<FxHashMap<String, Package>>,
    resources: RwLock<ResourceTable>,
    assertions: RwLock<AssertionSettings>,
}

impl LoaderData {
    pub(crate) fn new(id: LoaderId, name: String, parent: Option<LoaderId>) -> Self {
        Self {
            id,
            name,
            parent,
            loaded: RwLock::new(FxHashMap::default()),
            packages: RwLock::new(FxHashMap::default()),
            resources: RwLock::new(ResourceTable::default()),
            assertions: RwLock::new(AssertionSettings::default()),
        }
    }

    pub(crate) fn loaded_class(&self, name: &str) -> Option<Arc<ClassData>> {
        self.loaded.read().get(name).cloned()
    }

    pub(crate) fn loaded_count(&self) -> usize {
        self.loaded.read().len()
    }

    /// Insert unless a class of that name exists; returns the winner
    pub(crate) fn insert_if_absent(
        &self,
        name: &str,
        make: impl FnOnce() -> ClassData,
    ) -> Arc<ClassData> {
        self.loaded
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(make()))
            .clone()
    }

    pub(crate) fn apply_assertion_config(&self, config: &AssertionConfig) {
        let mut settings = self.assertions.write();
        settings.default = config.default;
        settings.packages.extend(config.packages.clone());
        settings.classes.extend(config.classes.clone());
    }

    fn assertion_status(&self, class_name: &str) -> bool {
        let settings = self.assertions.read();
        if let Some(status) = settings.classes.get(class_name) {
            return *status;
        }

        let mut package = package_of(class_name);
        loop {
            if let Some(status) = settings.packages.get(package) {
                return *status;
            }
            match package.rfind('.') {
                Some(idx) => package = &package[..idx],
                None => break,
            }
        }

        settings.default
    }

    fn find_resource(&self, name: &str) -> Option<Url> {
        let resources = self.resources.read();
        if resources.memory.contains_key(name) {
            return Url::parse(&format!("memory:/{}/{}", self.name, name)).ok();
        }
        resources
            .dirs
            .iter()
            .filter_map(|dir| resolve_in_dir(dir, name))
            .find(|path| path.is_file())
            .and_then(|path| Url::from_file_path(path).ok())
    }

    fn open_resource(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        let resources = self.resources.read();
        if let Some(bytes) = resources.memory.get(name) {
            return Some(Box::new(Cursor::new(bytes.clone())));
        }
        resources
            .dirs
            .iter()
            .filter_map(|dir| resolve_in_dir(dir, name))
            .find_map(|path| std::fs::File::open(path).ok())
            .map(|file| Box::new(file) as Box<dyn Read + Send>)
    }
}

/// Join a resource path onto a root directory, refusing paths that leave it
fn resolve_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }
    Some(dir.join(relative))
}

/// Handle to a class loader
#[derive(Clone)]
pub struct ClassLoader {
    runtime: Runtime,
    data: Arc<LoaderData>,
}

impl ClassLoader {
    pub(crate) fn from_data(runtime: Runtime, data: Arc<LoaderData>) -> Self {
        Self { runtime, data }
    }

    pub(crate) fn data(&self) -> &Arc<LoaderData> {
        &self.data
    }

    pub fn id(&self) -> LoaderId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn is_bootstrap(&self) -> bool {
        self.data.id == LoaderId::BOOTSTRAP
    }

    /// Delegation parent; `None` only for the bootstrap loader
    pub fn parent(&self) -> Option<ClassLoader> {
        self.data.parent.map(|id| self.runtime.loader(id))
    }

    // ===== Definition =====

    /// Define a class in this loader
    ///
    /// The superclass and interfaces are resolved now, through this loader,
    /// and must already be defined. Member, field and method types are
    /// resolved lazily.
    pub fn define_class(&self, descriptor: ClassDescriptor) -> ReflectResult<Class> {
        let name = descriptor.name.clone();
        validate_class_name(&name)?;

        if !self.is_bootstrap() && (name.starts_with("java.") || self.runtime.primitive(&name).is_some()) {
            return Err(ReflectError::Security(format!(
                "Prohibited package name: {}",
                package_of(&name)
            )));
        }
        if self.data.loaded.read().contains_key(&name) {
            return Err(duplicate(&name, self.name()));
        }

        let superclass = match descriptor.effective_superclass() {
            Some(super_name) => {
                let superclass = self.runtime.resolve_type(self, super_name)?;
                if superclass.is_interface() || superclass.is_primitive() || superclass.is_array() {
                    return Err(ReflectError::Definition(format!(
                        "class {} has {} as super class",
                        name, superclass
                    )));
                }
                Some(superclass.data().clone())
            }
            None => None,
        };

        let mut interfaces = Vec::with_capacity(descriptor.interfaces.len());
        for iface_name in &descriptor.interfaces {
            let iface = self.runtime.resolve_type(self, iface_name)?;
            if !iface.is_interface() {
                return Err(ReflectError::Definition(format!(
                    "class {} can not implement {}, because it is not an interface",
                    name, iface
                )));
            }
            interfaces.push(iface.data().clone());
        }

        let data = {
            let mut loaded = self.data.loaded.write();
            if loaded.contains_key(&name) {
                return Err(duplicate(&name, self.name()));
            }
            let data = Arc::new(ClassData::reference(descriptor, self.id(), superclass, interfaces));
            loaded.insert(name.clone(), data.clone());
            data
        };

        debug!(class = %name, loader = %self.name(), "class defined");
        Ok(Class::from_data(self.runtime.clone(), data))
    }

    /// Define every descriptor of a JSON array, in order
    pub fn define_classes_json(&self, json: &str) -> ReflectResult<Vec<Class>> {
        let descriptors: Vec<ClassDescriptor> = serde_json::from_str(json)?;
        descriptors
            .into_iter()
            .map(|descriptor| self.define_class(descriptor))
            .collect()
    }

    /// Declare package metadata for classes of this loader
    pub fn define_package(&self, package: Package) -> ReflectResult<()> {
        let mut packages = self.data.packages.write();
        if packages.contains_key(&package.name) {
            return Err(ReflectError::Definition(format!(
                "Package {} already defined in loader {}",
                package.name,
                self.name()
            )));
        }
        trace!(package = %package.name, loader = %self.name(), "package defined");
        packages.insert(package.name.clone(), package);
        Ok(())
    }

    // ===== Resolution =====

    /// Resolve a class by name, parent first
    pub fn load_class(&self, name: &str) -> ReflectResult<Class> {
        if name.starts_with('[') {
            return self.runtime.resolve_array_descriptor(self, name);
        }

        if let Some(parent) = self.parent() {
            match parent.load_class(name) {
                Ok(class) => return Ok(class),
                Err(ReflectError::ClassNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        self.find_loaded_class(name)
            .ok_or_else(|| ReflectError::ClassNotFound(name.to_string()))
    }

    /// Class of that name defined by this loader, without delegation
    pub fn find_loaded_class(&self, name: &str) -> Option<Class> {
        self.data
            .loaded_class(name)
            .map(|data| Class::from_data(self.runtime.clone(), data))
    }

    /// Package metadata visible to this loader
    pub fn package(&self, name: &str) -> Option<Package> {
        if let Some(package) = self.data.packages.read().get(name) {
            return Some(package.clone());
        }
        self.parent().and_then(|parent| parent.package(name))
    }

    // ===== Resources =====

    /// Register an in-memory resource (`com/acme/app.properties`)
    pub fn add_resource(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.data
            .resources
            .write()
            .memory
            .insert(name.to_string(), Arc::from(bytes));
    }

    /// Search a directory for resources not found in memory
    pub fn add_resource_dir(&self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref().to_path_buf();
        debug!(loader = %self.name(), dir = %dir.display(), "resource directory added");
        self.data.resources.write().dirs.push(dir);
    }

    /// Locate a resource, parent first
    pub fn resource(&self, name: &str) -> Option<Url> {
        self.parent()
            .and_then(|parent| parent.resource(name))
            .or_else(|| self.data.find_resource(name))
    }

    /// Open a resource, parent first
    pub fn resource_as_stream(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        self.parent()
            .and_then(|parent| parent.resource_as_stream(name))
            .or_else(|| self.data.open_resource(name))
    }

    // ===== Assertions =====

    pub fn set_default_assertion_status(&self, enabled: bool) {
        self.data.assertions.write().default = enabled;
    }

    /// Applies to the package and all of its subpackages
    pub fn set_package_assertion_status(&self, package: &str, enabled: bool) {
        self.data
            .assertions
            .write()
            .packages
            .insert(package.to_string(), enabled);
    }

    pub fn set_class_assertion_status(&self, class_name: &str, enabled: bool) {
        self.data
            .assertions
            .write()
            .classes
            .insert(class_name.to_string(), enabled);
    }

    /// Reset to assertions disabled with no package or class overrides
    pub fn clear_assertion_status(&self) {
        *self.data.assertions.write() = AssertionSettings::default();
    }

    pub(crate) fn desired_assertion_status(&self, class_name: &str) -> bool {
        self.data.assertion_status(class_name)
    }
}

impl PartialEq for ClassLoader {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for ClassLoader {}

impl std::fmt::Debug for ClassLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassLoader")
            .field("id", &self.data.id.0)
            .field("name", &self.data.name)
            .field("parent", &self.data.parent.map(|p| p.0))
            .finish()
    }
}

fn duplicate(name: &str, loader: &str) -> ReflectError {
    ReflectError::Definition(format!(
        "duplicate class definition: {} in loader {}",
        name, loader
    ))
}

fn validate_class_name(name: &str) -> ReflectResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('[')
        && !name.contains(['/', ';'])
        && name.split('.').all(|part| !part.is_empty());
    if valid {
        Ok(())
    } else {
        Err(ReflectError::Definition(format!("illegal class name: {:?}", name)))
    }
}
