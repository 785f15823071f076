//! Runtime configuration (TOML)
//!
//! ```toml
//! [assertions]
//! default = false
//! packages = { "com.acme" = true }
//! classes = { "com.acme.Main" = false }
//!
//! [security]
//! default = "ALL"
//!
//! [security.packages]
//! "com.untrusted.*" = "NONE"
//! "com.partner" = "ACCESS_DECLARED_MEMBERS|GET_CLASS_LOADER"
//!
//! [loader]
//! system_name = "app"
//! resource_dirs = ["/opt/app/resources"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::permissions::{ReflectPermission, SecurityPolicy};
use crate::runtime::SYSTEM_LOADER_NAME;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub assertions: AssertionConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Assertion status applied to the system loader
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssertionConfig {
    /// Status for classes with no package or class setting
    #[serde(default)]
    pub default: bool,

    /// Per package, covering subpackages
    #[serde(default)]
    pub packages: BTreeMap<String, bool>,

    /// Per class, by binary name
    #[serde(default)]
    pub classes: BTreeMap<String, bool>,
}

/// Reflection permission policy
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    /// Permissions for packages without a rule (default: "ALL")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Package name or wildcard pattern to permission list
    ///
    /// Entry order is irrelevant: the most specific matching pattern applies.
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

/// System loader settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoaderConfig {
    /// Name of the system loader (default: "app")
    #[serde(default = "default_system_name")]
    pub system_name: String,

    /// Directories searched for resources after in-memory resources
    #[serde(default)]
    pub resource_dirs: Vec<PathBuf>,
}

fn default_system_name() -> String {
    SYSTEM_LOADER_NAME.to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            system_name: default_system_name(),
            resource_dirs: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    /// Check every value without building anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.system_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "loader.system_name must not be empty".to_string(),
            ));
        }
        self.security_policy().map(|_| ())
    }

    /// Build the security policy described by `[security]`
    pub fn security_policy(&self) -> Result<SecurityPolicy, ConfigError> {
        let mut policy = SecurityPolicy::new();

        if let Some(default) = &self.security.default {
            policy.set_global(parse_permissions("security.default", default)?);
        }

        for (pattern, perms) in &self.security.packages {
            if pattern.is_empty() {
                return Err(ConfigError::Invalid(
                    "empty package pattern in security.packages".to_string(),
                ));
            }
            let key = format!("security.packages.\"{}\"", pattern);
            policy.add_pattern(pattern, parse_permissions(&key, perms)?);
        }

        Ok(policy)
    }
}

fn parse_permissions(key: &str, value: &str) -> Result<ReflectPermission, ConfigError> {
    ReflectPermission::parse_combined(value).ok_or_else(|| {
        ConfigError::Invalid(format!("{}: unknown permission list '{}'", key, value))
    })
}
