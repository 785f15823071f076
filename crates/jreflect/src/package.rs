//! Package, protection domain and signer records

use serde::{Deserialize, Serialize};
use url::Url;

use crate::permissions::ReflectPermission;

/// Package metadata as defined by a class loader
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Package {
    /// Dotted package name (`""` for the unnamed package)
    pub name: String,
    #[serde(default)]
    pub specification_title: Option<String>,
    #[serde(default)]
    pub specification_version: Option<String>,
    #[serde(default)]
    pub specification_vendor: Option<String>,
    #[serde(default)]
    pub implementation_title: Option<String>,
    #[serde(default)]
    pub implementation_version: Option<String>,
    #[serde(default)]
    pub implementation_vendor: Option<String>,
    /// Code source the package is sealed to, if any
    #[serde(default)]
    pub sealed: Option<Url>,
}

impl Package {
    /// Package with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "package {}", self.name)?;
        if let Some(title) = &self.specification_title {
            write!(f, ", {}", title)?;
        }
        if let Some(version) = &self.specification_version {
            write!(f, ", version {}", version)?;
        }
        Ok(())
    }
}

/// Identity that signed a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signer {
    /// Distinguished name of the certificate subject
    pub subject: String,
    /// Hex-encoded certificate fingerprint
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl Signer {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            fingerprint: None,
        }
    }
}

/// Code source and granted permissions of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionDomain {
    /// Where the code came from
    #[serde(default)]
    pub code_source: Option<Url>,
    /// Signers of the code source
    #[serde(default)]
    pub signers: Vec<Signer>,
    #[serde(skip, default = "ReflectPermission::default")]
    pub permissions: ReflectPermission,
}

impl ProtectionDomain {
    /// Domain used for classes registered without one
    pub fn all_permissions() -> Self {
        Self {
            code_source: None,
            signers: Vec::new(),
            permissions: ReflectPermission::ALL,
        }
    }

    pub fn with_code_source(code_source: Url) -> Self {
        Self {
            code_source: Some(code_source),
            ..Self::all_permissions()
        }
    }
}

impl Default for ProtectionDomain {
    fn default() -> Self {
        Self::all_permissions()
    }
}
