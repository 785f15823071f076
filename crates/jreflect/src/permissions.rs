//! Reflection Security Policy
//!
//! Guards the sensitive reflective queries with permission flags resolved per
//! class package.
//!
//! | Flag                      | Guards                                      |
//! |---------------------------|---------------------------------------------|
//! | `ACCESS_DECLARED_MEMBERS` | `declared_*` member and nested-class lookup |
//! | `GET_CLASS_LOADER`        | `class_loader`                              |
//! | `GET_PROTECTION_DOMAIN`   | `protection_domain`                         |
//!
//! Package rules are configured in the runtime config:
//!
//! ```toml
//! [security]
//! default = "ALL"
//!
//! [security.packages]
//! "com.acme" = "ALL"
//! "com.untrusted.*" = "NONE"
//! ```

use std::collections::HashMap;

use crate::error::{ReflectError, ReflectResult};

/// Reflection permission flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReflectPermission(u8);

impl ReflectPermission {
    /// Nothing sensitive allowed
    pub const NONE: Self = Self(0x00);
    /// Enumerate and look up non-public members
    pub const ACCESS_DECLARED_MEMBERS: Self = Self(0x01);
    /// Obtain the defining class loader
    pub const GET_CLASS_LOADER: Self = Self(0x02);
    /// Obtain the protection domain
    pub const GET_PROTECTION_DOMAIN: Self = Self(0x04);
    /// Every flag
    pub const ALL: Self = Self(0x07);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if permission contains a flag
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Difference (remove flags)
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse a single flag name, or a hex/decimal literal
    ///
    /// Literal bits outside [`Self::ALL`] are dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "NONE" => Some(Self::NONE),
            "ACCESS_DECLARED_MEMBERS" => Some(Self::ACCESS_DECLARED_MEMBERS),
            "GET_CLASS_LOADER" => Some(Self::GET_CLASS_LOADER),
            "GET_PROTECTION_DOMAIN" => Some(Self::GET_PROTECTION_DOMAIN),
            "ALL" => Some(Self::ALL),
            literal => {
                let bits = match literal.strip_prefix("0X") {
                    Some(hex) => u8::from_str_radix(hex, 16).ok()?,
                    None => literal.parse::<u8>().ok()?,
                };
                Some(Self::from_bits(bits & Self::ALL.0))
            }
        }
    }

    /// Parse combined flags from a pipe-separated string (e.g. "GET_CLASS_LOADER|GET_PROTECTION_DOMAIN")
    pub fn parse_combined(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            result = result.union(Self::parse(part.trim())?);
        }
        Some(result)
    }

    fn describe(&self) -> String {
        match *self {
            Self::NONE => "NONE".to_string(),
            Self::ACCESS_DECLARED_MEMBERS => "ACCESS_DECLARED_MEMBERS".to_string(),
            Self::GET_CLASS_LOADER => "GET_CLASS_LOADER".to_string(),
            Self::GET_PROTECTION_DOMAIN => "GET_PROTECTION_DOMAIN".to_string(),
            Self::ALL => "ALL".to_string(),
            _ => format!("0x{:02X}", self.0),
        }
    }
}

impl Default for ReflectPermission {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::fmt::Display for ReflectPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Package permission pattern (supports wildcards)
#[derive(Debug, Clone)]
pub struct PackageRule {
    /// Pattern (e.g., "com.acme", "com.plugins.*", "com.plugins.**")
    pub pattern: String,
    /// Permissions for matching packages
    pub permissions: ReflectPermission,
}

impl PackageRule {
    /// Length of the literal package prefix; longer prefixes are more specific
    fn specificity(&self) -> usize {
        self.pattern
            .strip_suffix(".**")
            .or_else(|| self.pattern.strip_suffix(".*"))
            .map_or(0, str::len)
    }

    /// Check if a package name matches this pattern
    ///
    /// `pkg.*` matches strict subpackages, `pkg.**` also matches `pkg` itself.
    pub fn matches(&self, package: &str) -> bool {
        if self.pattern == "**" || self.pattern == "*" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix(".**") {
            package == prefix || package.starts_with(&format!("{}.", prefix))
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            package.starts_with(&format!("{}.", prefix))
        } else {
            self.pattern == package
        }
    }
}

/// Package-scoped reflection policy
#[derive(Debug, Clone, Default)]
pub struct SecurityPolicy {
    /// Applies when nothing more specific matches
    global_default: ReflectPermission,
    /// Exact package matches
    packages: HashMap<String, ReflectPermission>,
    /// Wildcard rules; the longest matching prefix wins, ties go to the earliest rule
    rules: Vec<PackageRule>,
}

impl SecurityPolicy {
    /// Create a permissive policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global(&mut self, permissions: ReflectPermission) {
        self.global_default = permissions;
    }

    pub fn global(&self) -> ReflectPermission {
        self.global_default
    }

    /// Set permissions for an exact package name
    pub fn set_package(&mut self, package: &str, permissions: ReflectPermission) {
        self.packages.insert(package.to_string(), permissions);
    }

    /// Add a wildcard rule
    pub fn add_rule(&mut self, rule: PackageRule) {
        self.rules.push(rule);
    }

    /// Add a pattern, routing it to exact or wildcard storage
    pub fn add_pattern(&mut self, pattern: &str, permissions: ReflectPermission) {
        if pattern.contains('*') {
            self.add_rule(PackageRule {
                pattern: pattern.to_string(),
                permissions,
            });
        } else {
            self.set_package(pattern, permissions);
        }
    }

    /// Whether anything narrower than ALL is configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global_default != ReflectPermission::ALL
            || !self.packages.is_empty()
            || !self.rules.is_empty()
    }

    /// Resolve the permissions that apply to a package
    pub fn resolve(&self, package: &str) -> ReflectPermission {
        if let Some(perms) = self.packages.get(package) {
            return *perms;
        }

        let mut best: Option<&PackageRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches(package)) {
            if best.map_or(true, |b| rule.specificity() > b.specificity()) {
                best = Some(rule);
            }
        }

        best.map_or(self.global_default, |rule| rule.permissions)
    }

    /// Fail with [`ReflectError::Security`] unless `required` is granted for `class_name`
    pub fn check(&self, class_name: &str, required: ReflectPermission) -> ReflectResult<()> {
        if !self.has_any_restrictions() {
            return Ok(());
        }

        let package = package_of(class_name);
        if self.resolve(package).contains(required) {
            Ok(())
        } else {
            Err(ReflectError::Security(format!(
                "{} denied for {}",
                required, class_name
            )))
        }
    }
}

/// Package part of a binary class name (`""` for the unnamed package)
pub(crate) fn package_of(class_name: &str) -> &str {
    class_name
        .rfind('.')
        .map(|idx| &class_name[..idx])
        .unwrap_or("")
}
