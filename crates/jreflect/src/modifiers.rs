//! Access and property flags for classes and members
//!
//! Values match the JVM class-file access flags so descriptors produced by
//! other tooling can be registered without translation.

use serde::{Deserialize, Serialize};

/// Modifier bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u32);

impl Modifiers {
    /// No modifiers (package-private)
    pub const NONE: Self = Self(0x0000);
    pub const PUBLIC: Self = Self(0x0001);
    pub const PRIVATE: Self = Self(0x0002);
    pub const PROTECTED: Self = Self(0x0004);
    pub const STATIC: Self = Self(0x0008);
    pub const FINAL: Self = Self(0x0010);
    pub const SYNCHRONIZED: Self = Self(0x0020);
    pub const VOLATILE: Self = Self(0x0040);
    pub const TRANSIENT: Self = Self(0x0080);
    pub const NATIVE: Self = Self(0x0100);
    pub const INTERFACE: Self = Self(0x0200);
    pub const ABSTRACT: Self = Self(0x0400);
    pub const STRICT: Self = Self(0x0800);
    /// Compiler-generated
    pub const SYNTHETIC: Self = Self(0x1000);
    /// Annotation type (always together with INTERFACE)
    pub const ANNOTATION: Self = Self(0x2000);
    /// Enum type or enum constant
    pub const ENUM: Self = Self(0x4000);

    /// PUBLIC | PRIVATE | PROTECTED
    pub const ACCESS_MASK: Self = Self(0x0007);

    /// Create from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check if all flags of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(&self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_public(&self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub const fn is_private(&self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub const fn is_protected(&self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub const fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    pub const fn is_final(&self) -> bool {
        self.contains(Self::FINAL)
    }

    pub const fn is_abstract(&self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub const fn is_interface(&self) -> bool {
        self.contains(Self::INTERFACE)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Renders the keyword form used in source declarations, e.g. `public static final`
impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const KEYWORDS: [(Modifiers, &str); 12] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::TRANSIENT, "transient"),
            (Modifiers::VOLATILE, "volatile"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::STRICT, "strictfp"),
            (Modifiers::INTERFACE, "interface"),
        ];

        let mut first = true;
        for (flag, keyword) in KEYWORDS {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(keyword)?;
                first = false;
            }
        }
        Ok(())
    }
}
