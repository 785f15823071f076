//! Generic type information
//!
//! Generic signatures are registered in structured form alongside the erased
//! descriptor; nothing here parses or checks them. They are reported back
//! verbatim by `generic_superclass`, `generic_interfaces` and
//! `type_parameters`.

use serde::{Deserialize, Serialize};

/// A possibly-generic type as written in a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenericType {
    /// Plain (erased) class, by binary name
    Class { name: String },
    /// `Raw<Args...>`, optionally nested in a parameterized owner
    Parameterized {
        raw: String,
        arguments: Vec<GenericType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<Box<GenericType>>,
    },
    /// Reference to a type variable, e.g. `T`
    Variable { name: String },
    /// `?`, `? extends U`, `? super L`
    Wildcard {
        #[serde(default)]
        upper_bounds: Vec<GenericType>,
        #[serde(default)]
        lower_bounds: Vec<GenericType>,
    },
    /// `T[]`, `List<String>[]`
    Array { component: Box<GenericType> },
}

impl GenericType {
    pub fn class(name: impl Into<String>) -> Self {
        GenericType::Class { name: name.into() }
    }

    pub fn parameterized(raw: impl Into<String>, arguments: Vec<GenericType>) -> Self {
        GenericType::Parameterized {
            raw: raw.into(),
            arguments,
            owner: None,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        GenericType::Variable { name: name.into() }
    }

    /// Binary name of the erasure, when it is a plain or parameterized class
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            GenericType::Class { name } => Some(name),
            GenericType::Parameterized { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl std::fmt::Display for GenericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericType::Class { name } => f.write_str(name),
            GenericType::Parameterized { raw, arguments, owner } => {
                if let Some(owner) = owner {
                    write!(f, "{}$", owner)?;
                }
                f.write_str(raw)?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, arguments, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            GenericType::Variable { name } => f.write_str(name),
            GenericType::Wildcard {
                upper_bounds,
                lower_bounds,
            } => {
                f.write_str("?")?;
                if !lower_bounds.is_empty() {
                    f.write_str(" super ")?;
                    write_joined(f, lower_bounds, " & ")
                } else if upper_bounds
                    .iter()
                    .any(|b| b.raw_name() != Some("java.lang.Object"))
                {
                    f.write_str(" extends ")?;
                    write_joined(f, upper_bounds, " & ")
                } else {
                    Ok(())
                }
            }
            GenericType::Array { component } => write!(f, "{}[]", component),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    types: &[GenericType],
    sep: &str,
) -> std::fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

/// A declared type parameter, e.g. `T extends Comparable<T>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeVariable {
    /// Parameter name (e.g., "T", "K", "V")
    pub name: String,
    /// Upper bounds; empty means `java.lang.Object`
    #[serde(default)]
    pub bounds: Vec<GenericType>,
}

impl TypeVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn with_bound(mut self, bound: GenericType) -> Self {
        self.bounds.push(bound);
        self
    }

    /// Bounds as reported by reflection (`Object` when none were declared)
    pub fn effective_bounds(&self) -> Vec<GenericType> {
        if self.bounds.is_empty() {
            vec![GenericType::class("java.lang.Object")]
        } else {
            self.bounds.clone()
        }
    }
}

impl std::fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
