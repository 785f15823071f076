//! Annotation instances attached to classes and members

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the meta-annotation that makes class annotations visible on subclasses
pub const INHERITED: &str = "java.lang.annotation.Inherited";

/// A single annotation element value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Class literal, by binary name
    Class(String),
    /// Enum constant
    Enum {
        type_name: String,
        constant: String,
    },
    Array(Vec<AnnotationValue>),
    Annotation(Box<Annotation>),
}

/// An annotation: its type plus element values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Binary name of the annotation type
    pub annotation_type: String,
    /// Element values by name
    #[serde(default)]
    pub elements: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    /// Marker annotation with no elements
    pub fn new(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            elements: BTreeMap::new(),
        }
    }

    /// Builder-style element setter
    pub fn with(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.elements.insert(name.into(), value);
        self
    }

    pub fn element(&self, name: &str) -> Option<&AnnotationValue> {
        self.elements.get(name)
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationValue::Bool(b) => write!(f, "{}", b),
            AnnotationValue::Int(i) => write!(f, "{}", i),
            AnnotationValue::Float(x) => write!(f, "{}", x),
            AnnotationValue::Str(s) => write!(f, "{:?}", s),
            AnnotationValue::Class(name) => write!(f, "{}.class", name),
            AnnotationValue::Enum { type_name, constant } => write!(f, "{}.{}", type_name, constant),
            AnnotationValue::Array(values) => {
                f.write_str("{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("}")
            }
            AnnotationValue::Annotation(a) => write!(f, "{}", a),
        }
    }
}

/// Source-like rendering: `@com.acme.Tag(name="x", level=2)`
impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}(", self.annotation_type)?;
        for (i, (name, value)) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}
