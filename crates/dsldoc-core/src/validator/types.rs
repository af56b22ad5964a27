//! Type table used by the type validator.

use super::ExpectedKind;
use serde_json::Value;
use std::collections::HashMap;

/// JSON shape a named type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    String,
    Integer,
    Float,
    /// Integer or float.
    Number,
    Object,
    Array,
    Bool,
    /// Anything except null.
    Any,
}

impl Shape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Integer => value.is_i64() || value.is_u64(),
            Shape::Float => value.is_f64(),
            Shape::Number => value.is_number(),
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
            Shape::Bool => value.is_boolean(),
            Shape::Any => !value.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDef {
    pub shape: Shape,
    pub expected: ExpectedKind,
}

impl TypeDef {
    pub const fn new(shape: Shape, expected: ExpectedKind) -> Self {
        Self { shape, expected }
    }

    /// Type entry for a documented class: values are objects.
    pub const fn documented() -> Self {
        Self::new(Shape::Object, ExpectedKind::Hash)
    }
}

const BUILTIN_TYPES: &[(&str, TypeDef)] = &[
    ("String", TypeDef::new(Shape::String, ExpectedKind::String)),
    ("Symbol", TypeDef::new(Shape::String, ExpectedKind::String)),
    ("Integer", TypeDef::new(Shape::Integer, ExpectedKind::Numeric)),
    ("Float", TypeDef::new(Shape::Float, ExpectedKind::Numeric)),
    ("Numeric", TypeDef::new(Shape::Number, ExpectedKind::Numeric)),
    ("Hash", TypeDef::new(Shape::Object, ExpectedKind::Hash)),
    ("Array", TypeDef::new(Shape::Array, ExpectedKind::Array)),
    ("Boolean", TypeDef::new(Shape::Bool, ExpectedKind::Boolean)),
    ("Object", TypeDef::new(Shape::Any, ExpectedKind::String)),
    ("Proc", TypeDef::new(Shape::Any, ExpectedKind::String)),
];

#[derive(Debug, Clone)]
pub struct TypeTable {
    types: HashMap<String, TypeDef>,
}

impl TypeTable {
    pub fn builtin() -> Self {
        Self {
            types: BUILTIN_TYPES
                .iter()
                .map(|(name, def)| (name.to_string(), *def))
                .collect(),
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_TYPES.iter().any(|(n, _)| *n == name)
    }

    pub fn get(&self, name: &str) -> Option<TypeDef> {
        self.types.get(name).copied()
    }

    /// Builtin entries are never replaced.
    pub fn insert(&mut self, name: String, def: TypeDef) {
        if Self::is_builtin(&name) {
            return;
        }
        self.types.insert(name, def);
    }
}
