//! Error taxonomy shared by every layer of the registry.
//!
//! Build-time errors (`ValidatorNotFound`, `ReturnShapeConflict`, ...) are
//! scoped to the entity being built; the registry records them and keeps
//! going. Validation errors (`ParamInvalid`, `ParamMissing`, `UnknownParam`)
//! are returned to whoever asked for the check.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No validator variant accepted the raw specification.
    #[error("validator for {spec} not found")]
    ValidatorNotFound { spec: String },

    #[error("invalid parameter '{name}' value {value}: {description}")]
    ParamInvalid {
        name: String,
        value: Value,
        description: String,
    },

    #[error("{}", missing_text(.name, .message))]
    ParamMissing {
        name: String,
        message: Option<String>,
    },

    #[error("unknown parameter {name}")]
    UnknownParam { name: String },

    #[error("a 'returns' statement cannot select more than one of: {}", .shapes.join(", "))]
    ReturnShapeConflict { shapes: Vec<&'static str> },

    #[error("a 'returns' statement cannot be used more than once (method {method})")]
    DuplicateReturn { method: String },

    #[error("a block can be specified for Hash return type only, got {found}")]
    ReturnBlockRequiresHash { found: String },

    #[error("multiple definition of {what}")]
    MultipleDefinition { what: String },

    #[error("don't know how to merge {left} with {right}")]
    IncompatibleMerge { left: String, right: String },

    #[error("group {key} is not defined")]
    UnknownGroup { key: String },

    #[error("group {key} includes itself")]
    GroupCycle { key: String },

    #[error("method {method} declares more than one block parameter ({first}, {second})")]
    DuplicateBlock {
        method: String,
        first: String,
        second: String,
    },

    /// A `see` link or return type names an entity the registry does not know.
    #[error("{from} references {link}, which does not exist")]
    UnresolvedReference { from: String, link: String },

    #[error("type {type_name} of parameter {param} cannot be resolved")]
    UnresolvedType { param: String, type_name: String },

    #[error("class {key} is not documented")]
    UnknownClass { key: String },

    #[error("method {class}#{method} is not documented")]
    UnknownMethod { class: String, method: String },

    #[error("invalid query key {key:?}")]
    InvalidQueryKey { key: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// The declaration source failed; the previous snapshot stays active.
    #[error("collecting declarations failed: {0}")]
    Collection(#[source] BoxError),
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn missing_text(name: &str, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("missing parameter {name}"),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
