//! Versioned documentation registry for DSL classes and methods.
//!
//! Declarations (classes, methods, parameter trees, groups) go in through a
//! [`RegistryBuilder`]; the resulting [`Registry`] answers lookups, checks
//! arguments, and serializes [`DocTree`]s for renderers. [`DocStore`] adds
//! lock-free snapshots with atomic reload on top.

pub mod check;
pub mod class;
pub mod config;
pub mod decl;
pub mod error;
pub mod group;
pub mod markup;
pub mod method;
pub mod param;
pub mod query;
pub mod registry;
pub mod returns;
pub mod store;
pub mod translate;
pub mod validator;

pub use check::ArgumentCheck;
pub use class::ClassDescription;
pub use config::Config;
pub use decl::Declarations;
pub use error::{Error, Result};
pub use method::MethodDescription;
pub use param::ParameterDescription;
pub use query::{DocTree, Query};
pub use registry::{BuildReport, ClassHandle, Registry, RegistryBuilder};
pub use store::{DeclarationSource, DocStore};
pub use validator::{Validator, ValidatorTable};
