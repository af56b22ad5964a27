//! Validator engine.
//!
//! A [`ValidatorTable`] is an ordered plugin table of named probes. The
//! [`Engine`] asks the probes newest-first whether they accept a raw
//! [`ValidatorSpec`]; the first probe that answers with a validator wins, so a
//! plugin registered later shadows a more general one registered earlier.
//! When nothing matches the engine reports [`Error::ValidatorNotFound`].

mod builtins;
mod deferred;
mod types;

pub use builtins::{
    ArrayValidator, BooleanValidator, CustomValidator, DecimalValidator, EnumValidator,
    HashValidator, NestedValidator, NumberValidator, OneOfTypesValidator, RegexpValidator,
    RestValidator, TypeValidator,
};
pub use deferred::Deferred;
pub use types::{Shape, TypeDef, TypeTable};

use crate::decl::{DeclItem, ParamDecl, ValidatorSpec};
use crate::error::{Error, Result};
use crate::group::Scope;
use crate::param::ParameterDescription;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type BoxedValidator = Box<dyn Validator>;

/// Coarse value category a validator expects, used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedKind {
    String,
    Hash,
    Array,
    Numeric,
    Regexp,
    Boolean,
    List,
}

impl ExpectedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpectedKind::String => "string",
            ExpectedKind::Hash => "hash",
            ExpectedKind::Array => "array",
            ExpectedKind::Numeric => "numeric",
            ExpectedKind::Regexp => "regexp",
            ExpectedKind::Boolean => "boolean",
            ExpectedKind::List => "list",
        }
    }
}

pub trait Validator: fmt::Debug + Send + Sync + 'static {
    /// Short variant name, used in merge errors.
    fn kind(&self) -> &'static str;

    /// Plain predicate, never raises.
    fn validate(&self, value: &Value) -> bool;

    fn description(&self) -> String;

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::String
    }

    fn sub_params(&self) -> Option<&[ParameterDescription]> {
        None
    }

    /// Raising wrapper around [`Validator::validate`].
    fn check(&self, name: &str, value: &Value) -> Result<()> {
        if self.validate(value) {
            Ok(())
        } else {
            Err(Error::ParamInvalid {
                name: name.to_string(),
                value: value.clone(),
                description: self.description(),
            })
        }
    }

    /// Fold `other` (a validator declared for the same parameter elsewhere)
    /// into `self`. Only identical constraints merge unless a variant knows
    /// better.
    fn merge_with(&mut self, other: BoxedValidator) -> Result<()> {
        if self.kind() == other.kind() && self.description() == other.description() {
            return Ok(());
        }
        Err(Error::IncompatibleMerge {
            left: describe_kind(self.kind(), &self.description()),
            right: describe_kind(other.kind(), &other.description()),
        })
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

pub(crate) fn describe_kind(kind: &str, description: &str) -> String {
    format!("{kind} ({description})")
}

/// Everything a probe may look at.
pub struct BuildRequest<'a> {
    pub engine: &'a Arc<Engine>,
    pub spec: &'a ValidatorSpec,
    /// Declaration options (`of`, `in`, ...).
    pub decl: &'a ParamDecl,
    /// Scope for evaluating a nested block; its parent link is the parameter
    /// being built. `None` when a deferred validator resolves later.
    pub scope: Option<&'a Scope<'a>>,
}

impl BuildRequest<'_> {
    pub fn block(&self) -> Option<&[DeclItem]> {
        self.decl.params.as_deref()
    }

    pub fn has_block(&self) -> bool {
        self.decl.params.is_some()
    }
}

type ProbeFn = dyn Fn(&BuildRequest<'_>) -> Result<Option<BoxedValidator>> + Send + Sync;

struct Plugin {
    name: &'static str,
    probe: Box<ProbeFn>,
}

pub type PredicateFn = dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync;

/// Named custom check. The function returns `Err(help)` on failure; the help
/// text becomes the `ParamInvalid` description.
#[derive(Clone)]
pub struct Predicate {
    description: String,
    check: Arc<PredicateFn>,
}

impl Predicate {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn call(&self, value: &Value) -> std::result::Result<(), String> {
        (self.check)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Plugin table, set up once at process start and shared by every registry
/// built from it.
#[derive(Default)]
pub struct ValidatorTable {
    plugins: Vec<Plugin>,
    predicates: BTreeMap<String, Predicate>,
}

impl ValidatorTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table with every built-in variant registered.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.register("type", TypeValidator::build);
        table.register("regexp", RegexpValidator::build);
        table.register("enum", EnumValidator::build);
        table.register("array", ArrayValidator::build);
        table.register("one_of_types", OneOfTypesValidator::build);
        table.register("custom", CustomValidator::build);
        table.register("hash", HashValidator::build);
        table.register("decimal", DecimalValidator::build);
        table.register("number", NumberValidator::build);
        table.register("boolean", BooleanValidator::build);
        table.register("rest", RestValidator::build);
        table.register("nested", NestedValidator::build);
        table
    }

    /// Register a probe. It is tried before every probe registered earlier.
    pub fn register<F>(&mut self, name: &'static str, probe: F)
    where
        F: Fn(&BuildRequest<'_>) -> Result<Option<BoxedValidator>> + Send + Sync + 'static,
    {
        self.plugins.push(Plugin {
            name,
            probe: Box::new(probe),
        });
    }

    pub fn register_predicate<F>(&mut self, name: impl Into<String>, description: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.predicates.insert(
            name.into(),
            Predicate {
                description: description.into(),
                check: Arc::new(check),
            },
        );
    }

    pub fn predicate(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    /// Plugin names in probe order.
    pub fn probe_order(&self) -> Vec<&'static str> {
        self.plugins.iter().rev().map(|p| p.name).collect()
    }
}

impl fmt::Debug for ValidatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorTable")
            .field("plugins", &self.probe_order())
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Plugin table plus the type table of one registry.
#[derive(Debug)]
pub struct Engine {
    table: Arc<ValidatorTable>,
    types: RwLock<TypeTable>,
}

impl Engine {
    pub fn new(table: Arc<ValidatorTable>) -> Self {
        Self {
            table,
            types: RwLock::new(TypeTable::builtin()),
        }
    }

    pub fn table(&self) -> &ValidatorTable {
        &self.table
    }

    pub fn register_type(&self, name: impl Into<String>, def: TypeDef) {
        self.types.write().insert(name.into(), def);
    }

    pub fn resolve_type(&self, name: &str) -> Option<TypeDef> {
        self.types.read().get(name)
    }

    /// First probe (newest first) that accepts the request, or `None`.
    pub fn probe(&self, req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        for plugin in self.table.plugins.iter().rev() {
            if let Some(validator) = (plugin.probe)(req)? {
                tracing::trace!(plugin = plugin.name, spec = %req.spec, "validator matched");
                return Ok(Some(validator));
            }
        }
        Ok(None)
    }

    pub fn find(&self, req: &BuildRequest<'_>) -> Result<BoxedValidator> {
        self.probe(req)?.ok_or_else(|| Error::ValidatorNotFound {
            spec: req.spec.to_string(),
        })
    }
}
