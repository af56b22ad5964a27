//! Validators whose type is named before it exists.
//!
//! A deferred validator keeps the type name and resolves it through the
//! engine on first use. A successful resolution is cached for the lifetime of
//! the registry snapshot; a failed one is retried on the next call, because
//! the type may be documented by then.

use super::{BuildRequest, Engine, Validator};
use crate::decl::{ParamDecl, ValidatorSpec};
use crate::error::{Error, Result};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub struct Deferred {
    engine: Arc<Engine>,
    param: String,
    type_name: String,
    options: ParamDecl,
    resolved: OnceLock<Box<dyn Validator>>,
}

impl Deferred {
    /// `options` carries the declaration the validator is built from; its
    /// nested block, if any, is dropped.
    pub fn new(engine: Arc<Engine>, param: impl Into<String>, options: ParamDecl) -> Self {
        let type_name = match &options.validator {
            Some(ValidatorSpec::Type(name)) | Some(ValidatorSpec::Lazy(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self {
            engine,
            param: param.into(),
            type_name,
            options: ParamDecl {
                params: None,
                ..options
            },
            resolved: OnceLock::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub fn resolve(&self) -> Option<&dyn Validator> {
        if let Some(validator) = self.resolved.get() {
            return Some(validator.as_ref());
        }
        let spec = ValidatorSpec::Type(self.type_name.clone());
        let req = BuildRequest {
            engine: &self.engine,
            spec: &spec,
            decl: &self.options,
            scope: None,
        };
        match self.engine.probe(&req) {
            Ok(Some(validator)) => {
                // Another thread may have won the race; either result is equivalent.
                let _ = self.resolved.set(validator);
                self.resolved.get().map(|v| v.as_ref())
            }
            Ok(None) => {
                tracing::debug!(param = %self.param, type_name = %self.type_name, "type not resolvable yet");
                None
            }
            Err(e) => {
                tracing::warn!(param = %self.param, type_name = %self.type_name, "resolving type failed: {e}");
                None
            }
        }
    }

    /// Resolve and hand out the validator, consuming the wrapper.
    pub fn into_resolved(self) -> Option<Box<dyn Validator>> {
        if self.resolve().is_none() {
            return None;
        }
        self.resolved.into_inner()
    }

    pub fn validate(&self, value: &Value) -> bool {
        self.resolve().is_some_and(|v| v.validate(value))
    }

    pub fn check(&self, name: &str, value: &Value) -> Result<()> {
        match self.resolve() {
            Some(validator) => validator.check(name, value),
            None => Err(Error::UnresolvedType {
                param: name.to_string(),
                type_name: self.type_name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{TypeDef, ValidatorTable};
    use serde_json::json;

    fn deferred(engine: &Arc<Engine>, type_name: &str) -> Deferred {
        Deferred::new(
            Arc::clone(engine),
            "owner",
            ParamDecl::new("owner", ValidatorSpec::Lazy(type_name.to_string())),
        )
    }

    #[test]
    fn resolves_once_type_is_documented() {
        let engine = Arc::new(Engine::new(Arc::new(ValidatorTable::builtin())));
        let lazy = deferred(&engine, "User");

        let err = lazy.check("owner", &json!({})).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType { ref type_name, .. } if type_name == "User"));
        assert!(!lazy.is_resolved());

        engine.register_type("User", TypeDef::documented());
        assert!(lazy.check("owner", &json!({"id": 1})).is_ok());
        assert!(lazy.is_resolved());
        assert!(!lazy.validate(&json!("admin")));
    }

    #[test]
    fn builtin_type_resolves_immediately() {
        let engine = Arc::new(Engine::new(Arc::new(ValidatorTable::builtin())));
        let lazy = deferred(&engine, "Integer");
        assert!(lazy.validate(&json!(5)));
        assert_eq!(lazy.resolve().map(|v| v.description()).as_deref(), Some("Must be a Integer"));
    }
}
