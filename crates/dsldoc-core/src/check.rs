//! Argument checking against a documented method.
//!
//! Value validation follows the registry configuration (`validate` and
//! `validate_value`). Presence and strictness are opt-in per check.

use crate::config::Config;
use crate::decl::ParamKind;
use crate::error::{Error, Result};
use crate::method::MethodDescription;
use crate::param::ParameterDescription;
use crate::registry::Registry;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgumentCheck {
    /// Required parameters must be present.
    pub presence: bool,
    /// Undocumented keys are rejected, unless the method takes a rest
    /// parameter.
    pub strict: bool,
}

impl ArgumentCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence(mut self, on: bool) -> Self {
        self.presence = on;
        self
    }

    pub fn strict(mut self, on: bool) -> Self {
        self.strict = on;
        self
    }

    pub fn check(&self, config: &Config, method: &MethodDescription, args: &Map<String, Value>) -> Result<()> {
        if !config.validate {
            return Ok(());
        }
        self.walk(method.params(), args)?;
        if config.validate_value() {
            for param in method.params() {
                if let Some(value) = args.get(param.name()) {
                    param.validate(value)?;
                }
            }
        }
        Ok(())
    }

    fn walk(&self, params: &[ParameterDescription], args: &Map<String, Value>) -> Result<()> {
        if self.presence {
            if let Some(missing) = params
                .iter()
                .find(|p| p.is_required() && !args.contains_key(p.name()))
            {
                return Err(Error::ParamMissing {
                    name: missing.full_name(),
                    message: missing.missing_message().map(String::from),
                });
            }
        }
        if self.strict && !params.iter().any(|p| p.kind() == ParamKind::Rest) {
            if let Some(key) = args.keys().find(|key| !params.iter().any(|p| p.name() == key.as_str())) {
                return Err(Error::UnknownParam { name: key.clone() });
            }
        }
        for param in params {
            let subs = param.sub_params();
            if subs.is_empty() {
                continue;
            }
            match args.get(param.name()) {
                Some(Value::Object(map)) => self.walk(subs, map)?,
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Value::Object(map) = item {
                            self.walk(subs, map)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Registry {
    /// Check `args` against the method named by `key` (`Class#method` or
    /// `version#Class#method`).
    pub fn check_arguments(&self, key: &str, args: &Map<String, Value>, check: ArgumentCheck) -> Result<()> {
        let method = self.method_description(key)?.ok_or_else(|| {
            let (class, method) = key.rsplit_once('#').unwrap_or((key, ""));
            Error::UnknownMethod {
                class: class.to_string(),
                method: method.to_string(),
            }
        })?;
        check.check(self.config(), method, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Declarations;
    use crate::registry::RegistryBuilder;
    use serde_json::json;

    fn registry(config: Config) -> Registry {
        let decls: Declarations = serde_json::from_value(json!({
            "classes": [{"name": "Users", "methods": [{
                "name": "create",
                "params": [
                    {"param": {"name": "user", "validator": "Hash", "params": [
                        {"param": {"name": "login", "validator": "String"}},
                        {"param": {"name": "age", "validator": "Integer", "kind": "optional"}}
                    ]}},
                    {"param": {"name": "notify", "validator": ":bool", "kind": "keyword",
                               "missing_message": "notify is mandatory"}}
                ]
            }]}]
        }))
        .unwrap();
        let (registry, report) = RegistryBuilder::new(config).build(&decls).unwrap();
        assert!(report.is_clean(), "{:?}", report.failures);
        registry
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn values_are_validated() {
        let registry = registry(Config::default());
        let err = registry
            .check_arguments("Users#create", &args(json!({"user": {"age": "old"}})), ArgumentCheck::new())
            .unwrap_err();
        assert!(matches!(err, Error::ParamInvalid { name, .. } if name == "user[age]"));
    }

    #[test]
    fn presence_reports_nested_full_name() {
        let registry = registry(Config::default());
        let check = ArgumentCheck::new().presence(true);
        let err = registry
            .check_arguments("Users#create", &args(json!({"user": {"age": 3}})), check)
            .unwrap_err();
        assert!(matches!(err, Error::ParamMissing { name, .. } if name == "user[login]"));
        assert!(registry
            .check_arguments("Users#create", &args(json!({"user": {"login": "ann"}})), check)
            .is_ok());
    }

    #[test]
    fn strict_rejects_unknown_keys() {
        let registry = registry(Config::default());
        let check = ArgumentCheck::new().strict(true);
        let err = registry
            .check_arguments("Users#create", &args(json!({"user": {}, "admin": true})), check)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParam { name } if name == "admin"));
    }

    #[test]
    fn validation_can_be_switched_off() {
        let registry = registry(Config {
            validate_value: false,
            ..Config::default()
        });
        assert!(registry
            .check_arguments("Users#create", &args(json!({"user": {"age": "old"}})), ArgumentCheck::new())
            .is_ok());
    }

    #[test]
    fn unknown_method() {
        let registry = registry(Config::default());
        let err = registry
            .check_arguments("Users#destroy", &Map::new(), ArgumentCheck::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { method, .. } if method == "destroy"));
    }
}
