//! Built-in validator variants.
//!
//! Each variant has a `build` probe with the signature the plugin table
//! expects; it returns `Ok(None)` when the `ValidatorSpec` is not its business.

use super::{
    describe_kind, BoxedValidator, BuildRequest, Deferred, Engine, ExpectedKind, Predicate,
    TypeDef, Validator,
};
use crate::decl::{ParamDecl, ValidatorSpec};
use crate::error::{Error, Result};
use crate::param::ParameterDescription;
use regex::Regex;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Text form of a scalar, the way it would be typed on a command line.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// -- type --

#[derive(Debug)]
pub struct TypeValidator {
    name: String,
    def: TypeDef,
}

impl TypeValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        let Some(name) = req.spec.type_name() else {
            return Ok(None);
        };
        // Hash with a block belongs to the hash validator.
        if name == "Hash" && req.has_block() {
            return Ok(None);
        }
        Ok(req.engine.resolve_type(name).map(|def| {
            Box::new(TypeValidator {
                name: name.to_string(),
                def,
            }) as BoxedValidator
        }))
    }

    pub fn type_name(&self) -> &str {
        &self.name
    }
}

impl Validator for TypeValidator {
    fn kind(&self) -> &'static str {
        "type"
    }

    fn validate(&self, value: &Value) -> bool {
        self.def.shape.matches(value)
    }

    fn description(&self) -> String {
        format!("Must be a {}", self.name)
    }

    fn expected_kind(&self) -> ExpectedKind {
        self.def.expected
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- regexp --

#[derive(Debug)]
pub struct RegexpValidator {
    re: Regex,
}

impl RegexpValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        let ValidatorSpec::Pattern(source) = req.spec else {
            return Ok(None);
        };
        match Regex::new(source) {
            Ok(re) => Ok(Some(Box::new(RegexpValidator { re }))),
            Err(e) => {
                tracing::warn!(param = %req.decl.name, pattern = %source, "invalid pattern: {e}");
                Ok(None)
            }
        }
    }
}

impl Validator for RegexpValidator {
    fn kind(&self) -> &'static str {
        "regexp"
    }

    fn validate(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.re.is_match(s))
    }

    fn description(&self) -> String {
        format!(
            "Must match regular expression <code>/{}/</code>.",
            self.re.as_str()
        )
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Regexp
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- enum --

#[derive(Debug)]
pub struct EnumValidator {
    values: Vec<Value>,
}

impl EnumValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        let ValidatorSpec::Enum(values) = req.spec else {
            return Ok(None);
        };
        Ok(Some(Box::new(EnumValidator {
            values: values.clone(),
        })))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Validator for EnumValidator {
    fn kind(&self) -> &'static str {
        "enum"
    }

    fn validate(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    fn description(&self) -> String {
        let list = self
            .values
            .iter()
            .map(|v| format!("<code>{}</code>", scalar_text(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Must be one of: {list}.")
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- array --

#[derive(Debug)]
pub struct ArrayValidator {
    of: Option<Deferred>,
    within: Option<Vec<Value>>,
}

impl ArrayValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        if req.spec.type_name() != Some("Array") || req.has_block() {
            return Ok(None);
        }
        let of = req.decl.of.as_ref().map(|item_type| {
            Deferred::new(
                Arc::clone(req.engine),
                format!("{}[]", req.decl.name),
                ParamDecl::new(req.decl.name.clone(), ValidatorSpec::Type(item_type.clone())),
            )
        });
        Ok(Some(Box::new(ArrayValidator {
            of,
            within: req.decl.within.clone(),
        })))
    }

    fn valid_item(&self, item: &Value) -> bool {
        let type_ok = self.of.as_ref().map_or(true, |of| of.validate(item));
        let value_ok = self.within.as_ref().map_or(true, |within| within.contains(item));
        type_ok && value_ok
    }
}

impl Validator for ArrayValidator {
    fn kind(&self) -> &'static str {
        "array"
    }

    /// Null counts as an empty list; a string is not a list.
    fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().all(|item| self.valid_item(item)),
            _ => false,
        }
    }

    fn description(&self) -> String {
        let items = match (&self.within, &self.of) {
            (Some(within), _) => Value::Array(within.clone()).to_string(),
            (None, Some(of)) => of.type_name().to_string(),
            (None, None) => "any type".to_string(),
        };
        format!("Must be an array of {items}")
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Array
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- one of types --

#[derive(Debug)]
pub struct OneOfTypesValidator {
    types: Vec<String>,
    engine: Arc<Engine>,
}

impl OneOfTypesValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        let ValidatorSpec::OneOfTypes(types) = req.spec else {
            return Ok(None);
        };
        if types.is_empty() || req.has_block() {
            return Ok(None);
        }
        Ok(Some(Box::new(OneOfTypesValidator {
            types: types.clone(),
            engine: Arc::clone(req.engine),
        })))
    }
}

impl Validator for OneOfTypesValidator {
    fn kind(&self) -> &'static str {
        "one_of_types"
    }

    // Names are looked up per call so classes documented later still count.
    fn validate(&self, value: &Value) -> bool {
        self.types.iter().any(|name| {
            self.engine
                .resolve_type(name)
                .is_some_and(|def| def.shape.matches(value))
        })
    }

    fn description(&self) -> String {
        format!("Must be one of: {}.", self.types.join(", "))
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- custom --

#[derive(Debug)]
pub struct CustomValidator {
    name: String,
    predicate: Predicate,
}

impl CustomValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        let ValidatorSpec::Custom(name) = req.spec else {
            return Ok(None);
        };
        Ok(req.engine.table().predicate(name).map(|predicate| {
            Box::new(CustomValidator {
                name: name.clone(),
                predicate: predicate.clone(),
            }) as BoxedValidator
        }))
    }
}

impl Validator for CustomValidator {
    fn kind(&self) -> &'static str {
        "custom"
    }

    fn validate(&self, value: &Value) -> bool {
        self.predicate.call(value).is_ok()
    }

    fn description(&self) -> String {
        self.predicate.description().to_string()
    }

    /// The predicate's own help text replaces the generic description.
    fn check(&self, name: &str, value: &Value) -> Result<()> {
        self.predicate
            .call(value)
            .map_err(|help| Error::ParamInvalid {
                name: name.to_string(),
                value: value.clone(),
                description: help,
            })
    }

    fn merge_with(&mut self, other: BoxedValidator) -> Result<()> {
        let other_kind = other.kind();
        let other_desc = other.description();
        match other.into_any().downcast::<CustomValidator>() {
            Ok(other) if other.name == self.name => Ok(()),
            _ => Err(Error::IncompatibleMerge {
                left: describe_kind(self.kind(), &self.name),
                right: describe_kind(other_kind, &other_desc),
            }),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- hash --

/// Hash with a nested parameter block.
#[derive(Debug)]
pub struct HashValidator {
    params: Vec<ParameterDescription>,
}

impl HashValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        if req.spec.type_name() != Some("Hash") {
            return Ok(None);
        }
        match Self::from_block(req)? {
            Some(hash) => Ok(Some(Box::new(hash))),
            None => Ok(None),
        }
    }

    fn from_block(req: &BuildRequest<'_>) -> Result<Option<Self>> {
        let (Some(block), Some(scope)) = (req.block(), req.scope) else {
            return Ok(None);
        };
        let params = ParameterDescription::unify(scope.evaluate(block)?)?;
        Ok(Some(HashValidator { params }))
    }

    pub fn params(&self) -> &[ParameterDescription] {
        &self.params
    }

    fn merge_params(&mut self, other: Vec<ParameterDescription>) -> Result<()> {
        let mut params = std::mem::take(&mut self.params);
        params.extend(other);
        self.params = ParameterDescription::unify(params)?;
        Ok(())
    }

    fn present_keys<'a>(
        &'a self,
        map: &'a serde_json::Map<String, Value>,
    ) -> impl Iterator<Item = (&'a ParameterDescription, &'a Value)> {
        self.params
            .iter()
            .filter_map(move |param| map.get(param.name()).map(|v| (param, v)))
    }
}

impl Validator for HashValidator {
    fn kind(&self) -> &'static str {
        "hash"
    }

    fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Object(map) => self
                .present_keys(map)
                .all(|(param, v)| param.is_valid(v)),
            _ => false,
        }
    }

    fn description(&self) -> String {
        "Must be a Hash".to_string()
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Hash
    }

    fn sub_params(&self) -> Option<&[ParameterDescription]> {
        Some(&self.params)
    }

    /// Only keys that are present are validated; presence is the argument
    /// checker's concern.
    fn check(&self, name: &str, value: &Value) -> Result<()> {
        let Value::Object(map) = value else {
            return Err(Error::ParamInvalid {
                name: name.to_string(),
                value: value.clone(),
                description: self.description(),
            });
        };
        for (param, v) in self.present_keys(map) {
            param.validate(v)?;
        }
        Ok(())
    }

    fn merge_with(&mut self, other: BoxedValidator) -> Result<()> {
        let other_kind = other.kind();
        let other_desc = other.description();
        match other.into_any().downcast::<HashValidator>() {
            Ok(other) => self.merge_params(other.params),
            Err(_) => Err(Error::IncompatibleMerge {
                left: describe_kind(self.kind(), &self.description()),
                right: describe_kind(other_kind, &other_desc),
            }),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- decimal --

#[derive(Debug)]
pub struct DecimalValidator;

impl DecimalValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        Ok(req
            .spec
            .is_marker(&["decimal"])
            .then(|| Box::new(DecimalValidator) as BoxedValidator))
    }
}

/// `^[-+]?[0-9]+([,.][0-9]+)?$`
pub(crate) fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    match unsigned.split_once(&['.', ','][..]) {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(unsigned),
    }
}

impl Validator for DecimalValidator {
    fn kind(&self) -> &'static str {
        "decimal"
    }

    fn validate(&self, value: &Value) -> bool {
        // JSON numbers may print in exponent form
        value.is_number() || is_decimal(&scalar_text(value))
    }

    fn description(&self) -> String {
        "Must be a decimal number".to_string()
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Numeric
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- number --

#[derive(Debug)]
pub struct NumberValidator;

impl NumberValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        Ok(req
            .spec
            .is_marker(&["number"])
            .then(|| Box::new(NumberValidator) as BoxedValidator))
    }
}

/// `^(0|[1-9]\d*)$`
pub(crate) fn is_number(text: &str) -> bool {
    text == "0" || (all_digits(text) && !text.starts_with('0'))
}

impl Validator for NumberValidator {
    fn kind(&self) -> &'static str {
        "number"
    }

    fn validate(&self, value: &Value) -> bool {
        is_number(&scalar_text(value))
    }

    fn description(&self) -> String {
        "Must be a number".to_string()
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Numeric
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- boolean --

const BOOLEAN_TEXTS: [&str; 4] = ["true", "false", "1", "0"];

#[derive(Debug)]
pub struct BooleanValidator;

impl BooleanValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        Ok(req
            .spec
            .is_marker(&["bool", "boolean"])
            .then(|| Box::new(BooleanValidator) as BoxedValidator))
    }
}

impl Validator for BooleanValidator {
    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn validate(&self, value: &Value) -> bool {
        BOOLEAN_TEXTS.contains(&scalar_text(value).as_str())
    }

    fn description(&self) -> String {
        let list = BOOLEAN_TEXTS
            .iter()
            .map(|v| format!("<code>{v}</code>"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Must be one of: {list}")
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Boolean
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- rest --

#[derive(Debug)]
pub struct RestValidator;

impl RestValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        Ok(req
            .spec
            .is_marker(&["rest", "list", "splat"])
            .then(|| Box::new(RestValidator) as BoxedValidator))
    }
}

impl Validator for RestValidator {
    fn kind(&self) -> &'static str {
        "rest"
    }

    fn validate(&self, _value: &Value) -> bool {
        true
    }

    fn description(&self) -> String {
        "Must be a list of values".to_string()
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::List
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -- nested --

/// Array whose elements are hashes described by a nested block.
#[derive(Debug)]
pub struct NestedValidator {
    inner: HashValidator,
}

impl NestedValidator {
    pub fn build(req: &BuildRequest<'_>) -> Result<Option<BoxedValidator>> {
        if req.spec.type_name() != Some("Array") {
            return Ok(None);
        }
        Ok(HashValidator::from_block(req)?
            .map(|inner| Box::new(NestedValidator { inner }) as BoxedValidator))
    }
}

impl Validator for NestedValidator {
    fn kind(&self) -> &'static str {
        "nested"
    }

    fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().all(|item| self.inner.validate(item)),
            _ => false,
        }
    }

    fn description(&self) -> String {
        "Must be an Array of nested elements".to_string()
    }

    fn expected_kind(&self) -> ExpectedKind {
        ExpectedKind::Array
    }

    fn sub_params(&self) -> Option<&[ParameterDescription]> {
        self.inner.sub_params()
    }

    fn check(&self, name: &str, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => items.iter().try_for_each(|item| self.inner.check(name, item)),
            _ => Err(Error::ParamInvalid {
                name: name.to_string(),
                value: value.clone(),
                description: self.description(),
            }),
        }
    }

    fn merge_with(&mut self, other: BoxedValidator) -> Result<()> {
        let other_kind = other.kind();
        let other_desc = other.description();
        match other.into_any().downcast::<NestedValidator>() {
            Ok(other) => self.inner.merge_params(other.inner.params),
            Err(_) => Err(Error::IncompatibleMerge {
                left: describe_kind(self.kind(), &self.description()),
                right: describe_kind(other_kind, &other_desc),
            }),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
