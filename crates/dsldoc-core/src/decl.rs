//! Declaration records, the structured input the registry is built from.
//!
//! How the records are produced (source scanning, macros, hand-written JSON)
//! is not this crate's business. Every collection defaults to empty so a
//! record only needs the fields it uses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One batch of declarations. Several batches concatenate with [`Declarations::extend`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Declarations {
    pub param_groups: Vec<GroupDecl>,
    pub prop_groups: Vec<GroupDecl>,
    pub classes: Vec<ClassDecl>,
    pub methods: Vec<MethodDecl>,
    pub updates: Vec<MethodUpdate>,
}

impl Declarations {
    pub fn extend(&mut self, other: Declarations) {
        self.param_groups.extend(other.param_groups);
        self.prop_groups.extend(other.prop_groups);
        self.classes.extend(other.classes);
        self.methods.extend(other.methods);
        self.updates.extend(other.updates);
    }

    pub fn is_empty(&self) -> bool {
        self.param_groups.is_empty()
            && self.prop_groups.is_empty()
            && self.classes.is_empty()
            && self.methods.is_empty()
            && self.updates.is_empty()
    }
}

/// Named, reusable bundle of parameter (or property) declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDecl {
    /// Class the group is defined in; lookups without an explicit scope use
    /// the owning class.
    pub scope: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<DeclItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassDecl {
    /// Class (or module) name as written in code, e.g. `DSL::IO`.
    pub name: String,
    /// Display name; defaults to `name`.
    pub label: Option<String>,
    /// Superclass or enclosing module used for version and tag inheritance.
    pub superclass: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub versions: Vec<String>,
    pub sections: Option<SectionsDecl>,
    pub tags: Vec<String>,
    pub meta: Option<Value>,
    pub deprecated: Option<bool>,
    pub show: Option<bool>,
    /// Extra reference keys other entities may use to find this class.
    pub refs: Vec<String>,
    pub properties: Vec<DeclItem>,
    pub app_info: Option<String>,
    pub dsl_base_url: Option<String>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SectionsDecl {
    pub only: Vec<String>,
    pub except: Vec<String>,
}

impl SectionsDecl {
    /// `only − except`, keeping the order of `only`. An empty `only` means
    /// the configured sections.
    pub fn resolve(&self, configured: &[String]) -> Vec<String> {
        let only = if self.only.is_empty() {
            configured
        } else {
            &self.only
        };
        let mut out: Vec<String> = Vec::new();
        for section in only {
            if !self.except.contains(section) && !out.contains(section) {
                out.push(section.clone());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MethodDecl {
    /// Owning class; filled in when the method is nested in a [`ClassDecl`].
    pub class: Option<String>,
    pub name: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub versions: Vec<String>,
    pub tags: Vec<String>,
    pub meta: Option<Value>,
    pub deprecated: Option<bool>,
    pub show: Option<bool>,
    pub params: Vec<DeclItem>,
    #[serde(deserialize_with = "one_or_many")]
    pub returns: Vec<ReturnDecl>,
    pub raises: Vec<RaiseDecl>,
    pub see: Vec<SeeDecl>,
    pub examples: Vec<ExampleDecl>,
    pub aliases: Vec<String>,
    pub signature: Option<Vec<String>>,
}

/// Extends an already built method instead of replacing it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MethodUpdate {
    pub class: String,
    pub name: String,
    pub versions: Vec<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub meta: Option<Value>,
    pub show: Option<bool>,
    pub raises: Vec<RaiseDecl>,
    pub params: Vec<DeclItem>,
}

/// One entry of a parameter block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclItem {
    Param(ParamDecl),
    ParamGroup(GroupRef),
    PropGroup(GroupRef),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupRef {
    pub name: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Required,
    Optional,
    Keyword,
    Block,
    Rest,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::Required => "required",
            ParamKind::Optional => "optional",
            ParamKind::Keyword => "keyword",
            ParamKind::Block => "block",
            ParamKind::Rest => "rest",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParamDecl {
    pub name: String,
    pub validator: Option<ValidatorSpec>,
    pub desc: Option<String>,
    pub kind: ParamKind,
    pub default: Option<Value>,
    pub meta: Option<Value>,
    pub show: Option<bool>,
    /// Free-form schema attached to block parameters.
    pub schema: Option<Value>,
    /// Item type of an array parameter.
    pub of: Option<String>,
    /// Allowed item values of an array parameter.
    #[serde(rename = "in")]
    pub within: Option<Vec<Value>>,
    pub missing_message: Option<String>,
    /// Nested declaration block (hash / array-of-hash parameters).
    pub params: Option<Vec<DeclItem>>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, validator: ValidatorSpec) -> Self {
        Self {
            name: name.into(),
            validator: Some(validator),
            ..Self::default()
        }
    }

    /// Validator spec after applying the kind defaults.
    pub fn effective_validator(&self) -> Option<ValidatorSpec> {
        match (&self.validator, self.kind) {
            (Some(spec), _) => Some(spec.clone()),
            (None, ParamKind::Block) => Some(ValidatorSpec::Type("Proc".to_string())),
            (None, ParamKind::Rest) => Some(ValidatorSpec::Marker("rest".to_string())),
            (None, _) => None,
        }
    }
}

/// Raw validator specification, tagged at the declaration boundary.
///
/// A bare string is accepted as shorthand: `":number"` is a marker, `"/re/"`
/// a pattern, anything else a type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorSpec {
    Type(String),
    Pattern(String),
    Enum(Vec<Value>),
    OneOfTypes(Vec<String>),
    Marker(String),
    Custom(String),
    Lazy(String),
}

impl ValidatorSpec {
    pub fn parse_shorthand(s: &str) -> Self {
        if let Some(marker) = s.strip_prefix(':') {
            ValidatorSpec::Marker(marker.to_string())
        } else if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') {
            ValidatorSpec::Pattern(s[1..s.len() - 1].to_string())
        } else {
            ValidatorSpec::Type(s.to_string())
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            ValidatorSpec::Type(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_marker(&self, names: &[&str]) -> bool {
        matches!(self, ValidatorSpec::Marker(m) if names.contains(&m.as_str()))
    }
}

impl fmt::Display for ValidatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorSpec::Type(name) => write!(f, "{name}"),
            ValidatorSpec::Pattern(re) => write!(f, "/{re}/"),
            ValidatorSpec::Enum(values) => write!(f, "{}", Value::Array(values.clone())),
            ValidatorSpec::OneOfTypes(names) => write!(f, "[{}]", names.join(", ")),
            ValidatorSpec::Marker(m) => write!(f, ":{m}"),
            ValidatorSpec::Custom(name) => write!(f, "custom({name})"),
            ValidatorSpec::Lazy(name) => write!(f, "{name:?}"),
        }
    }
}

// Accept either the tagged form or the shorthand string.
#[derive(Deserialize)]
#[serde(untagged)]
enum SpecRepr {
    Shorthand(String),
    Tagged(TaggedSpec),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedSpec {
    Type(String),
    Pattern(String),
    Enum(Vec<Value>),
    OneOfTypes(Vec<String>),
    Marker(String),
    Custom(String),
    Lazy(String),
}

impl From<TaggedSpec> for ValidatorSpec {
    fn from(spec: TaggedSpec) -> Self {
        match spec {
            TaggedSpec::Type(v) => ValidatorSpec::Type(v),
            TaggedSpec::Pattern(v) => ValidatorSpec::Pattern(v),
            TaggedSpec::Enum(v) => ValidatorSpec::Enum(v),
            TaggedSpec::OneOfTypes(v) => ValidatorSpec::OneOfTypes(v),
            TaggedSpec::Marker(v) => ValidatorSpec::Marker(v),
            TaggedSpec::Custom(v) => ValidatorSpec::Custom(v),
            TaggedSpec::Lazy(v) => ValidatorSpec::Lazy(v),
        }
    }
}

impl<'de> Deserialize<'de> for ValidatorSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SpecRepr::deserialize(deserializer)? {
            SpecRepr::Shorthand(s) => ValidatorSpec::parse_shorthand(&s),
            SpecRepr::Tagged(spec) => spec.into(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReturnDecl {
    pub object_of: Option<String>,
    pub array_of: Option<ArrayItems>,
    pub one_of: Option<Vec<Value>>,
    pub param_group: Option<String>,
    /// Scope for `param_group` lookups; defaults to the owning class.
    pub scope: Option<String>,
    pub desc: Option<String>,
    /// Inline block, allowed only with `object_of: "Hash"`.
    pub params: Option<Vec<DeclItem>>,
}

/// Elements of an `array_of` return: a type name or the allowed values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArrayItems {
    Type(String),
    Values(Vec<Value>),
}

impl fmt::Display for ArrayItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayItems::Type(name) => write!(f, "{name}"),
            ArrayItems::Values(values) => write!(f, "{}", Value::Array(values.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RaiseDecl {
    pub error: String,
    #[serde(alias = "description")]
    pub desc: Option<String>,
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeeDecl {
    /// `method`, `Class#method` or `version#Class#method`.
    pub link: String,
    #[serde(alias = "description")]
    pub desc: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleDecl {
    pub example: String,
    pub desc: Option<String>,
    #[serde(rename = "for")]
    pub for_method: Option<String>,
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shorthand_specs() {
        assert_eq!(
            ValidatorSpec::parse_shorthand("String"),
            ValidatorSpec::Type("String".to_string())
        );
        assert_eq!(
            ValidatorSpec::parse_shorthand(":number"),
            ValidatorSpec::Marker("number".to_string())
        );
        assert_eq!(
            ValidatorSpec::parse_shorthand("/^a+$/"),
            ValidatorSpec::Pattern("^a+$".to_string())
        );
    }

    #[test]
    fn tagged_and_shorthand_deserialize() {
        let tagged: ValidatorSpec = serde_json::from_value(json!({"enum": [1, 2]})).unwrap();
        assert_eq!(tagged, ValidatorSpec::Enum(vec![json!(1), json!(2)]));
        let short: ValidatorSpec = serde_json::from_value(json!("Hash")).unwrap();
        assert_eq!(short, ValidatorSpec::Type("Hash".to_string()));
        let lazy: ValidatorSpec = serde_json::from_value(json!({"lazy": "User"})).unwrap();
        assert_eq!(lazy, ValidatorSpec::Lazy("User".to_string()));
    }

    #[test]
    fn returns_accepts_single_object_or_list() {
        let one: MethodDecl =
            serde_json::from_value(json!({"name": "a", "returns": {"object_of": "String"}}))
                .unwrap();
        assert_eq!(one.returns.len(), 1);
        let many: MethodDecl = serde_json::from_value(json!({
            "name": "a",
            "returns": [{"object_of": "String"}, {"array_of": "String"}]
        }))
        .unwrap();
        assert_eq!(many.returns.len(), 2);
        assert_eq!(many.returns[1].array_of, Some(ArrayItems::Type("String".to_string())));
        let none: MethodDecl = serde_json::from_value(json!({"name": "a"})).unwrap();
        assert!(none.returns.is_empty());
    }

    #[test]
    fn decl_items_are_tagged() {
        let items: Vec<DeclItem> = serde_json::from_value(json!([
            {"param": {"name": "user", "validator": "Hash", "params": []}},
            {"param_group": {"name": "credentials", "scope": "Auth"}}
        ]))
        .unwrap();
        assert!(matches!(&items[0], DeclItem::Param(p) if p.params.is_some()));
        assert!(matches!(&items[1], DeclItem::ParamGroup(g) if g.scope.as_deref() == Some("Auth")));
    }

    #[test]
    fn kind_defaults_fill_validator() {
        let block = ParamDecl {
            name: "block".to_string(),
            kind: ParamKind::Block,
            ..ParamDecl::default()
        };
        assert_eq!(
            block.effective_validator(),
            Some(ValidatorSpec::Type("Proc".to_string()))
        );
        let rest = ParamDecl {
            name: "args".to_string(),
            kind: ParamKind::Rest,
            ..ParamDecl::default()
        };
        assert!(rest.effective_validator().unwrap().is_marker(&["rest"]));
    }

    #[test]
    fn sections_only_minus_except() {
        let decl = SectionsDecl {
            only: vec!["all".to_string(), "plugins".to_string(), "reports".to_string()],
            except: vec!["reports".to_string()],
        };
        assert_eq!(decl.resolve(&["all".to_string()]), vec!["all", "plugins"]);
        let empty = SectionsDecl::default();
        assert_eq!(empty.resolve(&["all".to_string()]), vec!["all"]);
    }
}
