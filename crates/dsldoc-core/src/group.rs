//! Param and property groups, and the scope declaration blocks are
//! evaluated in.

use crate::decl::{DeclItem, GroupRef};
use crate::error::{Error, Result};
use crate::markup::Markup;
use crate::param::{ParameterDescription, ParentLink};
use crate::validator::Engine;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Param,
    Property,
}

impl GroupKind {
    fn as_str(self) -> &'static str {
        match self {
            GroupKind::Param => "param group",
            GroupKind::Property => "property group",
        }
    }
}

fn group_key(scope: &str, name: &str) -> String {
    format!("{scope}#{name}")
}

/// Group bodies keyed by kind and `scope#name`. Bodies are stored
/// unevaluated and expanded at every use site.
#[derive(Debug, Default, Clone)]
pub struct GroupStore {
    groups: HashMap<(GroupKind, String), Arc<Vec<DeclItem>>>,
}

impl GroupStore {
    pub fn define(&mut self, kind: GroupKind, scope: &str, name: &str, items: Vec<DeclItem>) -> Result<()> {
        let key = group_key(scope, name);
        if self.groups.contains_key(&(kind, key.clone())) {
            return Err(Error::MultipleDefinition {
                what: format!("{} {key}", kind.as_str()),
            });
        }
        tracing::debug!(kind = kind.as_str(), %key, "group defined");
        self.groups.insert((kind, key), Arc::new(items));
        Ok(())
    }

    pub fn get(&self, kind: GroupKind, scope: &str, name: &str) -> Result<Arc<Vec<DeclItem>>> {
        let key = group_key(scope, name);
        match self.groups.get(&(kind, key.clone())) {
            Some(items) => Ok(Arc::clone(items)),
            None => Err(Error::UnknownGroup { key }),
        }
    }

    pub fn contains(&self, kind: GroupKind, scope: &str, name: &str) -> bool {
        self.groups.contains_key(&(kind, group_key(scope, name)))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Evaluation scope for a declaration block.
#[derive(Clone)]
pub struct Scope<'a> {
    engine: &'a Arc<Engine>,
    groups: &'a GroupStore,
    markup: &'a dyn Markup,
    /// Where unscoped group references are looked up.
    group_scope: String,
    parent: Option<Arc<ParentLink>>,
    /// Groups currently being expanded, outermost first.
    active: Vec<String>,
}

impl<'a> Scope<'a> {
    pub fn new(
        engine: &'a Arc<Engine>,
        groups: &'a GroupStore,
        markup: &'a dyn Markup,
        group_scope: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            groups,
            markup,
            group_scope: group_scope.into(),
            parent: None,
            active: Vec::new(),
        }
    }

    pub fn engine(&self) -> &'a Arc<Engine> {
        self.engine
    }

    pub fn markup(&self) -> &'a dyn Markup {
        self.markup
    }

    pub fn parent(&self) -> Option<&Arc<ParentLink>> {
        self.parent.as_ref()
    }

    /// Scope for the block nested under `parent`.
    pub fn child(&self, parent: Arc<ParentLink>) -> Scope<'a> {
        Scope {
            parent: Some(parent),
            ..self.clone()
        }
    }

    pub fn evaluate(&self, items: &[DeclItem]) -> Result<Vec<ParameterDescription>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                DeclItem::Param(decl) => out.push(ParameterDescription::build(decl, self)?),
                DeclItem::ParamGroup(group) => out.extend(self.expand(GroupKind::Param, group)?),
                DeclItem::PropGroup(group) => out.extend(self.expand(GroupKind::Property, group)?),
            }
        }
        Ok(out)
    }

    /// Splice a group body in place. Nested references inside the body
    /// resolve against the group's own scope.
    pub fn expand(&self, kind: GroupKind, group: &GroupRef) -> Result<Vec<ParameterDescription>> {
        let scope = group.scope.as_deref().unwrap_or(&self.group_scope);
        let key = group_key(scope, &group.name);
        if self.active.contains(&key) {
            return Err(Error::GroupCycle { key });
        }
        let items = self.groups.get(kind, scope, &group.name)?;
        let mut inner = Scope {
            group_scope: scope.to_string(),
            ..self.clone()
        };
        inner.active.push(key);
        inner.evaluate(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::PlainText;
    use crate::validator::ValidatorTable;
    use serde_json::{json, Value};

    fn items(value: Value) -> Vec<DeclItem> {
        serde_json::from_value(value).unwrap()
    }

    fn engine() -> Arc<Engine> {
        Arc::new(Engine::new(Arc::new(ValidatorTable::builtin())))
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut store = GroupStore::default();
        store.define(GroupKind::Param, "IO", "target", Vec::new()).unwrap();
        let err = store
            .define(GroupKind::Param, "IO", "target", Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::MultipleDefinition { .. }));
        // same name, different kind
        store.define(GroupKind::Property, "IO", "target", Vec::new()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn group_is_spliced_in_place() {
        let engine = engine();
        let mut store = GroupStore::default();
        store
            .define(
                GroupKind::Param,
                "IO",
                "credentials",
                items(json!([
                    {"param": {"name": "login", "validator": "String"}},
                    {"param": {"name": "password", "validator": "String"}}
                ])),
            )
            .unwrap();
        let scope = Scope::new(&engine, &store, &PlainText, "IO");
        let params = scope
            .evaluate(&items(json!([
                {"param": {"name": "host", "validator": "String"}},
                {"param_group": {"name": "credentials"}},
                {"param": {"name": "port", "validator": "Integer"}}
            ])))
            .unwrap();
        let names: Vec<_> = params.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["host", "login", "password", "port"]);
    }

    #[test]
    fn group_inside_hash_gets_prefixed_names() {
        let engine = engine();
        let mut store = GroupStore::default();
        store
            .define(
                GroupKind::Param,
                "Auth",
                "credentials",
                items(json!([{"param": {"name": "login", "validator": "String"}}])),
            )
            .unwrap();
        let scope = Scope::new(&engine, &store, &PlainText, "IO");
        let params = scope
            .evaluate(&items(json!([
                {"param": {"name": "user", "validator": "Hash", "params": [
                    {"param_group": {"name": "credentials", "scope": "Auth"}}
                ]}}
            ])))
            .unwrap();
        assert_eq!(params[0].sub_params()[0].full_name(), "user[login]");
    }

    #[test]
    fn unknown_group_is_reported() {
        let engine = engine();
        let store = GroupStore::default();
        let scope = Scope::new(&engine, &store, &PlainText, "IO");
        let err = scope
            .evaluate(&items(json!([{"param_group": {"name": "nope"}}])))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownGroup { key } if key == "IO#nope"));
    }

    #[test]
    fn self_including_group_is_a_cycle() {
        let engine = engine();
        let mut store = GroupStore::default();
        store
            .define(
                GroupKind::Param,
                "IO",
                "loop",
                items(json!([
                    {"param": {"name": "depth", "validator": "Integer"}},
                    {"param_group": {"name": "loop"}}
                ])),
            )
            .unwrap();
        let scope = Scope::new(&engine, &store, &PlainText, "IO");
        let err = scope
            .evaluate(&items(json!([{"param_group": {"name": "loop"}}])))
            .unwrap_err();
        assert!(matches!(err, Error::GroupCycle { key } if key == "IO#loop"));
    }

    #[test]
    fn prop_groups_are_separate() {
        let engine = engine();
        let mut store = GroupStore::default();
        store
            .define(
                GroupKind::Property,
                "User",
                "identity",
                items(json!([{"param": {"name": "id", "validator": "Integer"}}])),
            )
            .unwrap();
        let scope = Scope::new(&engine, &store, &PlainText, "User");
        assert!(scope
            .evaluate(&items(json!([{"param_group": {"name": "identity"}}])))
            .is_err());
        let props = scope
            .evaluate(&items(json!([{"prop_group": {"name": "identity"}}])))
            .unwrap();
        assert_eq!(props[0].name(), "id");
    }
}
