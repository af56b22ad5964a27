//! The registry: every documented class and method, per version.
//!
//! A registry is built in one pass from a batch of [`Declarations`] and is
//! read-only afterwards (deferred validators aside). Build failures are
//! scoped to the entity being defined; they are collected in a
//! [`BuildReport`] and the rest of the batch still goes in.

use crate::class::ClassDescription;
use crate::config::Config;
use crate::decl::{ClassDecl, Declarations, DeclItem, MethodDecl, MethodUpdate};
use crate::error::{Error, Result};
use crate::group::{GroupKind, GroupStore, Scope};
use crate::markup::{Markup, PlainText};
use crate::method::{MethodDescription, SeeDescription};
use crate::query::{DocContext, DocTree, Docs, Query};
use crate::translate::{Catalog, Identity, Translator};
use crate::validator::{Engine, TypeDef, ValidatorTable};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

const DEFAULT_APP_INFO: &str = "Another DSL description";

/// A live class, matched by its code name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHandle {
    name: String,
}

impl ClassHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How a caller names a class.
#[derive(Debug, Clone, Copy)]
pub enum ClassRef<'a> {
    /// `key` or `version#key`.
    Key(&'a str),
    Handle(&'a ClassHandle),
}

impl<'a> From<&'a str> for ClassRef<'a> {
    fn from(key: &'a str) -> Self {
        ClassRef::Key(key)
    }
}

impl<'a> From<&'a String> for ClassRef<'a> {
    fn from(key: &'a String) -> Self {
        ClassRef::Key(key)
    }
}

impl<'a> From<&'a ClassHandle> for ClassRef<'a> {
    fn from(handle: &'a ClassHandle) -> Self {
        ClassRef::Handle(handle)
    }
}

#[derive(Debug)]
pub struct BuildFailure {
    pub entity: String,
    pub error: Error,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.error)
    }
}

/// Entities that could not be built.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, entity: String, error: Error) {
        tracing::warn!(%entity, "skipped: {error}");
        self.failures.push(BuildFailure { entity, error });
    }

    fn note<T>(&mut self, entity: impl FnOnce() -> String, result: Result<T>) {
        if let Err(error) = result {
            self.record(entity(), error);
        }
    }
}

/// Collaborators and configuration a registry is built with. Cheap to
/// clone; a document store keeps one to rebuild on reload.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    config: Config,
    table: Arc<ValidatorTable>,
    markup: Arc<dyn Markup>,
    translator: Arc<dyn Translator>,
}

impl RegistryBuilder {
    /// Builtin validators, plain-text markup, and a catalog translator when
    /// the configuration carries translations.
    pub fn new(config: Config) -> Self {
        let translator: Arc<dyn Translator> = if config.translations.is_empty() {
            Arc::new(Identity)
        } else {
            Arc::new(Catalog::new(config.translations.clone()))
        };
        Self {
            config,
            table: Arc::new(ValidatorTable::builtin()),
            markup: Arc::new(PlainText),
            translator,
        }
    }

    pub fn table(mut self, table: Arc<ValidatorTable>) -> Self {
        self.table = table;
        self
    }

    pub fn markup(mut self, markup: Arc<dyn Markup>) -> Self {
        self.markup = markup;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn empty(&self) -> Result<Registry> {
        self.config.validate()?;
        Ok(Registry {
            config: self.config.clone(),
            engine: Arc::new(Engine::new(Arc::clone(&self.table))),
            markup: Arc::clone(&self.markup),
            translator: Arc::clone(&self.translator),
            classes: BTreeMap::new(),
            refs: BTreeMap::new(),
            class_versions: HashMap::new(),
            superclasses: HashMap::new(),
            groups: GroupStore::default(),
            app_info: BTreeMap::new(),
        })
    }

    /// Build a registry from one batch. Only an invalid configuration fails
    /// the whole build.
    ///
    /// Order: groups, class hierarchy and versions, classes, methods,
    /// method updates. Every class is defined before any method so methods
    /// may name any documented class as a type.
    pub fn build(&self, decls: &Declarations) -> Result<(Registry, BuildReport)> {
        let mut registry = self.empty()?;
        let mut report = BuildReport::default();

        for group in &decls.param_groups {
            report.note(
                || format!("param group {}#{}", group.scope, group.name),
                registry.define_param_group(&group.scope, &group.name, group.params.clone()),
            );
        }
        for group in &decls.prop_groups {
            report.note(
                || format!("property group {}#{}", group.scope, group.name),
                registry.define_prop_group(&group.scope, &group.name, group.params.clone()),
            );
        }

        for class in &decls.classes {
            if let Some(parent) = &class.superclass {
                registry.set_superclass(&class.name, parent);
            }
            if !class.versions.is_empty() {
                registry.set_class_versions(&class.name, class.versions.clone());
            }
            registry.declare_class_type(class);
        }
        for class in &decls.classes {
            report.note(|| format!("class {}", class.name), registry.define_class(class));
        }

        let nested = decls
            .classes
            .iter()
            .flat_map(|class| class.methods.iter().map(move |m| (Some(class.name.as_str()), m)));
        let loose = decls.methods.iter().map(|m| (m.class.as_deref(), m));
        for (class, method) in nested.chain(loose) {
            let entity = || format!("method {}#{}", class.unwrap_or("?"), method.name);
            match class {
                Some(class) => report.note(entity, registry.define_method(class, method)),
                None => report.record(
                    entity(),
                    Error::UnknownClass {
                        key: String::new(),
                    },
                ),
            }
        }

        for update in &decls.updates {
            report.note(
                || format!("update {}#{}", update.class, update.name),
                registry.update_method(update),
            );
        }

        tracing::info!(
            versions = registry.classes.len(),
            classes = registry.classes.values().map(BTreeMap::len).sum::<usize>(),
            failures = report.len(),
            "registry built"
        );
        Ok((registry, report))
    }
}

#[derive(Debug)]
pub struct Registry {
    config: Config,
    engine: Arc<Engine>,
    markup: Arc<dyn Markup>,
    translator: Arc<dyn Translator>,
    /// version → class id → description
    classes: BTreeMap<String, BTreeMap<String, ClassDescription>>,
    /// version → reference key → class id
    refs: BTreeMap<String, BTreeMap<String, String>>,
    /// Explicit versions per class code name.
    class_versions: HashMap<String, Vec<String>>,
    superclasses: HashMap<String, String>,
    groups: GroupStore,
    /// version → application description declared by a class
    app_info: BTreeMap<String, String>,
}

impl Registry {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    fn scope(&self, group_scope: &str) -> Scope<'_> {
        Scope::new(&self.engine, &self.groups, self.markup.as_ref(), group_scope)
    }

    fn is_ignored(&self, class_name: &str, method: Option<&str>) -> bool {
        self.config.is_ignored(class_name, method)
            || self
                .config
                .is_ignored(&self.config.class_id(class_name), method)
    }

    // -- groups --

    pub fn define_param_group(&mut self, scope: &str, name: &str, items: Vec<DeclItem>) -> Result<()> {
        self.groups.define(GroupKind::Param, scope, name, items)
    }

    pub fn define_prop_group(&mut self, scope: &str, name: &str, items: Vec<DeclItem>) -> Result<()> {
        self.groups.define(GroupKind::Property, scope, name, items)
    }

    // -- hierarchy and versions --

    pub fn set_superclass(&mut self, class_name: &str, parent: &str) {
        self.superclasses
            .insert(class_name.to_string(), parent.to_string());
    }

    pub fn set_class_versions(&mut self, class_name: &str, versions: Vec<String>) {
        self.class_versions.insert(class_name.to_string(), versions);
    }

    /// Ancestors, nearest first. A cyclic chain stops at the repeat.
    pub fn ancestors(&self, class_name: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([class_name]);
        let mut out = Vec::new();
        let mut current = self.superclasses.get(class_name);
        while let Some(parent) = current {
            if !seen.insert(parent.as_str()) {
                break;
            }
            out.push(parent.clone());
            current = self.superclasses.get(parent);
        }
        out
    }

    /// Explicit versions of the class, else of the nearest ancestor that
    /// has some, else the default version.
    pub fn class_versions(&self, class_name: &str) -> Vec<String> {
        std::iter::once(class_name.to_string())
            .chain(self.ancestors(class_name))
            .find_map(|name| {
                self.class_versions
                    .get(&name)
                    .filter(|versions| !versions.is_empty())
                    .cloned()
            })
            .unwrap_or_else(|| vec![self.config.default_version.clone()])
    }

    pub fn available_versions(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    // -- classes --

    /// Create or update the class in each of its versions. Returns the
    /// versions touched; an ignored class touches none.
    pub fn define_class(&mut self, decl: &ClassDecl) -> Result<Vec<String>> {
        if self.is_ignored(&decl.name, None) {
            tracing::debug!(class = %decl.name, "ignored");
            return Ok(Vec::new());
        }
        if let Some(parent) = &decl.superclass {
            self.set_superclass(&decl.name, parent);
        }
        let versions = if decl.versions.is_empty() {
            self.class_versions(&decl.name)
        } else {
            decl.versions.clone()
        };
        let id = self.config.class_id(&decl.name);
        for version in &versions {
            self.ensure_class(&decl.name, version);
            let properties = self.scope(&decl.name).evaluate(&decl.properties)?;
            let class = self
                .classes
                .get_mut(version)
                .and_then(|by_id| by_id.get_mut(&id))
                .ok_or_else(|| Error::UnknownClass { key: id.clone() })?;
            class.update_from(decl, properties, self.markup.as_ref(), &self.config.sections)?;
            if let Some(info) = &decl.app_info {
                self.app_info.insert(version.clone(), info.clone());
            }
            self.index_refs(version, &id);
        }
        self.set_class_versions(&decl.name, versions.clone());
        Ok(versions)
    }

    /// Make a class usable as a parameter type before it is built, so
    /// properties may name classes declared later.
    fn declare_class_type(&self, decl: &ClassDecl) {
        if self.is_ignored(&decl.name, None) {
            return;
        }
        let id = self.config.class_id(&decl.name);
        for key in [&id, &decl.name].into_iter().chain(&decl.refs) {
            self.engine.register_type(key.as_str(), TypeDef::documented());
        }
    }

    fn ensure_class(&mut self, class_name: &str, version: &str) {
        let id = self.config.class_id(class_name);
        let by_id = self.classes.entry(version.to_string()).or_default();
        if by_id.contains_key(&id) {
            return;
        }
        tracing::debug!(%version, class = %id, "class described");
        by_id.insert(id.clone(), ClassDescription::new(class_name, id.clone(), version));
        self.index_refs(version, &id);
    }

    /// Register the class's reference keys. On a collision the first
    /// registration stays.
    fn index_refs(&mut self, version: &str, id: &str) {
        let Some(class) = self.classes.get(version).and_then(|by_id| by_id.get(id)) else {
            return;
        };
        let keys: Vec<String> = class.ref_keys().into_iter().map(String::from).collect();
        let index = self.refs.entry(version.to_string()).or_default();
        for key in keys {
            match index.get(&key) {
                Some(existing) if existing != id => {
                    tracing::warn!(%version, reference = %key, kept = %existing, ignored = %id, "reference key collision");
                }
                Some(_) => {}
                None => {
                    index.insert(key.clone(), id.to_string());
                }
            }
            self.engine.register_type(key, TypeDef::documented());
        }
    }

    /// Class by id or reference key within one version.
    pub fn find_class(&self, version: &str, key: &str) -> Option<&ClassDescription> {
        let by_id = self.classes.get(version)?;
        by_id.get(key).or_else(|| {
            let id = self.refs.get(version)?.get(key)?;
            by_id.get(id)
        })
    }

    /// Look up a class by key (`key` or `version#key`) or by handle. An
    /// explicit version in the key wins over `version`, which wins over the
    /// default.
    pub fn class_description<'a>(
        &self,
        class: impl Into<ClassRef<'a>>,
        version: Option<&str>,
    ) -> Option<&ClassDescription> {
        let default = self.config.default_version.as_str();
        match class.into() {
            ClassRef::Key(key) => match key.split_once('#') {
                Some((explicit, key)) => self.find_class(explicit, key),
                None => self.find_class(version.unwrap_or(default), key),
            },
            ClassRef::Handle(handle) => {
                let id = self.config.class_id(handle.name());
                self.find_class(version.unwrap_or(default), &id)
                    .filter(|class| class.class_name() == handle.name())
            }
        }
    }

    /// Every version of a class, oldest version key first.
    pub fn class_descriptions(&self, class_name: &str) -> Vec<&ClassDescription> {
        let handle = ClassHandle::new(class_name);
        self.classes
            .keys()
            .filter_map(|version| self.class_description(&handle, Some(version)))
            .collect()
    }

    // -- methods --

    /// `Class#method` or `version#Class#method`. Fails when the class is
    /// unknown; an unknown method on a known class is `Ok(None)`.
    pub fn method_description(&self, key: &str) -> Result<Option<&MethodDescription>> {
        let (class_key, method) = key
            .rsplit_once('#')
            .ok_or_else(|| Error::UnknownClass { key: key.to_string() })?;
        let class = self
            .class_description(class_key, None)
            .ok_or_else(|| Error::UnknownClass {
                key: class_key.to_string(),
            })?;
        Ok(class.method(method))
    }

    pub fn method_descriptions(&self, class_name: &str, method: &str) -> Vec<&MethodDescription> {
        self.class_descriptions(class_name)
            .into_iter()
            .filter_map(|class| class.method(method))
            .collect()
    }

    /// Define a method in each of its versions, replacing any previous
    /// definition. A class that is not documented yet is created bare.
    pub fn define_method(&mut self, class_name: &str, decl: &MethodDecl) -> Result<Vec<String>> {
        if self.is_ignored(class_name, Some(&decl.name)) {
            tracing::debug!(class = %class_name, method = %decl.name, "ignored");
            return Ok(Vec::new());
        }
        let versions = if decl.versions.is_empty() {
            self.class_versions(class_name)
        } else {
            decl.versions.clone()
        };
        self.remove_method(class_name, &versions, &decl.name);

        let id = self.config.class_id(class_name);
        for version in &versions {
            self.ensure_class(class_name, version);
            let method = {
                let owner = self
                    .find_class(version, &id)
                    .ok_or_else(|| Error::UnknownClass { key: id.clone() })?;
                MethodDescription::build(owner, decl, &self.scope(class_name))?
            };
            if let Some(class) = self.classes.get_mut(version).and_then(|by_id| by_id.get_mut(&id)) {
                class.add_method(method);
            }
        }
        Ok(versions)
    }

    /// Detach a method from the given versions. Absent methods are skipped.
    pub fn remove_method(&mut self, class_name: &str, versions: &[String], method: &str) {
        let id = self.config.class_id(class_name);
        for version in versions {
            if let Some(class) = self.classes.get_mut(version).and_then(|by_id| by_id.get_mut(&id)) {
                class.remove_method(method);
            }
        }
    }

    pub fn update_method(&mut self, update: &MethodUpdate) -> Result<()> {
        let versions = if update.versions.is_empty() {
            self.class_versions(&update.class)
        } else {
            update.versions.clone()
        };
        let id = self.config.class_id(&update.class);
        let scope = Scope::new(&self.engine, &self.groups, self.markup.as_ref(), update.class.as_str());
        let mut touched = false;
        for version in &versions {
            let Some(method) = self
                .classes
                .get_mut(version)
                .and_then(|by_id| by_id.get_mut(&id))
                .and_then(|class| class.method_mut(&update.name))
            else {
                continue;
            };
            method.update(update, &scope)?;
            touched = true;
        }
        if touched {
            Ok(())
        } else {
            Err(Error::UnknownMethod {
                class: update.class.clone(),
                method: update.name.clone(),
            })
        }
    }

    /// Tags of the ancestors (root first), then the class, then the method,
    /// without repeats.
    pub fn method_tags(&self, version: &str, class_name: &str, own: &[String]) -> Vec<String> {
        let mut chain = self.ancestors(class_name);
        chain.reverse();
        chain.push(class_name.to_string());

        let mut tags: Vec<String> = Vec::new();
        let class_tags = chain.iter().filter_map(|name| {
            self.class_description(&ClassHandle::new(name.as_str()), Some(version))
                .map(ClassDescription::tags)
        });
        for tag in class_tags.flatten().chain(own) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Target of a `see` link. `owner` is the id of the class the link was
    /// declared in; `from` names the declaring method in errors.
    pub fn resolve_see(
        &self,
        version: &str,
        owner: &str,
        from: &str,
        see: &SeeDescription,
    ) -> Result<&MethodDescription> {
        let found = match (&see.scope, see.link.rsplit_once('#')) {
            (Some(scope), _) => self
                .find_class(version, scope)
                .and_then(|class| class.method(&see.link)),
            (None, Some((class_key, method))) => {
                let (version, key) = class_key.split_once('#').unwrap_or((version, class_key));
                self.find_class(version, key)
                    .and_then(|class| class.method(method))
            }
            (None, None) => self
                .find_class(version, owner)
                .and_then(|class| class.method(&see.link)),
        };
        found.ok_or_else(|| Error::UnresolvedReference {
            from: from.to_string(),
            link: see.link.clone(),
        })
    }

    // -- queries --

    /// Application description for a version: declared by a class, else
    /// configured, else the configured default version's, else a stock text.
    pub fn app_info(&self, version: &str) -> &str {
        let default = &self.config.default_version;
        self.app_info
            .get(version)
            .or_else(|| self.config.app_info.get(version))
            .or_else(|| self.app_info.get(default))
            .or_else(|| self.config.app_info.get(default))
            .map(String::as_str)
            .unwrap_or(DEFAULT_APP_INFO)
    }

    /// Serialize the part of the registry the query selects. Unknown
    /// versions, classes or methods give an empty tree.
    pub fn query(&self, query: &Query) -> Result<DocTree> {
        query.check_keys()?;
        let version = query
            .version
            .as_deref()
            .unwrap_or(&self.config.default_version);
        let section = query
            .section
            .as_deref()
            .unwrap_or(&self.config.default_section);
        let locale = query
            .language
            .as_deref()
            .or(Some(self.config.default_locale.as_str()));
        let cx = DocContext::new(self, version, locale, &query.url_prefix);

        let mut classes = BTreeMap::new();
        if let Some(by_id) = self.classes.get(version) {
            match &query.class {
                None => {
                    for (id, class) in by_id {
                        if class.in_section(section) {
                            classes.insert(id.clone(), class.docs(&cx, None)?);
                        }
                    }
                }
                Some(key) => {
                    let selected = self.find_class(version, key).filter(|class| {
                        class.in_section(section)
                            && query.method.as_deref().map_or(true, |m| class.has_method(m))
                    });
                    if let Some(class) = selected {
                        classes.insert(
                            class.id().to_string(),
                            class.docs(&cx, query.method.as_deref())?,
                        );
                    }
                }
            }
        }

        let info = self.markup.to_html(&cx.translate(self.app_info(version)));
        let url_path = if self.config.version_in_url { version } else { "" };
        Ok(DocTree {
            docs: Docs {
                name: self.config.app_name.clone(),
                info,
                copyright: self.config.copyright.clone(),
                doc_url: cx.full_url(url_path),
                dsl_url: self.config.dsl_base_url(version).to_string(),
                classes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn decls(value: Value) -> Declarations {
        serde_json::from_value(value).unwrap()
    }

    fn build(value: Value) -> (Registry, BuildReport) {
        RegistryBuilder::new(Config::default())
            .build(&decls(value))
            .unwrap()
    }

    #[test]
    fn invalid_config_fails_build() {
        let config = Config {
            default_version: String::new(),
            ..Config::default()
        };
        assert!(RegistryBuilder::new(config).empty().is_err());
    }

    #[test]
    fn version_inherited_from_ancestor() {
        let (registry, report) = build(json!({
            "classes": [
                {"name": "Base", "versions": ["2.0"]},
                {"name": "Child", "superclass": "Base"}
            ]
        }));
        assert!(report.is_clean());
        assert_eq!(registry.class_versions("Child"), ["2.0"]);
        assert!(registry.class_description("2.0#Child", None).is_some());
        assert!(registry.class_description("Child", None).is_none());
    }

    #[test]
    fn classes_declared_later_are_known_types() {
        let (registry, report) = build(json!({
            "classes": [
                {"name": "Post", "properties": [{"param": {"name": "author", "validator": "User"}}]},
                {"name": "Writer", "properties": [{"param": {"name": "member", "validator": "Account"}}]},
                {"name": "User", "refs": ["Account"]}
            ]
        }));
        assert!(report.is_clean(), "{:?}", report.failures);
        let post = registry.class_description("Post", None).unwrap();
        assert_eq!(post.properties()[0].name(), "author");
    }

    #[test]
    fn unresolved_lazy_type_fails_the_query() {
        let (registry, report) = build(json!({
            "classes": [{"name": "IO", "methods": [
                {"name": "chown", "params": [{"param": {"name": "owner", "validator": {"lazy": "Ghost"}}}]}
            ]}]
        }));
        assert!(report.is_clean());
        let err = registry.query(&Query::new()).unwrap_err();
        match err {
            Error::UnresolvedType { param, type_name } => {
                assert_eq!(param, "owner");
                assert_eq!(type_name, "Ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let mut registry = RegistryBuilder::new(Config::default()).empty().unwrap();
        registry.set_superclass("A", "B");
        registry.set_superclass("B", "A");
        assert_eq!(registry.ancestors("A"), ["B"]);
        assert_eq!(registry.class_versions("A"), ["1.0"]);
    }

    #[test]
    fn method_on_undocumented_class_creates_it() {
        let (registry, report) = build(json!({
            "methods": [{"class": "DSL::IO", "name": "puts"}]
        }));
        assert!(report.is_clean());
        let class = registry.class_description("IO", None).unwrap();
        assert_eq!(class.class_name(), "DSL::IO");
        assert!(class.has_method("puts"));
    }

    #[test]
    fn redefinition_replaces_method() {
        let mut registry = RegistryBuilder::new(Config::default()).empty().unwrap();
        let first: MethodDecl = serde_json::from_value(json!({"name": "puts", "short_description": "one"})).unwrap();
        let second: MethodDecl = serde_json::from_value(json!({"name": "puts", "short_description": "two"})).unwrap();
        registry.define_method("IO", &first).unwrap();
        registry.define_method("IO", &second).unwrap();
        let class = registry.class_description("IO", None).unwrap();
        assert_eq!(class.methods().len(), 1);
        assert_eq!(class.methods()[0].short_description(), "two");
    }

    #[test]
    fn failures_are_scoped() {
        let (registry, report) = build(json!({
            "classes": [{"name": "IO", "methods": [
                {"name": "broken", "params": [{"param": {"name": "x", "validator": "Ghost"}}]},
                {"name": "fine"}
            ]}]
        }));
        assert_eq!(report.len(), 1);
        assert_eq!(report.failures[0].entity, "method IO#broken");
        let class = registry.class_description("IO", None).unwrap();
        assert!(class.has_method("fine"));
        assert!(!class.has_method("broken"));
    }

    #[test]
    fn handle_lookup_matches_code_name() {
        let (registry, _) = build(json!({"classes": [{"name": "DSL::IO"}]}));
        assert!(registry.class_description(&ClassHandle::new("DSL::IO"), None).is_some());
        assert!(registry.class_description(&ClassHandle::new("Other::IO"), None).is_none());
    }

    #[test]
    fn method_description_keys() {
        let (registry, _) = build(json!({
            "classes": [{"name": "IO", "versions": ["1.0", "2.0"], "methods": [{"name": "puts"}]}]
        }));
        assert!(registry.method_description("IO#puts").unwrap().is_some());
        assert!(registry.method_description("2.0#IO#puts").unwrap().is_some());
        assert!(registry.method_description("IO#nope").unwrap().is_none());
        assert!(matches!(
            registry.method_description("Ghost#puts"),
            Err(Error::UnknownClass { .. })
        ));
        assert_eq!(registry.method_descriptions("IO", "puts").len(), 2);
        assert_eq!(registry.available_versions(), ["1.0", "2.0"]);
    }

    #[test]
    fn ignored_entities_are_skipped() {
        let config = Config {
            ignored: vec!["Secret".to_string(), "IO#close".to_string()],
            ..Config::default()
        };
        let (registry, report) = RegistryBuilder::new(config)
            .build(&decls(json!({
                "classes": [
                    {"name": "Secret"},
                    {"name": "IO", "methods": [{"name": "close"}, {"name": "open"}]}
                ]
            })))
            .unwrap();
        assert!(report.is_clean());
        assert!(registry.class_description("Secret", None).is_none());
        let io = registry.class_description("IO", None).unwrap();
        assert!(io.has_method("open"));
        assert!(!io.has_method("close"));
    }

    #[test]
    fn reference_collision_keeps_first() {
        let (registry, _) = build(json!({
            "classes": [
                {"name": "User", "refs": ["Account"]},
                {"name": "Admin", "refs": ["Account"]}
            ]
        }));
        assert_eq!(registry.find_class("1.0", "Account").map(|c| c.id()), Some("User"));
    }

    #[test]
    fn tags_walk_ancestors_root_first() {
        let (registry, _) = build(json!({
            "classes": [
                {"name": "Base", "tags": ["core"]},
                {"name": "IO", "superclass": "Base", "tags": ["io", "core"]}
            ]
        }));
        let tags = registry.method_tags("1.0", "IO", &["write".to_string(), "io".to_string()]);
        assert_eq!(tags, ["core", "io", "write"]);
    }

    #[test]
    fn update_of_unknown_method_fails() {
        let (_, report) = build(json!({
            "classes": [{"name": "IO"}],
            "updates": [{"class": "IO", "name": "ghost"}]
        }));
        assert!(matches!(report.failures[0].error, Error::UnknownMethod { .. }));
    }

    #[test]
    fn app_info_fallbacks() {
        let (registry, _) = build(json!({
            "classes": [{"name": "IO", "versions": ["1.0"], "app_info": "Shell helpers"}]
        }));
        assert_eq!(registry.app_info("1.0"), "Shell helpers");
        assert_eq!(registry.app_info("9.9"), "Shell helpers");
        let (empty, _) = build(json!({}));
        assert_eq!(empty.app_info("1.0"), DEFAULT_APP_INFO);
    }
}
