//! Class descriptions: one per documented class and version.

use crate::decl::ClassDecl;
use crate::error::Result;
use crate::markup::Markup;
use crate::method::{MethodDescription, MethodDoc};
use crate::param::{ParamDoc, ParameterDescription};
use crate::query::DocContext;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub struct ClassDescription {
    /// Name as written in code, e.g. `DSL::IO`.
    class_name: String,
    id: String,
    /// Display name.
    name: String,
    version: String,
    short_description: Option<String>,
    full_description: String,
    deprecated: bool,
    show: bool,
    metadata: Option<Value>,
    /// Empty means every section.
    sections: Vec<String>,
    tags: Vec<String>,
    refs: Vec<String>,
    properties: Vec<ParameterDescription>,
    dsl_base_url: Option<String>,
    /// Declaration order.
    methods: Vec<MethodDescription>,
}

impl ClassDescription {
    pub fn new(class_name: impl Into<String>, id: impl Into<String>, version: impl Into<String>) -> Self {
        let class_name = class_name.into();
        Self {
            name: class_name.clone(),
            class_name,
            id: id.into(),
            version: version.into(),
            short_description: None,
            full_description: String::new(),
            deprecated: false,
            show: true,
            metadata: None,
            sections: Vec::new(),
            tags: Vec::new(),
            refs: Vec::new(),
            properties: Vec::new(),
            dsl_base_url: None,
            methods: Vec::new(),
        }
    }

    /// Apply a class declaration. Only the fields the declaration sets are
    /// overridden; properties are merged into the existing ones.
    pub(crate) fn update_from(
        &mut self,
        decl: &ClassDecl,
        properties: Vec<ParameterDescription>,
        markup: &dyn Markup,
        configured_sections: &[String],
    ) -> Result<()> {
        if let Some(label) = &decl.label {
            self.name = label.clone();
        }
        if let Some(short) = &decl.short_description {
            self.short_description = Some(short.clone());
        }
        if let Some(text) = &decl.description {
            self.full_description = markup.to_html(text);
        }
        if let Some(deprecated) = decl.deprecated {
            self.deprecated = deprecated;
        }
        if let Some(show) = decl.show {
            self.show = show;
        }
        if let Some(meta) = &decl.meta {
            self.metadata = Some(meta.clone());
        }
        if let Some(sections) = &decl.sections {
            self.sections = sections.resolve(configured_sections);
        }
        if let Some(url) = &decl.dsl_base_url {
            self.dsl_base_url = Some(url.clone());
        }
        push_unique(&mut self.tags, &decl.tags);
        push_unique(&mut self.refs, &decl.refs);
        ParameterDescription::merge(&mut self.properties, properties)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    pub fn full_description(&self) -> &str {
        &self.full_description
    }

    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn show(&self) -> bool {
        self.show
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Reference keys other entities may use for this class: the id, the
    /// code name and every declared ref.
    pub fn ref_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.id.as_str()];
        for key in std::iter::once(self.class_name.as_str()).chain(self.refs.iter().map(String::as_str)) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    pub fn properties(&self) -> &[ParameterDescription] {
        &self.properties
    }

    /// Properties that carry a validator.
    pub fn property_descriptions(&self) -> impl Iterator<Item = &ParameterDescription> {
        self.properties.iter().filter(|p| p.is_documented())
    }

    pub fn dsl_base_url(&self) -> Option<&str> {
        self.dsl_base_url.as_deref()
    }

    /// Undeclared sections mean every section; querying `all` lists every
    /// class.
    pub fn in_section(&self, section: &str) -> bool {
        self.sections.is_empty() || section == "all" || self.sections.iter().any(|s| s == section)
    }

    pub fn add_method(&mut self, method: MethodDescription) {
        tracing::debug!(version = %self.version, class = %self.id, method = %method.name(), "method described");
        self.remove_method(method.name());
        self.methods.push(method);
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescription> {
        self.methods.iter().find(|m| m.name() == name)
    }

    pub(crate) fn method_mut(&mut self, name: &str) -> Option<&mut MethodDescription> {
        self.methods.iter_mut().find(|m| m.name() == name)
    }

    /// Detach a method. Removing an absent method is a no-op.
    pub fn remove_method(&mut self, name: &str) -> Option<MethodDescription> {
        let index = self.methods.iter().position(|m| m.name() == name)?;
        Some(self.methods.remove(index))
    }

    pub fn methods(&self) -> &[MethodDescription] {
        &self.methods
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub(crate) fn doc_url(&self, cx: &DocContext<'_>) -> String {
        if cx.config().version_in_url {
            cx.full_url(&format!("{}/{}", self.version, self.id))
        } else {
            cx.full_url(&self.id)
        }
    }

    /// Serialize, limited to `only_method` when given.
    pub(crate) fn docs(&self, cx: &DocContext<'_>, only_method: Option<&str>) -> Result<ClassDoc> {
        let methods = self
            .methods
            .iter()
            .filter(|m| only_method.map_or(true, |name| m.name() == name))
            .map(|m| m.docs(cx))
            .collect::<Result<Vec<_>>>()?;
        let dsl_url = self
            .dsl_base_url
            .clone()
            .unwrap_or_else(|| cx.config().dsl_base_url(&self.version).to_string());

        Ok(ClassDoc {
            id: self.id.clone(),
            doc_url: self.doc_url(cx),
            dsl_url,
            name: self.name.clone(),
            short_description: self.short_description.as_deref().map(|s| cx.translate(s)),
            full_description: cx.translate(&self.full_description),
            version: self.version.clone(),
            metadata: self.metadata.clone(),
            properties: self
                .property_descriptions()
                .map(|p| p.docs(cx))
                .collect::<Result<_>>()?,
            methods,
            deprecated: self.deprecated,
            show: self.show,
            sections: self.sections.clone(),
        })
    }
}

fn push_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDoc {
    pub id: String,
    pub doc_url: String,
    pub dsl_url: String,
    pub name: String,
    pub short_description: Option<String>,
    pub full_description: String,
    pub version: String,
    pub metadata: Option<Value>,
    pub properties: Vec<ParamDoc>,
    pub methods: Vec<MethodDoc>,
    pub deprecated: bool,
    pub show: bool,
    pub sections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::SectionsDecl;
    use crate::markup::PlainText;

    #[test]
    fn upsert_keeps_unset_fields() {
        let mut class = ClassDescription::new("DSL::IO", "IO", "1.0");
        let first = ClassDecl {
            name: "DSL::IO".to_string(),
            short_description: Some("Input/output".to_string()),
            tags: vec!["io".to_string()],
            ..ClassDecl::default()
        };
        class.update_from(&first, Vec::new(), &PlainText, &[]).unwrap();
        let second = ClassDecl {
            name: "DSL::IO".to_string(),
            description: Some("Longer text".to_string()),
            tags: vec!["io".to_string(), "core".to_string()],
            ..ClassDecl::default()
        };
        class.update_from(&second, Vec::new(), &PlainText, &[]).unwrap();
        assert_eq!(class.short_description(), Some("Input/output"));
        assert_eq!(class.full_description(), "Longer text");
        assert_eq!(class.tags(), ["io", "core"]);
    }

    #[test]
    fn sections_filter() {
        let mut class = ClassDescription::new("Report", "Report", "1.0");
        assert!(class.in_section("reports"));
        let decl = ClassDecl {
            name: "Report".to_string(),
            sections: Some(SectionsDecl {
                only: vec!["reports".to_string()],
                except: Vec::new(),
            }),
            ..ClassDecl::default()
        };
        class
            .update_from(&decl, Vec::new(), &PlainText, &["all".to_string()])
            .unwrap();
        assert!(class.in_section("reports"));
        assert!(class.in_section("all"));
        assert!(!class.in_section("plugins"));
    }

    #[test]
    fn ref_keys_are_unique() {
        let mut class = ClassDescription::new("User", "User", "1.0");
        let decl = ClassDecl {
            name: "User".to_string(),
            refs: vec!["User".to_string(), "Account".to_string()],
            ..ClassDecl::default()
        };
        class.update_from(&decl, Vec::new(), &PlainText, &[]).unwrap();
        assert_eq!(class.ref_keys(), ["User", "Account"]);
    }

    #[test]
    fn removing_absent_method_is_noop() {
        let mut class = ClassDescription::new("IO", "IO", "1.0");
        assert!(class.remove_method("nope").is_none());
        assert!(class.methods().is_empty());
    }
}
