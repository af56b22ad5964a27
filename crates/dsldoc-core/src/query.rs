//! Documentation queries and the serialized document tree.

use crate::class::ClassDoc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::registry::Registry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Lookup parameters. Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub version: Option<String>,
    pub class: Option<String>,
    pub method: Option<String>,
    pub language: Option<String>,
    pub section: Option<String>,
    /// Prepended to every generated url.
    pub url_prefix: String,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Keys end up in urls and file paths; anything that could climb out of
    /// the documentation root is rejected.
    pub(crate) fn check_keys(&self) -> Result<()> {
        let keys = [&self.version, &self.class, &self.method, &self.language, &self.section];
        for key in keys.into_iter().flatten() {
            if key.contains("..") || key.contains(&['/', '\\', '\0'][..]) {
                return Err(Error::InvalidQueryKey { key: key.clone() });
            }
        }
        Ok(())
    }
}

/// Join a url prefix, the documentation root and a relative path.
pub fn full_url(prefix: &str, base: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut url = format!("{prefix}{base}/{path}");
    if !(url.starts_with('/') || url.starts_with('.')) {
        url.insert(0, '/');
    }
    let trimmed = url.trim_end_matches('/').len();
    url.truncate(trimmed.max(1));
    url
}

/// Everything a serializer needs besides the entity itself.
pub struct DocContext<'a> {
    registry: &'a Registry,
    version: &'a str,
    locale: Option<&'a str>,
    prefix: &'a str,
}

impl<'a> DocContext<'a> {
    pub(crate) fn new(registry: &'a Registry, version: &'a str, locale: Option<&'a str>, prefix: &'a str) -> Self {
        Self {
            registry,
            version,
            locale,
            prefix,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn config(&self) -> &'a Config {
        self.registry.config()
    }

    pub fn version(&self) -> &'a str {
        self.version
    }

    pub fn translate(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.registry.translator().translate(text, self.locale)
    }

    pub fn full_url(&self, path: &str) -> String {
        full_url(self.prefix, &self.config().doc_base_url, path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocTree {
    pub docs: Docs,
}

#[derive(Debug, Clone, Serialize)]
pub struct Docs {
    pub name: String,
    pub info: String,
    pub copyright: Option<String>,
    pub doc_url: String,
    pub dsl_url: String,
    /// Keyed by class id.
    pub classes: BTreeMap<String, ClassDoc>,
}

impl DocTree {
    pub fn is_empty(&self) -> bool {
        self.docs.classes.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_joins_and_trims() {
        assert_eq!(full_url("", "/apipie-dsl", "1.0/IO"), "/apipie-dsl/1.0/IO");
        assert_eq!(full_url("", "/apipie-dsl", "/IO"), "/apipie-dsl/IO");
        assert_eq!(full_url("", "/apipie-dsl", ""), "/apipie-dsl");
        assert_eq!(full_url("", "docs", "IO"), "/docs/IO");
        assert_eq!(full_url(".", "/docs", "IO"), "./docs/IO");
        assert_eq!(full_url("", "/", ""), "/");
    }

    #[test]
    fn traversal_keys_rejected() {
        let bad = Query::new().class("../etc");
        assert!(matches!(bad.check_keys(), Err(Error::InvalidQueryKey { .. })));
        let slash = Query::new().version("1.0/x");
        assert!(slash.check_keys().is_err());
        let ok = Query::new().version("2.0").class("IO").method("puts?");
        assert!(ok.check_keys().is_ok());
    }
}
