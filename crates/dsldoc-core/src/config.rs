//! Registry configuration.
//!
//! Every field has a default so an empty TOML/JSON document is a valid
//! configuration.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app_name: String,
    pub copyright: Option<String>,
    /// Root of every generated `doc_url`.
    pub doc_base_url: String,
    pub default_version: String,
    pub version_in_url: bool,
    /// Use `A::B::C` as the class id instead of `C`.
    pub class_full_names: bool,
    pub sections: Vec<String>,
    pub default_section: String,
    pub languages: Vec<String>,
    pub default_locale: String,
    /// version → application description
    pub app_info: BTreeMap<String, String>,
    /// version → base url of the described DSL
    pub dsl_base_url: BTreeMap<String, String>,
    /// `Class` or `Class#method` entries left out of the registry.
    pub ignored: Vec<String>,
    pub validate: bool,
    pub validate_value: bool,
    pub link_extension: String,
    pub cache_dir: Option<String>,
    /// locale → source text → translated text
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Another DOC".to_string(),
            copyright: None,
            doc_base_url: "/apipie-dsl".to_string(),
            default_version: "1.0".to_string(),
            version_in_url: true,
            class_full_names: false,
            sections: vec!["all".to_string()],
            default_section: "all".to_string(),
            languages: Vec::new(),
            default_locale: "en".to_string(),
            app_info: BTreeMap::new(),
            dsl_base_url: BTreeMap::new(),
            ignored: Vec::new(),
            validate: true,
            validate_value: true,
            link_extension: ".html".to_string(),
            cache_dir: None,
            translations: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.default_version.trim().is_empty() {
            return Err(Error::Configuration(
                "default_version must not be empty".to_string(),
            ));
        }
        if self.default_version.contains('#') {
            return Err(Error::Configuration(format!(
                "default_version {:?} must not contain '#'",
                self.default_version
            )));
        }
        if self.doc_base_url.trim().is_empty() {
            return Err(Error::Configuration(
                "doc_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Values are validated only when both switches are on.
    pub fn validate_value(&self) -> bool {
        self.validate && self.validate_value
    }

    pub fn cache_dir(&self) -> Result<&Path> {
        self.cache_dir
            .as_deref()
            .map(Path::new)
            .ok_or_else(|| Error::Configuration("cache_dir is not configured".to_string()))
    }

    pub fn is_ignored(&self, class_name: &str, method: Option<&str>) -> bool {
        if self.ignored.iter().any(|entry| entry == class_name) {
            return true;
        }
        match method {
            Some(method) => {
                let key = format!("{class_name}#{method}");
                self.ignored.iter().any(|entry| *entry == key)
            }
            None => false,
        }
    }

    /// Class id as shown in urls and query results.
    pub fn class_id(&self, class_name: &str) -> String {
        if self.class_full_names {
            class_name.to_string()
        } else {
            class_name
                .rsplit("::")
                .next()
                .unwrap_or(class_name)
                .to_string()
        }
    }

    pub fn dsl_base_url(&self, version: &str) -> &str {
        self.dsl_base_url
            .get(version)
            .or_else(|| self.dsl_base_url.get(&self.default_version))
            .map(String::as_str)
            .unwrap_or("/dsl")
    }
}
