//! Translator collaborators.
//!
//! Translation happens only when a query is serialized; the stored model is
//! locale-neutral.

use std::collections::BTreeMap;
use std::fmt::Debug;

pub trait Translator: Debug + Send + Sync {
    fn translate(&self, text: &str, locale: Option<&str>) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Translator for Identity {
    fn translate(&self, text: &str, _locale: Option<&str>) -> String {
        text.to_string()
    }
}

/// Lookup table translator: locale → source text → translation.
/// Unknown locales and missing entries fall back to the source text.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Catalog {
    pub fn new(entries: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translator for Catalog {
    fn translate(&self, text: &str, locale: Option<&str>) -> String {
        locale
            .and_then(|locale| self.entries.get(locale))
            .and_then(|table| table.get(text))
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut cs = BTreeMap::new();
        cs.insert("Prints text".to_string(), "Vypíše text".to_string());
        let mut entries = BTreeMap::new();
        entries.insert("cs".to_string(), cs);
        Catalog::new(entries)
    }

    #[test]
    fn catalog_translates_known_entry() {
        assert_eq!(catalog().translate("Prints text", Some("cs")), "Vypíše text");
    }

    #[test]
    fn catalog_falls_back_to_source() {
        let catalog = catalog();
        assert_eq!(catalog.translate("Prints text", None), "Prints text");
        assert_eq!(catalog.translate("Prints text", Some("de")), "Prints text");
        assert_eq!(catalog.translate("Other", Some("cs")), "Other");
    }
}
