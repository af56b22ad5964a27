//! Static JSON page generation.
//!
//! Layout under the output directory, per version and language:
//!
//! ```text
//! <version>[.<lang>].json                     whole version
//! <version>/<section>[.<lang>].json           one per configured section
//! <version>/<class>[.<lang>].json
//! <version>/<class>/<method>[.<lang>].json
//! ```

use anyhow::{Context, Result};
use dsldoc_core::{DocTree, Query, Registry};
use std::fs;
use std::path::{Path, PathBuf};

/// Options shared by every page of one run.
pub struct PageOptions<'a> {
    pub out_dir: &'a Path,
    pub url_prefix: &'a str,
    /// Restrict generation to one version.
    pub version: Option<&'a str>,
}

/// Write every page; returns the number of files written.
pub fn generate(registry: &Registry, opts: &PageOptions<'_>) -> Result<usize> {
    let config = registry.config();
    let versions: Vec<&str> = match opts.version {
        Some(version) => vec![version],
        None => registry.available_versions(),
    };
    let languages: Vec<Option<&str>> = std::iter::once(None)
        .chain(config.languages.iter().map(|lang| Some(lang.as_str())))
        .collect();

    let mut written = 0;
    for version in versions {
        let version_dir = opts.out_dir.join(version);
        for &lang in &languages {
            let base = || {
                let mut query = Query::new().version(version).url_prefix(opts.url_prefix);
                if let Some(lang) = lang {
                    query = query.language(lang);
                }
                query
            };

            let index = registry.query(&base())?;
            write_page(&page_path(opts.out_dir, version, lang), &index)?;
            written += 1;

            for section in &config.sections {
                let doc = registry.query(&base().section(section.as_str()))?;
                write_page(&page_path(&version_dir, section, lang), &doc)?;
                written += 1;
            }

            for (id, class) in &index.docs.classes {
                let doc = registry.query(&base().class(id.as_str()))?;
                write_page(&page_path(&version_dir, id, lang), &doc)?;
                written += 1;

                let class_dir = version_dir.join(id);
                for method in &class.methods {
                    let doc = registry.query(&base().class(id.as_str()).method(method.name.as_str()))?;
                    write_page(&page_path(&class_dir, &method.name, lang), &doc)?;
                    written += 1;
                }
            }
        }
        tracing::debug!(version, "pages generated");
    }
    Ok(written)
}

fn page_path(dir: &Path, name: &str, lang: Option<&str>) -> PathBuf {
    match lang {
        Some(lang) => dir.join(format!("{name}.{lang}.json")),
        None => dir.join(format!("{name}.json")),
    }
}

fn write_page(path: &Path, doc: &DocTree) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let mut json = doc.to_json_pretty()?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
