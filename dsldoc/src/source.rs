//! Declaration files on disk.

use anyhow::{Context, Result};
use dsldoc_core::error::BoxError;
use dsldoc_core::{DeclarationSource, Declarations};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions recognized as declaration files.
const SUPPORTED_EXTENSIONS: &[&str] = &["json"];

/// Declarations read from a fixed list of JSON files. Every `collect`
/// re-reads the files, so a reload picks up edits.
pub struct FileSource {
    files: Vec<PathBuf>,
}

impl FileSource {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let files = expand_globs(patterns)?;
        if files.is_empty() {
            anyhow::bail!("no declaration files found");
        }
        Ok(Self { files })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl DeclarationSource for FileSource {
    fn collect(&self) -> Result<Declarations, BoxError> {
        let mut decls = Declarations::default();
        for path in &self.files {
            decls.extend(read_file(path)?);
        }
        tracing::debug!(files = self.files.len(), "declarations collected");
        Ok(decls)
    }
}

fn read_file(path: &Path) -> Result<Declarations, BoxError> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let decls: Declarations = serde_json::from_str(&content)
        .map_err(|e| format!("invalid declarations in {}: {e}", path.display()))?;
    Ok(decls)
}

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for supported file types.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // directories are scanned one level deep
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                let supported = p
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));
                if p.is_file() && supported {
                    files.push(p);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!("no files matched: {pattern}");
        }
        files.extend(matches);
    }
    // declaration order across files must not depend on the shell
    files.sort();
    files.dedup();
    Ok(files)
}
