//! Reloadable document store.
//!
//! Readers take a snapshot and keep using it for as long as they like; a
//! reload builds a complete new registry off to the side and swaps it in
//! atomically. Reloads are serialized by a lock, readers never block.

use crate::decl::Declarations;
use crate::error::{BoxError, Error, Result};
use crate::query::{DocTree, Query};
use crate::registry::{BuildReport, Registry, RegistryBuilder};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Produces the declarations a registry is built from.
pub trait DeclarationSource: Send + Sync {
    fn collect(&self) -> std::result::Result<Declarations, BoxError>;
}

impl DeclarationSource for Declarations {
    fn collect(&self) -> std::result::Result<Declarations, BoxError> {
        Ok(self.clone())
    }
}

pub struct DocStore {
    builder: RegistryBuilder,
    source: Box<dyn DeclarationSource>,
    snap: ArcSwap<Registry>,
    reload_lock: Mutex<()>,
}

impl DocStore {
    /// Collect and build the first snapshot.
    pub fn open(builder: RegistryBuilder, source: impl DeclarationSource + 'static) -> Result<(Self, BuildReport)> {
        let decls = source.collect().map_err(Error::Collection)?;
        let (registry, report) = builder.build(&decls)?;
        let store = Self {
            builder,
            source: Box::new(source),
            snap: ArcSwap::from_pointee(registry),
            reload_lock: Mutex::new(()),
        };
        Ok((store, report))
    }

    /// Current registry. Stays valid across reloads.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.snap.load_full()
    }

    /// Rebuild from the source. On a collection failure the current
    /// snapshot stays active.
    pub fn reload(&self) -> Result<BuildReport> {
        let _guard = self.reload_lock.lock();
        let decls = self.source.collect().map_err(|e| {
            tracing::warn!("reload aborted, keeping current documentation: {e}");
            Error::Collection(e)
        })?;
        let (registry, report) = self.builder.build(&decls)?;
        self.snap.store(Arc::new(registry));
        tracing::info!(failures = report.len(), "documentation reloaded");
        Ok(report)
    }

    pub fn query(&self, query: &Query) -> Result<DocTree> {
        self.snapshot().query(query)
    }
}
