//! Load cache keyed by source identity and version

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Dataset, SourceLoader};

#[derive(Debug)]
struct CachedDataset {
    version: String,
    dataset: Arc<Dataset>,
}

/// Holds loaded datasets for reuse across renders.
///
/// An entry is reused only while the source reports the same version. There
/// is no ambient global: the owner decides the cache's lifetime and calls
/// [`SourceCache::invalidate`] to force a reload.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<String, CachedDataset>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `loader`, loading it on a miss or when the
    /// source version changed
    pub fn get_or_load(&mut self, loader: &dyn SourceLoader) -> Result<Arc<Dataset>> {
        let identity = loader.identity();
        let snapshot = loader.read()?;

        if let Some(cached) = self.entries.get(&identity) {
            if cached.version == snapshot.version {
                debug!("Cache hit for {}", identity);
                return Ok(Arc::clone(&cached.dataset));
            }
            info!("Source {} changed; reloading", identity);
        }

        let dataset = Arc::new(loader.parse(&snapshot)?);
        self.entries.insert(
            identity,
            CachedDataset {
                version: snapshot.version,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Drop the entry for `identity`; returns whether one was present
    pub fn invalidate(&mut self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
