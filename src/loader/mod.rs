//! Source loading - typed tables from the dashboard workbook
//!
//! The engine only sees a [`Dataset`]; where it came from is behind the
//! [`SourceLoader`] trait. Loaded datasets are kept in an explicit
//! [`SourceCache`] keyed by source identity and content version.

pub mod cache;
pub mod cells;
pub mod workbook;

use anyhow::Result;

use crate::engine::WideAllocationTable;
use crate::models::{AnnualSnapshot, AssetPosition, MonthlySnapshot};

pub use cache::SourceCache;
pub use workbook::WorkbookLoader;

/// The four source tables of one load cycle. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Sorted ascending by date
    pub monthly: Vec<MonthlySnapshot>,
    /// Sorted ascending by date
    pub annual: Vec<AnnualSnapshot>,
    pub historical: WideAllocationTable,
    pub positions: Vec<AssetPosition>,
}

/// Raw content of a source at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnapshot {
    /// blake3 digest of `bytes`
    pub version: String,
    pub bytes: Vec<u8>,
}

impl SourceSnapshot {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            version: blake3::hash(&bytes).to_hex().to_string(),
            bytes,
        }
    }
}

/// Anything that can produce a [`Dataset`]
pub trait SourceLoader {
    /// Stable identity of the source (cache key)
    fn identity(&self) -> String;

    /// Read the current content; its version decides whether the cache reloads
    fn read(&self) -> Result<SourceSnapshot>;

    /// Validate and type all four tables of a snapshot taken by [`SourceLoader::read`]
    fn parse(&self, snapshot: &SourceSnapshot) -> Result<Dataset>;

    fn load(&self) -> Result<Dataset> {
        self.parse(&self.read()?)
    }
}
