//! Fixed, ordered universe of account holder identifiers
//!
//! The registry defines `totalElements` for every page request. It is
//! built once at startup and never mutated afterwards.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Opaque identifier naming one account holder
pub type Identifier = String;

/// Immutable ordered list of every known identifier
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    ids: Arc<[Identifier]>,
}

impl IdentifierRegistry {
    /// Create a registry from an ordered list of unique identifiers
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        let ids: Vec<Identifier> = ids.into_iter().map(Into::into).collect();

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if id.is_empty() {
                return Err(Error::Config("identifier must not be empty".to_string()));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::Config(format!("duplicate identifier: {}", id)));
            }
        }

        Ok(Self { ids: ids.into() })
    }

    /// Load identifiers from `HOLDER_IDS` or `HOLDER_IDS_FILE`
    ///
    /// `HOLDER_IDS` is a comma separated list. `HOLDER_IDS_FILE` points to
    /// a file with one identifier per line; blank lines and `#` comments
    /// are skipped.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        if let Ok(list) = std::env::var("HOLDER_IDS") {
            let registry = Self::parse_list(&list)?;
            info!("Loaded {} identifiers from HOLDER_IDS", registry.size());
            return Ok(registry);
        }

        if let Ok(path) = std::env::var("HOLDER_IDS_FILE") {
            let registry = Self::from_file(&path)?;
            info!("Loaded {} identifiers from {}", registry.size(), path);
            return Ok(registry);
        }

        Err(Error::Config(
            "neither HOLDER_IDS nor HOLDER_IDS_FILE is set".to_string(),
        ))
    }

    /// Load identifiers from a newline separated file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;

        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    fn parse_list(list: &str) -> Result<Self> {
        Self::new(list.split(',').map(str::trim).filter(|id| !id.is_empty()))
    }

    /// Total number of identifiers
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in `[from_index, to_index)`
    ///
    /// Bounds are clamped by the pagination engine; an out-of-range window
    /// here is an internal error.
    pub fn slice(&self, from_index: usize, to_index: usize) -> Result<&[Identifier]> {
        self.ids.get(from_index..to_index).ok_or_else(|| {
            Error::Internal(format!(
                "window [{}, {}) outside registry of {} identifiers",
                from_index,
                to_index,
                self.ids.len()
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.ids.iter()
    }
}
