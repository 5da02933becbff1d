use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::srg::parse_srg;
use crate::table::MappingTable;
use crate::MappingError;

/// Target-platform version identifier (`1.12.2`, `1.20.1`, ...).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingVersion(String);

impl MappingVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MappingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappingVersion({})", self.0)
    }
}

impl fmt::Display for MappingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MappingVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&String> for MappingVersion {
    fn from(value: &String) -> Self {
        Self::new(value.as_str())
    }
}

/// Where mapping tables come from.
///
/// `Ok(None)` means the source has nothing for that version; the service then
/// falls back to the identity table.
pub trait MappingSource: Send + Sync {
    fn load(&self, version: &MappingVersion) -> Result<Option<Arc<MappingTable>>, MappingError>;
}

/// Reads one SRG file per version from disk.
#[derive(Debug, Default, Clone)]
pub struct SrgFileSource {
    files: HashMap<MappingVersion, PathBuf>,
}

impl SrgFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, version: impl Into<MappingVersion>, path: impl Into<PathBuf>) -> Self {
        self.insert(version, path);
        self
    }

    pub fn insert(&mut self, version: impl Into<MappingVersion>, path: impl Into<PathBuf>) {
        self.files.insert(version.into(), path.into());
    }
}

impl MappingSource for SrgFileSource {
    fn load(&self, version: &MappingVersion) -> Result<Option<Arc<MappingTable>>, MappingError> {
        let Some(path) = self.files.get(version) else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.clone(),
            source,
        })?;
        let table = parse_srg(version.as_str(), &text)?;
        tracing::debug!(
            target = "weft.mappings",
            version = %version,
            path = %path.display(),
            classes = table.class_count(),
            "loaded mapping table"
        );
        Ok(Some(Arc::new(table)))
    }
}

/// Serves tables that were built in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    tables: HashMap<MappingVersion, Arc<MappingTable>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: MappingTable) -> Self {
        self.tables
            .insert(MappingVersion::new(table.version()), Arc::new(table));
        self
    }
}

impl MappingSource for StaticSource {
    fn load(&self, version: &MappingVersion) -> Result<Option<Arc<MappingTable>>, MappingError> {
        Ok(self.tables.get(version).cloned())
    }
}

/// Per-version mapping tables, loaded on first use and cached afterwards.
///
/// The service is meant to be shared behind an `Arc` for a whole resolution
/// session. Concurrent first requests for the same version may both load the
/// table; the first one stored is the one every caller sees.
pub struct MappingService {
    source: Box<dyn MappingSource>,
    cache: RwLock<HashMap<MappingVersion, Arc<MappingTable>>>,
}

impl fmt::Debug for MappingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut versions: Vec<_> = self.cache.read().keys().cloned().collect();
        versions.sort();
        f.debug_struct("MappingService")
            .field("cached", &versions)
            .finish_non_exhaustive()
    }
}

impl MappingService {
    pub fn new(source: impl MappingSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A service that never maps anything.
    pub fn identity() -> Self {
        Self::new(StaticSource::new())
    }

    /// Returns the table for `version`. Unknown versions and load failures
    /// yield an identity table rather than an error.
    pub fn table(&self, version: &MappingVersion) -> Arc<MappingTable> {
        if let Some(table) = self.cache.read().get(version) {
            return Arc::clone(table);
        }

        let loaded = match self.source.load(version) {
            Ok(Some(table)) => table,
            Ok(None) => {
                tracing::debug!(
                    target = "weft.mappings",
                    version = %version,
                    "no mapping table for version; using identity"
                );
                Arc::new(MappingTable::identity(version.as_str()))
            }
            Err(err) => {
                tracing::warn!(
                    target = "weft.mappings",
                    version = %version,
                    error = %err,
                    "failed to load mapping table; using identity"
                );
                Arc::new(MappingTable::identity(version.as_str()))
            }
        };

        let mut cache = self.cache.write();
        Arc::clone(cache.entry(version.clone()).or_insert(loaded))
    }

    pub fn is_cached(&self, version: &MappingVersion) -> bool {
        self.cache.read().contains_key(version)
    }

    /// Drops the cached table for `version`; the next request reloads it.
    pub fn invalidate(&self, version: &MappingVersion) {
        self.cache.write().remove(version);
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}
