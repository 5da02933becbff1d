//! Versioned name mappings between the compiled (obfuscated) naming scheme
//! and the human-readable one.
//!
//! A [`MappingTable`] holds one version's classes, fields and methods in both
//! directions. [`MappingService`] loads tables lazily per version through a
//! [`MappingSource`] and caches them for the lifetime of the service.

mod service;
mod srg;
mod table;

use std::path::PathBuf;

use thiserror::Error;

pub use crate::service::{MappingService, MappingSource, MappingVersion, SrgFileSource, StaticSource};
pub use crate::srg::parse_srg;
pub use crate::table::{Direction, MappingTable};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed mapping line {line}: {message}")]
    Malformed { line: usize, message: String },
}
