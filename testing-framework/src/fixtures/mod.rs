//! SQL fixtures and their sidecar metadata
//!
//! A fixture is one `.sql` file holding a statement or batch, paired with a
//! JSON sidecar of the same base name:
//!
//! ```json
//! {
//!   "test_desc": "Create foreign table with explicit schema",
//!   "server": { "version": { "min": "9.2", "max": "" } }
//! }
//! ```
//!
//! Fixtures are returned in ascending path order. That order is a contract:
//! later fixtures routinely depend on objects created by earlier ones.

pub mod loader;
pub mod metadata;

use std::path::{Path, PathBuf};

pub use loader::{discover, FixturePattern};
pub use metadata::FixtureMetadata;

/// One SQL test file with its parsed metadata.
#[derive(Debug, Clone)]
pub struct Fixture {
    identifier: String,
    path: PathBuf,
    sql: String,
    metadata: FixtureMetadata,
}

impl Fixture {
    pub fn new(path: PathBuf, sql: String, metadata: FixtureMetadata) -> Self {
        let identifier = identifier_for(&path);
        Self {
            identifier,
            path,
            sql,
            metadata,
        }
    }

    /// Ordering prefix of the file name (`010` for `010_create.sql`),
    /// used for progress output only
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn metadata(&self) -> &FixtureMetadata {
        &self.metadata
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }
}

fn identifier_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('_') {
        Some((prefix, _)) => prefix.to_owned(),
        None => name,
    }
}
