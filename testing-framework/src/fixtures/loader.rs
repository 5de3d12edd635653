use log::{debug, trace, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use tdsfdw_common::config::METADATA_EXTENSION;

use super::{Fixture, FixtureMetadata};
use crate::database::DbFamily;
use crate::error::{HarnessError, Result};

/// A `<directory>/<file-glob>` pattern such as `tests/postgresql/*.sql`.
///
/// Only the file name may contain wildcards: `*` matches any run of
/// characters and `?` exactly one. As with shell globs, a leading `*` or
/// `?` does not match hidden files.
#[derive(Debug, Clone)]
pub struct FixturePattern {
    pattern: String,
    directory: PathBuf,
    file_name: Regex,
    matches_hidden: bool,
}

impl FixturePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| HarnessError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        if pattern.ends_with(std::path::is_separator) {
            return Err(invalid("ends with a path separator, expected <directory>/<file glob>"));
        }

        let path = Path::new(pattern);
        let file_glob = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| invalid("no file name component"))?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if directory
            .to_string_lossy()
            .contains(|c: char| matches!(c, '*' | '?' | '['))
        {
            return Err(invalid("wildcards are only supported in the file name"));
        }

        let mut expression = String::from("^");
        for c in file_glob.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                other => expression.push_str(&regex::escape(&other.to_string())),
            }
        }
        expression.push('$');
        let file_name = Regex::new(&expression).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_owned(),
            directory,
            file_name,
            matches_hidden: file_glob.starts_with('.'),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') && !self.matches_hidden {
            return false;
        }
        self.file_name.is_match(file_name)
    }

    /// Matching regular files, sorted ascending by path
    pub fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.directory).map_err(|e| HarnessError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: format!("cannot list {}: {}", self.directory.display(), e),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HarnessError::io(&self.directory, e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if self.matches(name) && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Load every fixture matching `pattern`, in execution order.
///
/// Loading is eager and all-or-nothing: a missing or undecodable sidecar,
/// or an unreadable file, fails the whole discovery.
pub fn discover(pattern: &str, family: DbFamily) -> Result<Vec<Fixture>> {
    let pattern = FixturePattern::parse(pattern)?;
    let files = pattern.matching_files()?;
    debug!(
        "Found {} fixture files in {}",
        files.len(),
        pattern.directory().display()
    );
    if files.is_empty() {
        warn!("No fixture matches {}", pattern.pattern);
    }

    files
        .into_iter()
        .map(|path| load_fixture(path, family))
        .collect()
}

fn load_fixture(path: PathBuf, family: DbFamily) -> Result<Fixture> {
    let metadata_path = path.with_extension(METADATA_EXTENSION);
    if !metadata_path.is_file() {
        return Err(HarnessError::MissingMetadata {
            fixture: path,
            metadata: metadata_path,
        });
    }

    let contents =
        fs::read_to_string(&metadata_path).map_err(|e| HarnessError::io(&metadata_path, e))?;
    let metadata = FixtureMetadata::from_json(&contents, &metadata_path, family)?;
    let sql = fs::read_to_string(&path).map_err(|e| HarnessError::io(&path, e))?;

    trace!(
        "Loaded {} ({}, versions {} to {})",
        path.display(),
        metadata.description,
        metadata.min_version,
        metadata.max_version
    );
    Ok(Fixture::new(path, sql, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        let pattern = FixturePattern::parse("tests/postgresql/*.sql").unwrap();
        assert_eq!(pattern.directory(), Path::new("tests/postgresql"));
        assert!(pattern.matches("010_create.sql"));
        assert!(!pattern.matches("010_create.json"));
        assert!(!pattern.matches("010_create.sql.bak"));
        assert!(!pattern.matches(".hidden.sql"));

        let pattern = FixturePattern::parse("0?0_*.sql").unwrap();
        assert_eq!(pattern.directory(), Path::new("."));
        assert!(pattern.matches("010_x.sql"));
        assert!(!pattern.matches("0100_x.sql"));
    }

    #[test]
    fn test_pattern_escapes_regex_characters() {
        let pattern = FixturePattern::parse("dir/a+b(1).sql").unwrap();
        assert!(pattern.matches("a+b(1).sql"));
        assert!(!pattern.matches("aab(1).sql"));
    }

    #[test]
    fn test_pattern_rejects_directory_wildcards() {
        let err = FixturePattern::parse("tests/*/x.sql").unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_rejects_bare_directory() {
        let err = FixturePattern::parse("tests/postgresql/").unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPattern { .. }));
        assert!(err.to_string().contains("tests/postgresql/"));
    }
}
