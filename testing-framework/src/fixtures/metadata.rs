use serde::Deserialize;
use std::path::Path;

use crate::database::DbFamily;
use crate::error::{HarnessError, Result};
use crate::version::VersionSpec;

/// What a fixture tests and which server versions it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureMetadata {
    pub description: String,
    /// Empty means no lower bound
    pub min_version: VersionSpec,
    /// Empty means no upper bound
    pub max_version: VersionSpec,
}

impl FixtureMetadata {
    /// Decode a sidecar document. Version strings are parsed for `family`.
    pub fn from_json(contents: &str, path: &Path, family: DbFamily) -> Result<Self> {
        let raw: RawMetadata =
            serde_json::from_str(contents).map_err(|e| HarnessError::InvalidMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let range = raw.server.version;
        let min_version =
            VersionSpec::parse(&range.min, family).map_err(|e| e.with_origin(path))?;
        let max_version =
            VersionSpec::parse(&range.max, family).map_err(|e| e.with_origin(path))?;

        Ok(Self {
            description: raw.test_desc,
            min_version,
            max_version,
        })
    }

    /// Whether a fixture with this metadata runs on `server`
    pub fn applies_to(&self, server: &VersionSpec) -> bool {
        server.in_range(&self.min_version, &self.max_version)
    }
}

// On-disk layout: {"test_desc": .., "server": {"version": {"min": .., "max": ..}}}
#[derive(Deserialize)]
struct RawMetadata {
    test_desc: String,
    server: RawServer,
}

#[derive(Deserialize)]
struct RawServer {
    version: RawVersionRange,
}

#[derive(Deserialize)]
struct RawVersionRange {
    min: String,
    max: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "tests/postgresql/010_create.json";

    #[test]
    fn test_decode_metadata() {
        let json = r#"{
            "test_desc": "Create a foreign table",
            "server": {"version": {"min": "9.2", "max": ""}},
            "comment": "extra keys are ignored"
        }"#;
        let meta = FixtureMetadata::from_json(json, Path::new(PATH), DbFamily::PostgreSql).unwrap();

        assert_eq!(meta.description, "Create a foreign table");
        assert_eq!(meta.min_version.segments(), &[9, 2]);
        assert!(meta.max_version.is_unconstrained());
    }

    #[test]
    fn test_decode_pads_mssql_versions() {
        let json = r#"{"test_desc": "x", "server": {"version": {"min": "8.00.194", "max": ""}}}"#;
        let meta = FixtureMetadata::from_json(json, Path::new(PATH), DbFamily::MsSql).unwrap();
        assert_eq!(meta.min_version.segments(), &[8, 0, 194, 0]);
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        for json in [
            r#"{"server": {"version": {"min": "", "max": ""}}}"#,
            r#"{"test_desc": "x"}"#,
            r#"{"test_desc": "x", "server": {"version": {"min": ""}}}"#,
            r#"not json"#,
        ] {
            let err = FixtureMetadata::from_json(json, Path::new(PATH), DbFamily::PostgreSql)
                .unwrap_err();
            assert!(matches!(err, HarnessError::InvalidMetadata { .. }), "{json}: {err}");
        }
    }

    #[test]
    fn test_malformed_version_names_the_sidecar() {
        let json = r#"{"test_desc": "x", "server": {"version": {"min": "latest", "max": ""}}}"#;
        let err =
            FixtureMetadata::from_json(json, Path::new(PATH), DbFamily::PostgreSql).unwrap_err();
        match err {
            HarnessError::MalformedVersion { input, origin } => {
                assert_eq!(input, "latest");
                assert_eq!(origin.as_deref(), Some(Path::new(PATH)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_applies_to() {
        let json = r#"{"test_desc": "x", "server": {"version": {"min": "99.0", "max": ""}}}"#;
        let meta = FixtureMetadata::from_json(json, Path::new(PATH), DbFamily::PostgreSql).unwrap();
        let server = VersionSpec::parse("12.3", DbFamily::PostgreSql).unwrap();
        assert!(!meta.applies_to(&server));
    }
}
