//! Server version parsing and range gating
//!
//! Versions are compared as integer arrays over their common prefix: a
//! shorter spec constrains only the components it names, so `12` admits
//! every `12.x` server and an empty spec admits everything. An empty
//! minimum and an empty maximum are both "unbounded".

use std::cmp::Ordering;
use std::fmt;

use crate::database::DbFamily;
use crate::error::{HarnessError, Result};

/// Parsed dotted version, e.g. `[10, 2]` for `"10.2"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionSpec(Vec<u32>);

impl VersionSpec {
    /// The empty spec: no constraint
    pub fn unconstrained() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<u32>) -> Self {
        Self(segments)
    }

    /// Parse a version string as reported by a server or written in a
    /// fixture sidecar.
    ///
    /// Only the leading run of digits and dots is considered, so vendor
    /// suffixes such as `"10.2 (Ubuntu 10.2-1.pgdg14.04+1)"` parse as
    /// `[10, 2]`. For MSSQL a three part version gets a trailing `0`.
    pub fn parse(version: &str, family: DbFamily) -> Result<Self> {
        if version.is_empty() {
            return Ok(Self::unconstrained());
        }

        let malformed = || HarnessError::MalformedVersion {
            input: version.to_owned(),
            origin: None,
        };

        let end = version
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(version.len());
        let leading = &version[..end];
        if !leading.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let mut segments = leading
            .split('.')
            .map(|segment| segment.parse::<u32>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>>>()?;

        if family.pads_three_part_versions() && segments.len() == 3 {
            segments.push(0);
        }

        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    pub fn is_unconstrained(&self) -> bool {
        self.0.is_empty()
    }

    /// Lexicographic comparison limited to the shorter of both specs.
    ///
    /// This is deliberately not `Ord`: `[12]` and `[12, 3]` compare equal
    /// here while being different values.
    pub fn compare_prefix(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// True if `self`, as a server version, satisfies `[min, max]`
    pub fn in_range(&self, min: &Self, max: &Self) -> bool {
        in_range(self, min, max)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        let dotted = self
            .0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", dotted)
    }
}

/// `server >= min` and (`server <= max` or `max` is empty)
pub fn in_range(server: &VersionSpec, min: &VersionSpec, max: &VersionSpec) -> bool {
    server.compare_prefix(min).is_ge()
        && (max.is_unconstrained() || server.compare_prefix(max).is_le())
}
