use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Database families the harness knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DbFamily {
    PostgreSql,
    MsSql,
}

impl DbFamily {
    /// The one query returning the server version as text
    pub fn version_query(self) -> &'static str {
        match self {
            Self::PostgreSql => "SELECT setting FROM pg_settings WHERE name = 'server_version';",
            // serverproperty() is a sql_variant, drivers want plain text
            Self::MsSql => "SELECT CAST(serverproperty('ProductVersion') AS nvarchar(128));",
        }
    }

    /// MSSQL numbers builds major.minor.build.revision but old releases
    /// (7.0, 2000) report only three parts.
    pub fn pads_three_part_versions(self) -> bool {
        matches!(self, Self::MsSql)
    }
}
