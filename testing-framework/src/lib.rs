//! # tds_fdw regression test framework
//!
//! Runs directories of SQL fixtures against a live PostgreSQL or MSSQL
//! server and counts what passed.
//!
//! Every fixture is a pair of files sharing a stem:
//! - `NNN_name.sql`: the statements to execute
//! - `NNN_name.json`: a description and the server versions it applies to
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tdsfdw_common::prompt::ConsoleSink;
//! use tdsfdw_testing_framework::prelude::*;
//!
//! let mut conn = PgConnection::connect(&options)?;
//! let placeholders: PlaceholderMap = [("@SCHEMANAME", "public")].into_iter().collect();
//! let config = HarnessConfig::new("tests/postgresql/*.sql", placeholders);
//! let result = run_suite(&config, &mut conn, ConsoleSink::new(false))?;
//! ```
//!
//! ## Features
//!
//! - **postgresql**: PostgreSQL driver adapter (default)
//! - **mssql**: MSSQL driver adapter (default)
//!
//! Without either feature only the [`connection::MockConnection`] is
//! available, which is enough for the engine's own tests.

#![warn(clippy::all)]

/// Engine configuration assembled by the front-ends
pub mod config;

/// Connection capability, driver adapters and the mock
pub mod connection;

/// Supported server families
pub mod database;

/// Fixture execution
pub mod engine;

pub mod error;

/// Fixture discovery and metadata
pub mod fixtures;

/// Server log discovery
pub mod logs;

/// Run counters and the final report
pub mod report;

/// Placeholder replacement in fixture SQL
pub mod substitution;

/// Dotted version parsing and prefix comparison
pub mod version;

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::config::{EngineOptions, HarnessConfig};
    pub use crate::connection::{
        Connection, DiagnosticError, ExecutionRecord, MockConnection, MockError,
    };
    #[cfg(feature = "mssql")]
    pub use crate::connection::{MssqlConnectOptions, MssqlConnection};
    #[cfg(feature = "postgresql")]
    pub use crate::connection::{PgConnectOptions, PgConnection};
    pub use crate::database::DbFamily;
    pub use crate::engine::{
        probe_server_version, run_suite, ExecutionOutcome, FailureDetails, FixtureExecutor,
    };
    pub use crate::error::{HarnessError, Result};
    pub use crate::fixtures::{discover, Fixture, FixtureMetadata};
    pub use crate::logs::{collect_server_logs, print_server_logs, LogCollector};
    pub use crate::report::{print_report, RunResult};
    pub use crate::substitution::{substitute, PlaceholderMap};
    pub use crate::version::{in_range, VersionSpec};
}

pub use error::{HarnessError, Result};
