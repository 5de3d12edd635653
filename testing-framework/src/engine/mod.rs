//! Fixture execution engine
//!
//! Runs fixtures one at a time, in loader order, each inside its own
//! transaction: committed when it succeeds, rolled back when it fails.
//! A failing fixture is reported and counted; it never stops the run.
//! Only structural problems (bad versions, a dead connection) do.
//!
//! ```rust
//! use tdsfdw_common::prompt::MemorySink;
//! use tdsfdw_testing_framework::prelude::*;
//!
//! let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
//! let mut executor = FixtureExecutor::new(MemorySink::new(), EngineOptions::default());
//! let result = executor.run(&[], &mut conn, &PlaceholderMap::new()).unwrap();
//! assert_eq!(result.total(), 0);
//! ```

mod executor;

pub use executor::{probe_server_version, run_suite, FixtureExecutor};

use std::collections::BTreeMap;

use crate::connection::DiagnosticError;

/// Result of executing one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failure(FailureDetails),
}

/// Everything the driver told us about a failed fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetails {
    pub code: Option<String>,
    pub message: String,
    pub diagnostics: BTreeMap<String, String>,
}

impl FailureDetails {
    pub fn from_error<E: DiagnosticError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.code(),
            message: error.message(),
            diagnostics: error.fields(),
        }
    }
}
