//! Database connection capability required by the engine
//!
//! The engine never opens or closes connections. Callers hand it an
//! already-open [`Connection`] by mutable reference and keep ownership.
//! Transactions are implicit: the first `execute` after a `commit` or
//! `rollback` starts a new one, as with DB-API drivers.

pub mod mock;
#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgresql")]
pub mod pg;

use std::collections::BTreeMap;

use crate::database::DbFamily;

pub use mock::{ExecutionRecord, MockConnection, MockError};
#[cfg(feature = "mssql")]
pub use mssql::{MssqlConnectOptions, MssqlConnection, MssqlError};
#[cfg(feature = "postgresql")]
pub use pg::{PgConnectOptions, PgConnection, PgError};

/// Structured view of a driver error.
///
/// Drivers expose very different things: PostgreSQL has a SQLSTATE and a
/// dozen optional fields, MSSQL an error number, state and class. Whatever
/// is available goes into `fields`, keyed by a short lowercase name.
pub trait DiagnosticError: std::error::Error {
    /// Vendor error code, if the driver reports one
    fn code(&self) -> Option<String> {
        None
    }

    /// Human readable message
    fn message(&self) -> String {
        self.to_string()
    }

    /// Additional vendor specific fields (severity, hint, detail...)
    fn fields(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// True when the connection itself can no longer be used
    fn is_connection_fatal(&self) -> bool {
        false
    }
}

/// What the engine needs from a database connection.
pub trait Connection {
    type Error: DiagnosticError;

    fn family(&self) -> DbFamily;

    /// Run a statement or batch inside the current transaction
    fn execute(&mut self, sql: &str) -> Result<(), Self::Error>;

    /// First column of the first row as text, outside any harness
    /// transaction. `None` for no row or a NULL value.
    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;

    fn rollback(&mut self) -> Result<(), Self::Error>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    type Error = C::Error;

    fn family(&self) -> DbFamily {
        (**self).family()
    }

    fn execute(&mut self, sql: &str) -> Result<(), Self::Error> {
        (**self).execute(sql)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, Self::Error> {
        (**self).query_scalar(sql)
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        (**self).rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("connection reset by peer")]
    struct ResetError;

    impl DiagnosticError for ResetError {}

    #[test]
    fn test_default_diagnostics_only_have_message() {
        let err = ResetError;
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "connection reset by peer");
        assert!(err.fields().is_empty());
        assert!(!err.is_connection_fatal());
    }
}
