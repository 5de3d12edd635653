//! In-memory connection for tests
//!
//! `MockConnection` does not interpret SQL. It records every statement,
//! keeps track of what was committed and what was rolled back, and fails
//! on demand when a statement contains a configured substring.
//!
//! ```rust
//! use tdsfdw_testing_framework::connection::{Connection, MockConnection, MockError};
//! use tdsfdw_testing_framework::database::DbFamily;
//!
//! let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3")
//!     .fail_on("DROP", MockError::new("42P01", "table does not exist"));
//!
//! conn.execute("CREATE TABLE t (id int)").unwrap();
//! conn.commit().unwrap();
//! assert!(conn.execute("DROP TABLE missing").is_err());
//! conn.rollback().unwrap();
//!
//! assert_eq!(conn.committed(), ["CREATE TABLE t (id int)"]);
//! assert_eq!(conn.rolled_back(), ["DROP TABLE missing"]);
//! ```

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::{Connection, DiagnosticError};
use crate::database::DbFamily;

/// Error raised by [`MockConnection`], with fully scriptable diagnostics
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct MockError {
    code: Option<String>,
    message: String,
    fields: BTreeMap<String, String>,
    fatal: bool,
}

impl MockError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            fields: BTreeMap::new(),
            fatal: false,
        }
    }

    /// An error without a vendor code
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            fields: BTreeMap::new(),
            fatal: false,
        }
    }

    /// The connection is gone
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            fields: BTreeMap::new(),
            fatal: true,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl DiagnosticError for MockError {
    fn code(&self) -> Option<String> {
        self.code.clone()
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn fields(&self) -> BTreeMap<String, String> {
        self.fields.clone()
    }

    fn is_connection_fatal(&self) -> bool {
        self.fatal
    }
}

/// One `execute` call as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub sql: String,
    /// Uncommitted statements already open when this one started
    pub inherited: Vec<String>,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub struct MockConnection {
    family: DbFamily,
    scalars: HashMap<String, Option<String>>,
    failures: Vec<(String, MockError)>,
    commit_failures: Vec<(String, MockError)>,
    rollback_failure: Option<MockError>,
    pending: Vec<String>,
    committed: Vec<String>,
    rolled_back: Vec<String>,
    executions: Vec<ExecutionRecord>,
    scalar_queries: Vec<String>,
    commits: usize,
    rollbacks: usize,
}

impl MockConnection {
    /// A connection to a `family` server reporting `server_version`
    pub fn new(family: DbFamily, server_version: impl Into<String>) -> Self {
        let mut scalars = HashMap::new();
        scalars.insert(
            family.version_query().to_owned(),
            Some(server_version.into()),
        );
        Self {
            family,
            scalars,
            failures: Vec::new(),
            commit_failures: Vec::new(),
            rollback_failure: None,
            pending: Vec::new(),
            committed: Vec::new(),
            rolled_back: Vec::new(),
            executions: Vec::new(),
            scalar_queries: Vec::new(),
            commits: 0,
            rollbacks: 0,
        }
    }

    /// Fail any `execute` whose text contains `needle`
    pub fn fail_on(mut self, needle: impl Into<String>, error: MockError) -> Self {
        self.failures.push((needle.into(), error));
        self
    }

    /// Fail `commit` while a pending statement contains `needle`
    pub fn fail_commit_on(mut self, needle: impl Into<String>, error: MockError) -> Self {
        self.commit_failures.push((needle.into(), error));
        self
    }

    pub fn fail_rollback(mut self, error: MockError) -> Self {
        self.rollback_failure = Some(error);
        self
    }

    /// Answer `query_scalar(sql)` with `value`
    pub fn with_scalar(mut self, sql: impl Into<String>, value: Option<&str>) -> Self {
        self.scalars.insert(sql.into(), value.map(str::to_owned));
        self
    }

    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    pub fn rolled_back(&self) -> &[String] {
        &self.rolled_back
    }

    pub fn executions(&self) -> &[ExecutionRecord] {
        &self.executions
    }

    /// Every `query_scalar` call, in order
    pub fn scalar_queries(&self) -> &[String] {
        &self.scalar_queries
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// Statements executed but neither committed nor rolled back yet
    pub fn pending(&self) -> &[String] {
        &self.pending
    }
}

impl Connection for MockConnection {
    type Error = MockError;

    fn family(&self) -> DbFamily {
        self.family
    }

    fn execute(&mut self, sql: &str) -> Result<(), MockError> {
        let failure = self
            .failures
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, error)| error.clone());

        self.executions.push(ExecutionRecord {
            sql: sql.to_owned(),
            inherited: self.pending.clone(),
            succeeded: failure.is_none(),
        });
        // A failed statement still leaves the transaction open (and aborted)
        self.pending.push(sql.to_owned());

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, MockError> {
        self.scalar_queries.push(sql.to_owned());
        self.scalars
            .get(sql)
            .cloned()
            .ok_or_else(|| MockError::new("42000", format!("unexpected query: {}", sql)))
    }

    fn commit(&mut self) -> Result<(), MockError> {
        self.commits += 1;
        let failure = self
            .commit_failures
            .iter()
            .find(|(needle, _)| self.pending.iter().any(|sql| sql.contains(needle.as_str())))
            .map(|(_, error)| error.clone());
        if let Some(error) = failure {
            return Err(error);
        }
        self.committed.append(&mut self.pending);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), MockError> {
        self.rollbacks += 1;
        if let Some(error) = self.rollback_failure.clone() {
            return Err(error);
        }
        self.rolled_back.append(&mut self.pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_query_is_answered() {
        let mut conn = MockConnection::new(DbFamily::MsSql, "15.0.2000.5");
        let version = conn.query_scalar(DbFamily::MsSql.version_query()).unwrap();
        assert_eq!(version.as_deref(), Some("15.0.2000.5"));
        assert!(conn.query_scalar("SELECT 1").is_err());
        assert_eq!(conn.scalar_queries().len(), 2);
    }

    #[test]
    fn test_commit_failure_keeps_statements_pending() {
        let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3")
            .fail_commit_on("deferred", MockError::new("23503", "fk violation"));
        conn.execute("INSERT deferred").unwrap();
        assert!(conn.commit().is_err());
        assert_eq!(conn.pending(), ["INSERT deferred"]);
        conn.rollback().unwrap();
        assert!(conn.committed().is_empty());
        assert_eq!(conn.rolled_back(), ["INSERT deferred"]);
    }

    #[test]
    fn test_execution_records_inherited_state() {
        let mut conn = MockConnection::new(DbFamily::PostgreSql, "12.3");
        conn.execute("A").unwrap();
        conn.execute("B").unwrap();
        assert!(conn.executions()[0].inherited.is_empty());
        assert_eq!(conn.executions()[1].inherited, vec!["A".to_string()]);
    }
}
