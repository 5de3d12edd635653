//! Fixture executor
//!
//! Gates every fixture on the server version, substitutes placeholders,
//! executes the SQL and keeps the counters.

use log::{debug, info, trace};

use tdsfdw_common::prompt::MessageSink;

use super::{ExecutionOutcome, FailureDetails};
use crate::config::{EngineOptions, HarnessConfig};
use crate::connection::{Connection, DiagnosticError};
use crate::database::DbFamily;
use crate::error::{HarnessError, Result};
use crate::fixtures::{discover, Fixture};
use crate::report::RunResult;
use crate::substitution::{substitute, PlaceholderMap};
use crate::version::VersionSpec;

/// Runs loaded fixtures against a connection and reports through a sink
pub struct FixtureExecutor<S: MessageSink> {
    sink: S,
    options: EngineOptions,
}

impl<S: MessageSink> FixtureExecutor<S> {
    pub fn new(sink: S, options: EngineOptions) -> Self {
        Self { sink, options }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Execute every applicable fixture, in order.
    ///
    /// The server version is probed once, before the first fixture.
    /// Fixtures outside their version range are skipped without touching
    /// any counter.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The version probe fails or returns an unparseable version
    /// - The connection becomes unusable (including a failed rollback)
    pub fn run<C: Connection + ?Sized>(
        &mut self,
        fixtures: &[Fixture],
        conn: &mut C,
        placeholders: &PlaceholderMap,
    ) -> Result<RunResult> {
        let family = conn.family();
        let raw_version = probe_server_version(conn, family)?;
        let server = VersionSpec::parse(&raw_version, family)?;
        info!("Testing against {} server version {}", family, server);

        let mut result = RunResult::default();
        for fixture in fixtures {
            if !fixture.metadata().applies_to(&server) {
                debug!(
                    "Skipping {} ({}): needs server {} to {}",
                    fixture.identifier(),
                    fixture.description(),
                    fixture.metadata().min_version,
                    fixture.metadata().max_version
                );
                continue;
            }

            result.record_started();
            let sql = substitute(fixture.sql(), placeholders);
            self.sink.info(&format!(
                "{}: Testing {}",
                fixture.identifier(),
                fixture.description()
            ));
            if self.options.echo_queries {
                self.sink.info("Query:");
                self.sink.raw(&sql);
            }

            match execute_fixture(conn, &sql)? {
                ExecutionOutcome::Success => {
                    trace!("{} committed", fixture.path().display());
                    result.record_ok();
                }
                ExecutionOutcome::Failure(failure) => {
                    self.report_failure(fixture, &sql, &failure);
                    result.record_error();
                }
            }
        }

        debug!(
            "Run finished: total={} ok={} errors={}",
            result.total(),
            result.ok(),
            result.errors()
        );
        Ok(result)
    }

    fn report_failure(&mut self, fixture: &Fixture, sql: &str, failure: &FailureDetails) {
        debug!(
            "{} failed: {}",
            fixture.path().display(),
            failure.message
        );
        self.sink.error(&format!(
            "Error running {} ({})",
            fixture.description(),
            fixture.path().display()
        ));
        self.sink.error("Query:");
        self.sink.raw(sql);
        if let Some(code) = &failure.code {
            self.sink.error(code);
        }
        self.sink.error(&failure.message);
        for (name, value) in &failure.diagnostics {
            self.sink.error(&format!("{}: {}", name, value));
        }
    }
}

/// Run one fixture in its own transaction.
///
/// A commit failure counts as a fixture failure. Rollback must succeed,
/// otherwise the next fixture could start from dirty state.
fn execute_fixture<C: Connection + ?Sized>(conn: &mut C, sql: &str) -> Result<ExecutionOutcome> {
    let error = match conn.execute(sql).and_then(|()| conn.commit()) {
        Ok(()) => return Ok(ExecutionOutcome::Success),
        Err(error) => error,
    };

    if error.is_connection_fatal() {
        return Err(HarnessError::ConnectionFatal(error.message()));
    }

    let failure = FailureDetails::from_error(&error);
    conn.rollback().map_err(|rollback| {
        HarnessError::ConnectionFatal(format!(
            "rollback after '{}' failed: {}",
            failure.message,
            rollback.message()
        ))
    })?;

    Ok(ExecutionOutcome::Failure(failure))
}

/// Ask the server for its version with the family's introspection query
pub fn probe_server_version<C: Connection + ?Sized>(
    conn: &mut C,
    family: DbFamily,
) -> Result<String> {
    match conn.query_scalar(family.version_query()) {
        Ok(Some(version)) => Ok(version),
        Ok(None) => Err(HarnessError::VersionProbe(format!(
            "{} returned no version",
            family.version_query()
        ))),
        Err(e) if e.is_connection_fatal() => Err(HarnessError::ConnectionFatal(e.message())),
        Err(e) => Err(HarnessError::VersionProbe(e.message())),
    }
}

/// Discover the configured fixtures and run them
pub fn run_suite<C, S>(config: &HarnessConfig, conn: &mut C, sink: S) -> Result<RunResult>
where
    C: Connection + ?Sized,
    S: MessageSink,
{
    let fixtures = discover(&config.fixtures, conn.family())?;
    let mut executor = FixtureExecutor::new(sink, config.engine.clone());
    executor.run(&fixtures, conn, &config.placeholders)
}
