use std::process::ExitCode;

pub const VERSION: &str = env!("BUILD_VERSION");

// TDS protocol version injected as @TDSVERSION when none is given
pub const DEFAULT_TDS_VERSION: &str = "7.1";

// tds_fdw foreign server message handlers
pub const DEFAULT_MSG_HANDLER: &str = "notice";
pub const MSG_HANDLERS: [&str; 2] = ["notice", "blackhole"];

// Accepted values for PostgreSQL client_min_messages
pub const DEFAULT_CLIENT_MIN_MESSAGES: &str = "NOTICE";
pub const CLIENT_MIN_MESSAGES_LEVELS: [&str; 9] = [
    "DEBUG5", "DEBUG4", "DEBUG3", "DEBUG2", "DEBUG1", "LOG", "NOTICE", "WARNING", "ERROR",
];

// Every fixture `x.sql` is described by a sidecar `x.json`
pub const METADATA_EXTENSION: &str = "json";

// Fixture locations, relative to the repository root
pub const POSTGRESQL_TESTS_PATTERN: &str = "tests/postgresql/*.sql";
pub const MSSQL_TESTS_PATTERN: &str = "tests/mssql/*.sql";

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_MSSQL_PORT: u16 = 1433;

pub fn default_logs_datetime_format() -> String {
    String::from("[%Y-%m-%d] (%H:%M:%S%.3f)")
}

/// Process exit statuses of the harness binaries.
///
/// CI scripts key on these values, keep them stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessExit {
    /// Every executed fixture passed
    Success = 0,
    /// Command line could not be parsed (clap uses the same code)
    Usage = 2,
    /// Connection failure or any error that aborted the run
    Fatal = 3,
    /// A required connection parameter was not supplied
    InsufficientParameters = 4,
    /// At least one fixture failed
    TestFailures = 5,
}

impl HarnessExit {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<HarnessExit> for ExitCode {
    fn from(exit: HarnessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            HarnessExit::Success,
            HarnessExit::Usage,
            HarnessExit::Fatal,
            HarnessExit::InsufficientParameters,
            HarnessExit::TestFailures,
        ]
        .map(HarnessExit::code);

        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(HarnessExit::Success.code(), 0);
    }

    #[test]
    fn test_default_client_min_messages_is_accepted() {
        assert!(CLIENT_MIN_MESSAGES_LEVELS.contains(&DEFAULT_CLIENT_MIN_MESSAGES));
        assert!(MSG_HANDLERS.contains(&DEFAULT_MSG_HANDLER));
    }
}
