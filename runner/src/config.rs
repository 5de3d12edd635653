use clap::Parser;
use serde::{Deserialize, Serialize};

use tdsfdw_common::config::{
    default_logs_datetime_format, DEFAULT_CLIENT_MIN_MESSAGES, DEFAULT_MSG_HANDLER,
    DEFAULT_TDS_VERSION, MSSQL_TESTS_PATTERN, POSTGRESQL_TESTS_PATTERN, VERSION,
};
use tdsfdw_common::prompt::LogLevel;
use tdsfdw_testing_framework::substitution::PlaceholderMap;

// Functions Helpers
fn default_postgresql_tests() -> String {
    String::from(POSTGRESQL_TESTS_PATTERN)
}

fn default_mssql_tests() -> String {
    String::from(MSSQL_TESTS_PATTERN)
}

fn default_tds_version() -> String {
    String::from(DEFAULT_TDS_VERSION)
}

fn default_msg_handler() -> String {
    String::from(DEFAULT_MSG_HANDLER)
}

fn default_client_min_messages() -> String {
    String::from(DEFAULT_CLIENT_MIN_MESSAGES)
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t, env = "TDSFDW_LOG_LEVEL")]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Disable the usage of colors in log and in test output
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Also write the log to this file
    #[clap(long)]
    #[serde(default)]
    pub log_file: Option<String>,
    /// Change the datetime format used by the logger
    #[clap(long, default_value_t = default_logs_datetime_format())]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

/// A PostgreSQL server with every connection parameter known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresTarget {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub schema: String,
    pub username: String,
    pub password: String,
}

#[cfg(feature = "postgresql")]
impl PostgresTarget {
    pub fn connect_options(&self) -> tdsfdw_testing_framework::connection::PgConnectOptions {
        tdsfdw_testing_framework::connection::PgConnectOptions {
            host: self.server.clone(),
            port: self.port,
            user: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

/// A MSSQL or Azure SQL server with every connection parameter known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MssqlTarget {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub schema: String,
    /// Already rewritten for Azure when needed
    pub username: String,
    pub password: String,
}

#[cfg(feature = "mssql")]
impl MssqlTarget {
    pub fn connect_options(
        &self,
        trust_cert: bool,
    ) -> tdsfdw_testing_framework::connection::MssqlConnectOptions {
        tdsfdw_testing_framework::connection::MssqlConnectOptions {
            host: self.server.clone(),
            port: self.port,
            user: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            trust_cert,
        }
    }
}

/// Azure SQL wants `user@server` where server is the first DNS label
pub fn azure_username(username: &str, server: &str) -> String {
    let label = server.split('.').next().unwrap_or(server);
    format!("{}@{}", username, label)
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[clap(
    version = VERSION,
    about = "Run PostgreSQL tests from sql files",
    long_about = "Run the tds_fdw PostgreSQL regression fixtures.\n\n\
        The PostgreSQL server must have tds_fdw installed. The MSSQL parameters \
        are only injected into the fixtures, which use them to create the \
        foreign server and user mappings."
)]
#[command(styles = tdsfdw_common::get_cli_styles())]
pub struct PostgresTestsConfig {
    /// PostgreSQL server
    #[clap(long, alias = "postgres_server", env = "TDSFDW_POSTGRES_SERVER")]
    pub postgres_server: Option<String>,
    /// PostgreSQL TCP port
    #[clap(long, alias = "postgres_port", env = "TDSFDW_POSTGRES_PORT")]
    pub postgres_port: Option<u16>,
    /// PostgreSQL database name
    #[clap(long, alias = "postgres_database", env = "TDSFDW_POSTGRES_DATABASE")]
    pub postgres_database: Option<String>,
    /// PostgreSQL schema to use (and create if needed)
    #[clap(long, alias = "postgres_schema", env = "TDSFDW_POSTGRES_SCHEMA")]
    pub postgres_schema: Option<String>,
    /// PostgreSQL username to connect
    #[clap(long, alias = "postgres_username", env = "TDSFDW_POSTGRES_USERNAME")]
    pub postgres_username: Option<String>,
    /// PostgreSQL password to connect
    #[clap(
        long,
        alias = "postgres_password",
        env = "TDSFDW_POSTGRES_PASSWORD",
        hide_env_values = true
    )]
    pub postgres_password: Option<String>,
    /// MSSQL/Azure server
    #[clap(long, alias = "mssql_server", env = "TDSFDW_MSSQL_SERVER")]
    pub mssql_server: Option<String>,
    /// MSSQL/Azure TCP port
    #[clap(long, alias = "mssql_port", env = "TDSFDW_MSSQL_PORT")]
    pub mssql_port: Option<u16>,
    /// MSSQL/Azure database name
    #[clap(long, alias = "mssql_database", env = "TDSFDW_MSSQL_DATABASE")]
    pub mssql_database: Option<String>,
    /// MSSQL/Azure schema to use (and create if needed)
    #[clap(long, alias = "mssql_schema", env = "TDSFDW_MSSQL_SCHEMA")]
    pub mssql_schema: Option<String>,
    /// MSSQL/Azure username to connect
    #[clap(long, alias = "mssql_username", env = "TDSFDW_MSSQL_USERNAME")]
    pub mssql_username: Option<String>,
    /// MSSQL/Azure password to connect
    #[clap(
        long,
        alias = "mssql_password",
        env = "TDSFDW_MSSQL_PASSWORD",
        hide_env_values = true
    )]
    pub mssql_password: Option<String>,
    /// Connect as Azure, otherwise as standard MSSQL
    #[clap(long)]
    #[serde(default)]
    pub azure: bool,
    /// Pause after printing the backend PID (so gdb can be attached)
    /// and display every query before running it
    #[clap(long)]
    #[serde(default)]
    pub debugging: bool,
    /// Same as --debugging without the pause, and print the PostgreSQL
    /// logs at the end (useful for CI)
    #[clap(long, alias = "unattended_debugging")]
    #[serde(default)]
    pub unattended_debugging: bool,
    /// TDS protocol version used by the foreign server
    #[clap(long, alias = "tds_version", default_value_t = default_tds_version())]
    #[serde(default = "default_tds_version")]
    pub tds_version: String,
    /// Message handler for the foreign server: notice or blackhole
    #[clap(long, alias = "tds_fdw_msg_handler", default_value_t = default_msg_handler())]
    #[serde(default = "default_msg_handler")]
    pub tds_fdw_msg_handler: String,
    /// PostgreSQL client_min_messages level: DEBUG5, DEBUG4, DEBUG3, DEBUG2,
    /// DEBUG1, LOG, NOTICE, WARNING or ERROR
    #[clap(long, alias = "postgres_min_messages", default_value_t = default_client_min_messages())]
    #[serde(default = "default_client_min_messages")]
    pub postgres_min_messages: String,
    /// Fixtures to run
    #[clap(long, default_value_t = default_postgresql_tests())]
    #[serde(default = "default_postgresql_tests")]
    pub tests: String,
    /// Log configuration
    #[command(flatten)]
    pub log: LogConfig,
    /// JSON file to read the whole configuration from
    #[clap(long)]
    #[serde(skip)]
    pub config_file: Option<String>,
    /// Write the current configuration to --config-file and exit
    #[clap(long)]
    #[serde(skip)]
    pub generate_config_template: bool,
}

impl PostgresTestsConfig {
    /// Both servers, or `None` when any connection parameter is missing
    pub fn targets(&self) -> Option<(PostgresTarget, MssqlTarget)> {
        let postgres = PostgresTarget {
            server: self.postgres_server.clone()?,
            port: self.postgres_port?,
            database: self.postgres_database.clone()?,
            schema: self.postgres_schema.clone()?,
            username: self.postgres_username.clone()?,
            password: self.postgres_password.clone()?,
        };

        let server = self.mssql_server.clone()?;
        let mut username = self.mssql_username.clone()?;
        if self.azure {
            username = azure_username(&username, &server);
        }
        let mssql = MssqlTarget {
            server,
            port: self.mssql_port?,
            database: self.mssql_database.clone()?,
            schema: self.mssql_schema.clone()?,
            username,
            password: self.mssql_password.clone()?,
        };

        Some((postgres, mssql))
    }

    /// Tokens the PostgreSQL fixtures expect
    pub fn placeholders(
        &self,
        postgres: &PostgresTarget,
        mssql: &MssqlTarget,
        msg_handler: &str,
    ) -> PlaceholderMap {
        [
            ("@PSCHEMANAME", postgres.schema.clone()),
            ("@PUSER", postgres.username.clone()),
            ("@MSERVER", mssql.server.clone()),
            ("@MPORT", mssql.port.to_string()),
            ("@MUSER", mssql.username.clone()),
            ("@MPASSWORD", mssql.password.clone()),
            ("@MDATABASE", mssql.database.clone()),
            ("@MSCHEMANAME", mssql.schema.clone()),
            ("@TDSVERSION", self.tds_version.clone()),
            ("@MSG_HANDLER", msg_handler.to_owned()),
        ]
        .into_iter()
        .collect()
    }

    /// Queries are echoed in both debugging modes
    pub fn echo_queries(&self) -> bool {
        self.debugging || self.unattended_debugging
    }

    /// Server logs are dumped after a failed or unattended run, but never
    /// in interactive debugging where the developer has a debugger attached
    pub fn dump_server_logs(&self, errors: usize) -> bool {
        (errors != 0 || self.unattended_debugging) && !self.debugging
    }
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[clap(version = VERSION, about = "Run MSSQL tests from sql files")]
#[command(styles = tdsfdw_common::get_cli_styles())]
pub struct MssqlTestsConfig {
    /// MSSQL/Azure server
    #[clap(long, env = "TDSFDW_MSSQL_SERVER")]
    pub server: Option<String>,
    /// MSSQL/Azure TCP port
    #[clap(long, env = "TDSFDW_MSSQL_PORT")]
    pub port: Option<u16>,
    /// Database name
    #[clap(long, env = "TDSFDW_MSSQL_DATABASE")]
    pub database: Option<String>,
    /// Schema to use (and create if needed)
    #[clap(long, env = "TDSFDW_MSSQL_SCHEMA")]
    pub schema: Option<String>,
    /// Username to connect
    #[clap(long, env = "TDSFDW_MSSQL_USERNAME")]
    pub username: Option<String>,
    /// Password to connect
    #[clap(long, env = "TDSFDW_MSSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Connect as Azure, otherwise as standard MSSQL
    #[clap(long)]
    #[serde(default)]
    pub azure: bool,
    /// Accept the server certificate without validation
    #[clap(long)]
    #[serde(default)]
    pub trust_server_certificate: bool,
    /// Fixtures to run
    #[clap(long, default_value_t = default_mssql_tests())]
    #[serde(default = "default_mssql_tests")]
    pub tests: String,
    /// Log configuration
    #[command(flatten)]
    pub log: LogConfig,
    /// JSON file to read the whole configuration from
    #[clap(long)]
    #[serde(skip)]
    pub config_file: Option<String>,
    /// Write the current configuration to --config-file and exit
    #[clap(long)]
    #[serde(skip)]
    pub generate_config_template: bool,
}

impl MssqlTestsConfig {
    /// The server, or `None` when any connection parameter is missing
    pub fn target(&self) -> Option<MssqlTarget> {
        let server = self.server.clone()?;
        let mut username = self.username.clone()?;
        if self.azure {
            username = azure_username(&username, &server);
        }
        Some(MssqlTarget {
            server,
            port: self.port?,
            database: self.database.clone()?,
            schema: self.schema.clone()?,
            username,
            password: self.password.clone()?,
        })
    }

    /// Tokens the MSSQL fixtures expect
    pub fn placeholders(&self, target: &MssqlTarget) -> PlaceholderMap {
        [("@SCHEMANAME", target.schema.as_str())].into_iter().collect()
    }
}
