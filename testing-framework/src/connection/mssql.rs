//! MSSQL / Azure SQL adapter over `tiberius`
//!
//! tiberius is async only. The adapter owns a current-thread tokio runtime
//! and blocks on every call, so the engine stays strictly sequential.

use log::trace;
use std::collections::BTreeMap;
use thiserror::Error;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::{Connection, DiagnosticError};
use crate::database::DbFamily;

/// Connection parameters for [`MssqlConnection::connect`]
#[derive(Debug, Clone)]
pub struct MssqlConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Accept the server certificate without validation
    pub trust_cert: bool,
}

#[derive(Debug, Error)]
pub enum MssqlError {
    #[error(transparent)]
    Driver(#[from] tiberius::error::Error),
    #[error("Cannot start the driver runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("Cannot reach {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

// Fields of a server-side error token
struct ServerDiagnostics {
    code: u32,
    message: String,
    state: u8,
    class: u8,
    line: u32,
    server: String,
    procedure: String,
}

impl MssqlError {
    fn server_error(&self) -> Option<ServerDiagnostics> {
        match self {
            Self::Driver(tiberius::error::Error::Server(token)) => Some(ServerDiagnostics {
                code: token.code(),
                message: token.message().to_owned(),
                state: token.state(),
                class: token.class(),
                line: token.line(),
                server: token.server().to_owned(),
                procedure: token.procedure().to_owned(),
            }),
            _ => None,
        }
    }
}

impl DiagnosticError for MssqlError {
    fn code(&self) -> Option<String> {
        self.server_error().map(|server| server.code.to_string())
    }

    fn message(&self) -> String {
        match self.server_error() {
            Some(server) => server.message,
            None => self.to_string(),
        }
    }

    fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let Some(server) = self.server_error() {
            fields.insert("state".to_owned(), server.state.to_string());
            fields.insert("class".to_owned(), server.class.to_string());
            fields.insert("line".to_owned(), server.line.to_string());
            if !server.server.is_empty() {
                fields.insert("server".to_owned(), server.server);
            }
            if !server.procedure.is_empty() {
                fields.insert("procedure".to_owned(), server.procedure);
            }
        }
        fields
    }

    fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Self::Runtime(_) | Self::Connect { .. } | Self::Driver(tiberius::error::Error::Io { .. })
        )
    }
}

/// An MSSQL session with DB-API style implicit transactions
pub struct MssqlConnection {
    runtime: Runtime,
    client: Client<Compat<TcpStream>>,
    in_transaction: bool,
}

impl MssqlConnection {
    pub fn connect(options: &MssqlConnectOptions) -> Result<Self, MssqlError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(MssqlError::Runtime)?;

        let mut config = Config::new();
        config.host(&options.host);
        config.port(options.port);
        config.database(&options.database);
        config.authentication(AuthMethod::sql_server(&options.user, &options.password));
        if options.trust_cert {
            config.trust_cert();
        }

        let client = runtime.block_on(async move {
            let address = config.get_addr();
            let tcp = TcpStream::connect(&address)
                .await
                .map_err(|source| MssqlError::Connect {
                    address: address.clone(),
                    source,
                })?;
            tcp.set_nodelay(true)
                .map_err(|source| MssqlError::Connect { address, source })?;
            Ok::<_, MssqlError>(Client::connect(config, tcp.compat_write()).await?)
        })?;

        Ok(Self {
            runtime,
            client,
            in_transaction: false,
        })
    }

    fn batch(&mut self, sql: &str) -> Result<(), MssqlError> {
        let Self {
            runtime, client, ..
        } = self;
        runtime.block_on(async move {
            client.simple_query(sql).await?.into_results().await?;
            Ok::<_, MssqlError>(())
        })
    }

    fn end_transaction(&mut self, statement: &str) -> Result<(), MssqlError> {
        if !self.in_transaction {
            return Ok(());
        }
        trace!("{}", statement);
        let result = self.batch(statement);
        self.in_transaction = false;
        result
    }
}

impl Connection for MssqlConnection {
    type Error = MssqlError;

    fn family(&self) -> DbFamily {
        DbFamily::MsSql
    }

    fn execute(&mut self, sql: &str) -> Result<(), MssqlError> {
        if !self.in_transaction {
            self.batch("BEGIN TRANSACTION")?;
            self.in_transaction = true;
        }
        self.batch(sql)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, MssqlError> {
        let Self {
            runtime, client, ..
        } = self;
        let row = runtime.block_on(async move { client.simple_query(sql).await?.into_row().await })?;
        match row {
            Some(row) => Ok(row.try_get::<&str, _>(0)?.map(str::to_owned)),
            None => Ok(None),
        }
    }

    // A failed batch may already have ended the transaction server side
    fn commit(&mut self) -> Result<(), MssqlError> {
        self.end_transaction("IF @@TRANCOUNT > 0 COMMIT TRANSACTION")
    }

    fn rollback(&mut self) -> Result<(), MssqlError> {
        self.end_transaction("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
    }
}
