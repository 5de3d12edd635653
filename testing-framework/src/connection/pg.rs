//! PostgreSQL adapter over the synchronous `postgres` client

use log::trace;
use postgres::error::ErrorPosition;
use postgres::{Client, NoTls, SimpleQueryMessage};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{Connection, DiagnosticError};
use crate::database::DbFamily;

/// Connection parameters for [`PgConnection::connect`]
#[derive(Debug, Clone)]
pub struct PgConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct PgError(#[from] postgres::Error);

impl DiagnosticError for PgError {
    fn code(&self) -> Option<String> {
        self.0.code().map(|state| state.code().to_owned())
    }

    fn message(&self) -> String {
        match self.0.as_db_error() {
            Some(db) => db.message().to_owned(),
            None => self.0.to_string(),
        }
    }

    fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        let Some(db) = self.0.as_db_error() else {
            return fields;
        };

        fields.insert("severity".to_owned(), db.severity().to_owned());
        let optional = [
            ("detail", db.detail()),
            ("hint", db.hint()),
            ("context", db.where_()),
            ("schema_name", db.schema()),
            ("table_name", db.table()),
            ("column_name", db.column()),
            ("datatype_name", db.datatype()),
            ("constraint_name", db.constraint()),
            ("source_file", db.file()),
            ("source_function", db.routine()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.to_owned(), value.to_owned());
            }
        }
        if let Some(line) = db.line() {
            fields.insert("source_line".to_owned(), line.to_string());
        }
        if let Some(position) = db.position() {
            insert_position(&mut fields, position);
        }
        fields
    }

    fn is_connection_fatal(&self) -> bool {
        self.0.is_closed()
    }
}

// Character offsets are 1-based, as reported by the server
fn insert_position(fields: &mut BTreeMap<String, String>, position: &ErrorPosition) {
    match position {
        ErrorPosition::Original(offset) => {
            fields.insert("statement_position".to_owned(), offset.to_string());
        }
        ErrorPosition::Internal { position, query } => {
            fields.insert("internal_position".to_owned(), position.to_string());
            fields.insert("internal_query".to_owned(), query.clone());
        }
    }
}

/// A PostgreSQL session with DB-API style implicit transactions
pub struct PgConnection {
    client: Client,
    in_transaction: bool,
}

impl PgConnection {
    pub fn connect(options: &PgConnectOptions) -> Result<Self, PgError> {
        let client = postgres::Config::new()
            .host(&options.host)
            .port(options.port)
            .user(&options.user)
            .password(&options.password)
            .dbname(&options.database)
            .application_name("tdsfdw-tests")
            .connect(NoTls)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            in_transaction: false,
        }
    }

    fn end_transaction(&mut self, statement: &str) -> Result<(), PgError> {
        if !self.in_transaction {
            return Ok(());
        }
        trace!("{}", statement);
        let result = self.client.batch_execute(statement);
        self.in_transaction = false;
        result.map_err(PgError::from)
    }
}

impl Connection for PgConnection {
    type Error = PgError;

    fn family(&self) -> DbFamily {
        DbFamily::PostgreSql
    }

    fn execute(&mut self, sql: &str) -> Result<(), PgError> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN")?;
            self.in_transaction = true;
        }
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, PgError> {
        let messages = self.client.simple_query(sql)?;
        let value = messages.iter().find_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(row.get(0).map(str::to_owned)),
            _ => None,
        });
        Ok(value.flatten())
    }

    fn commit(&mut self) -> Result<(), PgError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), PgError> {
        self.end_transaction("ROLLBACK")
    }
}
