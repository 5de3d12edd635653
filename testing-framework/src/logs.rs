//! PostgreSQL server log discovery
//!
//! Finds the files a local PostgreSQL server writes its log to, so they can
//! be dumped after a failed run. Only works when the harness runs on the
//! database host and the user is a superuser; otherwise nothing is found.

use log::{debug, trace};
use std::fs;
use std::path::{Path, PathBuf};

use tdsfdw_common::prompt::MessageSink;

use crate::connection::{Connection, DiagnosticError};
use crate::database::DbFamily;
use crate::error::{HarnessError, Result};

const DATA_DIRECTORY_QUERY: &str =
    "SELECT setting FROM pg_catalog.pg_settings WHERE name = 'data_directory';";
const LOG_DIRECTORY_QUERY: &str =
    "SELECT setting FROM pg_catalog.pg_settings WHERE name = 'log_directory';";
const LOGGING_COLLECTOR_QUERY: &str =
    "SELECT setting FROM pg_catalog.pg_settings WHERE name = 'logging_collector';";

const LOGGER_PROCESS_TITLE: &[u8] = b"postgres: logger";

/// Locates server log files through the process table
#[derive(Debug, Clone)]
pub struct LogCollector {
    proc_root: PathBuf,
}

impl Default for LogCollector {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl LogCollector {
    /// Use `proc_root` instead of `/proc`
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Paths of the server log files, canonicalized.
    ///
    /// MSSQL servers never have any. Missing privileges are reported on
    /// the sink and yield an empty list.
    pub fn collect<C, S>(&self, conn: &mut C, sink: &mut S) -> Result<Vec<PathBuf>>
    where
        C: Connection + ?Sized,
        S: MessageSink + ?Sized,
    {
        if conn.family() == DbFamily::MsSql {
            return Ok(Vec::new());
        }

        let data_dir = match conn.query_scalar(DATA_DIRECTORY_QUERY) {
            Ok(Some(dir)) => PathBuf::from(dir),
            Ok(None) | Err(_) => {
                sink.error("The user does not have SUPERUSER access to PostgreSQL.");
                sink.error(
                    "Cannot access pg_catalog.pg_settings required values, so logs cannot be found",
                );
                return Ok(Vec::new());
            }
        };

        let log_dir = data_dir.join(setting(conn, LOG_DIRECTORY_QUERY)?);
        let collector = setting(conn, LOGGING_COLLECTOR_QUERY)?;
        debug!(
            "Server data directory {}, log directory {}, logging_collector {}",
            data_dir.display(),
            log_dir.display(),
            collector
        );

        if collector == "off" {
            return self.postmaster_output(&data_dir);
        }

        let mut logs = self.logger_outputs()?;
        let mut entries = fs::read_dir(&log_dir)
            .map_err(|e| HarnessError::io(&log_dir, e))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| HarnessError::io(&log_dir, e))?;
        entries.sort();
        for path in entries {
            logs.push(canonical(path));
        }
        Ok(logs)
    }

    // stdout of the postmaster, stderr is assumed to be redirected there
    fn postmaster_output(&self, data_dir: &Path) -> Result<Vec<PathBuf>> {
        let pid_file = data_dir.join("postmaster.pid");
        let contents =
            fs::read_to_string(&pid_file).map_err(|e| HarnessError::io(&pid_file, e))?;
        let pid = contents.lines().next().unwrap_or_default().trim();

        let output = self.proc_root.join(pid).join("fd").join("1");
        if output.is_file() {
            Ok(vec![canonical(output)])
        } else {
            debug!("{} is not a file", output.display());
            Ok(Vec::new())
        }
    }

    // stderr of every logger process
    fn logger_outputs(&self) -> Result<Vec<PathBuf>> {
        let mut pids = fs::read_dir(&self.proc_root)
            .map_err(|e| HarnessError::io(&self.proc_root, e))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            .collect::<Vec<_>>();
        pids.sort();

        let mut logs = Vec::new();
        for pid in pids {
            let process = self.proc_root.join(&pid);
            // The process may be gone by now
            let Ok(cmdline) = fs::read(process.join("cmdline")) else {
                trace!("process {} vanished", pid);
                continue;
            };
            if !contains(&cmdline, LOGGER_PROCESS_TITLE) {
                continue;
            }
            let output = process.join("fd").join("2");
            if output.is_file() {
                logs.push(canonical(output));
            }
        }
        Ok(logs)
    }
}

fn setting<C: Connection + ?Sized>(conn: &mut C, query: &str) -> Result<String> {
    match conn.query_scalar(query) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(HarnessError::ServerQuery {
            query: query.to_owned(),
            reason: "no value returned".to_owned(),
        }),
        Err(e) if e.is_connection_fatal() => Err(HarnessError::ConnectionFatal(e.message())),
        Err(e) => Err(HarnessError::ServerQuery {
            query: query.to_owned(),
            reason: e.message(),
        }),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn canonical(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

/// Collect server logs with the default `/proc` root
pub fn collect_server_logs<C, S>(conn: &mut C, sink: &mut S) -> Result<Vec<PathBuf>>
where
    C: Connection + ?Sized,
    S: MessageSink + ?Sized,
{
    LogCollector::default().collect(conn, sink)
}

/// Print every log file under a header
pub fn print_server_logs<S: MessageSink + ?Sized>(paths: &[PathBuf], sink: &mut S) {
    for path in paths {
        sink.info(&format!(
            "=========== Content of {} ===========",
            path.display()
        ));
        match fs::read(path) {
            Ok(contents) => sink.raw(&String::from_utf8_lossy(&contents)),
            Err(e) => sink.warning(&format!("Cannot read {}: {}", path.display(), e)),
        }
    }
}
