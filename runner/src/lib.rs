//! Pieces shared by the `postgresql-tests` and `mssql-tests` binaries

pub mod config;

use std::fs::File;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use tdsfdw_common::config::HarnessExit;
use tdsfdw_common::prompt::{setup_logger, LoggerError, MessageSink};
use tdsfdw_testing_framework::report::RunResult;
use tdsfdw_testing_framework::substitution::PlaceholderMap;

use config::LogConfig;

/// Apply `--config-file` and `--generate-config-template`.
///
/// Returns `Break` when the binary has nothing left to do (a template was
/// written, or could not be) and `Continue` with the configuration to run
/// with otherwise.
pub fn load_config<T>(config: T, config_file: Option<&str>, generate_template: bool) -> Result<ControlFlow<(), T>>
where
    T: Serialize + DeserializeOwned,
{
    let Some(path) = config_file else {
        if generate_template {
            eprintln!("Provided config file path is required to generate the template with --config-file");
            return Ok(ControlFlow::Break(()));
        }
        return Ok(ControlFlow::Continue(config));
    };

    if generate_template {
        if Path::new(path).exists() {
            eprintln!("Config file already exists at {}", path);
            return Ok(ControlFlow::Break(()));
        }

        let mut file = File::create(path).context("Error while creating config file")?;
        let json = serde_json::to_string_pretty(&config).context("Error while serializing config file")?;
        file.write_all(json.as_bytes()).context("Error while writing config file")?;
        println!("Config file template generated at {}", path);
        return Ok(ControlFlow::Break(()));
    }

    let file = File::open(path).context("Error while opening config file")?;
    let config = serde_json::from_reader(file).context("Error while reading config file")?;
    Ok(ControlFlow::Continue(config))
}

/// Install the global logger described by the log options
///
/// An unusable `--log-file` is a usage problem; failing to install the
/// logger itself is fatal.
pub fn init_logging<S: MessageSink + ?Sized>(sink: &mut S, log: &LogConfig) -> Result<(), HarnessExit> {
    let result = setup_logger(
        log.log_level,
        log.disable_log_color,
        log.log_file.as_deref().map(Path::new),
        &log.datetime_format,
    );
    match result {
        Ok(()) => Ok(()),
        Err(e @ LoggerError::LogFile(_)) => {
            sink.error(&e.to_string());
            Err(HarnessExit::Usage)
        }
        Err(e @ LoggerError::AlreadySet(_)) => {
            sink.error(&e.to_string());
            Err(HarnessExit::Fatal)
        }
    }
}

/// Return `value` when it is one of `allowed`, otherwise warn and fall
/// back to `default`
pub fn validated_choice<S: MessageSink + ?Sized>(
    sink: &mut S,
    flag: &str,
    value: &str,
    allowed: &[&str],
    default: &str,
) -> String {
    if allowed.contains(&value) {
        return value.to_owned();
    }
    sink.warning(&format!(
        "Invalid {} value '{}', using '{}'",
        flag, value, default
    ));
    default.to_owned()
}

/// Placeholders are replaced in no particular order, so tokens that
/// overlap can produce surprising SQL
pub fn warn_ambiguities(placeholders: &PlaceholderMap) {
    for ambiguity in placeholders.ambiguities() {
        warn!("Ambiguous placeholders: {}", ambiguity);
    }
}

/// Process status for a completed run
pub fn exit_for(result: &RunResult) -> HarnessExit {
    if result.errors() != 0 {
        HarnessExit::TestFailures
    } else {
        HarnessExit::Success
    }
}
