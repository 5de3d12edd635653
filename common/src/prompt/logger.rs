use std::path::Path;

use fern::colors::{Color, ColoredLevelConfig};
use thiserror::Error;

use super::LogLevel;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Cannot open log file: {0}")]
    LogFile(#[from] std::io::Error),
    #[error("A logger is already installed: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Install the global logger.
///
/// Records go to stderr, colored by level unless `disable_colors` is set,
/// and to `log_file` without colors when one is given. Stdout is left to
/// the test progress output.
pub fn setup_logger(
    level: LogLevel,
    disable_colors: bool,
    log_file: Option<&Path>,
    datetime_format: &str,
) -> Result<(), LoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::BrightRed)
        .warn(Color::BrightYellow)
        .info(Color::BrightGreen)
        .debug(Color::BrightCyan)
        .trace(Color::BrightBlack);

    let stderr_format = datetime_format.to_owned();
    let stderr = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = if disable_colors {
                record.level().to_string()
            } else {
                colors.color(record.level()).to_string()
            };
            out.finish(format_args!(
                "{} {} [{}] {}",
                chrono::Local::now().format(&stderr_format),
                level,
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new().level(level.into()).chain(stderr);

    if let Some(path) = log_file {
        let file_format = datetime_format.to_owned();
        let file = fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {} [{}] {}",
                    chrono::Local::now().format(&file_format),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(fern::log_file(path)?);
        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;
    Ok(())
}
