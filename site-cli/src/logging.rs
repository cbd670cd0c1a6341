//! Tracing setup for the `accounts-site` binary.
//!
//! Log records go to stderr so that command output on stdout (including
//! `--json`) stays machine readable. An optional log file receives the same
//! records without colour.

use std::{
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Local-time timestamp, padded level, then the event's target and fields.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if ansi {
            write!(writer, "\x1b[2m{timestamp}\x1b[0m ")?;
        } else {
            write!(writer, "{timestamp} ")?;
        }

        let colour = match *meta.level() {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        if ansi {
            write!(writer, "{colour}{:>5}\x1b[0m \x1b[36m{}\x1b[0m ", meta.level(), meta.target())?;
        } else {
            write!(writer, "{:>5} {} ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// `RUST_LOG` when set, otherwise `default_level`.
fn make_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn open_log_file(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file '{}'", path.display()))
}

/// Installs the global subscriber. Call once at startup.
///
/// * Level: `RUST_LOG` when set, otherwise `default_level`.
/// * Stderr: coloured when attached to a terminal, plain when redirected.
/// * `log_file`: appended to when given. Its directory must exist.
///
/// A second call leaves the first subscriber in place.
pub fn init_logging(
    default_level: &str,
    log_file: Option<&Path>,
) -> Result<()> {
    let file_layer = log_file
        .map(open_log_file)
        .transpose()?
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .event_format(LocalFmt)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .with_filter(make_filter(default_level));

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer.with_filter(make_filter(default_level)))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_in_append_mode() {
        let path = std::env::temp_dir().join(format!("accounts-site-{}.log", std::process::id()));

        let first = open_log_file(&path);
        let second = open_log_file(&path);

        assert!(first.is_ok());
        assert!(second.is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_log_directory_is_an_error() {
        let result = open_log_file(Path::new("/nonexistent-dir/for/sure/site.log"));

        assert!(result.is_err());
    }

    #[test]
    fn init_twice_does_not_fail() {
        assert!(init_logging("warn", None).is_ok());
        assert!(init_logging("debug", None).is_ok());
    }
}
