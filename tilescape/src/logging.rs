//! Process-wide `tracing` subscriber setup.
//!
//! Binaries call [`init_logging`] once at startup. Library code never installs
//! a subscriber; it logs through an injected [`Logger`](crate::log::Logger).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive. Dropping it flushes pending lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// A guard that owns no file writer.
    pub fn console_only() -> Self {
        Self { _file_guard: None }
    }
}

/// Install a subscriber writing to stderr and, when `log_file` is given, to
/// that file (truncated on startup, written without ANSI colors).
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Installing twice is not an error; the second call leaves the first
/// subscriber in place.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the file
/// cannot be truncated.
pub fn init_logging(default_filter: &str, log_file: Option<&Path>) -> Result<LoggingGuard, io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            fs::create_dir_all(&dir)?;
            File::create(dir.join(&name))?;

            let appender = tracing_appender::rolling::never(&dir, &name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // an already installed subscriber stays in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(LoggingGuard { _file_guard: guard })
}

/// `~/.tilescape/tilescape.log`, or a relative path when there is no home.
pub fn default_log_file() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".tilescape"))
        .unwrap_or_else(|| PathBuf::from(".tilescape"))
        .join("tilescape.log")
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String), io::Error> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid log file path {}", path.display())))?
        .to_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, name))
}
