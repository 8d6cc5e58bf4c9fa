use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;
const SESSION_PREFIX: &str = "session-";

/// Get the log directory path in the user-specific OS cache directory
/// - Linux: ~/.cache/css-variables-language-server/
/// - macOS: ~/Library/Caches/css-variables-language-server/
/// - Windows: %LOCALAPPDATA%\css-variables-language-server\
fn get_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory"))?;

    let log_dir = cache_dir.join(env!("CARGO_PKG_NAME"));
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Remove session logs older than LOG_RETENTION_DAYS
fn cleanup_old_logs(log_dir: &Path) -> io::Result<()> {
    let now = std::time::SystemTime::now();
    let retention = std::time::Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    for entry in fs::read_dir(log_dir)?.flatten() {
        let is_session_log = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(SESSION_PREFIX) && name.ends_with(".log"));
        if !is_session_log {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        if expired {
            if let Err(e) = fs::remove_file(entry.path()) {
                eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e);
            }
        }
    }

    Ok(())
}

fn session_log_path(log_dir: &Path) -> io::Result<PathBuf> {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(log_dir.join(format!("{}{}-{}.log", SESSION_PREFIX, timestamp, std::process::id())))
}

/// Initialize logger with stderr and optional file output
/// Returns a WorkerGuard that must be kept alive for the duration of the program
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
/// * `enable_file_logging` - Enable the per-session log file (disable for tests)
///
/// # Logging Behavior
/// - **Stderr**: Logs at the configured level. Stdout carries the LSP stream and is never written to.
/// - **Session File**: Logs at DEBUG level, including per-file scan details
pub fn init_logger(no_color: bool, log_level: Option<&str>, enable_file_logging: bool) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    let (result, guard, log_path) = if enable_file_logging {
        let log_dir = get_log_dir()?;
        cleanup_old_logs(&log_dir)?;
        let log_path = session_log_path(&log_dir)?;

        let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_timer(timer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::EnvFilter::new("debug"));

        let result = tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init();
        (result, guard, Some(log_path))
    } else {
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());
        let result = tracing_subscriber::registry().with(stderr_layer).try_init();
        (result, guard, None)
    };

    match result {
        Ok(()) => {}
        // Ignore errors due to the subscriber already being set
        Err(e) if e.to_string().contains("already been set") || e.to_string().contains("SetLoggerError") => {}
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
    }
    if let Some(log_path) = log_path {
        eprintln!("Logging to file: {:?}", log_path);
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_keeps_recent_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("session-20260101-000000-1.log"), "recent").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        assert!(dir.path().join("session-20260101-000000-1.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_session_log_path_shape() {
        let path = session_log_path(Path::new("/tmp/logs")).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(SESSION_PREFIX));
        assert!(name.ends_with(&format!("-{}.log", std::process::id())));
    }
}
