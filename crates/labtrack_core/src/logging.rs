//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start one flexi_logger backend per process, writing either rolling files
//!   or stderr.
//! - Capture panics as single-line log events.
//!
//! # Invariants
//! - Initialization is idempotent for an identical [`LoggingConfig`] and
//!   rejects any different one.
//! - Initialization never panics.
//! - Events are `key=value` metadata; record content and sync tokens are
//!   never logged.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "labtrack";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE_CONFIG: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    config: LoggingConfig,
    _handle: LoggerHandle,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    level: &'static str,
    /// Rolling files in this directory; stderr when `None`.
    log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates `level` (`trace|debug|info|warn|error`, case-insensitive).
    pub fn new(level: &str) -> Result<Self, LoggingError> {
        Ok(Self {
            level: normalize_level(level)?,
            log_dir: None,
        })
    }

    /// Switches output to rolling files under an absolute directory.
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Result<Self, LoggingError> {
        let log_dir = log_dir.into();
        if log_dir.as_os_str().is_empty() || !log_dir.is_absolute() {
            return Err(LoggingError::RelativeDirectory(log_dir));
        }
        self.log_dir = Some(log_dir);
        Ok(self)
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.log_dir.as_ref()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeDirectory(PathBuf),
    CreateDirectory(PathBuf, std::io::Error),
    Backend(flexi_logger::FlexiLoggerError),
    /// Another configuration is already active in this process.
    AlreadyInitialized(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeDirectory(path) => {
                write!(f, "log directory must be absolute, got `{}`", path.display())
            }
            Self::CreateDirectory(path, err) => {
                write!(f, "failed to create log directory `{}`: {err}", path.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyInitialized(active) => {
                write!(f, "logging already initialized as {active}; refusing to switch")
            }
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory(_, err) => Some(err),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts logging for the process.
///
/// # Errors
/// - [`LoggingError::AlreadyInitialized`] when a different config is active.
/// - [`LoggingError::CreateDirectory`] / [`LoggingError::Backend`] when the
///   backend cannot start.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let active = ACTIVE_CONFIG.get_or_try_init(|| start_backend(config))?;
    if active.config != *config {
        return Err(LoggingError::AlreadyInitialized(describe(&active.config)));
    }
    Ok(())
}

/// Active configuration, if logging has been initialized.
pub fn logging_status() -> Option<LoggingConfig> {
    ACTIVE_CONFIG.get().map(|active| active.config.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(config: &LoggingConfig) -> Result<ActiveLogger, LoggingError> {
    let logger = Logger::try_with_str(config.level).map_err(LoggingError::Backend)?;
    let logger = match config.log_dir.as_ref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| LoggingError::CreateDirectory(dir.clone(), err))?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        None => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
    };
    let handle = logger.start().map_err(LoggingError::Backend)?;

    install_panic_hook_once();
    info!(
        "event=app_start module=core status=ok platform={} version={} {}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        describe(config)
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

fn describe(config: &LoggingConfig) -> String {
    match config.log_dir.as_ref() {
        Some(dir) => format!("level={} log_dir={}", config.level, dir.display()),
        None => format!("level={} log_dir=stderr", config.level),
    }
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Collapses line breaks and caps length so one event stays on one line.
pub(crate) fn single_line(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, single_line, LoggingConfig, LoggingError};

    #[test]
    fn level_is_normalized() {
        assert_eq!(LoggingConfig::new(" WARNING ").unwrap().level(), "warn");
        assert!(matches!(
            LoggingConfig::new("loud"),
            Err(LoggingError::UnsupportedLevel(_))
        ));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = LoggingConfig::new("info")
            .unwrap()
            .with_log_dir("logs/dev")
            .expect_err("relative paths must be rejected");
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn single_line_removes_newlines_and_truncates() {
        let value = single_line("line1\nline2\rline3", 8);
        assert!(!value.contains('\n'));
        assert!(!value.contains('\r'));
        assert!(value.ends_with("..."));
    }

    #[test]
    fn init_is_idempotent_and_rejects_a_different_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig::new("info")
            .unwrap()
            .with_log_dir(dir.path())
            .unwrap();

        init_logging(&config).expect("first init should succeed");
        init_logging(&config).expect("same config should be idempotent");

        let other = LoggingConfig::new("debug")
            .unwrap()
            .with_log_dir(dir.path())
            .unwrap();
        let err = init_logging(&other).expect_err("level conflict should fail");
        assert!(matches!(err, LoggingError::AlreadyInitialized(_)));

        assert_eq!(logging_status(), Some(config));
    }
}
