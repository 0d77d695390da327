// =============================================================================
// LOGGING - Console + file sinks behind the `log` facade
// =============================================================================
//
// Every record is fanned out to two env_logger loggers: a colored console
// logger on stderr and a plain logger writing to logs/game.log. winit logs
// through the same facade, so window-system messages end up in both sinks.

use crate::config::DebugConfig;
use anyhow::{Context, Result};
use env_logger::{Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File};
use std::sync::Once;

static INIT: Once = Once::new();

/// `log` has no level above `error`; critical messages are errors with a tag.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        log::error!("[CRITICAL] {}", format_args!($($arg)+))
    };
}

/// Keeps the process-wide logger alive for the duration of `main`.
///
/// Dropping it flushes both sinks. The logger itself stays installed: the
/// `log` facade cannot be uninstalled.
pub struct LogGuard {
    _private: (),
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        log::logger().flush();
    }
}

/// Fans every record out to a console logger and an optional file logger.
pub struct FanOutLogger {
    console: env_logger::Logger,
    file: Option<env_logger::Logger>,
}

impl FanOutLogger {
    pub fn new(console: env_logger::Logger, file: Option<env_logger::Logger>) -> Self {
        Self { console, file }
    }

    /// Most verbose level any sink accepts
    pub fn filter(&self) -> LevelFilter {
        let file = self.file.as_ref().map_or(LevelFilter::Off, |f| f.filter());
        self.console.filter().max(file)
    }
}

impl Log for FanOutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata)
            || self.file.as_ref().is_some_and(|f| f.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

/// Resolve the filter directive: RUST_LOG beats the config file.
pub fn filter_spec(config: &DebugConfig, env: Option<String>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.log_level.clone())
}

fn builder(spec: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    // winit is chatty at debug/trace; a directive in `spec` overrides this
    builder.filter_module("winit", LevelFilter::Warn);
    builder.parse_filters(spec);
    builder
}

/// Build the fan-out logger without installing it.
pub fn build_logger(config: &DebugConfig, spec: &str) -> Result<FanOutLogger> {
    let console = builder(spec)
        .target(Target::Stderr)
        .write_style(WriteStyle::Auto)
        .build();

    let file = if config.log_to_file {
        fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;

        let path = config.log_path();
        // Truncated once per run
        let sink = File::create(&path)
            .with_context(|| format!("Failed to create log file {:?}", path))?;

        Some(
            builder(spec)
                .target(Target::Pipe(Box::new(sink)))
                .write_style(WriteStyle::Never)
                .build(),
        )
    } else {
        None
    };

    Ok(FanOutLogger::new(console, file))
}

/// Install the process-wide logger. Only the first call does any work.
pub fn init_logging(config: &DebugConfig) -> Result<LogGuard> {
    let mut result: Result<()> = Ok(());

    INIT.call_once(|| {
        result = (|| -> Result<()> {
            let spec = filter_spec(config, std::env::var("RUST_LOG").ok());
            let logger = build_logger(config, &spec)?;
            let max_level = logger.filter();

            log::set_boxed_logger(Box::new(logger)).context("A logger is already installed")?;
            log::set_max_level(max_level);

            log::debug!("logging initialized ({})", spec);
            if config.log_to_file {
                log::info!("Writing log to {:?}", config.log_path());
            }
            Ok(())
        })();
    });

    result?;
    Ok(LogGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config(name: &str) -> DebugConfig {
        DebugConfig {
            log_level: "debug".to_string(),
            log_to_file: true,
            log_dir: std::env::temp_dir().join(format!("triangle-engine-{}-{}", name, std::process::id())),
            log_file: "game.log".to_string(),
        }
    }

    #[test]
    fn test_env_overrides_config_level() {
        let config = DebugConfig::default();
        assert_eq!(filter_spec(&config, Some("warn".into())), "warn");
        assert_eq!(filter_spec(&config, Some("  ".into())), config.log_level);
        assert_eq!(filter_spec(&config, None), config.log_level);
    }

    #[test]
    fn test_file_sink_receives_records() {
        let config = temp_config("file-sink");
        let logger = build_logger(&config, "debug").unwrap();
        assert_eq!(logger.filter(), LevelFilter::Debug);

        logger.log(
            &Record::builder()
                .args(format_args!("swapchain recreated"))
                .level(log::Level::Info)
                .target("triangle_engine")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("filtered out"))
                .level(log::Level::Trace)
                .target("triangle_engine")
                .build(),
        );
        logger.flush();

        let written = fs::read_to_string(config.log_path()).unwrap();
        assert!(written.contains("swapchain recreated"));
        assert!(!written.contains("filtered out"));
        // plain text, no ANSI escapes in the file
        assert!(!written.contains('\u{1b}'));

        let _ = fs::remove_dir_all(&config.log_dir);
    }

    #[test]
    fn test_file_sink_disabled() {
        let mut config = temp_config("no-file");
        config.log_to_file = false;
        let logger = build_logger(&config, "info").unwrap();
        assert_eq!(logger.filter(), LevelFilter::Info);
        assert!(!PathBuf::from(&config.log_dir).exists());
    }
}
