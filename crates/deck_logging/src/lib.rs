#![deny(missing_docs)]
//! Shared logging utilities for the deck workspace.
//!
//! This crate provides the `deck_*` logging macros used across the codebase,
//! a per-thread execution context label that prefixes every line, and the
//! logger initializers for tests and for running contexts.

use std::cell::Cell;
use std::fs::File;
use std::future::{poll_fn, Future};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::pin;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log;

const UNSET_LABEL: &str = "-";

thread_local! {
    /// Label of the execution context (background, content, inject) running on this thread.
    static CONTEXT_LABEL: Cell<&'static str> = const { Cell::new(UNSET_LABEL) };
}

/// Sets the execution context label for the current thread.
///
/// Async tasks can resume on a different worker thread after every
/// `.await`, so set the label again before each dispatch.
pub fn set_context_label(label: &'static str) {
    CONTEXT_LABEL.with(|v| v.set(label));
}

/// Retrieves the execution context label for the current thread.
/// Returns `-` if no label has been set.
pub fn context_label() -> &'static str {
    CONTEXT_LABEL.with(|v| v.get())
}

/// Runs `future` with `label` set on whichever thread polls it.
///
/// Use this for tasks on a multi-threaded runtime, where a plain
/// [`set_context_label`] only covers the code before the first `.await`.
pub async fn with_context_label<F: Future>(label: &'static str, future: F) -> F::Output {
    let mut future = pin!(future);
    poll_fn(move |cx| {
        set_context_label(label);
        future.as_mut().poll(cx)
    })
    .await
}

/// Logs a trace-level message tagged with the current context label.
#[macro_export]
macro_rules! deck_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("[{}] {}", $crate::context_label(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current context label.
#[macro_export]
macro_rules! deck_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("[{}] {}", $crate::context_label(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current context label.
#[macro_export]
macro_rules! deck_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("[{}] {}", $crate::context_label(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current context label.
#[macro_export]
macro_rules! deck_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("[{}] {}", $crate::context_label(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current context label.
#[macro_export]
macro_rules! deck_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("[{}] {}", $crate::context_label(), format_args!($($arg)*));
    }};
}

/// Log file used when a context runs without an explicit path.
pub const DEFAULT_LOG_FILE: &str = "./deck.log";

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file, truncated on start.
    File(PathBuf),
    /// Write to the terminal.
    Terminal,
    /// Write to the terminal and to the given file.
    Both(PathBuf),
}

impl Default for LogDestination {
    fn default() -> Self {
        LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE))
    }
}

/// Installs the global logger for `destination`.
///
/// Fails only if the log file cannot be created. A logger installed
/// earlier stays in place.
pub fn initialize(destination: &LogDestination, level: LevelFilter) -> io::Result<()> {
    let loggers = build_loggers(destination, level)?;
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// The sinks `initialize` would install, without touching the global logger.
pub fn build_loggers(
    destination: &LogDestination,
    level: LevelFilter,
) -> io::Result<Vec<Box<dyn SharedLogger>>> {
    let config = build_config();
    let terminal = |config: Config| -> Box<dyn SharedLogger> {
        TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
    };
    Ok(match destination {
        LogDestination::File(path) => vec![file_logger(path, level, config)?],
        LogDestination::Terminal => vec![terminal(config)],
        LogDestination::Both(path) => {
            vec![terminal(config.clone()), file_logger(path, level, config)?]
        }
    })
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn file_logger(path: &Path, level: LevelFilter, config: Config) -> io::Result<Box<dyn SharedLogger>> {
    let file = File::create(path)?;
    let logger: Box<dyn SharedLogger> = WriteLogger::new(level, config, file);
    Ok(logger)
}
