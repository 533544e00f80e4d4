//! Logging manager
//!
//! Provides up to three outputs on one registry:
//! - Console: stderr, level switched per configuration unit
//! - File: optional, daily rotation, DEBUG level
//! - Mail buffer: records captured while a unit runs, sent as the email report

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

/// Prefix of log file names
const LOG_FILE_PREFIX: &str = "borg-manager";

/// Maximum number of records kept for one email report
pub const MAIL_BUFFER_CAPACITY: usize = 2000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for log files, `None` for console only
    pub log_directory: Option<PathBuf>,
    /// Log level for file output
    pub file_level: Level,
    /// Initial console level, until a configuration unit sets its own
    pub console_level: Level,
    /// Maximum number of log files to keep
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: None,
            file_level: Level::DEBUG,
            console_level: Level::INFO,
            max_files: 10,
        }
    }
}

impl LoggingConfig {
    pub fn with_log_directory(mut self, log_directory: &Path) -> Self {
        self.log_directory = Some(log_directory.to_path_buf());
        self
    }
}

/// Parse a level name (`trace`, `debug`, `info`, `warn`/`warning`, `error`)
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Handle swapping a level filter after the subscriber is installed
pub type LevelHandle = reload::Handle<LevelFilter, Registry>;

/// Called with a full batch of mail records while capture continues
pub type FlushHook = Arc<dyn Fn(MailReport) + Send + Sync>;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// The mail buffer's sink behind its reloadable threshold
pub type MailLayer = Filtered<MailSink, reload::Layer<LevelFilter, Registry>, Registry>;

/// Records collected for one email report
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MailReport {
    pub lines: Vec<String>,
    /// Records that did not fit in the buffer
    pub dropped: usize,
}

impl MailReport {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.dropped == 0
    }

    /// Plain-text body, CRLF line endings
    pub fn body(&self) -> String {
        let mut body = String::new();
        for line in &self.lines {
            body.push_str(line);
            body.push_str("\r\n");
        }
        if self.dropped > 0 {
            let _ = write!(
                body,
                "... {} more log records were dropped\r\n",
                self.dropped
            );
        }
        body
    }
}

#[derive(Default)]
struct MailState {
    lines: Vec<String>,
    dropped: usize,
    flush: Option<FlushHook>,
}

/// Records captured for the email report of the running unit
///
/// The layer half is a [`MailSink`] behind a reloadable [`LevelFilter`];
/// capture is off (`OFF`) until [`start`](MailBuffer::start).
#[derive(Clone)]
pub struct MailBuffer {
    threshold: LevelHandle,
    state: Arc<Mutex<MailState>>,
}

impl MailBuffer {
    pub fn new(capacity: usize) -> (Self, MailLayer) {
        let state = Arc::new(Mutex::new(MailState::default()));
        let (filter, threshold) = reload::Layer::new(LevelFilter::OFF);
        let sink = MailSink {
            state: Arc::clone(&state),
            capacity,
        };
        (Self { threshold, state }, sink.with_filter(filter))
    }

    /// Start capturing records at `level` or above, discarding old ones
    pub fn start(&self, level: Level) {
        if let Ok(mut state) = self.state.lock() {
            state.lines.clear();
            state.dropped = 0;
        }
        self.set_threshold(LevelFilter::from_level(level));
    }

    /// Hand each full batch to `flush` instead of dropping further records
    ///
    /// Cleared by [`finish`](MailBuffer::finish).
    pub fn flush_when_full<F>(&self, flush: F)
    where
        F: Fn(MailReport) + Send + Sync + 'static,
    {
        if let Ok(mut state) = self.state.lock() {
            state.flush = Some(Arc::new(flush));
        }
    }

    /// Stop capturing and hand out what was collected
    pub fn finish(&self) -> MailReport {
        self.set_threshold(LevelFilter::OFF);
        match self.state.lock() {
            Ok(mut state) => {
                let state = std::mem::take(&mut *state);
                MailReport {
                    lines: state.lines,
                    dropped: state.dropped,
                }
            }
            Err(_) => MailReport::default(),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.threshold
            .with_current(|filter| *filter != LevelFilter::OFF)
            .unwrap_or(false)
    }

    fn set_threshold(&self, filter: LevelFilter) {
        if let Err(e) = self.threshold.reload(filter) {
            tracing::warn!("Failed to change mail log level: {}", e);
        }
    }
}

/// Layer storing formatted records for [`MailBuffer`]
pub struct MailSink {
    state: Arc<Mutex<MailState>>,
    capacity: usize,
}

impl MailSink {
    fn push(&self, line: String) {
        let full = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.lines.len() < self.capacity {
                state.lines.push(line);
            } else {
                state.dropped += 1;
            }
            match state.flush {
                Some(ref flush) if state.lines.len() >= self.capacity => {
                    let flush = Arc::clone(flush);
                    let report = MailReport {
                        lines: std::mem::take(&mut state.lines),
                        dropped: std::mem::take(&mut state.dropped),
                    };
                    Some((flush, report))
                }
                _ => None,
            }
        };

        // Outside the lock: the hook may log
        if let Some((flush, report)) = full {
            flush(report);
        }
    }
}

impl<S: Subscriber> Layer<S> for MailSink {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.push(format!(
            "{} [{}] {}",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level(),
            visitor.finish()
        ));
    }
}

/// Collects the message and fields of an event into one line
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Initialize logging with console, optional file and mail buffer outputs
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the guard is dropped, any remaining file logs are flushed to disk.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let (mail, mail_layer) = MailBuffer::new(MAIL_BUFFER_CAPACITY);

    let console_fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(3);

    // RUST_LOG wins over the configured console level
    let console = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => {
            layers.push(console_fmt.with_filter(env_filter).boxed());
            None
        }
        Err(_) => {
            let (filter, handle) = reload::Layer::new(LevelFilter::from_level(config.console_level));
            layers.push(console_fmt.with_filter(filter).boxed());
            Some(handle)
        }
    };

    let (file_guard, log_dir) = match config.log_directory {
        Some(ref dir) => {
            let log_dir = crate::config::expand_tilde(dir);
            fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

            // Create rolling file appender (daily rotation)
            let file_appender = RollingFileAppender::new(
                Rotation::DAILY,
                &log_dir,
                format!("{}.log", LOG_FILE_PREFIX),
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
                .with_target(true)
                .with_level(true)
                .with_filter(LevelFilter::from_level(config.file_level));
            layers.push(layer.boxed());

            (Some(guard), Some(log_dir))
        }
        None => (None, None),
    };
    layers.push(mail_layer.boxed());

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install the log subscriber")?;

    if let Some(ref dir) = log_dir {
        cleanup_old_logs(dir, config.max_files)?;
    }

    Ok(LogGuard {
        console,
        mail,
        _file_guard: file_guard,
    })
}

/// Cleanup old log files, keeping only the most recent N files
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOG_FILE_PREFIX)
        })
        .collect();

    // Sort by modification time (newest first)
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    for file in log_files.into_iter().skip(max_files as usize) {
        if let Err(e) = fs::remove_file(file.path()) {
            tracing::warn!("Failed to remove old log file {:?}: {}", file.path(), e);
        } else {
            tracing::debug!("Removed old log file: {:?}", file.path());
        }
    }

    Ok(())
}

/// Guard that keeps the logging system alive
///
/// Also gives access to the console level and the mail buffer.
pub struct LogGuard {
    /// `None` while `RUST_LOG` drives the console
    console: Option<LevelHandle>,
    mail: MailBuffer,
    _file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    /// Change the console level (ignored while `RUST_LOG` is set)
    pub fn set_console_level(&self, level: Level) {
        if let Some(ref console) = self.console {
            if let Err(e) = console.reload(LevelFilter::from_level(level)) {
                tracing::warn!("Failed to change console log level: {}", e);
            }
        }
    }

    pub fn mail_buffer(&self) -> &MailBuffer {
        &self.mail
    }
}
