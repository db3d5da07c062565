//! Rolling file sink
//!
//! Each period writes to its own file, named by inserting the period stamp
//! between the file stem and extension of the base path:
//!
//! ```text
//! logs/app.log  --Daily-->  logs/app20260301.log
//! logs/app.log  --Hourly--> logs/app2026030114.log
//! ```
//!
//! The period is taken from the event timestamp, not the wall clock, so an
//! event always lands in the file of the hour or day it was created in.

use crate::core::diagnostic;
use crate::core::error::{LoggerError, Result};
use crate::core::event::LogEvent;
use crate::core::output_format::OutputFormat;
use crate::core::sink::Sink;
use crate::core::timestamp::TimestampFormat;
use chrono::{DateTime, Timelike, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// How often a new file is started
///
/// # Examples
///
/// ```
/// use rust_structured_logger::sinks::RollingInterval;
/// use chrono::{TimeZone, Utc};
/// use std::path::{Path, PathBuf};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 1, 14, 5, 0).unwrap();
/// let base = Path::new("logs/app.log");
///
/// assert_eq!(RollingInterval::Infinite.generate_path(base, &now), PathBuf::from("logs/app.log"));
/// assert_eq!(RollingInterval::Daily.generate_path(base, &now), PathBuf::from("logs/app20260301.log"));
/// assert_eq!(RollingInterval::Hourly.generate_path(base, &now), PathBuf::from("logs/app2026030114.log"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RollingInterval {
    /// One file, never rolled
    #[default]
    Infinite,
    /// A new file per UTC day
    Daily,
    /// A new file per UTC hour
    Hourly,
}

impl RollingInterval {
    /// The file an event at `now` belongs in
    pub fn generate_path(&self, base: &Path, now: &DateTime<Utc>) -> PathBuf {
        let Some(stamp) = self.stamp(now) else {
            return base.to_path_buf();
        };

        let mut name = base.file_stem().map(OsString::from).unwrap_or_default();
        name.push(stamp);
        if let Some(ext) = base.extension() {
            name.push(".");
            name.push(ext);
        }
        base.with_file_name(name)
    }

    /// Whether `now` falls in a different period than `last`
    pub fn should_roll(&self, last: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
        match self {
            RollingInterval::Infinite => false,
            RollingInterval::Daily => last.date_naive() != now.date_naive(),
            RollingInterval::Hourly => {
                last.date_naive() != now.date_naive() || last.hour() != now.hour()
            }
        }
    }

    fn stamp(&self, now: &DateTime<Utc>) -> Option<String> {
        match self {
            RollingInterval::Infinite => None,
            RollingInterval::Daily => Some(now.format("%Y%m%d").to_string()),
            RollingInterval::Hourly => Some(now.format("%Y%m%d%H").to_string()),
        }
    }

    fn stamp_len(&self) -> usize {
        match self {
            RollingInterval::Infinite => 0,
            RollingInterval::Daily => 8,
            RollingInterval::Hourly => 10,
        }
    }
}

#[derive(Debug, Default)]
struct FileState {
    file: Option<File>,
    current_path: Option<PathBuf>,
    last_roll: Option<DateTime<Utc>>,
    closed: bool,
}

/// File sink with time-based rolling
///
/// The parent directory is created up front; the file itself is opened on
/// the first event. Each line is written with a single `write_all` while
/// the sink's lock is held, so concurrent writers never interleave.
///
/// # Examples
///
/// ```no_run
/// use rust_structured_logger::sinks::{RollingFileSink, RollingInterval};
/// use rust_structured_logger::Logger;
///
/// let sink = RollingFileSink::new("/var/log/app.log", RollingInterval::Daily)
///     .unwrap()
///     .retained_files(7)
///     .compress(true);
/// let logger = Logger::builder().write_to(sink).create_logger().unwrap();
/// ```
#[derive(Debug)]
pub struct RollingFileSink {
    base_path: PathBuf,
    interval: RollingInterval,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
    retained_files: Option<usize>,
    compress: bool,
    state: Mutex<FileState>,
}

impl RollingFileSink {
    /// Create a rolling file sink
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created
    pub fn new<P: AsRef<Path>>(path: P, interval: RollingInterval) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        Ok(Self {
            base_path,
            interval,
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
            retained_files: None,
            compress: false,
            state: Mutex::new(FileState::default()),
        })
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format.or_default_when_invalid();
        self
    }

    /// Keep at most `count` rolled files, deleting the oldest after a roll
    #[must_use = "builder methods return a new value"]
    pub fn retained_files(mut self, count: usize) -> Self {
        self.retained_files = Some(count);
        self
    }

    /// Gzip each file once it has been rolled away from
    #[must_use = "builder methods return a new value"]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn interval(&self) -> RollingInterval {
        self.interval
    }

    /// The file currently open, if any event has been written
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state.lock().current_path.clone()
    }

    fn roll_to(&self, state: &mut FileState, now: DateTime<Utc>) -> Result<()> {
        let previous = state.current_path.take();
        if let Some(file) = state.file.take() {
            if let Err(e) = file.sync_data() {
                diagnostic::warning(format!("Failed to sync log file before rolling: {}", e));
            }
        }

        let path = self.interval.generate_path(&self.base_path, &now);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        state.file = Some(file);
        state.current_path = Some(path.clone());
        state.last_roll = Some(now);

        if let Some(previous) = previous.filter(|previous| *previous != path) {
            self.after_roll(&previous, &path);
        }
        Ok(())
    }

    /// Compression and retention; failures are reported, never returned
    fn after_roll(&self, previous: &Path, current: &Path) {
        if self.compress {
            if let Err(e) = compress_file(previous) {
                diagnostic::error(format!("Failed to compress rolled log file: {}", e));
            }
        }

        if let Some(keep) = self.retained_files {
            let rolled = self.rolled_files(current);
            let excess = rolled.len().saturating_sub(keep);
            for old in &rolled[..excess] {
                if let Err(e) = fs::remove_file(old) {
                    diagnostic::warning(format!(
                        "Failed to remove old log file {}: {}",
                        old.display(),
                        e
                    ));
                }
            }
        }
    }

    /// Rolled files of this sink on disk, oldest first, excluding `current`
    fn rolled_files(&self, current: &Path) -> Vec<PathBuf> {
        let dir = self
            .base_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let ext = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let stamp_len = self.interval.stamp_len();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                diagnostic::warning(format!(
                    "Failed to list log directory {}: {}",
                    dir.display(),
                    e
                ));
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.as_path() != current)
            .filter(|path| {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    return false;
                };
                let Some(rest) = name.strip_prefix(stem) else {
                    return false;
                };
                let (Some(stamp), Some(suffix)) = (rest.get(..stamp_len), rest.get(stamp_len..))
                else {
                    return false;
                };
                stamp.bytes().all(|b| b.is_ascii_digit())
                    && (suffix == ext || suffix.strip_suffix(".gz") == Some(ext.as_str()))
            })
            .collect();
        files.sort();
        files
    }
}

impl Sink for RollingFileSink {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        let mut line = self.output_format.format(event, &self.timestamp_format);
        line.push('\n');

        let mut state = self.state.lock();
        if state.closed {
            return Err(LoggerError::sink_closed(self.name()));
        }

        // Rolling only moves forward; a late event joins the current file
        let now = state
            .last_roll
            .map_or(event.timestamp, |last| last.max(event.timestamp));
        let due = state
            .last_roll
            .map_or(true, |last| self.interval.should_roll(&last, &now));
        if state.file.is_none() || due {
            self.roll_to(&mut state, now)?;
        }

        let path = state.current_path.clone().unwrap_or_default();
        match state.file.as_mut() {
            Some(file) => file.write_all(line.as_bytes()).map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                )
            }),
            None => Err(LoggerError::file_sink(
                self.base_path.display().to_string(),
                "File not open",
            )),
        }
    }

    fn flush(&self) -> Result<()> {
        let state = self.state.lock();
        if let Some(ref file) = state.file {
            file.sync_data().map_err(|e| {
                LoggerError::io_operation("flushing log file", "sync_data failed", e)
            })?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(file) = state.file.take() {
            file.sync_data().map_err(|e| {
                LoggerError::io_operation("closing log file", "sync_data failed", e)
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rolling_file"
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Gzip `path` to `path.gz`, deleting the original only once the archive
/// is complete
fn compress_file(path: &Path) -> Result<PathBuf> {
    let gz_path = with_suffix(path, ".gz");
    let temp_path = with_suffix(path, ".gz.tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let output = File::create(&temp_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary file: {}", temp_path.display()),
            e,
        )
    })?;

    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let mut encoder = GzEncoder::new(BufWriter::with_capacity(64 * 1024, output), Compression::default());
    let written = io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut writer| writer.flush());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    if gz_path.exists() {
        append_member(&temp_path, &gz_path)?;
    } else {
        fs::rename(&temp_path, &gz_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to rename compressed file to: {}", gz_path.display()),
                e,
            )
        })?;
    }

    if let Err(e) = fs::remove_file(path) {
        diagnostic::warning(format!(
            "Compressed {} but failed to remove the original: {}",
            path.display(),
            e
        ));
    }
    Ok(gz_path)
}

/// Append the gzip member in `temp_path` to an existing archive
///
/// Concatenated members form a valid gzip stream, so an archive written by
/// an earlier roll keeps its contents.
fn append_member(temp_path: &Path, gz_path: &Path) -> Result<()> {
    let appended = File::open(temp_path).and_then(|mut member| {
        let mut archive = OpenOptions::new().append(true).open(gz_path)?;
        io::copy(&mut member, &mut archive)?;
        archive.sync_data()
    });
    let _ = fs::remove_file(temp_path);
    appended.map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to append to existing archive: {}", gz_path.display()),
            e,
        )
    })
}
