//! Console sink implementation

use crate::core::error::{LoggerError, Result};
use crate::core::event::LogEvent;
use crate::core::level::Level;
use crate::core::output_format::OutputFormat;
use crate::core::sink::Sink;
use crate::core::timestamp::TimestampFormat;
use std::io::Write;

#[cfg(feature = "console")]
use colored::Colorize;

/// Writes one line per event to stdout, or to stderr from a threshold up
///
/// With the `console` feature, text output colors the level token.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    use_colors: bool,
    stderr_threshold: Level,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            stderr_threshold: Level::Error,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Events at `level` or above go to stderr
    #[must_use = "builder methods return a new value"]
    pub fn with_stderr_threshold(mut self, level: Level) -> Self {
        self.stderr_threshold = level;
        self
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::sinks::ConsoleSink;
    /// use rust_structured_logger::core::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
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

    fn uses_stderr(&self, level: Level) -> bool {
        level.is_at_least(self.stderr_threshold)
    }

    fn format_line(&self, event: &LogEvent) -> String {
        match self.output_format {
            OutputFormat::Text(_) if self.use_colors => self.output_format.format_with_level(
                event,
                &self.timestamp_format,
                &colored_level(event.level),
            ),
            _ => self.output_format.format(event, &self.timestamp_format),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "console")]
fn colored_level(level: Level) -> String {
    let code = level.short_code();
    match level {
        Level::Verbose => code.dimmed(),
        Level::Debug => code.cyan(),
        Level::Information => code.green(),
        Level::Warning => code.yellow(),
        Level::Error => code.red(),
        Level::Fatal => code.magenta(),
    }
    .to_string()
}

#[cfg(not(feature = "console"))]
fn colored_level(level: Level) -> String {
    level.short_code().to_string()
}

fn write_line(mut out: impl Write, line: &str) -> Result<()> {
    writeln!(out, "{}", line)
        .map_err(|e| LoggerError::io_operation("writing to console", "write failed", e))
}

impl Sink for ConsoleSink {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        let line = self.format_line(event);
        if self.uses_stderr(event.level) {
            write_line(std::io::stderr().lock(), &line)
        } else {
            write_line(std::io::stdout().lock(), &line)
        }
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
