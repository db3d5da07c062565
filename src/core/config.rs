//! Fluent logger configuration

use super::enrich::Enricher;
use super::error::Result;
use super::event::LogEvent;
use super::filter::Filter;
use super::level::Level;
use super::logger::Logger;
use super::output_format::{OutputFormat, OutputTemplate};
use super::property::Properties;
use super::sink::{Sink, SinkSlot};
use crate::sinks::{ConsoleSink, RollingFileSink, RollingInterval};
use crate::strategy::{Immediate, Strategy};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// A sink registration; file sinks are opened when the logger is created
enum PendingSink {
    Ready(SinkSlot),
    File {
        path: PathBuf,
        rolling: RollingInterval,
        template: OutputTemplate,
    },
}

/// Builder for [`Logger`]
///
/// Sinks, enrichers and filters run in the order they are registered.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{Level, LoggerConfiguration, MemorySink};
///
/// let sink = MemorySink::new();
/// let logger = LoggerConfiguration::new()
///     .minimum_level(Level::Debug)
///     .enrich_with_property("app", "billing")
///     .write_to(sink.clone())
///     .create_logger()
///     .unwrap();
///
/// logger.debug("Invoice {id} issued", [("id", 42)]).unwrap();
/// assert_eq!(sink.messages(), vec!["Invoice 42 issued"]);
/// ```
pub struct LoggerConfiguration {
    min_level: Level,
    sinks: Vec<PendingSink>,
    enrichers: Vec<Enricher>,
    filters: Vec<Filter>,
    source: Option<String>,
}

impl LoggerConfiguration {
    /// Create a configuration with the `Information` minimum and no sinks
    pub fn new() -> Self {
        Self {
            min_level: Level::default(),
            sinks: Vec::new(),
            enrichers: Vec::new(),
            filters: Vec::new(),
            source: None,
        }
    }

    /// Set the minimum level; calls below it do no work
    #[must_use = "builder methods return a new value"]
    pub fn minimum_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Write to stdout, switching to stderr from `stderr_threshold` up
    #[must_use = "builder methods return a new value"]
    pub fn write_to_console(
        self,
        colors: bool,
        stderr_threshold: Level,
        template: impl Into<OutputTemplate>,
    ) -> Self {
        let sink = ConsoleSink::new()
            .with_colors(colors)
            .with_stderr_threshold(stderr_threshold)
            .with_output_format(OutputFormat::text(template));
        self.write_to(sink)
    }

    /// Write to a rolling file
    ///
    /// The parent directory is created by [`create_logger`](Self::create_logger),
    /// which fails if that is not possible.
    #[must_use = "builder methods return a new value"]
    pub fn write_to_file(
        mut self,
        path: impl Into<PathBuf>,
        rolling: RollingInterval,
        template: impl Into<OutputTemplate>,
    ) -> Self {
        self.sinks.push(PendingSink::File {
            path: path.into(),
            rolling,
            template: template.into(),
        });
        self
    }

    /// Write to any sink
    #[must_use = "builder methods return a new value"]
    pub fn write_to<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(PendingSink::Ready(SinkSlot::new(Arc::new(sink))));
        self
    }

    /// Write to a sink that only receives events at `level` or above
    #[must_use = "builder methods return a new value"]
    pub fn write_to_with_level<S: Sink + 'static>(mut self, sink: S, level: Level) -> Self {
        self.sinks
            .push(PendingSink::Ready(SinkSlot::with_min_level(Arc::new(sink), level)));
        self
    }

    /// Transform every event before filtering
    #[must_use = "builder methods return a new value"]
    pub fn enrich_with<F>(mut self, transform: F) -> Self
    where
        F: Fn(LogEvent) -> LogEvent + Send + Sync + 'static,
    {
        self.enrichers.push(Enricher::new(transform));
        self
    }

    /// Add a fixed property to every event
    #[must_use = "builder methods return a new value"]
    pub fn enrich_with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.enrichers.push(Enricher::property(name, value));
        self
    }

    /// Add `ThreadId` (and `ThreadName` when set) to every event
    #[must_use = "builder methods return a new value"]
    pub fn enrich_with_thread(mut self) -> Self {
        self.enrichers.push(Enricher::thread());
        self
    }

    /// Keep only events the predicate accepts
    #[must_use = "builder methods return a new value"]
    pub fn filter_by<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Filter::new(predicate));
        self
    }

    /// Drop events below `level` after enrichment
    #[must_use = "builder methods return a new value"]
    pub fn filter_by_min_level(mut self, level: Level) -> Self {
        self.filters.push(Filter::min_level(level));
        self
    }

    /// Keep a random fraction of events; errors and fatals are always kept
    #[must_use = "builder methods return a new value"]
    pub fn filter_by_sampling(mut self, rate: f64) -> Self {
        self.filters.push(Filter::sampled(rate));
        self
    }

    /// Label every event with a source
    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, label: impl Into<String>) -> Self {
        self.source = Some(label.into());
        self
    }

    /// Build a logger that writes on the calling thread
    ///
    /// # Errors
    ///
    /// Returns an error if a file sink's directory cannot be created.
    pub fn create_logger(self) -> Result<Logger<Immediate>> {
        self.create_logger_with(Immediate)
    }

    /// Build a logger on the given strategy
    ///
    /// # Errors
    ///
    /// Returns an error if a file sink's directory cannot be created.
    pub fn create_logger_with<S: Strategy>(self, strategy: S) -> Result<Logger<S>> {
        let sinks = self
            .sinks
            .into_iter()
            .map(|spec| match spec {
                PendingSink::Ready(slot) => Ok(slot),
                PendingSink::File {
                    path,
                    rolling,
                    template,
                } => {
                    let sink = RollingFileSink::new(path, rolling)?
                        .with_output_format(OutputFormat::text(template));
                    Ok(SinkSlot::new(Arc::new(sink)))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Logger::from_parts(
            self.min_level,
            sinks,
            self.enrichers,
            self.filters,
            Properties::new(),
            self.source,
            strategy,
        ))
    }
}

impl Default for LoggerConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
