//! Main logger implementation
//!
//! Every log call runs the same pipeline:
//!
//! 1. level gate (nothing is parsed or allocated below the minimum)
//! 2. render the template and capture the hole properties
//! 3. enrichers, in registration order
//! 4. context merge: ambient properties, then the logger's context
//!    properties, then the event's own
//! 5. filters, all of which must accept
//! 6. dispatch to every admitting sink through the logger's [`Strategy`]
//!
//! The strategy decides what a log call returns: a `Result` for
//! [`Immediate`], a future for the async strategies.

use super::ambient;
use super::config::LoggerConfiguration;
use super::diagnostic;
use super::enrich::Enricher;
use super::error::{LoggerError, Result};
use super::event::{ExceptionInfo, LogEvent};
use super::filter::Filter;
use super::level::Level;
use super::metrics::LoggerMetrics;
use super::property::{Properties, Property};
use super::render::{capture, render};
use super::sink::{isolate, Sink, SinkSlot};
use super::template::Template;
use crate::strategy::{Immediate, Strategy};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A structured event logger
///
/// Loggers are cheap to clone and never change after construction;
/// [`for_context`](Self::for_context) and friends return new loggers that
/// share the same sinks.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{Level, Logger, MemorySink};
/// use serde_json::json;
///
/// let sink = MemorySink::new();
/// let logger = Logger::builder()
///     .minimum_level(Level::Debug)
///     .write_to(sink.clone())
///     .create_logger()
///     .unwrap();
///
/// logger
///     .information("User {user} logged in from {ip}", [("user", "alice"), ("ip", "10.0.0.1")])
///     .unwrap();
///
/// let events = sink.events();
/// assert_eq!(events[0].rendered_message, "User alice logged in from 10.0.0.1");
/// assert_eq!(events[0].property("user"), Some(&json!("alice")));
/// ```
#[derive(Clone)]
pub struct Logger<S: Strategy = Immediate> {
    min_level: Level,
    sinks: Arc<[SinkSlot]>,
    enrichers: Arc<[Enricher]>,
    filters: Arc<[Filter]>,
    context_properties: Properties,
    source: Option<Arc<str>>,
    metrics: Arc<LoggerMetrics>,
    strategy: S,
}

impl Logger<Immediate> {
    /// Start a [`LoggerConfiguration`]
    #[must_use]
    pub fn builder() -> LoggerConfiguration {
        LoggerConfiguration::new()
    }

    /// A logger with no sinks
    pub fn silent() -> Self {
        Self::from_parts(
            Level::default(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Properties::new(),
            None,
            Immediate,
        )
    }
}

impl<S: Strategy> Logger<S> {
    pub(crate) fn from_parts(
        min_level: Level,
        sinks: Vec<SinkSlot>,
        enrichers: Vec<Enricher>,
        filters: Vec<Filter>,
        context_properties: Properties,
        source: Option<String>,
        strategy: S,
    ) -> Self {
        Self {
            min_level,
            sinks: sinks.into(),
            enrichers: enrichers.into(),
            filters: filters.into(),
            context_properties,
            source: source.map(Arc::from),
            metrics: Arc::new(LoggerMetrics::new()),
            strategy,
        }
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Whether a call at `level` would pass the level gate
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level.is_at_least(self.min_level)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Log a message template with named properties
    ///
    /// A malformed template is logged verbatim and reported to the
    /// diagnostic channel; use [`Template::parse`] to surface the error.
    pub fn log(
        &self,
        level: Level,
        template: &str,
        properties: impl Into<Properties>,
    ) -> S::Effect<Result<()>> {
        if !self.gate(level) {
            return self.strategy.ready(Ok(()));
        }
        let template = parse_or_literal(template);
        self.write(level, &template, properties.into(), None)
    }

    /// Log with a template parsed ahead of time
    pub fn log_template(
        &self,
        level: Level,
        template: &Template,
        properties: impl Into<Properties>,
    ) -> S::Effect<Result<()>> {
        if !self.gate(level) {
            return self.strategy.ready(Ok(()));
        }
        self.write(level, template, properties.into(), None)
    }

    /// Log with an error attached to the event
    pub fn log_exception<E>(
        &self,
        level: Level,
        error: &E,
        template: &str,
        properties: impl Into<Properties>,
    ) -> S::Effect<Result<()>>
    where
        E: StdError + ?Sized,
    {
        if !self.gate(level) {
            return self.strategy.ready(Ok(()));
        }
        let template = parse_or_literal(template);
        let exception = ExceptionInfo::from_error(error);
        self.write(level, &template, properties.into(), Some(exception))
    }

    /// Log without waiting; sink failures go to the diagnostic channel
    pub fn log_detached(&self, level: Level, template: &str, properties: impl Into<Properties>) {
        if !self.gate(level) {
            return;
        }
        self.strategy.detach(self.log(level, template, properties));
    }

    pub fn verbose(&self, template: &str, properties: impl Into<Properties>) -> S::Effect<Result<()>> {
        self.log(Level::Verbose, template, properties)
    }

    pub fn debug(&self, template: &str, properties: impl Into<Properties>) -> S::Effect<Result<()>> {
        self.log(Level::Debug, template, properties)
    }

    pub fn information(
        &self,
        template: &str,
        properties: impl Into<Properties>,
    ) -> S::Effect<Result<()>> {
        self.log(Level::Information, template, properties)
    }

    pub fn warning(&self, template: &str, properties: impl Into<Properties>) -> S::Effect<Result<()>> {
        self.log(Level::Warning, template, properties)
    }

    pub fn error(&self, template: &str, properties: impl Into<Properties>) -> S::Effect<Result<()>> {
        self.log(Level::Error, template, properties)
    }

    pub fn fatal(&self, template: &str, properties: impl Into<Properties>) -> S::Effect<Result<()>> {
        self.log(Level::Fatal, template, properties)
    }

    /// Flush every sink
    pub fn flush(&self) -> S::Effect<Result<()>> {
        fan_out(&self.strategy, &self.sinks, &self.metrics, |sink| sink.flush())
    }

    /// Flush, then close, every sink
    ///
    /// Closing twice is fine; logging after close fails for sinks that own
    /// resources.
    pub fn close(&self) -> S::Effect<Result<()>> {
        let strategy = self.strategy.clone();
        let sinks = Arc::clone(&self.sinks);
        let metrics = Arc::clone(&self.metrics);
        self.strategy.and_then(self.flush(), move |flushed| {
            let closed = fan_out(&strategy, &sinks, &metrics, |sink| sink.close());
            strategy.map(closed, move |closed| flushed.and(closed))
        })
    }

    /// A logger whose events carry one more context property
    #[must_use]
    pub fn for_context(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut logger = self.clone();
        logger.context_properties.prepend(Property::new(name, value));
        logger
    }

    /// A logger with one more enricher, run after the existing ones
    #[must_use]
    pub fn with_enricher(&self, enricher: Enricher) -> Self {
        let mut logger = self.clone();
        let mut enrichers = self.enrichers.to_vec();
        enrichers.push(enricher);
        logger.enrichers = enrichers.into();
        logger
    }

    /// A logger whose events are labelled with `source`
    #[must_use]
    pub fn for_source(&self, source: impl Into<String>) -> Self {
        let mut logger = self.clone();
        logger.source = Some(Arc::from(source.into()));
        logger
    }

    /// The same pipeline on a different strategy
    #[must_use]
    pub fn with_strategy<T: Strategy>(&self, strategy: T) -> Logger<T> {
        Logger {
            min_level: self.min_level,
            sinks: Arc::clone(&self.sinks),
            enrichers: Arc::clone(&self.enrichers),
            filters: Arc::clone(&self.filters),
            context_properties: self.context_properties.clone(),
            source: self.source.clone(),
            metrics: Arc::clone(&self.metrics),
            strategy,
        }
    }

    fn gate(&self, level: Level) -> bool {
        if self.is_enabled(level) {
            true
        } else {
            self.metrics.record_suppressed();
            false
        }
    }

    fn write(
        &self,
        level: Level,
        template: &Template,
        properties: Properties,
        exception: Option<ExceptionInfo>,
    ) -> S::Effect<Result<()>> {
        let mut event = LogEvent::new(
            level,
            template.source(),
            render(template, &properties),
            capture(template, &properties),
        );
        event.exception = exception;
        if let Some(ref source) = self.source {
            event.source = Some(source.to_string());
        }

        let event = self
            .enrichers
            .iter()
            .fold(event, |event, enricher| enricher.enrich(event));
        let event = self.merge_context(event);

        if !self.filters.iter().all(|filter| filter.accepts(&event)) {
            self.metrics.record_filtered();
            return self.strategy.ready(Ok(()));
        }

        self.metrics.record_emitted();
        self.dispatch(event)
    }

    fn merge_context(&self, mut event: LogEvent) -> LogEvent {
        let mut merged = ambient::properties();
        merged.extend(self.context_properties.iter().cloned());
        merged.extend(std::mem::take(&mut event.properties));
        event.properties = merged;

        if event.correlation_id.is_none() {
            event.correlation_id = ambient::correlation_id();
        }
        event
    }

    fn dispatch(&self, event: LogEvent) -> S::Effect<Result<()>> {
        let event = Arc::new(event);
        let effects = self
            .sinks
            .iter()
            .filter(|slot| slot.admits(event.level))
            .map(|slot| {
                let sink = Arc::clone(&slot.sink);
                let event = Arc::clone(&event);
                self.strategy
                    .lift(move || isolate(sink.name(), || sink.emit(&event)))
            })
            .collect();
        collect_failures(&self.strategy, effects, &self.metrics)
    }
}

fn parse_or_literal(source: &str) -> Template {
    Template::parse(source).unwrap_or_else(|e| {
        diagnostic::warning(format!(
            "Malformed message template {:?}: {}. Logged verbatim.",
            source, e
        ));
        Template::literal(source)
    })
}

/// Run `operation` on every sink, isolated, through the strategy
fn fan_out<S, F>(
    strategy: &S,
    sinks: &Arc<[SinkSlot]>,
    metrics: &Arc<LoggerMetrics>,
    operation: F,
) -> S::Effect<Result<()>>
where
    S: Strategy,
    F: Fn(&dyn Sink) -> Result<()> + Clone + Send + 'static,
{
    let effects = sinks
        .iter()
        .map(|slot| {
            let sink = Arc::clone(&slot.sink);
            let operation = operation.clone();
            strategy.lift(move || isolate(sink.name(), || operation(sink.as_ref())))
        })
        .collect();
    collect_failures(strategy, effects, metrics)
}

fn collect_failures<S: Strategy>(
    strategy: &S,
    effects: Vec<S::Effect<Result<()>>>,
    metrics: &Arc<LoggerMetrics>,
) -> S::Effect<Result<()>> {
    let metrics = Arc::clone(metrics);
    strategy.map(strategy.join_all(effects), move |results| {
        let failures: Vec<LoggerError> = results.into_iter().filter_map(Result::err).collect();
        if !failures.is_empty() {
            metrics.record_sink_failures(failures.len() as u64);
        }
        LoggerError::collect(failures)
    })
}

impl<S: Strategy + fmt::Debug> fmt::Debug for Logger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("sinks", &self.sinks)
            .field("enrichers", &self.enrichers.len())
            .field("filters", &self.filters.len())
            .field("context_properties", &self.context_properties)
            .field("source", &self.source)
            .field("strategy", &self.strategy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::testing::Capture;
    use crate::sinks::{FnSink, MemorySink};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn logger_with(sink: &MemorySink, min_level: Level) -> Logger {
        Logger::builder()
            .minimum_level(min_level)
            .write_to(sink.clone())
            .create_logger()
            .unwrap()
    }

    #[test]
    fn test_concrete_scenario() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information);

        logger
            .information(
                "User {user} logged in from {ip}",
                [("user", "alice"), ("ip", "192.168.1.1")],
            )
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rendered_message, "User alice logged in from 192.168.1.1");
        assert_eq!(events[0].message_template, "User {user} logged in from {ip}");
        assert_eq!(events[0].property("user"), Some(&json!("alice")));
        assert_eq!(events[0].property("ip"), Some(&json!("192.168.1.1")));
    }

    #[test]
    fn test_suppressed_calls_do_no_work() {
        let sink = MemorySink::new();
        let enriched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&enriched);
        let logger = logger_with(&sink, Level::Warning).with_enricher(Enricher::new(move |e| {
            counter.fetch_add(1, Ordering::SeqCst);
            e
        }));

        logger.debug("ignored {x}", [("x", 1)]).unwrap();
        logger.information("ignored", ()).unwrap();

        assert_eq!(enriched.load(Ordering::SeqCst), 0);
        assert!(sink.is_empty());
        assert_eq!(logger.metrics().suppressed_count(), 2);
        assert_eq!(logger.metrics().emitted_count(), 0);
    }

    #[test]
    fn test_event_properties_are_the_captured_holes() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Verbose);

        logger
            .warning("{a} and {a} but not b", [("a", 1), ("b", 2)])
            .unwrap();

        let event = &sink.events()[0];
        assert_eq!(event.properties.len(), 1);
        assert_eq!(event.rendered_message, "1 and 1 but not b");
    }

    #[test]
    fn test_context_merge_order() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information)
            .for_context("k", "ctx-outer")
            .for_context("k", "ctx-inner")
            .with_enricher(Enricher::property("k", "enriched"));

        ambient::with_property("k", "ambient", || {
            logger.information("{k}", [("k", "own")]).unwrap();
        });

        let values: Vec<_> = sink.events()[0]
            .properties
            .get_all("k")
            .cloned()
            .collect();
        assert_eq!(
            values,
            vec![
                json!("ambient"),
                json!("ctx-inner"),
                json!("ctx-outer"),
                json!("own"),
                json!("enriched"),
            ]
        );
    }

    #[test]
    fn test_ambient_correlation_id() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information).with_enricher(Enricher::new(|e| {
            if e.property("preset").is_some() {
                e.with_correlation_id("from-enricher")
            } else {
                e
            }
        }));

        ambient::with_correlation_id("ambient-id", || {
            logger.information("plain", ()).unwrap();
            logger.information("{preset}", [("preset", true)]).unwrap();
        });

        let events = sink.events();
        assert_eq!(events[0].correlation_id.as_deref(), Some("ambient-id"));
        assert_eq!(events[1].correlation_id.as_deref(), Some("from-enricher"));
    }

    #[test]
    fn test_filters_are_anded() {
        let sink = MemorySink::new();
        let logger = Logger::builder()
            .minimum_level(Level::Verbose)
            .write_to(sink.clone())
            .filter_by(|e| e.property("keep").is_some())
            .filter_by_min_level(Level::Information)
            .create_logger()
            .unwrap();

        logger.information("{keep}", [("keep", true)]).unwrap();
        logger.information("no keep", ()).unwrap();
        logger.debug("{keep}", [("keep", true)]).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(logger.metrics().filtered_count(), 2);
    }

    #[test]
    fn test_per_sink_minimum_level() {
        let all = MemorySink::new();
        let errors = MemorySink::new();
        let logger = Logger::builder()
            .minimum_level(Level::Debug)
            .write_to(all.clone())
            .write_to_with_level(errors.clone(), Level::Error)
            .create_logger()
            .unwrap();

        logger.debug("d", ()).unwrap();
        logger.error("e", ()).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(errors.messages(), vec!["e"]);
    }

    #[test]
    fn test_failing_sink_does_not_block_siblings() {
        let recorder = MemorySink::new();
        let logger = Logger::builder()
            .write_to(FnSink::new("broken", |_| Err(LoggerError::other("broken"))))
            .write_to(FnSink::new("panics", |_| panic!("sink bug")))
            .write_to(recorder.clone())
            .create_logger()
            .unwrap();

        let capture = Capture::install();
        let result = logger.information("hello", ());
        drop(capture);

        assert!(matches!(result, Err(LoggerError::SinkFailures(ref f)) if f.len() == 2));
        assert_eq!(recorder.messages(), vec!["hello"]);
        assert_eq!(logger.metrics().sink_failures(), 2);
    }

    #[test]
    fn test_detached_failures_are_reported() {
        let logger = Logger::builder()
            .write_to(FnSink::new("broken", |_| Err(LoggerError::other("disk on fire"))))
            .create_logger()
            .unwrap();

        let capture = Capture::install();
        logger.log_detached(Level::Information, "x", ());
        let reports = capture.take();

        assert_eq!(reports.len(), 1);
        assert!(reports[0].1.contains("disk on fire"));
    }

    #[test]
    fn test_malformed_template_logs_literally() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information);

        let capture = Capture::install();
        logger.information("broken {hole", [("hole", 1)]).unwrap();
        let reports = capture.take();

        assert_eq!(sink.messages(), vec!["broken {hole"]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].1.contains("Malformed message template"));
    }

    #[test]
    fn test_log_exception() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information);
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");

        logger
            .log_exception(Level::Error, &err, "Startup failed for {app}", [("app", "svc")])
            .unwrap();

        let exception = sink.events()[0].exception.clone().unwrap();
        assert_eq!(exception.message, "config.toml missing");
        assert_eq!(exception.kind, "Error");
    }

    #[test]
    fn test_derived_loggers_leave_original_untouched() {
        let sink = MemorySink::new();
        let base = logger_with(&sink, Level::Information);
        let derived = base.for_context("tenant", "acme").for_source("billing");

        base.information("base", ()).unwrap();
        derived.information("derived", ()).unwrap();

        let events = sink.events();
        assert!(events[0].properties.is_empty());
        assert!(events[0].source.is_none());
        assert_eq!(events[1].property("tenant"), Some(&json!("acme")));
        assert_eq!(events[1].source.as_deref(), Some("billing"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let sink = MemorySink::new();
        let logger = logger_with(&sink, Level::Information);

        logger.information("before", ()).unwrap();
        assert!(logger.close().is_ok());
        assert!(logger.close().is_ok());
        assert!(sink.is_closed());
        assert!(matches!(
            logger.information("after", ()),
            Err(LoggerError::SinkClosed { .. })
        ));
    }

    #[test]
    fn test_zero_sinks_is_valid() {
        let logger = Logger::builder().create_logger().unwrap();
        assert_eq!(logger.sink_count(), 0);
        assert!(logger.information("dropped", ()).is_ok());
        assert!(logger.flush().is_ok());
        assert!(Logger::silent().error("nothing", ()).is_ok());
    }
}
