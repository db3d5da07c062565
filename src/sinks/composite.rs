//! Sink that fans out to member sinks

use crate::core::error::{LoggerError, Result};
use crate::core::event::LogEvent;
use crate::core::level::Level;
use crate::core::sink::{isolate, Sink, SinkSlot};
use std::sync::Arc;

/// Forwards to every member, each isolated from the others
///
/// `emit` reaches members whose minimum level admits the event; `flush`
/// and `close` reach all of them. Every member is attempted before the
/// failures are reported.
#[derive(Debug)]
pub struct CompositeSink {
    members: Vec<SinkSlot>,
    name: String,
}

impl CompositeSink {
    pub fn new(members: Vec<SinkSlot>) -> Self {
        Self {
            members,
            name: "composite".to_string(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.members.push(SinkSlot::new(Arc::new(sink)));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add_with_level<S: Sink + 'static>(mut self, sink: S, level: Level) -> Self {
        self.members
            .push(SinkSlot::with_min_level(Arc::new(sink), level));
        self
    }

    pub fn members(&self) -> &[SinkSlot] {
        &self.members
    }

    fn each<'a, F>(&self, slots: impl Iterator<Item = &'a SinkSlot>, operation: F) -> Result<()>
    where
        F: Fn(&dyn Sink) -> Result<()>,
    {
        let failures = slots
            .filter_map(|slot| isolate(slot.sink.name(), || operation(slot.sink.as_ref())).err())
            .collect();
        LoggerError::collect(failures)
    }
}

impl Default for CompositeSink {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Sink for CompositeSink {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        self.each(
            self.members.iter().filter(|slot| slot.admits(event.level)),
            |sink| sink.emit(event),
        )
    }

    fn flush(&self) -> Result<()> {
        self.each(self.members.iter(), |sink| sink.flush())
    }

    fn close(&self) -> Result<()> {
        self.each(self.members.iter(), |sink| sink.close())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::testing::Capture;
    use crate::core::property::Properties;
    use crate::sinks::{FnSink, MemorySink};

    fn event(level: Level) -> LogEvent {
        LogEvent::new(level, "m", "m", Properties::new())
    }

    #[test]
    fn test_threshold_routing() {
        let all = MemorySink::new();
        let errors = MemorySink::new();
        let composite = CompositeSink::default()
            .add(all.clone())
            .add_with_level(errors.clone(), Level::Error);

        composite.emit(&event(Level::Debug)).unwrap();
        composite.emit(&event(Level::Fatal)).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(composite.members().len(), 2);
    }

    #[test]
    fn test_failure_isolation() {
        let before = MemorySink::new();
        let after = MemorySink::new();
        let composite = CompositeSink::default()
            .add(before.clone())
            .add(FnSink::new("broken", |_| Err(LoggerError::other("broken"))))
            .add(FnSink::new("panics", |_| panic!("member bug")))
            .add(after.clone());

        let capture = Capture::install();
        let result = composite.emit(&event(Level::Information));
        drop(capture);

        match result {
            Err(LoggerError::SinkFailures(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(matches!(failures[0], LoggerError::Other(_)));
                assert!(matches!(failures[1], LoggerError::SinkPanicked { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_flush_and_close_reach_every_member() {
        let gated = MemorySink::new();
        let composite = CompositeSink::default()
            .with_name("fanout")
            .add_with_level(gated.clone(), Level::Fatal);

        composite.flush().unwrap();
        composite.close().unwrap();

        assert_eq!(gated.flush_count(), 1);
        assert!(gated.is_closed());
        assert_eq!(composite.name(), "fanout");
    }
}
