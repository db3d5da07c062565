//! In-memory and discarding sinks

use crate::core::error::{LoggerError, Result};
use crate::core::event::LogEvent;
use crate::core::sink::Sink;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<LogEvent>,
    flushes: usize,
    closed: bool,
}

/// Records every event it receives
///
/// Clones share the same buffer, so a test can hand one clone to the
/// logger and inspect another.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{Logger, MemorySink};
///
/// let sink = MemorySink::new();
/// let logger = Logger::builder().write_to(sink.clone()).create_logger().unwrap();
///
/// logger.warning("Queue depth {depth}", [("depth", 120)]).unwrap();
/// assert_eq!(sink.messages(), vec!["Queue depth 120"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<LogEvent> {
        self.inner.lock().events.clone()
    }

    /// Rendered messages of the recorded events
    pub fn messages(&self) -> Vec<String> {
        self.inner
            .lock()
            .events
            .iter()
            .map(|event| event.rendered_message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().events.clear();
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        self.inner.lock().flushes
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl Sink for MemorySink {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(LoggerError::sink_closed(self.name()));
        }
        inner.events.push(event.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.inner.lock().flushes += 1;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.inner.lock().closed = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&self, _event: &LogEvent) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use crate::core::property::Properties;

    fn event(message: &str) -> LogEvent {
        LogEvent::new(Level::Information, message, message, Properties::new())
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = MemorySink::new();
        let other = sink.clone();

        sink.emit(&event("one")).unwrap();
        other.emit(&event("two")).unwrap();

        assert_eq!(sink.messages(), vec!["one", "two"]);
        assert_eq!(other.len(), 2);

        other.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_emit_after_close() {
        let sink = MemorySink::new();
        sink.flush().unwrap();
        sink.close().unwrap();
        sink.close().unwrap();

        assert_eq!(sink.flush_count(), 1);
        assert!(sink.is_closed());
        assert!(matches!(
            sink.emit(&event("late")),
            Err(LoggerError::SinkClosed { ref sink }) if sink == "memory"
        ));
    }

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        assert!(sink.emit(&event("gone")).is_ok());
        assert!(sink.flush().is_ok());
        assert!(sink.close().is_ok());
        assert_eq!(sink.name(), "null");
    }
}
