//! Sink trait for log output destinations

use super::diagnostic;
use super::error::{LoggerError, Result};
use super::event::LogEvent;
use super::level::Level;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A destination for log events
///
/// Sinks are shared between loggers and threads, so every operation takes
/// `&self`; implementations keep their mutable state behind a lock.
pub trait Sink: Send + Sync {
    fn emit(&self, event: &LogEvent) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources. Calling it again must succeed.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        (**self).emit(event)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A sink with an optional per-sink minimum level
#[derive(Clone)]
pub struct SinkSlot {
    pub sink: Arc<dyn Sink>,
    pub min_level: Option<Level>,
}

impl SinkSlot {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            min_level: None,
        }
    }

    pub fn with_min_level(sink: Arc<dyn Sink>, min_level: Level) -> Self {
        Self {
            sink,
            min_level: Some(min_level),
        }
    }

    /// A slot without a minimum accepts every level
    #[inline]
    pub fn admits(&self, level: Level) -> bool {
        self.min_level.map_or(true, |min| level.is_at_least(min))
    }
}

impl fmt::Debug for SinkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSlot")
            .field("sink", &self.sink.name())
            .field("min_level", &self.min_level)
            .finish()
    }
}

/// Run one sink operation, turning a panic into [`LoggerError::SinkPanicked`]
///
/// A panicking sink cannot disrupt the others; the panic is also reported
/// to the diagnostic channel.
pub fn isolate<F>(sink_name: &str, operation: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    match catch_unwind(AssertUnwindSafe(operation)) {
        Ok(result) => result,
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            diagnostic::critical(format!(
                "Sink '{}' panicked: {}. Other sinks continue to function.",
                sink_name, panic_msg
            ));
            Err(LoggerError::sink_panicked(sink_name, panic_msg))
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
