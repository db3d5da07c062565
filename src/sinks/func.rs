//! Sink built from closures

use crate::core::error::Result;
use crate::core::event::LogEvent;
use crate::core::sink::Sink;
use std::fmt;

type EmitFn = dyn Fn(&LogEvent) -> Result<()> + Send + Sync;
type LifecycleFn = dyn Fn() -> Result<()> + Send + Sync;

/// A sink whose operations are user closures
///
/// Flush and close default to doing nothing.
///
/// # Example
///
/// ```
/// use rust_structured_logger::sinks::FnSink;
/// use rust_structured_logger::Logger;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// let logger = Logger::builder()
///     .write_to(FnSink::new("counter", move |_| {
///         counter.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }))
///     .create_logger()
///     .unwrap();
///
/// logger.information("tick", ()).unwrap();
/// assert_eq!(seen.load(Ordering::Relaxed), 1);
/// ```
pub struct FnSink {
    name: String,
    emit: Box<EmitFn>,
    flush: Option<Box<LifecycleFn>>,
    close: Option<Box<LifecycleFn>>,
}

impl FnSink {
    pub fn new<F>(name: impl Into<String>, emit: F) -> Self
    where
        F: Fn(&LogEvent) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            emit: Box::new(emit),
            flush: None,
            close: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_flush<F>(mut self, flush: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.flush = Some(Box::new(flush));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_close<F>(mut self, close: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.close = Some(Box::new(close));
        self
    }
}

impl Sink for FnSink {
    fn emit(&self, event: &LogEvent) -> Result<()> {
        (self.emit)(event)
    }

    fn flush(&self) -> Result<()> {
        self.flush.as_ref().map_or(Ok(()), |flush| flush())
    }

    fn close(&self) -> Result<()> {
        self.close.as_ref().map_or(Ok(()), |close| close())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FnSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink")
            .field("name", &self.name)
            .field("flush", &self.flush.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::level::Level;
    use crate::core::property::Properties;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_lifecycle_closures() {
        let flushes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushes);
        let sink = FnSink::new("custom", |event| {
            if event.level == Level::Fatal {
                Err(LoggerError::other("refused"))
            } else {
                Ok(())
            }
        })
        .with_flush(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .with_close(|| Err(LoggerError::other("close failed")));

        let ok = LogEvent::new(Level::Information, "ok", "ok", Properties::new());
        let fatal = ok.clone().with_level(Level::Fatal);

        assert!(sink.emit(&ok).is_ok());
        assert!(sink.emit(&fatal).is_err());
        sink.flush().unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert!(sink.close().is_err());
        assert_eq!(sink.name(), "custom");
    }

    #[test]
    fn test_defaults_are_noops() {
        let sink = FnSink::new("plain", |_| Ok(()));
        assert!(sink.flush().is_ok());
        assert!(sink.close().is_ok());
    }
}
