//! Self-diagnostics for the logging engine
//!
//! Problems the engine cannot return to a caller (detached dispatch
//! failures, retention and compression errors, malformed templates that
//! were logged literally) are reported here. By default they go to stderr
//! with a `[LOGGER ...]` prefix; tests and embedders can install their own
//! handler.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn prefix(&self) -> &'static str {
        match self {
            Severity::Warning => "[LOGGER WARNING]",
            Severity::Error => "[LOGGER ERROR]",
            Severity::Critical => "[LOGGER CRITICAL]",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

pub type DiagnosticHandler = Arc<dyn Fn(Severity, &str) + Send + Sync>;

static HANDLER: RwLock<Option<DiagnosticHandler>> = parking_lot::const_rwlock(None);

/// Route diagnostics to `handler` instead of stderr
pub fn set_handler<F>(handler: F)
where
    F: Fn(Severity, &str) + Send + Sync + 'static,
{
    *HANDLER.write() = Some(Arc::new(handler));
}

/// Restore the stderr handler
pub fn reset_handler() {
    *HANDLER.write() = None;
}

/// Report an engine problem
pub fn report(severity: Severity, message: impl AsRef<str>) {
    let message = message.as_ref();
    // Clone out so a handler that reports again cannot deadlock
    let handler = HANDLER.read().clone();
    match handler {
        Some(handler) => handler(severity, message),
        None => eprintln!("{} {}", severity.prefix(), message),
    }
}

pub fn warning(message: impl AsRef<str>) {
    report(Severity::Warning, message);
}

pub fn error(message: impl AsRef<str>) {
    report(Severity::Error, message);
}

pub fn critical(message: impl AsRef<str>) {
    report(Severity::Critical, message);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::{Mutex, MutexGuard};

    static LOCK: Mutex<()> = parking_lot::const_mutex(());

    /// Serializes tests that install a global handler and collects reports
    pub(crate) struct Capture {
        pub(crate) reports: Arc<Mutex<Vec<(Severity, String)>>>,
        _guard: MutexGuard<'static, ()>,
    }

    impl Capture {
        pub(crate) fn install() -> Self {
            let guard = LOCK.lock();
            let reports = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&reports);
            set_handler(move |severity, message| {
                sink.lock().push((severity, message.to_string()));
            });
            Self {
                reports,
                _guard: guard,
            }
        }

        pub(crate) fn take(&self) -> Vec<(Severity, String)> {
            std::mem::take(&mut *self.reports.lock())
        }
    }

    impl Drop for Capture {
        fn drop(&mut self) {
            reset_handler();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Capture;
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(Severity::Warning.prefix(), "[LOGGER WARNING]");
        assert_eq!(Severity::Error.to_string(), "[LOGGER ERROR]");
        assert_eq!(Severity::Critical.prefix(), "[LOGGER CRITICAL]");
    }

    #[test]
    fn test_custom_handler_receives_reports() {
        let capture = Capture::install();
        warning("disk almost full");
        error(format!("sink '{}' failed", "file"));

        let reports = capture.take();
        assert_eq!(
            reports,
            vec![
                (Severity::Warning, "disk almost full".to_string()),
                (Severity::Error, "sink 'file' failed".to_string()),
            ]
        );
    }
}
