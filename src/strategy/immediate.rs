use super::Strategy;
use crate::core::diagnostic;
use crate::core::error::Result;

/// Runs every sink operation on the calling thread
///
/// Effects are plain values, so a log call returns its `Result` directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

impl Strategy for Immediate {
    type Effect<T: Send + 'static> = T;

    #[inline]
    fn ready<T: Send + 'static>(&self, value: T) -> Self::Effect<T> {
        value
    }

    #[inline]
    fn lift<T, F>(&self, operation: F) -> Self::Effect<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        operation()
    }

    #[inline]
    fn map<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        f(effect)
    }

    #[inline]
    fn and_then<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Self::Effect<U> + Send + 'static,
    {
        f(effect)
    }

    #[inline]
    fn join_all<T: Send + 'static>(&self, effects: Vec<Self::Effect<T>>) -> Self::Effect<Vec<T>> {
        effects
    }

    fn detach(&self, effect: Self::Effect<Result<()>>) {
        if let Err(e) = effect {
            diagnostic::error(format!("Detached log call failed: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::testing::Capture;
    use crate::core::error::LoggerError;

    #[test]
    fn test_lift_runs_in_place() {
        let caller = std::thread::current().id();
        let ran_on = Immediate.lift(move || Ok(std::thread::current().id()));
        assert_eq!(ran_on.unwrap(), caller);
    }

    #[test]
    fn test_composition() {
        let s = Immediate;
        let joined = s.join_all(vec![s.ready(1), s.lift(|| Ok(2)).unwrap_or(0)]);
        let summed = s.and_then(joined, move |v| s.map(v, |v| v.iter().sum::<i32>()));
        assert_eq!(summed, 3);
    }

    #[test]
    fn test_detach_reports_failures() {
        let capture = Capture::install();
        Immediate.detach(Ok(()));
        Immediate.detach(Err(LoggerError::other("lost")));

        let reports = capture.take();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].1.contains("lost"));
    }
}
