use super::Strategy;
use crate::core::diagnostic;
use crate::core::error::{LoggerError, Result};
use futures::future::{self, BoxFuture, FutureExt};
use tokio::runtime::Handle;

/// Runs sink operations on tokio's blocking pool
///
/// Log calls return a future; the sinks an event is routed to are written
/// concurrently when it is awaited.
#[derive(Debug, Clone)]
pub struct Deferred {
    handle: Handle,
}

impl Deferred {
    /// Use the runtime of the calling context
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| LoggerError::config("Deferred", e.to_string()))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Strategy for Deferred {
    type Effect<T: Send + 'static> = BoxFuture<'static, T>;

    fn ready<T: Send + 'static>(&self, value: T) -> Self::Effect<T> {
        future::ready(value).boxed()
    }

    fn lift<T, F>(&self, operation: F) -> Self::Effect<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = self.handle.clone();
        async move {
            match handle.spawn_blocking(operation).await {
                Ok(result) => result,
                Err(e) => Err(LoggerError::TaskFailed(e.to_string())),
            }
        }
        .boxed()
    }

    fn map<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        effect.map(f).boxed()
    }

    fn and_then<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Self::Effect<U> + Send + 'static,
    {
        effect.then(f).boxed()
    }

    fn join_all<T: Send + 'static>(&self, effects: Vec<Self::Effect<T>>) -> Self::Effect<Vec<T>> {
        future::join_all(effects).boxed()
    }

    fn detach(&self, effect: Self::Effect<Result<()>>) {
        self.handle.spawn(async move {
            if let Err(e) = effect.await {
                diagnostic::error(format!("Detached log call failed: {}", e));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_outside_runtime() {
        assert!(matches!(
            Deferred::current(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lift_runs_off_the_caller() {
        let strategy = Deferred::current().unwrap();
        let caller = std::thread::current().id();
        let ran_on = strategy
            .lift(move || Ok(std::thread::current().id()))
            .await
            .unwrap();
        assert_ne!(ran_on, caller);
    }

    #[tokio::test]
    async fn test_join_all_keeps_order() {
        let strategy = Deferred::current().unwrap();
        let effects = (0..5)
            .map(|i| strategy.lift(move || Ok(i)))
            .collect::<Vec<_>>();
        let results = strategy.join_all(effects).await;
        let values: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_panicking_operation_becomes_task_failure() {
        let strategy = Deferred::current().unwrap();
        let result: Result<()> = strategy.lift(|| panic!("boom")).await;
        assert!(matches!(result, Err(LoggerError::TaskFailed(_))));
    }

    #[tokio::test]
    async fn test_and_then_sequences() {
        let strategy = Deferred::current().unwrap();
        let inner = strategy.clone();
        let value = strategy
            .and_then(strategy.ready(20), move |v| inner.map(inner.ready(v), |v| v + 1))
            .await;
        assert_eq!(value, 21);
    }
}
