use super::Strategy;
use crate::core::diagnostic;
use crate::core::error::{LoggerError, Result};
use futures::future::{self, FutureExt, LocalBoxFuture};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::task::JoinSet;

/// Owner of the tasks detached through a [`Cooperative`] strategy
///
/// Detached work is spawned as local tasks, so the scope must be used from
/// within a [`tokio::task::LocalSet`]. Dropping the scope aborts whatever
/// is still outstanding.
///
/// # Examples
///
/// ```
/// use rust_structured_logger::strategy::FiberScope;
/// use rust_structured_logger::{Level, Logger, MemorySink};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let local = tokio::task::LocalSet::new();
/// local.run_until(async {
///     let scope = FiberScope::new();
///     let sink = MemorySink::new();
///     let logger = Logger::builder()
///         .write_to(sink.clone())
///         .create_logger_with(scope.strategy())
///         .unwrap();
///
///     logger.log_detached(Level::Information, "Job {id} queued", [("id", 7)]);
///     scope.join().await;
///     assert_eq!(sink.messages(), vec!["Job 7 queued"]);
/// }).await;
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FiberScope {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl FiberScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A strategy whose detached work lands in this scope
    pub fn strategy(&self) -> Cooperative {
        Cooperative {
            scope: Arc::downgrade(&self.tasks),
        }
    }

    /// Number of tasks not yet joined
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Wait for every detached task, including ones detached while waiting
    pub async fn join(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock());
            if tasks.is_empty() {
                return;
            }
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    if e.is_panic() {
                        diagnostic::critical(format!("Detached log task panicked: {}", e));
                    }
                }
            }
        }
    }

    /// Abort every outstanding task
    pub fn abort(&self) {
        self.tasks.lock().abort_all();
    }
}

/// Runs sink operations inline on the current task after a cooperative
/// yield
///
/// Effects are `!Send` futures meant for a single-threaded executor.
/// Detached calls are spawned into the [`FiberScope`] that created this
/// strategy.
#[derive(Debug, Clone)]
pub struct Cooperative {
    scope: Weak<Mutex<JoinSet<()>>>,
}

impl Strategy for Cooperative {
    type Effect<T: Send + 'static> = LocalBoxFuture<'static, T>;

    fn ready<T: Send + 'static>(&self, value: T) -> Self::Effect<T> {
        future::ready(value).boxed_local()
    }

    fn lift<T, F>(&self, operation: F) -> Self::Effect<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        async move {
            tokio::task::yield_now().await;
            operation()
        }
        .boxed_local()
    }

    fn map<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        effect.map(f).boxed_local()
    }

    fn and_then<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Self::Effect<U> + Send + 'static,
    {
        effect.then(f).boxed_local()
    }

    fn join_all<T: Send + 'static>(&self, effects: Vec<Self::Effect<T>>) -> Self::Effect<Vec<T>> {
        future::join_all(effects).boxed_local()
    }

    fn detach(&self, effect: Self::Effect<Result<()>>) {
        let Some(tasks) = self.scope.upgrade() else {
            diagnostic::warning(format!(
                "Detached log call dropped: {}",
                LoggerError::other("fiber scope has ended")
            ));
            return;
        };

        tasks.lock().spawn_local(async move {
            if let Err(e) = effect.await {
                diagnostic::error(format!("Detached log call failed: {}", e));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::testing::Capture;
    use crate::core::diagnostic::Severity;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(flavor = "current_thread")]
    async fn test_lift_yields_before_running() {
        LocalSet::new()
            .run_until(async {
                let scope = FiberScope::new();
                let strategy = scope.strategy();
                let order = Rc::new(RefCell::new(Vec::new()));

                let sibling = {
                    let order = Rc::clone(&order);
                    tokio::task::spawn_local(async move { order.borrow_mut().push("sibling") })
                };

                let effect = strategy.lift(|| Ok("sink"));
                let value = effect.await.unwrap();
                order.borrow_mut().push(value);
                sibling.await.unwrap();

                assert_eq!(*order.borrow(), vec!["sibling", "sink"]);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_detach_and_join() {
        let capture = Capture::install();
        LocalSet::new()
            .run_until(async {
                let scope = FiberScope::new();
                let strategy = scope.strategy();

                strategy.detach(strategy.lift(|| Ok(())));
                strategy.detach(strategy.lift(|| Err(LoggerError::other("disk gone"))));
                assert_eq!(scope.len(), 2);

                scope.join().await;
                assert!(scope.is_empty());
            })
            .await;

        let reports = capture.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Severity::Error);
        assert!(reports[0].1.contains("disk gone"));
    }

    #[test]
    fn test_detach_after_scope_dropped() {
        let capture = Capture::install();
        let strategy = FiberScope::new().strategy();
        strategy.detach(strategy.ready(Ok(())));

        let reports = capture.take();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Severity::Warning);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_dropping_scope_aborts_tasks() {
        LocalSet::new()
            .run_until(async {
                let ran = Rc::new(RefCell::new(false));
                let scope = FiberScope::new();
                let strategy = scope.strategy();

                let flag = Rc::clone(&ran);
                strategy.detach(
                    async move {
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        *flag.borrow_mut() = true;
                        Ok(())
                    }
                    .boxed_local(),
                );
                assert_eq!(scope.len(), 1);

                drop(scope);
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                assert!(!*ran.borrow());
            })
            .await;
    }
}
