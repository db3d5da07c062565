//! Concurrency strategies
//!
//! The logger pipeline is written once against [`Strategy`]. A strategy
//! decides what a sink operation *is*: a plain value computed on the
//! calling thread ([`Immediate`]), a future that runs the operation on
//! tokio's blocking pool ([`Deferred`]), or a local future that yields to
//! sibling tasks before running it ([`Cooperative`]).
//!
//! Async effects are lazy. Dropping one without awaiting it discards the
//! call; use [`Logger::log_detached`](crate::Logger::log_detached) for
//! fire-and-forget logging.

use crate::core::error::Result;

mod immediate;
pub use immediate::Immediate;

#[cfg(feature = "async")]
mod cooperative;
#[cfg(feature = "async")]
mod deferred;

#[cfg(feature = "async")]
pub use cooperative::{Cooperative, FiberScope};
#[cfg(feature = "async")]
pub use deferred::Deferred;

/// How sink operations are executed and composed
pub trait Strategy: Clone + Send + Sync + 'static {
    /// A computation producing `T`
    type Effect<T: Send + 'static>;

    /// An effect that is already complete
    fn ready<T: Send + 'static>(&self, value: T) -> Self::Effect<T>;

    /// Turn a blocking sink operation into an effect
    fn lift<T, F>(&self, operation: F) -> Self::Effect<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static;

    fn map<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static;

    /// Sequence a second effect after the first
    fn and_then<T, U, F>(&self, effect: Self::Effect<T>, f: F) -> Self::Effect<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Self::Effect<U> + Send + 'static;

    /// Wait for every effect, keeping their order in the output
    fn join_all<T: Send + 'static>(&self, effects: Vec<Self::Effect<T>>) -> Self::Effect<Vec<T>>;

    /// Run an effect without waiting for it; failures go to the
    /// diagnostic channel
    fn detach(&self, effect: Self::Effect<Result<()>>);
}
