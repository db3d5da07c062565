//! Ambient logging context
//!
//! A per-thread stack of frames, each holding properties and an optional
//! correlation id. Every event a logger emits while a frame is active picks
//! up its properties, and the correlation id if the event has none.
//!
//! Frames are scoped: [`with_property`] and friends pop their frame when
//! the body returns or unwinds, and [`push`] returns a guard that does so on
//! drop. For async code, [`AmbientFutureExt`] attaches frames to a future so
//! they are active only while that future is being polled; tasks sharing a
//! worker thread never observe each other's context.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::core::ambient;
//! use serde_json::json;
//!
//! ambient::with_property("request_id", "r-42", || {
//!     ambient::with_correlation_id("trace-1", || {
//!         assert_eq!(ambient::properties().get("request_id"), Some(&json!("r-42")));
//!         assert_eq!(ambient::correlation_id().as_deref(), Some("trace-1"));
//!     });
//! });
//! assert!(ambient::properties().is_empty());
//! ```

use super::property::{Properties, Property};
use pin_project::pin_project;
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Default)]
struct Frame {
    properties: Properties,
    correlation_id: Option<String>,
}

thread_local! {
    static STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frames pushed since its creation when dropped
///
/// Tied to the thread that created it.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct AmbientGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        // try_with: the stack may already be gone during thread teardown
        let _ = STACK.try_with(|stack| stack.borrow_mut().truncate(self.depth));
    }
}

fn push_frames(frames: impl IntoIterator<Item = Frame>) -> AmbientGuard {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let depth = stack.len();
        stack.extend(frames);
        AmbientGuard {
            depth,
            _not_send: PhantomData,
        }
    })
}

/// Push a frame until the returned guard is dropped
pub fn push(properties: impl Into<Properties>, correlation_id: Option<String>) -> AmbientGuard {
    push_frames([Frame {
        properties: properties.into(),
        correlation_id,
    }])
}

/// Run `body` with one extra ambient property
pub fn with_property<K, V, F, R>(name: K, value: V, body: F) -> R
where
    K: Into<String>,
    V: Into<Value>,
    F: FnOnce() -> R,
{
    let _guard = push(Properties::from(vec![Property::new(name, value)]), None);
    body()
}

/// Run `body` with extra ambient properties
pub fn with_properties<P, F, R>(properties: P, body: F) -> R
where
    P: Into<Properties>,
    F: FnOnce() -> R,
{
    let _guard = push(properties, None);
    body()
}

/// Run `body` with an ambient correlation id
pub fn with_correlation_id<I, F, R>(id: I, body: F) -> R
where
    I: Into<String>,
    F: FnOnce() -> R,
{
    let _guard = push(Properties::new(), Some(id.into()));
    body()
}

/// Properties of every active frame, outermost first
pub fn properties() -> Properties {
    STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .flat_map(|frame| frame.properties.iter().cloned())
            .collect()
    })
}

/// Correlation id of the innermost frame that carries one
pub fn correlation_id() -> Option<String> {
    STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.correlation_id.clone())
    })
}

/// Number of active frames on this thread
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// A detached copy of ambient frames that can move between threads
#[derive(Debug, Clone, Default)]
pub struct AmbientContext {
    frames: Vec<Frame>,
}

impl AmbientContext {
    /// Capture the frames active on this thread
    pub fn capture() -> Self {
        Self {
            frames: STACK.with(|stack| stack.borrow().clone()),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.frames.push(Frame {
            properties: Properties::from(vec![Property::new(name, value)]),
            correlation_id: None,
        });
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_properties(mut self, properties: impl Into<Properties>) -> Self {
        self.frames.push(Frame {
            properties: properties.into(),
            correlation_id: None,
        });
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.frames.push(Frame {
            properties: Properties::new(),
            correlation_id: Some(id.into()),
        });
        self
    }

    /// Make these frames active on the current thread until the guard drops
    pub fn enter(&self) -> AmbientGuard {
        push_frames(self.frames.iter().cloned())
    }
}

/// Attaches ambient frames to a future for the duration of each poll
pub trait AmbientFutureExt: Future + Sized {
    fn with_ambient_property(
        self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> WithAmbient<Self> {
        WithAmbient::new(self, AmbientContext::default().with_property(name, value))
    }

    fn with_ambient_properties(self, properties: impl Into<Properties>) -> WithAmbient<Self> {
        WithAmbient::new(self, AmbientContext::default().with_properties(properties))
    }

    fn with_correlation_id(self, id: impl Into<String>) -> WithAmbient<Self> {
        WithAmbient::new(self, AmbientContext::default().with_correlation_id(id))
    }

    /// Carry the caller's current frames into this future
    ///
    /// Use before spawning so the task inherits its causal context.
    fn in_current_scope(self) -> WithAmbient<Self> {
        WithAmbient::new(self, AmbientContext::capture())
    }

    fn with_ambient(self, context: AmbientContext) -> WithAmbient<Self> {
        WithAmbient::new(self, context)
    }
}

impl<F: Future> AmbientFutureExt for F {}

/// Future returned by [`AmbientFutureExt`]
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct WithAmbient<F> {
    #[pin]
    future: F,
    context: AmbientContext,
}

impl<F> WithAmbient<F> {
    fn new(future: F, context: AmbientContext) -> Self {
        Self { future, context }
    }
}

impl<F: Future> Future for WithAmbient<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = this.context.enter();
        this.future.poll(cx)
    }
}
