//! Event enrichers
//!
//! An enricher takes an event by value and returns a new one. Enrichers run
//! in registration order, before ambient and logger context are merged.

use super::event::LogEvent;
use super::property::Property;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

type Transform = dyn Fn(LogEvent) -> LogEvent + Send + Sync;

#[derive(Clone)]
pub struct Enricher {
    transform: Arc<Transform>,
}

impl Enricher {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(LogEvent) -> LogEvent + Send + Sync + 'static,
    {
        Self {
            transform: Arc::new(transform),
        }
    }

    /// Append a fixed property to every event
    pub fn property(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let property = Property::new(name, value);
        Self::new(move |mut event| {
            event.properties.push_property(property.clone());
            event
        })
    }

    /// Append `ThreadId` and, when the thread is named, `ThreadName`
    pub fn thread() -> Self {
        Self::new(|mut event| {
            event.properties.push("ThreadId", thread_id());
            if let Some(name) = thread_name() {
                event.properties.push("ThreadName", name);
            }
            event
        })
    }

    #[inline]
    pub fn enrich(&self, event: LogEvent) -> LogEvent {
        (self.transform)(event)
    }
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher").finish_non_exhaustive()
    }
}

// Thread information is looked up once per thread
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}
