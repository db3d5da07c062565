//! # Rust Structured Logger
//!
//! A structured event logging engine. Log calls take a message template
//! with named holes and a set of properties; the logger renders the
//! message, captures the hole values as structured data and routes the
//! resulting event to one or more sinks.
//!
//! ## Features
//!
//! - **Message templates**: `"User {user} logged in"`, with `{@data}`
//!   structure capture, `{$value}` stringification and `{n:05d}` style
//!   format specifiers
//! - **Pipeline**: level gate, enrichers, ambient and logger context,
//!   filters, then fan-out to sinks with per-sink failure isolation
//! - **Sinks**: console, rolling file (daily/hourly, retention, gzip),
//!   composite, closures and in-memory recording
//! - **Strategies**: the same logger runs on the calling thread, on
//!   tokio's blocking pool, or cooperatively inside a `LocalSet`
//!
//! ## Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder()
//!     .minimum_level(Level::Debug)
//!     .write_to(sink.clone())
//!     .create_logger()
//!     .unwrap();
//!
//! logger
//!     .for_context("request_id", "r-17")
//!     .information("Fetched {count:05d} rows", [("count", 7)])
//!     .unwrap();
//!
//! let event = &sink.events()[0];
//! assert_eq!(event.rendered_message, "Fetched 00007 rows");
//! assert_eq!(event.property("request_id"), Some(&json!("r-17")));
//! ```

pub mod core;
pub mod macros;
pub mod sinks;
pub mod strategy;

pub mod prelude {
    pub use crate::core::ambient::{self, AmbientContext, AmbientFutureExt};
    pub use crate::core::{
        Enricher, ExceptionInfo, Filter, Level, LogEvent, Logger, LoggerConfiguration,
        LoggerError, LoggerMetrics, OutputFormat, OutputTemplate, Properties, Result,
        SamplingConfig, Sink, Template, TimestampFormat,
    };
    pub use crate::sinks::{
        CompositeSink, ConsoleSink, FnSink, MemorySink, NullSink, RollingFileSink,
        RollingInterval,
    };
    pub use crate::strategy::{Immediate, Strategy};
    #[cfg(feature = "async")]
    pub use crate::strategy::{Cooperative, Deferred, FiberScope};
    pub use serde_json::json;
}

pub use crate::core::{
    ambient, diagnostic, Enricher, ExceptionInfo, Filter, Level, LogEvent, Logger,
    LoggerConfiguration, LoggerError, LoggerMetrics, OutputFormat, OutputTemplate, ParseError,
    Properties, Property, Result, SamplingConfig, Sink, SinkSlot, Template, TimestampFormat,
};
pub use serde_json::{json, Value};
pub use sinks::{
    CompositeSink, ConsoleSink, FnSink, MemorySink, NullSink, RollingFileSink, RollingInterval,
};
pub use strategy::{Immediate, Strategy};
#[cfg(feature = "async")]
pub use strategy::{Cooperative, Deferred, FiberScope};
