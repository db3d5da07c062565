//! Core logger types and traits

pub mod ambient;
pub mod config;
pub mod diagnostic;
pub mod enrich;
pub mod error;
pub mod event;
pub mod filter;
pub mod format_spec;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod property;
pub mod render;
pub mod sink;
pub mod template;
pub mod timestamp;

pub use ambient::{AmbientContext, AmbientFutureExt, AmbientGuard};
pub use config::LoggerConfiguration;
pub use diagnostic::Severity;
pub use enrich::Enricher;
pub use error::{LoggerError, ParseError, Result};
pub use event::{ExceptionInfo, LogEvent};
pub use filter::{Filter, SamplingConfig};
pub use format_spec::FormatSpec;
pub use level::Level;
pub use logger::Logger;
pub use metrics::LoggerMetrics;
pub use output_format::{OutputFormat, OutputTemplate, DEFAULT_OUTPUT_TEMPLATE};
pub use property::{Properties, Property};
pub use sink::{Sink, SinkSlot};
pub use template::{Hole, Operator, Segment, Template};
pub use timestamp::TimestampFormat;
