//! Sink implementations for various output targets

pub mod composite;
pub mod console;
pub mod func;
pub mod memory;
pub mod rolling_file;

pub use composite::CompositeSink;
pub use console::ConsoleSink;
pub use func::FnSink;
pub use memory::{MemorySink, NullSink};
pub use rolling_file::{RollingFileSink, RollingInterval};
