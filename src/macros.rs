//! Logging macros with named properties.
//!
//! The macros forward to [`Logger::log`](crate::Logger::log); property
//! values can be anything `serde::Serialize`, and the return value is the
//! logger's effect, exactly as from the method.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::{information, Logger, MemorySink};
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder().write_to(sink.clone()).create_logger().unwrap();
//!
//! let port = 8080;
//! information!(logger, "Server listening on {port}", port = port).unwrap();
//! information!(logger, "Server started").unwrap();
//!
//! assert_eq!(sink.messages(), vec!["Server listening on 8080", "Server started"]);
//! ```

/// Build [`Properties`](crate::Properties) from `name = value` pairs.
///
/// # Examples
///
/// ```
/// use rust_structured_logger::props;
/// use serde_json::json;
///
/// let tags = vec!["a", "b"];
/// let properties = props!(user = "alice", attempts = 3, tags = tags);
/// assert_eq!(properties.get("attempts"), Some(&json!(3)));
/// assert_eq!(properties.get("tags"), Some(&json!(["a", "b"])));
/// assert!(props!().is_empty());
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Properties::new()
    };
    ($($name:ident = $value:expr),+ $(,)?) => {{
        let mut properties = $crate::Properties::new();
        $(properties.push_serialize(stringify!($name), &$value);)+
        properties
    }};
}

/// Log a message template at the given level.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::{Logger, Level};
/// # let logger = Logger::silent();
/// use rust_structured_logger::log;
/// log!(logger, Level::Information, "Simple message").unwrap();
/// log!(logger, Level::Error, "Error code: {code}", code = 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $name:ident = $value:expr)* $(,)?) => {
        $logger.log($level, $template, $crate::props!($($name = $value),*))
    };
}

/// Log a verbose-level message.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Verbose, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::Logger;
/// # let logger = Logger::silent();
/// use rust_structured_logger::debug;
/// debug!(logger, "Counter value: {counter}", counter = 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an information-level message.
#[macro_export]
macro_rules! information {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Information, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::Logger;
/// # let logger = Logger::silent();
/// use rust_structured_logger::warning;
/// warning!(logger, "Retry attempt {attempt} of {max}", attempt = 3, max = 5).unwrap();
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
