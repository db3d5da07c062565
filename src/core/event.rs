//! Log event structure

use super::level::Level;
use super::property::{Properties, Property};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;

/// Error details attached to an event
///
/// Captured from any [`std::error::Error`] by walking its `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Type name of the outermost error
    pub kind: String,
    pub message: String,
    /// Messages of the source chain, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub causes: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn from_error<E: StdError + ?Sized>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind: short_type_name(std::any::type_name::<E>()),
            message: error.to_string(),
            causes,
        }
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for cause in &self.causes {
            write!(f, "; caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// `alloc::string::String` -> `String`, keeping generic arguments intact
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => full[idx + 2..].to_string(),
        None => full.to_string(),
    }
}

/// A single structured log event
///
/// Events are plain values: enrichers and the logger's context merge take
/// one by value and return a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message_template: String,
    pub rendered_message: String,
    pub properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LogEvent {
    /// Create an event timestamped now
    pub fn new(
        level: Level,
        message_template: impl Into<String>,
        rendered_message: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message_template: message_template.into(),
            rendered_message: rendered_message.into(),
            properties,
            exception: None,
            correlation_id: None,
            source: None,
        }
    }

    /// Append a property
    #[must_use = "builder methods return a new value"]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push_property(Property::new(name, value));
        self
    }

    /// Drop every property with the given name
    #[must_use = "builder methods return a new value"]
    pub fn without_property(mut self, name: &str) -> Self {
        self.properties.remove_all(name);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Last value of a property
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Outer {
        inner: std::io::Error,
    }

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.inner)
        }
    }

    #[test]
    fn test_exception_from_error_chain() {
        let err = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
        };
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.kind, "Outer");
        assert_eq!(info.message, "request failed");
        assert_eq!(info.causes, vec!["connect timed out".to_string()]);
        assert_eq!(
            info.to_string(),
            "Outer: request failed; caused by: connect timed out"
        );
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(
            short_type_name("my::Wrapper<alloc::string::String>"),
            "Wrapper<alloc::string::String>"
        );
    }

    #[test]
    fn test_event_builders() {
        let event = LogEvent::new(Level::Information, "x {a}", "x 1", Properties::new())
            .with_property("a", 1)
            .with_property("b", "two")
            .without_property("b")
            .with_correlation_id("req-1")
            .with_level(Level::Warning)
            .with_source("billing");

        assert_eq!(event.level, Level::Warning);
        assert_eq!(event.property("a"), Some(&json!(1)));
        assert!(event.property("b").is_none());
        assert_eq!(event.correlation_id.as_deref(), Some("req-1"));
        assert_eq!(event.source.as_deref(), Some("billing"));
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = LogEvent::new(Level::Error, "t", "t", Properties::new().with("k", 1))
            .with_correlation_id("c");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["messageTemplate"], json!("t"));
        assert_eq!(value["correlationId"], json!("c"));
        assert_eq!(value["level"], json!("Error"));
        assert_eq!(value["properties"], json!({"k": 1}));
        assert!(value.get("exception").is_none());
    }
}
