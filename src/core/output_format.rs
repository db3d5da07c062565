//! Line formats for sink output
//!
//! - Text: an output template such as `{timestamp} [{level}] {message}`,
//!   followed by the event properties as compact JSON
//! - Json: one JSON object per event
//! - Logfmt: `key=value` pairs

use super::event::{ExceptionInfo, LogEvent};
use super::property::{display_value, Properties};
use super::timestamp::TimestampFormat;
use serde::Serialize;
use serde_json::Value;

/// Template used by text sinks unless configured otherwise
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{timestamp} [{level}] {message}";

/// Escape control characters so one event always stays on one line
pub fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Timestamp,
    Level,
    Message,
    Source,
    CorrelationId,
}

/// A pre-tokenized text output template
///
/// Recognized tokens are `{timestamp}`, `{level}` (three-letter code),
/// `{message}`, `{source}` and `{correlation_id}`. Anything else, including
/// unknown `{tokens}`, is written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl OutputTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let tokens = tokenize(&source);
        Self { source, tokens }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute the template for an event, with `level` as the level text
    pub fn render(&self, event: &LogEvent, timestamp_format: &TimestampFormat, level: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + event.rendered_message.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Timestamp => out.push_str(&timestamp_format.format(&event.timestamp)),
                Token::Level => out.push_str(level),
                Token::Message => out.push_str(&sanitize_message(&event.rendered_message)),
                Token::Source => out.push_str(event.source.as_deref().unwrap_or_default()),
                Token::CorrelationId => {
                    out.push_str(event.correlation_id.as_deref().unwrap_or_default())
                }
            }
        }
        out
    }
}

impl Default for OutputTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_TEMPLATE)
    }
}

impl From<&str> for OutputTemplate {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for OutputTemplate {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open..];
        let known = after.find('}').and_then(|close| {
            let token = match &after[1..close] {
                "timestamp" => Token::Timestamp,
                "level" => Token::Level,
                "message" => Token::Message,
                "source" => Token::Source,
                "correlation_id" => Token::CorrelationId,
                _ => return None,
            };
            Some((token, close))
        });

        match known {
            Some((token, close)) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(token);
                rest = &after[close + 1..];
            }
            None => {
                literal.push('{');
                rest = &after[1..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Output format for log events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    ///
    /// Example: `2026-10-18T09:12:44.120Z [INF] User alice logged in {"user":"alice"}`
    Text(OutputTemplate),

    /// JSON for machine processing
    ///
    /// Example: `{"timestamp":"...","level":"Information","messageTemplate":"User {user} logged in",...}`
    Json,

    /// Logfmt key=value pairs
    ///
    /// Example: `timestamp=... level=INF message="User alice logged in" user="alice"`
    Logfmt,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text(OutputTemplate::default())
    }
}

impl OutputFormat {
    /// Text format with the given output template
    pub fn text(template: impl Into<OutputTemplate>) -> Self {
        OutputFormat::Text(template.into())
    }

    /// Format an event as a single line, without the trailing newline
    pub fn format(&self, event: &LogEvent, timestamp_format: &TimestampFormat) -> String {
        self.format_with_level(event, timestamp_format, event.level.short_code())
    }

    /// Like [`format`](Self::format), with the text used for `{level}`
    pub fn format_with_level(
        &self,
        event: &LogEvent,
        timestamp_format: &TimestampFormat,
        level: &str,
    ) -> String {
        match self {
            OutputFormat::Text(template) => format_text(template, event, timestamp_format, level),
            OutputFormat::Json => format_json(event, timestamp_format),
            OutputFormat::Logfmt => format_logfmt(event, timestamp_format),
        }
    }
}

fn format_text(
    template: &OutputTemplate,
    event: &LogEvent,
    timestamp_format: &TimestampFormat,
    level: &str,
) -> String {
    let mut line = template.render(event, timestamp_format, level);

    if !event.properties.is_empty() {
        line.push(' ');
        line.push_str(&event.properties.to_json_string());
    }

    if let Some(ref exception) = event.exception {
        line.push_str(" exception=");
        line.push_str(&serde_json::to_string(exception).unwrap_or_default());
    }

    line
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonLine<'a> {
    timestamp: Value,
    level: &'static str,
    message_template: &'a str,
    message: &'a str,
    properties: &'a Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<&'a ExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

fn format_json(event: &LogEvent, timestamp_format: &TimestampFormat) -> String {
    let line = JsonLine {
        timestamp: timestamp_format.to_json(&event.timestamp),
        level: event.level.to_str(),
        message_template: &event.message_template,
        message: &event.rendered_message,
        properties: &event.properties,
        exception: event.exception.as_ref(),
        correlation_id: event.correlation_id.as_deref(),
        source: event.source.as_deref(),
    };
    serde_json::to_string(&line).unwrap_or_default()
}

fn format_logfmt(event: &LogEvent, timestamp_format: &TimestampFormat) -> String {
    let mut parts = vec![
        format!(
            "timestamp={}",
            escape_logfmt_value(&timestamp_format.format(&event.timestamp))
        ),
        format!("level={}", event.level.short_code()),
        format!(
            "message={}",
            quote_logfmt_value(&sanitize_message(&event.rendered_message))
        ),
    ];

    if let Some(ref source) = event.source {
        parts.push(format!("source={}", escape_logfmt_value(source)));
    }
    if let Some(ref id) = event.correlation_id {
        parts.push(format!("correlation_id={}", escape_logfmt_value(id)));
    }

    for property in &event.properties {
        let value = match property.value {
            Value::String(ref s) => quote_logfmt_value(&sanitize_message(s)),
            ref other => escape_logfmt_value(&display_value(other)),
        };
        parts.push(format!("{}={}", escape_logfmt_key(&property.name), value));
    }

    if let Some(ref exception) = event.exception {
        parts.push(format!(
            "exception={}",
            quote_logfmt_value(&sanitize_message(&exception.to_string()))
        ));
    }

    parts.join(" ")
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Quote only when the value would otherwise split
fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use chrono::TimeZone;
    use chrono::Utc;
    use serde_json::json;

    fn event() -> LogEvent {
        LogEvent::new(
            Level::Information,
            "User {user} logged in",
            "User alice logged in",
            Properties::new().with("user", "alice"),
        )
        .with_timestamp(Utc.with_ymd_and_hms(2026, 10, 18, 9, 12, 44).unwrap())
    }

    #[test]
    fn test_default_text_line() {
        let line = OutputFormat::default().format(&event(), &TimestampFormat::Iso8601);
        assert_eq!(
            line,
            r#"2026-10-18T09:12:44.000Z [INF] User alice logged in {"user":"alice"}"#
        );
    }

    #[test]
    fn test_text_tokens() {
        let format = OutputFormat::text("[{level}] {source}/{correlation_id}: {message} {unknown}");
        let event = event()
            .with_source("auth")
            .with_correlation_id("c-1")
            .without_property("user");
        assert_eq!(
            format.format(&event, &TimestampFormat::Iso8601),
            "[INF] auth/c-1: User alice logged in {unknown}"
        );
    }

    #[test]
    fn test_text_missing_optional_tokens_are_empty() {
        let format = OutputFormat::text("<{source}>{message}");
        let event = event().without_property("user");
        assert_eq!(
            format.format(&event, &TimestampFormat::Iso8601),
            "<>User alice logged in"
        );
    }

    #[test]
    fn test_unterminated_token_is_literal() {
        let template = OutputTemplate::new("{level} {message");
        assert_eq!(
            template.render(&event(), &TimestampFormat::Iso8601, "INF"),
            "INF {message"
        );
    }

    #[test]
    fn test_text_sanitizes_message() {
        let mut event = event().without_property("user");
        event.rendered_message = "line1\nFAKE [ERR] injected\r\t".to_string();
        let line = OutputFormat::text("{message}").format(&event, &TimestampFormat::Iso8601);
        assert_eq!(line, "line1\\nFAKE [ERR] injected\\r\\t");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_text_exception_suffix() {
        let event = event()
            .without_property("user")
            .with_exception(ExceptionInfo::new("IoError", "disk full"));
        let line = OutputFormat::text("{message}").format(&event, &TimestampFormat::Iso8601);
        assert_eq!(
            line,
            r#"User alice logged in exception={"kind":"IoError","message":"disk full"}"#
        );
    }

    #[test]
    fn test_json_format() {
        let line = OutputFormat::Json.format(
            &event().with_correlation_id("req-7"),
            &TimestampFormat::UnixMillis,
        );
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "Information");
        assert_eq!(parsed["messageTemplate"], "User {user} logged in");
        assert_eq!(parsed["message"], "User alice logged in");
        assert_eq!(parsed["properties"], json!({"user": "alice"}));
        assert_eq!(parsed["correlationId"], "req-7");
        assert!(parsed["timestamp"].is_i64());
        assert!(parsed.get("exception").is_none());
        assert!(parsed.get("source").is_none());
    }

    #[test]
    fn test_json_keeps_duplicate_properties() {
        let event = event().with_property("user", "bob");
        let line = OutputFormat::Json.format(&event, &TimestampFormat::Iso8601);
        assert!(line.contains(r#""properties":{"user":"alice","user":"bob"}"#));
    }

    #[test]
    fn test_logfmt_format() {
        let event = event()
            .with_property("count", 5)
            .with_property("query", "id=1");
        let line = OutputFormat::Logfmt.format(&event, &TimestampFormat::Iso8601);
        assert!(line.contains("level=INF"));
        assert!(line.contains("message=\"User alice logged in\""));
        assert!(line.contains("user=\"alice\""));
        assert!(line.contains("count=5"));
        assert!(line.contains("query=\"id=1\""));
    }
}
