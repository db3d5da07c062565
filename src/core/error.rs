//! Error types for the logging engine

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Malformed message template.
///
/// Positions are byte offsets into the template source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A `{` opened a hole that never closed
    #[error("unterminated hole starting at byte {position}")]
    UnterminatedHole { position: usize },

    /// A hole with no name, e.g. `{}` or `{:d}`
    #[error("empty hole name at byte {position}")]
    EmptyName { position: usize },

    /// A hole name containing something other than letters, digits or `_`
    #[error("invalid character {character:?} in hole name at byte {position}")]
    InvalidCharacter { position: usize, character: char },
}

impl ParseError {
    /// Byte offset the error refers to
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnterminatedHole { position }
            | ParseError::EmptyName { position }
            | ParseError::InvalidCharacter { position, .. } => *position,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Template parse failure
    #[error("template error: {0}")]
    Parse(#[from] ParseError),

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rolling error
    #[error("File rolling failed for '{path}': {message}")]
    FileRollingError { path: String, message: String },

    /// Emit on a sink that has already been closed
    #[error("Sink '{sink}' is closed")]
    SinkClosed { sink: String },

    /// A sink panicked while handling an operation
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// More than one sink failed for the same operation
    #[error("{} sinks failed; first: {}", .0.len(), first_failure(.0))]
    SinkFailures(Vec<LoggerError>),

    /// A background unit of work could not complete
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn first_failure(failures: &[LoggerError]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rolling error
    pub fn file_rolling(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRollingError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn sink_closed(sink: impl Into<String>) -> Self {
        LoggerError::SinkClosed { sink: sink.into() }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Collapse per-sink failures into a single result
    ///
    /// No failures is `Ok`, a single failure is returned unchanged and
    /// several are wrapped in [`LoggerError::SinkFailures`].
    pub fn collect(mut failures: Vec<LoggerError>) -> Result<()> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(LoggerError::SinkFailures(failures)),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
