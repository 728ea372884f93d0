//! Custom error types for the data quality audit.
//!
//! Errors use `thiserror` and carry a stable code so anything consuming the
//! JSON report can tell failure kinds apart.
//!
//! Most failures inside the analysis never reach the caller: date and numeric
//! parse failures degrade to sentinels, and a source that fails to load is
//! replaced by an empty collection. The variants below cover what remains.

use thiserror::Error;

/// The main error type for the audit library.
#[derive(Error, Debug)]
pub enum AuditError {
    /// A line of an NDJSON source was valid JSON but not an object.
    #[error("Line {line} is not a JSON object: {reason}")]
    InvalidRecord { line: usize, reason: String },

    /// A named source could not be loaded.
    #[error("Failed to load source '{source_name}': {reason}")]
    SourceLoad { source_name: String, reason: String },

    /// A field holds values that have no numeric reading at all.
    #[error("Failed to convert column '{column}' to numeric: {reason}")]
    TypeConversionFailed { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AuditError>,
    },
}

impl AuditError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AuditError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::SourceLoad { .. } => "SOURCE_LOAD_FAILED",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Extension trait for adding context to IO results.
pub trait ResultExt<T> {
    /// Wrap the IO error and add context to it.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AuditError::Io(e).with_context(context))
    }
}
