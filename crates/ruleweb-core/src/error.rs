//! Error types for ruleweb-core
//!
//! Error codes, severities and detail records for the rule list
//! controller and the collaborators it talks to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Rule list not loaded yet
    NotLoaded,
    /// Rule not found in the cached list
    RuleNotFound,
    /// Bulk operation with an empty selection
    EmptySelection,
    /// Remote collaborator call failed
    RemoteError,
    /// Dataset could not be read or decoded
    InvalidData,
    /// IO error
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NotLoaded => write!(f, "NOT_LOADED"),
            ErrorCode::RuleNotFound => write!(f, "RULE_NOT_FOUND"),
            ErrorCode::EmptySelection => write!(f, "EMPTY_SELECTION"),
            ErrorCode::RemoteError => write!(f, "REMOTE_ERROR"),
            ErrorCode::InvalidData => write!(f, "INVALID_DATA"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Detailed error information for the hosting UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Main error type for ruleweb-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Rule list not loaded")]
    NotLoaded,

    #[error("Rule not found: {id}")]
    RuleNotFound { id: String },

    #[error("No rules selected")]
    EmptySelection,

    #[error("Remote call '{operation}' failed: {message}")]
    Remote { operation: String, message: String },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Shorthand for a failed remote call
    pub fn remote(operation: &str, message: impl Into<String>) -> Self {
        CoreError::Remote {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotLoaded => ErrorCode::NotLoaded,
            CoreError::RuleNotFound { .. } => ErrorCode::RuleNotFound,
            CoreError::EmptySelection => ErrorCode::EmptySelection,
            CoreError::Remote { .. } => ErrorCode::RemoteError,
            CoreError::InvalidData { .. } => ErrorCode::InvalidData,
            CoreError::Io(_) => ErrorCode::IoError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NotLoaded => ErrorSeverity::Warning,
            CoreError::RuleNotFound { .. } => ErrorSeverity::Info,
            CoreError::EmptySelection => ErrorSeverity::Info,
            CoreError::Remote { .. } => ErrorSeverity::Error,
            CoreError::InvalidData { .. } => ErrorSeverity::Error,
            CoreError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::NotLoaded => {
                details = details
                    .with_suggestion("Initialize the rule list before paging or deleting.".to_string());
            }
            CoreError::RuleNotFound { id } => {
                details = details
                    .with_detail(serde_json::json!({ "rule_id": id }))
                    .with_suggestion("The rule may have been deleted; reload the list.".to_string());
            }
            CoreError::Remote { operation, message } => {
                details = details
                    .with_detail(serde_json::json!({ "operation": operation, "message": message }))
                    .with_suggestion("Retry the operation once the server is reachable.".to_string());
            }
            CoreError::InvalidData { message } => {
                details = details
                    .with_detail(serde_json::json!({ "data_message": message }))
                    .with_suggestion("Check the rules file against data/rules.json.".to_string());
            }
            CoreError::Io(_) => {
                details = details.with_suggestion("Check data.path and data.rules_file in the config.".to_string());
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::InvalidData {
            message: error.to_string(),
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Payee the rule list is scoped to, if any
    pub payee_id: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            payee_id: None,
        }
    }

    pub fn with_payee(mut self, payee_id: Option<String>) -> Self {
        self.payee_id = payee_id;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        };
        log::log!(
            target: "ruleweb::error",
            level,
            "{} [{}] {} - Operation: {} - Payee: {:?}",
            error.severity().to_string().to_uppercase(),
            error.code(),
            error,
            context.operation,
            context.payee_id
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "ruleweb::error",
            "WARNING: {} - Operation: {} - Payee: {:?}",
            message,
            context.operation,
            context.payee_id
        );
    }
}

// ==================== Tests ====================
