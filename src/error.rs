//! # Client Error Handling
//!
//! Hierarchical error type for the FaceLab client core, with rich context and
//! classification helpers the UI layer uses to decide how to react.
//!
//! ## Error Kinds
//!
//! - `Decode` / `Encode`: local image failures. Terminal for the asset in
//!   question, surfaced immediately, never retried.
//! - `Network`: an unreachable API or a non-2xx response. The wizard reacts by
//!   degrading to a preview-only stand-in result.
//! - `Validation`: required inputs missing. Normally caught by gating before
//!   any request is issued.
//! - `State`: a wizard transition requested from a stage that does not allow it.
//! - `Auth`: identity-provider failures, shown inline on the auth form.
//! - `Config`, `Io`, `External`: ambient failures.
//!
//! None of these is retried automatically: a failed action needs an explicit
//! user re-initiation.
//!
//! ## Usage
//!
//! ```rust
//! use facelab_client::error::{ClientError, Recoverable, RecoveryStrategy};
//!
//! let error = ClientError::api_status("swap", 500, "oom")
//!     .with_context("POST /api/simswap");
//!
//! assert_eq!(error.category(), "network");
//! assert!(matches!(
//!     error.recovery_strategies().first(),
//!     Some(RecoveryStrategy::Degrade { .. })
//! ));
//! ```

use std::{collections::HashMap, error::Error as StdError, time::SystemTime};

use thiserror::Error;

/// Default message when a failed response carries no usable `detail`.
pub const UNKNOWN_ERROR_DETAIL: &str = "Unknown error";

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, no user-visible effect
    Info,
    /// Visible but non-blocking (degraded mode)
    Warning,
    /// The action failed and must be re-initiated
    Error,
    /// The session cannot continue without reconfiguration
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Base error type for the client core
#[derive(Debug, Error)]
pub enum ClientError {
    /// Source bytes are not a decodable image
    #[error("Failed to decode image '{name}': {reason}")]
    Decode {
        name: String,
        reason: String,
        context: ErrorContext,
    },
    /// Re-encoding produced no output or failed
    #[error("Failed to encode image '{name}': {reason}")]
    Encode {
        name: String,
        reason: String,
        context: ErrorContext,
    },
    /// Unreachable API, transport failure, or non-2xx response
    #[error("Network error during {operation}: {detail}")]
    Network {
        operation: String,
        status: Option<u16>,
        detail: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Missing or out-of-range input
    #[error("Validation failed for '{field}': {constraint} (value: {value})")]
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// Operation not allowed from the current stage
    #[error("Invalid transition from '{current_state}' when attempting '{attempted_operation}': {reason}")]
    State {
        current_state: String,
        attempted_operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Identity provider failures
    #[error("Authentication error during {operation}: {reason}")]
    Auth {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    #[error("Configuration error in '{field}': {reason} (value: {value})")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    #[error("External library error in {library}: {source}")]
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl ClientError {
    /// Create a decode error
    pub fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
            context: ErrorContext::new(),
        }
    }

    /// Create an encode error
    pub fn encode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            name: name.into(),
            reason: reason.to_string(),
            context: ErrorContext::new(),
        }
    }

    /// Transport-level failure (connection refused, body read failure, ...)
    pub fn network(operation: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        let detail = source.to_string();
        Self::Network {
            operation: operation.into(),
            status: None,
            detail,
            source: Some(Box::new(source)),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Non-2xx response carrying a server `detail`
    pub fn api_status(operation: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            status: Some(status),
            detail: detail.into(),
            source: None,
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// 2xx response whose body reports `ok: false`
    pub fn api_rejected(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            status: None,
            detail: detail.into(),
            source: None,
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a state error
    pub fn state(
        current_state: impl ToString,
        attempted_operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::State {
            current_state: current_state.to_string(),
            attempted_operation: attempted_operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an authentication error
    pub fn auth(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Auth {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Attach a filesystem path to an I/O error; no-op for other kinds
    pub fn with_path(mut self, p: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(p.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Decode { context, .. }
            | Self::Encode { context, .. }
            | Self::Network { context, .. }
            | Self::Validation { context, .. }
            | Self::State { context, .. }
            | Self::Auth { context, .. }
            | Self::Config { context, .. }
            | Self::Io { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Decode { context, .. }
            | Self::Encode { context, .. }
            | Self::Network { context, .. }
            | Self::Validation { context, .. }
            | Self::State { context, .. }
            | Self::Auth { context, .. }
            | Self::Config { context, .. }
            | Self::Io { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Network { .. } => "network",
            Self::Validation { .. } => "validation",
            Self::State { .. } => "state",
            Self::Auth { .. } => "auth",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// HTTP status for API failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias using the client error type
pub type ClientResult<T> = Result<T, ClientError>;

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;

    /// Get recovery strategies for this error
    fn recovery_strategies(&self) -> Vec<RecoveryStrategy>;
}

/// Recovery strategies for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Show a local stand-in and keep the flow moving
    Degrade { description: String },
    /// Return to an earlier stage and let the user act again
    ReturnTo { stage: String },
    /// Fix the input and re-initiate
    CorrectInput { field: String },
    /// Reconfigure the client
    Reconfigure { component: String },
}

impl Recoverable for ClientError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Decode { .. } | Self::Encode { .. } | Self::Config { .. })
    }

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy> {
        match self {
            Self::Network { .. } => vec![RecoveryStrategy::Degrade {
                description: "Use the locally selected file as a stand-in result".to_string(),
            }],
            Self::Validation { field, .. } => vec![RecoveryStrategy::CorrectInput {
                field: field.clone(),
            }],
            Self::State { .. } => vec![RecoveryStrategy::ReturnTo {
                stage: "upload".to_string(),
            }],
            Self::Auth { .. } => vec![RecoveryStrategy::CorrectInput {
                field: "credentials".to_string(),
            }],
            Self::Config { field, .. } => vec![RecoveryStrategy::Reconfigure {
                component: field.clone(),
            }],
            _ => vec![],
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ClientError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for ClientError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Failures that never touched the network
    pub fn is_local(error: &ClientError) -> bool {
        matches!(
            error,
            ClientError::Decode { .. } | ClientError::Encode { .. } | ClientError::Validation { .. }
        )
    }

    /// Failures the wizard answers with a stand-in result
    pub fn is_degradable(error: &ClientError) -> bool {
        matches!(error, ClientError::Network { .. })
    }

    /// Short text suitable for an inline error banner
    pub fn user_message(error: &ClientError) -> String {
        match error {
            ClientError::Network { detail, .. } => detail.clone(),
            ClientError::Auth { reason, .. } => reason.clone(),
            ClientError::Decode { name, .. } => format!("'{name}' is not a readable image"),
            ClientError::Encode { name, .. } => format!("'{name}' could not be compressed"),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<base64::DecodeError> for ClientError {
    fn from(error: base64::DecodeError) -> Self {
        Self::external("base64", error)
    }
}

impl From<std::num::ParseIntError> for ClientError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::validation("integer", "invalid format", error.to_string())
    }
}

impl From<std::num::ParseFloatError> for ClientError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::validation("float", "invalid format", error.to_string())
    }
}
