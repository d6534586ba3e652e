use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "rules.dynamic_patterns[2]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the offending path or partition)
    pub details: Option<String>,
    /// Source of the error (e.g., "disk_store", "lifecycle")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the cache layer.
///
/// Network failures and the terminal "nothing cached, network down" condition are kept
/// apart so callers can tell a recoverable transport error from an unavailable resource.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Resource unavailable: {url} ({reason})")]
    Unavailable { url: String, reason: String },

    #[error("Install failed: {message}{}", format_context(.context))]
    Install {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}{}", format_context(.context))]
    Storage {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Control message error: {message}{}", format_context(.context))]
    Control {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn install_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Install {
            message: msg.into(),
            context,
        }
    }

    pub fn storage_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Storage {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn control_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Control {
            message: msg.into(),
            context,
        }
    }

    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// True for failures reported by the network layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Install { context, .. }
            | Error::Storage { context, .. }
            | Error::Configuration { context, .. }
            | Error::Control { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered() {
        let err = Error::storage_with_context(
            "write failed",
            ErrorContext::new()
                .with_details("static-v1")
                .with_source("disk_store"),
        );
        assert_eq!(
            err.to_string(),
            "Storage error: write failed (details: static-v1, source: disk_store)"
        );
        assert_eq!(err.context().and_then(|c| c.source.as_deref()), Some("disk_store"));
    }

    #[test]
    fn test_unavailable_classification() {
        let err = Error::unavailable("https://example.com/api/data", "offline");
        assert!(err.is_unavailable());
        assert!(!err.is_network());
        assert!(err.context().is_none());
    }
}
