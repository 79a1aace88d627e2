//! Scan error types
//!
//! Uses anyhow for error propagation. `ScanError` is a minimal enum for the
//! global failures that need their own exit code; everything that goes wrong
//! for a single folder stays inside that folder's result slot instead.

/// Semantic errors that require special handling in main.rs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The `git` executable cannot be invoked at all
    ToolUnavailable { message: String },
    /// No usable target directories (missing, not a directory, or none given)
    Config { message: String },
    /// The user interrupted the scan (SIGINT/SIGTERM)
    Interrupted,
}

impl ScanError {
    pub fn config(message: impl Into<String>) -> Self {
        ScanError::Config {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::ToolUnavailable { message } | ScanError::Config { message } => {
                write!(f, "{message}")
            }
            ScanError::Interrupted => write!(f, "Interrupted."),
        }
    }
}

impl std::error::Error for ScanError {}

/// Extract exit code from ScanError, if applicable
pub fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<ScanError>().map(|e| match e {
        ScanError::ToolUnavailable { .. } => 1,
        ScanError::Config { .. } => 2,
        ScanError::Interrupted => 130,
    })
}
