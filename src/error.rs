//! Error taxonomy for the sync pipeline.
//!
//! Failures split along one axis: whether they affect a single unit (one
//! schema, one style, one validated artifact) or the ability to enumerate
//! units at all. Unit-level failures are caught at the unit boundary and
//! downgraded to logged issues; enumeration failures abort the phase.

use std::path::PathBuf;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The schema registry could not be reached or rejected the request.
    /// Fatal for the whole generation run; a partial schema list is never
    /// trusted.
    #[error("schema registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// The design-tool API could not be reached or rejected the request.
    /// Fatal to token sync only.
    #[error("design tool unavailable: {0}")]
    DesignToolUnavailable(String),

    /// Generation failed for one component schema. Recovered per schema;
    /// siblings in the same run proceed.
    #[error("generation failed for component `{component}`: {reason}")]
    SchemaGeneration { component: String, reason: String },

    /// Extraction failed for one style definition. Recovered per style.
    #[error("token extraction failed for style `{style}`: {reason}")]
    TokenExtraction { style: String, reason: String },

    /// Webhook signature did not match. The payload is never processed.
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    /// Webhook body could not be decoded into an event.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Filesystem operation failed. Fatal; aborts remaining work in the
    /// current phase.
    #[error("filesystem failure at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn generation(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::SchemaGeneration {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(style: impl Into<String>, reason: impl ToString) -> Self {
        Self::TokenExtraction {
            style: style.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts the phase it occurred in, as opposed to
    /// being recovered at the unit boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::RegistryUnavailable(_)
                | SyncError::DesignToolUnavailable(_)
                | SyncError::FileSystem { .. }
        )
    }

    /// Error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            SyncError::RegistryUnavailable(_) => "registry",
            SyncError::DesignToolUnavailable(_) => "design_tool",
            SyncError::SchemaGeneration { .. } => "generation",
            SyncError::TokenExtraction { .. } => "extraction",
            SyncError::SignatureInvalid => "signature",
            SyncError::InvalidPayload(_) => "payload",
            SyncError::FileSystem { .. } => "filesystem",
        }
    }
}
