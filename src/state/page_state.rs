/// Page outcome definitions for tracking processing results
///
/// This module defines every way the processing of one discovered URL can end.
use crate::FetchError;
use std::fmt;

/// Represents the final outcome of processing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Success =====
    /// Page was fetched, converted and written to disk
    Saved,

    // ===== Fetch Errors =====
    /// URL is disallowed by robots.txt; no request was made
    PermissionDenied,

    /// Page could not be reached (timeout, DNS failure, connection refused)
    NetworkError,

    /// Server answered with a 5xx status
    ServerError,

    /// Server answered with another non-success status (404 and similar)
    HttpError,

    // ===== Processing Errors =====
    /// Page was fetched but no main content could be extracted
    NoContent,

    /// Extracted content could not be converted to markdown
    ConversionFailed,

    /// Markdown could not be written to disk
    SaveFailed,

    // ===== Special =====
    /// The run was interrupted before this page finished
    Cancelled,
}

impl PageOutcome {
    /// Every outcome, in reporting order
    pub const ALL: [PageOutcome; 9] = [
        Self::Saved,
        Self::PermissionDenied,
        Self::NetworkError,
        Self::ServerError,
        Self::HttpError,
        Self::NoContent,
        Self::ConversionFailed,
        Self::SaveFailed,
        Self::Cancelled,
    ];

    /// Returns true if the page was saved
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if this outcome counts as a failed page
    ///
    /// Cancelled pages are neither successes nor failures.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Saved | Self::Cancelled)
    }

    /// Returns the string representation used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::PermissionDenied => "permission_denied",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::HttpError => "http_error",
            Self::NoContent => "no_content",
            Self::ConversionFailed => "conversion_failed",
            Self::SaveFailed => "save_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&FetchError> for PageOutcome {
    fn from(error: &FetchError) -> Self {
        match error {
            FetchError::PermissionDenied { .. } => Self::PermissionDenied,
            // A URL that cannot be requested fails like an unreachable one
            FetchError::Network { .. } | FetchError::InvalidUrl { .. } => Self::NetworkError,
            FetchError::Server { .. } => Self::ServerError,
            FetchError::HttpStatus { .. } => Self::HttpError,
            FetchError::Cancelled { .. } => Self::Cancelled,
        }
    }
}
