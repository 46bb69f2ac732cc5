//! Catalog error taxonomy.
//!
//! Three terminal outcomes for a fetch attempt: the transport failed, the
//! body was not JSON despite a success status, or the JSON violated the
//! record schema. None of them produce partial results - the caller keeps
//! its last-known-good snapshot and may re-fetch. Retry is the caller's
//! decision; nothing here loops.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (connect, DNS, timeout, non-2xx).
    #[error("network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    /// The endpoint answered 2xx but the body did not parse as JSON.
    #[error("non-JSON response (status {status}): {snippet}")]
    NonJsonResponse { status: u16, snippet: String },

    /// The body parsed as JSON but is not a valid prompt catalog.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl CatalogError {
    /// Transient errors may succeed on a later user-triggered re-fetch;
    /// an invalid payload will not fix itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::NetworkFailure(_) | CatalogError::NonJsonResponse { .. }
        )
    }

    /// Short label for compact display.
    pub fn short_label(&self) -> &'static str {
        match self {
            CatalogError::NetworkFailure(_) => "network",
            CatalogError::NonJsonResponse { .. } => "non-json",
            CatalogError::InvalidPayload(_) => "invalid-payload",
        }
    }
}

/// First line of a response body, bounded, for error messages.
pub(crate) fn body_snippet(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    let mut snippet: String = line.chars().take(80).collect();
    if snippet.len() < line.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_payload_is_terminal() {
        let err = CatalogError::InvalidPayload("top-level value must be an object".into());
        assert!(!err.is_transient());
        assert_eq!(err.short_label(), "invalid-payload");
    }

    #[test]
    fn test_non_json_is_transient() {
        let err = CatalogError::NonJsonResponse {
            status: 200,
            snippet: "<html>".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.short_label(), "non-json");
    }

    #[test]
    fn test_body_snippet_bounds() {
        assert_eq!(body_snippet("<html>\n<body>"), "<html>");
        let long = "x".repeat(200);
        let snippet = body_snippet(&long);
        assert!(snippet.len() <= 83);
        assert!(snippet.ends_with("..."));
    }
}
