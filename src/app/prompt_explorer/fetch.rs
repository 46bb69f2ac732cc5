//! Fetch boundary: HTTP catalog client and fetch-generation coordination.
//!
//! The engine itself never does I/O; this module is the seam where one
//! outstanding network call turns into a validated snapshot. Two rules
//! govern that seam:
//!
//! - **last-write-wins**: fetches are numbered when they start, and a
//!   completed fetch applies only if no later fetch has already applied.
//!   Out-of-order completions cannot roll the catalog backwards.
//! - **last-known-good**: a failed fetch leaves the current snapshot
//!   untouched. A transient outage never blanks a populated view.
//!
//! There is no retry here - re-fetching is the caller's (typically the
//! user's) decision.

use std::time::Duration;
use url::Url;

use super::errors::{body_snippet, CatalogError};
use super::state::CatalogSnapshot;
use super::store::parse_catalog;

/// Thin HTTP client for the catalog endpoint.
pub struct CatalogClient {
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("promptdash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(CatalogClient { client })
    }

    /// Fetch, validate, and normalize one catalog payload.
    ///
    /// Error mapping: transport problems and non-2xx statuses surface as
    /// `NetworkFailure`, a successful response with a non-JSON body as
    /// `NonJsonResponse`, and schema violations as `InvalidPayload`.
    pub async fn fetch_catalog(&self, url: &str) -> Result<CatalogSnapshot, CatalogError> {
        let url = Url::parse(url)
            .map_err(|e| CatalogError::InvalidPayload(format!("invalid catalog URL: {}", e)))?;

        tracing::debug!("Fetching prompt catalog from {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let status = response.status();
        let body = response.text().await?;

        let payload: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| CatalogError::NonJsonResponse {
                status: status.as_u16(),
                snippet: body_snippet(&body),
            })?;

        let snapshot = parse_catalog(payload)?;
        tracing::info!(
            "Catalog fetch complete: {} records, {} runs",
            snapshot.records.len(),
            snapshot.runs.len()
        );
        Ok(snapshot)
    }
}

/// Token identifying one fetch attempt. Issued by [`FetchCoordinator::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Orders fetch completions so only the newest result becomes visible.
///
/// A new fetch may start while a previous one is still in flight; whichever
/// applies first wins its generation, and anything older that completes
/// afterwards is discarded.
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    issued: u64,
    applied: u64,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number a fetch attempt at the moment it starts.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Claim the right to apply this ticket's result. Returns false when a
    /// newer fetch has already applied, in which case the result must be
    /// dropped.
    pub fn try_apply(&mut self, ticket: FetchTicket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_completions_apply() {
        let mut coordinator = FetchCoordinator::new();
        let first = coordinator.begin();
        let second = coordinator.begin();
        assert!(coordinator.try_apply(first));
        assert!(coordinator.try_apply(second));
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut coordinator = FetchCoordinator::new();
        let first = coordinator.begin();
        let second = coordinator.begin();
        // #2 resolves before #1
        assert!(coordinator.try_apply(second));
        assert!(!coordinator.try_apply(first));
    }

    #[test]
    fn test_same_ticket_applies_once() {
        let mut coordinator = FetchCoordinator::new();
        let ticket = coordinator.begin();
        assert!(coordinator.try_apply(ticket));
        assert!(!coordinator.try_apply(ticket));
    }
}
