use std::sync::{Arc, RwLock};

pub mod errors;
pub mod fetch;
pub mod groups;
pub mod query;
pub mod state;
pub mod store;
pub mod versioning;

pub use errors::CatalogError;
pub use fetch::{CatalogClient, FetchCoordinator, FetchTicket};
pub use groups::{bare_function_name, GroupAggregates, ProjectGroup, UNKNOWN_VERSION};
pub use query::{stats_report, CatalogStats, CatalogView, StatsReport};
pub use state::{CatalogSnapshot, ExplorerState, Projection, PromptRecord, PromptRun};
pub use store::parse_catalog;

/// Main prompt catalog interface: one shared snapshot plus the fetch
/// coordination that replaces it.
///
/// All mutation happens through [`complete_fetch`](Self::complete_fetch),
/// which swaps the snapshot wholesale under the write lock - readers see
/// either the old catalog or the new one, never a mix.
pub struct PromptExplorer {
    state: Arc<RwLock<ExplorerState>>,
    coordinator: RwLock<FetchCoordinator>,
}

impl Default for PromptExplorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptExplorer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ExplorerState::default())),
            coordinator: RwLock::new(FetchCoordinator::new()),
        }
    }

    /// Number a fetch attempt. Call before the request goes out.
    pub fn begin_fetch(&self) -> FetchTicket {
        self.coordinator.write().unwrap().begin()
    }

    /// Land a fetch result.
    ///
    /// - `Ok` + newest ticket: snapshot replaced, returns `Ok(true)`.
    /// - `Ok` + stale ticket: result discarded, returns `Ok(false)`.
    /// - `Err`: error passed through; the snapshot keeps its
    ///   last-known-good value either way.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: Result<CatalogSnapshot, CatalogError>,
    ) -> Result<bool, CatalogError> {
        match result {
            Ok(snapshot) => {
                if !self.coordinator.write().unwrap().try_apply(ticket) {
                    log_warn!("Discarding stale catalog fetch result ({:?})", ticket);
                    return Ok(false);
                }
                let mut state = self.state.write().unwrap();
                state.snapshot = snapshot;
                log_info!(
                    "Catalog snapshot replaced: {} records",
                    state.snapshot.records.len()
                );
                Ok(true)
            }
            Err(e) => {
                log_error!(
                    "Catalog fetch failed ({}), keeping previous snapshot: {}",
                    e.short_label(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Fetch from `url` and apply the result, honoring stale-fetch discard.
    pub async fn refresh(
        &self,
        client: &CatalogClient,
        url: &str,
    ) -> Result<bool, CatalogError> {
        let ticket = self.begin_fetch();
        let result = client.fetch_catalog(url).await;
        self.complete_fetch(ticket, result)
    }

    pub fn set_projection(&self, projection: Projection) {
        self.state.write().unwrap().projection = projection;
    }

    pub fn set_search_filter(&self, search: impl Into<String>) {
        self.state.write().unwrap().search_filter = search.into();
    }

    pub fn set_scoped_filter(&self, scoped: Option<String>) {
        self.state.write().unwrap().scoped_filter = scoped;
    }

    /// Build the view for the currently-stored projection and filters.
    pub fn view(&self) -> CatalogView {
        let state = self.state.read().unwrap();
        CatalogView::build(
            &state.snapshot,
            state.projection,
            &state.search_filter,
            state.scoped_filter.as_deref(),
        )
    }

    /// Build a view with explicit parameters, ignoring stored filters.
    pub fn view_with(
        &self,
        projection: Projection,
        search: &str,
        scoped: Option<&str>,
    ) -> CatalogView {
        let state = self.state.read().unwrap();
        CatalogView::build(&state.snapshot, projection, search, scoped)
    }

    /// Per-function rollup of the current snapshot.
    pub fn stats_report(&self) -> StatsReport {
        stats_report(&self.state.read().unwrap().snapshot)
    }

    /// Clone of the current snapshot, for export and tests.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.read().unwrap().snapshot.clone()
    }
}
