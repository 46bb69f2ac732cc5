//! Query filter and view assembly.
//!
//! Filtering is a pure, stable predicate pass: free-text search over
//! {prompt body, function name, description} AND an optional scoped term
//! that must also appear in the function name. The two terms never OR.
//! Grouping runs over the filtered subset, so the stats shown next to the
//! groups always describe the same data the groups do - all three counts
//! come from one snapshot in one pass.

use serde::Serialize;
use std::collections::BTreeMap;

use super::groups::{bare_function_name, group_records, group_run, sort_groups, ProjectGroup};
use super::state::{CatalogSnapshot, Projection, PromptRecord};
use super::versioning::compare_versions;

/// The stats triple shown alongside a catalog view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Records in the snapshot, ignoring any active filter.
    pub total_records: usize,
    /// Distinct groups after filtering.
    pub total_groups: usize,
    /// Records matching the active filter.
    pub filtered_count: usize,
}

/// Ordered groups plus stats: the complete output boundary for one
/// projection + filter combination.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub projection: Projection,
    pub groups: Vec<ProjectGroup>,
    pub stats: CatalogStats,
}

/// True when a record matches the free-text search and the scoped term.
/// Both comparisons are case-insensitive substring checks; an empty search
/// matches everything.
pub fn record_matches(record: &PromptRecord, search: &str, scoped: Option<&str>) -> bool {
    let search = search.to_lowercase();
    let search_hit = search.is_empty()
        || record.prompt.to_lowercase().contains(&search)
        || record.function_name.to_lowercase().contains(&search)
        || record.description.to_lowercase().contains(&search);

    let scoped_hit = match scoped {
        Some(term) if !term.is_empty() => record
            .function_name
            .to_lowercase()
            .contains(&term.to_lowercase()),
        _ => true,
    };

    search_hit && scoped_hit
}

/// Stable filter: output preserves input order.
pub fn filter_records<'a>(
    records: &'a [PromptRecord],
    search: &str,
    scoped: Option<&str>,
) -> Vec<&'a PromptRecord> {
    records
        .iter()
        .filter(|record| record_matches(record, search, scoped))
        .collect()
}

impl CatalogView {
    /// Derive the full view for one projection and filter from a snapshot.
    pub fn build(
        snapshot: &CatalogSnapshot,
        projection: Projection,
        search: &str,
        scoped: Option<&str>,
    ) -> CatalogView {
        let filtered = filter_records(&snapshot.records, search, scoped);
        let filtering = !search.is_empty() || scoped.is_some_and(|s| !s.is_empty());

        let groups = match projection {
            Projection::ByRun => {
                let mut groups = Vec::with_capacity(snapshot.runs.len());
                for run in &snapshot.runs {
                    let members = filter_records(&run.members, search, scoped);
                    // A run every member of which was filtered away is not a
                    // group; with no filter active even an empty run shows.
                    if filtering && members.is_empty() {
                        continue;
                    }
                    groups.push(group_run(run, members));
                }
                sort_groups(&mut groups);
                groups
            }
            _ => group_records(filtered.iter().copied(), projection),
        };

        let stats = CatalogStats {
            total_records: snapshot.records.len(),
            total_groups: groups.len(),
            filtered_count: filtered.len(),
        };

        CatalogView {
            projection,
            groups,
            stats,
        }
    }
}

/// Per-function rollup for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSummary {
    pub count: usize,
    pub latest_version: String,
    pub tags: Vec<String>,
}

/// Catalog-wide stats report, shaped for the `/api/prompts/stats` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_prompts: usize,
    pub total_functions: usize,
    pub functions: BTreeMap<String, FunctionSummary>,
}

/// Roll the snapshot up per bare function name.
pub fn stats_report(snapshot: &CatalogSnapshot) -> StatsReport {
    let mut functions: BTreeMap<String, FunctionSummary> = BTreeMap::new();

    for record in &snapshot.records {
        let name = bare_function_name(&record.function_name).to_string();
        let version = record.project_version.as_deref().unwrap_or("");
        let entry = functions.entry(name).or_insert_with(|| FunctionSummary {
            count: 0,
            latest_version: String::new(),
            tags: Vec::new(),
        });
        entry.count += 1;
        if compare_versions(version, &entry.latest_version) == std::cmp::Ordering::Greater {
            entry.latest_version = version.to_string();
        }
        for tag in &record.tags {
            if !entry.tags.contains(tag) {
                entry.tags.push(tag.clone());
            }
        }
    }

    StatsReport {
        total_prompts: snapshot.records.len(),
        total_functions: functions.len(),
        functions,
    }
}
