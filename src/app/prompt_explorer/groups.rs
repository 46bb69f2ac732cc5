//! Grouping index: partition records into project groups.
//!
//! Every projection is a strict partition of the records it is given (the
//! project-version projection first drops records with no assigned version).
//! Output order is fully deterministic: groups sort by their version string
//! descending, members sort by agent revision descending, and both sorts are
//! stable so first-encountered order breaks ties. Running the same input
//! twice yields identical keys and identical member order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use super::state::{Projection, PromptRecord, PromptRun};
use super::versioning::{compare_agent_versions, compare_versions};

/// Trailing `_<digits>` on a function name is read as a version suffix and
/// stripped to recover the bare function name. This is a heuristic carried
/// over from the capture convention `{function_name}_{version}`: a function
/// legitimately named with a trailing number loses that number here too.
static VERSION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.+?)_\d+$").expect("valid suffix regex"));

/// Version label used for records with no assigned project version in the
/// function-version projection. Sorts as 0.0.0, i.e. after every real
/// release.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Derived aggregates over one group's members.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupAggregates {
    /// Always equals `members.len()`.
    pub count: usize,
    pub max_agent_version: i64,
    /// Distinct tags across members. Set semantics - insertion order is
    /// irrelevant, so a sorted set keeps serialization deterministic.
    pub tags: BTreeSet<String>,
    /// Non-empty member descriptions in first-seen order, deduplicated.
    pub descriptions: Vec<String>,
}

/// One group of prompt records sharing a derived project identity. Derived
/// data: recomputed on every load or filter change, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub group_key: String,
    /// Dotted version string this group sorts by.
    pub version: String,
    pub members: Vec<PromptRecord>,
    pub aggregates: GroupAggregates,
}

/// Strip a trailing `_<digits>` version suffix, if present.
pub fn bare_function_name(function_name: &str) -> &str {
    match VERSION_SUFFIX.captures(function_name) {
        Some(caps) => caps.name("name").map(|m| m.as_str()).unwrap_or(function_name),
        None => function_name,
    }
}

/// Partition records under the function-version or project-version
/// projection. `Projection::ByRun` records arrive pre-nested in runs and go
/// through [`group_run`] instead; passing it here yields no groups.
pub fn group_records<'a, I>(records: I, projection: Projection) -> Vec<ProjectGroup>
where
    I: IntoIterator<Item = &'a PromptRecord>,
{
    // Insertion-ordered buckets: a HashMap alone would randomize group
    // order between runs and break idempotence.
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, (String, Vec<PromptRecord>)> = HashMap::new();

    for record in records {
        let (group_key, version) = match projection {
            Projection::ByFunctionVersion => {
                let version = record
                    .project_version
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
                let key = format!("{} v{}", bare_function_name(&record.function_name), version);
                (key, version)
            }
            Projection::ByProjectVersion => match &record.project_version {
                Some(version) => (version.clone(), version.clone()),
                // Unassigned records are excluded from this projection
                // entirely - no group, no counts.
                None => continue,
            },
            Projection::ByRun => continue,
        };

        match buckets.entry(group_key) {
            Entry::Occupied(mut entry) => entry.get_mut().1.push(record.clone()),
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert((version, vec![record.clone()]));
            }
        }
    }

    let mut groups: Vec<ProjectGroup> = order
        .into_iter()
        .map(|key| {
            let (version, members) = buckets.remove(&key).expect("bucket for ordered key");
            finish_group(key, version, members)
        })
        .collect();
    sort_groups(&mut groups);
    groups
}

/// Build the group for one capture run. `members` is the run's prompt
/// collection, already narrowed by whatever filter is active.
pub fn group_run(run: &PromptRun, members: Vec<&PromptRecord>) -> ProjectGroup {
    finish_group(
        run.system_name.clone(),
        run.project_version
            .clone()
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        members.into_iter().cloned().collect(),
    )
}

/// Order groups for display: version descending, stable.
pub fn sort_groups(groups: &mut [ProjectGroup]) {
    groups.sort_by(|a, b| compare_versions(&a.version, &b.version).reverse());
}

fn finish_group(group_key: String, version: String, mut members: Vec<PromptRecord>) -> ProjectGroup {
    members.sort_by(|a, b| compare_agent_versions(a.agent_version, b.agent_version).reverse());

    let mut aggregates = GroupAggregates {
        count: members.len(),
        ..Default::default()
    };
    for member in &members {
        aggregates.max_agent_version = aggregates.max_agent_version.max(member.agent_version);
        for tag in &member.tags {
            aggregates.tags.insert(tag.clone());
        }
        if !member.description.is_empty() && !aggregates.descriptions.contains(&member.description)
        {
            aggregates.descriptions.push(member.description.clone());
        }
    }

    ProjectGroup {
        group_key,
        version,
        members,
        aggregates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, function_name: &str, project_version: Option<&str>, agent: i64) -> PromptRecord {
        PromptRecord {
            key: key.to_string(),
            function_name: function_name.to_string(),
            prompt: "p".to_string(),
            created_at: "2025-06-01T12:00:00".to_string(),
            project_version: project_version.map(str::to_string),
            agent_version: agent,
            description: String::new(),
            tags: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_bare_function_name_strips_one_suffix() {
        assert_eq!(bare_function_name("extract_1"), "extract");
        assert_eq!(bare_function_name("extract_12"), "extract");
        assert_eq!(bare_function_name("a_1_2"), "a_1");
        assert_eq!(bare_function_name("extract"), "extract");
        assert_eq!(bare_function_name("extract_"), "extract_");
        assert_eq!(bare_function_name("_1"), "_1");
    }

    #[test]
    fn test_function_version_grouping() {
        let records = vec![
            record("x_1", "x_1", Some("1.0.0"), 1),
            record("x_2", "x_2", Some("1.0.0"), 2),
        ];
        let groups = group_records(&records, Projection::ByFunctionVersion);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_key, "x v1.0.0");
        assert_eq!(groups[0].aggregates.count, 2);
        // agent revision descending
        assert_eq!(groups[0].members[0].key, "x_2");
        assert_eq!(groups[0].members[1].key, "x_1");
        assert_eq!(groups[0].aggregates.max_agent_version, 2);
    }

    #[test]
    fn test_unassigned_version_grouped_as_unknown() {
        let records = vec![record("y_1", "y_1", None, 0)];
        let groups = group_records(&records, Projection::ByFunctionVersion);
        assert_eq!(groups[0].group_key, "y vUnknown");
        assert_eq!(groups[0].version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_project_version_projection_drops_unassigned() {
        let records = vec![
            record("a", "a_1", Some("2.0.0"), 0),
            record("b", "b_1", None, 0),
            record("c", "c_1", Some("1.0.0"), 0),
        ];
        let groups = group_records(&records, Projection::ByProjectVersion);

        let keys: Vec<&str> = groups.iter().map(|g| g.group_key.as_str()).collect();
        assert_eq!(keys, vec!["2.0.0", "1.0.0"]);
        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_groups_sorted_version_descending_ties_stable() {
        let records = vec![
            record("a", "alpha_1", Some("1.0.0"), 0),
            record("b", "beta_1", Some("1.0.0"), 0),
            record("c", "gamma_1", Some("2.0.0"), 0),
        ];
        let groups = group_records(&records, Projection::ByFunctionVersion);

        let keys: Vec<&str> = groups.iter().map(|g| g.group_key.as_str()).collect();
        // 2.0.0 first; the two 1.0.0 groups keep first-encountered order.
        assert_eq!(keys, vec!["gamma v2.0.0", "alpha v1.0.0", "beta v1.0.0"]);
    }

    #[test]
    fn test_aggregates_tags_and_descriptions() {
        let mut a = record("a", "f_1", Some("1.0.0"), 1);
        a.tags = vec!["nlp".into(), "prod".into()];
        a.description = "first".into();
        let mut b = record("b", "f_2", Some("1.0.0"), 2);
        b.tags = vec!["prod".into()];
        b.description = "first".into();

        let groups = group_records([&a, &b], Projection::ByFunctionVersion);
        let aggregates = &groups[0].aggregates;

        assert_eq!(aggregates.count, 2);
        assert_eq!(
            aggregates.tags.iter().collect::<Vec<_>>(),
            vec!["nlp", "prod"]
        );
        // deduplicated, first-seen order
        assert_eq!(aggregates.descriptions, vec!["first"]);
    }

    #[test]
    fn test_group_serialization_shape() {
        let groups = group_records(
            &[record("x_1", "x_1", Some("1.0.0"), 1)],
            Projection::ByFunctionVersion,
        );
        let value = serde_json::to_value(&groups[0]).unwrap();

        assert_eq!(value["groupKey"], json!("x v1.0.0"));
        assert_eq!(value["aggregates"]["maxAgentVersion"], json!(1));
    }

    #[test]
    fn test_idempotent_grouping() {
        let records: Vec<PromptRecord> = (0..20)
            .map(|i| {
                record(
                    &format!("f_{}", i),
                    &format!("f_{}", i % 5),
                    Some(if i % 2 == 0 { "1.0.0" } else { "1.1.0" }),
                    i as i64 % 3,
                )
            })
            .collect();

        let first = group_records(&records, Projection::ByFunctionVersion);
        let second = group_records(&records, Projection::ByFunctionVersion);

        let shape = |groups: &[ProjectGroup]| -> Vec<(String, Vec<String>)> {
            groups
                .iter()
                .map(|g| {
                    (
                        g.group_key.clone(),
                        g.members.iter().map(|m| m.key.clone()).collect(),
                    )
                })
                .collect()
        };
        assert_eq!(shape(&first), shape(&second));
    }
}
