use promptdash::app::prompt_explorer::groups::group_records;
use promptdash::app::prompt_explorer::{parse_catalog, CatalogView, Projection};
use serde_json::json;
use std::collections::HashSet;

fn record(function_name: &str, project_version: Option<&str>, agent_version: i64) -> serde_json::Value {
    let mut value = json!({
        "function_name": function_name,
        "prompt": "You are a helpful assistant.",
        "created_at": "2025-06-01T12:00:00",
        "agent_version": agent_version,
    });
    if let Some(version) = project_version {
        value["project_version"] = json!(version);
    }
    value
}

#[test]
fn test_stat_consistency_example() {
    // Two agent revisions of the same function and project version collapse
    // into one group, newest revision first.
    let snapshot = parse_catalog(json!({
        "a": record("x_1", Some("1.0.0"), 1),
        "b": record("x_2", Some("1.0.0"), 2),
    }))
    .unwrap();

    let view = CatalogView::build(&snapshot, Projection::ByFunctionVersion, "", None);

    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.groups[0].group_key, "x v1.0.0");
    let member_keys: Vec<&str> = view.groups[0]
        .members
        .iter()
        .map(|m| m.key.as_str())
        .collect();
    assert_eq!(member_keys, vec!["b", "a"]);
    assert_eq!(view.stats.total_groups, 1);
    assert_eq!(view.stats.filtered_count, 2);
    assert_eq!(view.groups[0].aggregates.count, view.groups[0].members.len());
}

#[test]
fn test_partition_invariant_function_projection() {
    let snapshot = parse_catalog(json!({
        "a": record("alpha_1", Some("1.0.0"), 1),
        "b": record("alpha_2", Some("1.1.0"), 2),
        "c": record("beta_1", Some("1.0.0"), 1),
        "d": record("gamma_1", None, 1),
        "e": record("gamma_2", None, 2),
    }))
    .unwrap();

    let groups = group_records(&snapshot.records, Projection::ByFunctionVersion);

    // Union of members equals the input set - no overlaps, no omissions.
    let mut seen = HashSet::new();
    for group in &groups {
        for member in &group.members {
            assert!(seen.insert(member.key.clone()), "duplicate {}", member.key);
        }
    }
    let expected: HashSet<String> = snapshot.records.iter().map(|r| r.key.clone()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_partition_invariant_project_projection_excludes_unassigned() {
    let snapshot = parse_catalog(json!({
        "a": record("alpha_1", Some("1.0.0"), 1),
        "b": record("beta_1", Some("2.0.0"), 1),
        "c": record("orphan_1", None, 1),
    }))
    .unwrap();

    let groups = group_records(&snapshot.records, Projection::ByProjectVersion);

    let grouped: HashSet<String> = groups
        .iter()
        .flat_map(|g| g.members.iter().map(|m| m.key.clone()))
        .collect();
    // Exactly the records with an assigned project version.
    assert_eq!(
        grouped,
        HashSet::from(["a".to_string(), "b".to_string()])
    );
    // And the excluded record is absent from all project-level counts.
    let total: usize = groups.iter().map(|g| g.aggregates.count).sum();
    assert_eq!(total, 2);
}

#[test]
fn test_group_order_is_version_descending() {
    let snapshot = parse_catalog(json!({
        "a": record("f_1", Some("1.2.0"), 1),
        "b": record("g_1", Some("2.0.0"), 1),
        "c": record("h_1", Some("1.10.0"), 1),
        "d": record("i_1", None, 1),
    }))
    .unwrap();

    let groups = group_records(&snapshot.records, Projection::ByFunctionVersion);
    let versions: Vec<&str> = groups.iter().map(|g| g.version.as_str()).collect();
    // 1.10 beats 1.2 numerically; "Unknown" reads as 0.0.0 and sorts last.
    assert_eq!(versions, vec!["2.0.0", "1.10.0", "1.2.0", "Unknown"]);
}

#[test]
fn test_idempotence_across_rebuilds() {
    let payload = json!({
        "a": record("alpha_1", Some("1.0.0"), 3),
        "b": record("alpha_2", Some("1.0.0"), 1),
        "c": record("alpha_3", Some("1.0.0"), 2),
        "d": record("beta_1", Some("0.9.0"), 1),
    });

    let first = CatalogView::build(
        &parse_catalog(payload.clone()).unwrap(),
        Projection::ByFunctionVersion,
        "",
        None,
    );
    let second = CatalogView::build(
        &parse_catalog(payload).unwrap(),
        Projection::ByFunctionVersion,
        "",
        None,
    );

    let shape = |view: &CatalogView| -> Vec<(String, Vec<String>)> {
        view.groups
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

#[test]
fn test_run_projection_groups_by_system_name() {
    let snapshot = parse_catalog(json!({
        "runs": [
            {
                "system_name": "pipeline-a",
                "project_version": "1.1.0",
                "created_at": "2025-06-02T00:00:00",
                "prompts": {
                    "x_1": record("x_1", Some("1.1.0"), 1),
                    "x_2": record("x_2", Some("1.1.0"), 2)
                }
            },
            {
                "system_name": "pipeline-b",
                "project_version": "2.0.0",
                "created_at": "2025-06-03T00:00:00",
                "prompts": {
                    "y_1": record("y_1", Some("2.0.0"), 1)
                }
            }
        ]
    }))
    .unwrap();

    let view = CatalogView::build(&snapshot, Projection::ByRun, "", None);

    let keys: Vec<&str> = view.groups.iter().map(|g| g.group_key.as_str()).collect();
    // Run groups order by their project version, newest first.
    assert_eq!(keys, vec!["pipeline-b", "pipeline-a"]);
    // Members inside a run still order by agent revision descending.
    let members: Vec<&str> = view.groups[1]
        .members
        .iter()
        .map(|m| m.key.as_str())
        .collect();
    assert_eq!(members, vec!["x_2", "x_1"]);
    // The flat record list still carries everything for the flat views.
    assert_eq!(view.stats.total_records, 3);
}

#[test]
fn test_run_projection_filter_drops_empty_runs() {
    let snapshot = parse_catalog(json!({
        "runs": [
            {
                "system_name": "relevant",
                "prompts": { "x_1": record("summarize_1", None, 1) }
            },
            {
                "system_name": "irrelevant",
                "prompts": { "y_1": record("classify_1", None, 1) }
            }
        ]
    }))
    .unwrap();

    let view = CatalogView::build(&snapshot, Projection::ByRun, "summarize", None);

    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.groups[0].group_key, "relevant");
    assert_eq!(view.stats.total_groups, 1);
    assert_eq!(view.stats.filtered_count, 1);
}
