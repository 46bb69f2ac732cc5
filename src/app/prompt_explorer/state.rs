use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One versioned prompt entry as delivered by the catalog endpoint.
///
/// Required fields are `function_name`, `prompt`, and `created_at`; a record
/// missing any of them makes the whole payload invalid. Every optional field
/// falls back to its documented default instead, so one sloppy record never
/// sinks a batch. Fields the engine does not interpret (`system`, `inputs`,
/// `output`, `execution_time`, ...) ride along opaquely in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Catalog key this record was stored under, conventionally
    /// `{function_name}_{version}`. Assigned by the record store, not the
    /// record body.
    #[serde(skip_deserializing)]
    pub key: String,
    pub function_name: String,
    pub prompt: String,
    pub created_at: String,
    /// Dotted project version (`"1.2.3"`). Absent means unassigned; such
    /// records are excluded from the project-version projection but stay
    /// visible in the flat views.
    #[serde(default, deserialize_with = "lenient_version")]
    pub project_version: Option<String>,
    /// Numeric revision of this individual prompt, independent of the
    /// project version. Missing or non-numeric values read as 0.
    #[serde(default, deserialize_with = "lenient_agent_version")]
    pub agent_version: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    /// Opaque passthrough payload, untouched by the engine.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One capture run: a named batch of prompt records delivered pre-nested
/// under `{ "runs": [...] }`.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRun {
    pub system_name: String,
    pub project_version: Option<String>,
    pub created_at: String,
    pub total_prompts: u64,
    pub members: Vec<PromptRecord>,
}

/// The validated, normalized catalog. Replaced wholesale on every successful
/// fetch - never merged incrementally, so readers cannot observe a
/// half-updated store.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Flat record list. For run-shaped payloads this is every run's
    /// members flattened, in payload order.
    pub records: Vec<PromptRecord>,
    /// Runs, when the payload was run-shaped. Empty for flat payloads.
    pub runs: Vec<PromptRun>,
}

impl CatalogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.runs.is_empty()
    }
}

/// Grouping projection applied to the record set. All three are equally
/// valid readings of the same catalog; the surrounding view picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Group by bare function name plus project version, e.g. `"parse v1.2.0"`.
    ByFunctionVersion,
    /// Group by project version alone; unassigned records are excluded.
    ByProjectVersion,
    /// Group by capture run (`system_name`).
    ByRun,
}

impl Projection {
    pub fn display_name(&self) -> &'static str {
        match self {
            Projection::ByFunctionVersion => "Function",
            Projection::ByProjectVersion => "Project Version",
            Projection::ByRun => "Run",
        }
    }

    /// Parse the query-parameter / CLI spelling of a projection.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "function" | "function-version" => Some(Projection::ByFunctionVersion),
            "project" | "project-version" => Some(Projection::ByProjectVersion),
            "run" | "system" => Some(Projection::ByRun),
            _ => None,
        }
    }

    pub fn all_modes() -> Vec<Projection> {
        vec![
            Projection::ByFunctionVersion,
            Projection::ByProjectVersion,
            Projection::ByRun,
        ]
    }
}

/// Engine-side state: the current snapshot plus the caller's in-progress
/// filter text. UI selection state (which record/group is open) belongs to
/// the presentation layer and is deliberately not here.
#[derive(Debug, Default)]
pub struct ExplorerState {
    pub snapshot: CatalogSnapshot,
    pub projection: Projection,
    pub search_filter: String,
    pub scoped_filter: Option<String>,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::ByFunctionVersion
    }
}

// Lenient field readers: optional fields degrade to their defaults on type
// mismatches rather than rejecting the record (the payload contract only
// hard-fails on missing required fields).

fn lenient_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_agent_version<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_agent_version(&value))
}

/// Agent versions arrive as integers, floats, or digit strings depending on
/// which client captured the run. Anything else counts as revision 0.
pub(crate) fn coerce_agent_version(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
