//! Record store: payload validation and normalization.
//!
//! The catalog endpoint delivers one of two shapes:
//!
//! - a flat mapping `{ "<key>": <record>, ... }`
//! - a run envelope `{ "runs": [ { "system_name": ..., "prompts": {...} } ] }`
//!
//! Both normalize into a [`CatalogSnapshot`]. Validation is strict about
//! structure (top level must be an object, records must be objects with
//! `function_name`, `prompt`, `created_at`) and lenient about everything
//! else: optional fields fall back to defaults record-by-record so a single
//! malformed version string cannot abort the batch.

use serde_json::Value;

use super::errors::CatalogError;
use super::state::{CatalogSnapshot, PromptRecord, PromptRun};

/// Validate a raw JSON payload and normalize it into a snapshot.
///
/// Key order of the incoming mapping is preserved in `records`, but callers
/// must not read meaning into it - display order comes from the grouping
/// index, never from the store.
pub fn parse_catalog(payload: Value) -> Result<CatalogSnapshot, CatalogError> {
    let top = payload.as_object().ok_or_else(|| {
        CatalogError::InvalidPayload("top-level value must be a JSON object".to_string())
    })?;

    if let Some(runs_value) = top.get("runs") {
        parse_run_catalog(runs_value)
    } else {
        let records = parse_record_map(top)?;
        tracing::debug!("Parsed flat catalog payload: {} records", records.len());
        Ok(CatalogSnapshot {
            records,
            runs: Vec::new(),
        })
    }
}

fn parse_record_map(
    map: &serde_json::Map<String, Value>,
) -> Result<Vec<PromptRecord>, CatalogError> {
    let mut records = Vec::with_capacity(map.len());
    for (key, value) in map {
        if !value.is_object() {
            return Err(CatalogError::InvalidPayload(format!(
                "record {:?} is not an object",
                key
            )));
        }
        let mut record: PromptRecord = serde_json::from_value(value.clone()).map_err(|e| {
            CatalogError::InvalidPayload(format!("record {:?}: {}", key, e))
        })?;
        record.key = key.clone();
        records.push(record);
    }
    Ok(records)
}

fn parse_run_catalog(runs_value: &Value) -> Result<CatalogSnapshot, CatalogError> {
    let runs_array = runs_value
        .as_array()
        .ok_or_else(|| CatalogError::InvalidPayload("\"runs\" must be an array".to_string()))?;

    let mut runs = Vec::with_capacity(runs_array.len());
    let mut records = Vec::new();

    for (index, run_value) in runs_array.iter().enumerate() {
        let run_object = run_value.as_object().ok_or_else(|| {
            CatalogError::InvalidPayload(format!("run #{} is not an object", index))
        })?;

        let system_name = run_object
            .get("system_name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CatalogError::InvalidPayload(format!("run #{} is missing system_name", index))
            })?
            .to_string();

        let members = match run_object.get("prompts") {
            Some(Value::Object(prompt_map)) => parse_record_map(prompt_map)?,
            Some(_) => {
                return Err(CatalogError::InvalidPayload(format!(
                    "run {:?}: \"prompts\" must be an object",
                    system_name
                )))
            }
            None => Vec::new(),
        };
        records.extend(members.iter().cloned());

        runs.push(PromptRun {
            project_version: run_object
                .get("project_version")
                .and_then(Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string),
            created_at: run_object
                .get("created_at")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            total_prompts: run_object
                .get("total_prompts")
                .and_then(Value::as_u64)
                .unwrap_or(members.len() as u64),
            system_name,
            members,
        });
    }

    tracing::debug!(
        "Parsed run catalog payload: {} runs, {} records",
        runs.len(),
        records.len()
    );
    Ok(CatalogSnapshot { records, runs })
}
