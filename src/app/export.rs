//! Aggregated catalog export.
//!
//! Writes the normalized record list in a small archival envelope so a
//! catalog can be diffed or re-imported elsewhere. Derived views are not
//! exported - they are recomputed from records on demand.

use anyhow::Context;
use serde_json::json;
use std::path::Path;

use super::prompt_explorer::CatalogSnapshot;

/// Build the export envelope: timestamp, count, records.
pub fn export_envelope(snapshot: &CatalogSnapshot) -> serde_json::Value {
    json!({
        "exported_at": chrono::Utc::now().to_rfc3339(),
        "total_prompts": snapshot.records.len(),
        "prompts": snapshot.records,
    })
}

/// Write the envelope as pretty-printed JSON.
pub fn write_export(snapshot: &CatalogSnapshot, path: &Path) -> anyhow::Result<()> {
    let envelope = export_envelope(snapshot);
    let body = serde_json::to_string_pretty(&envelope)?;
    std::fs::write(path, body)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    tracing::info!(
        "Exported {} prompts to {}",
        snapshot.records.len(),
        path.display()
    );
    Ok(())
}
