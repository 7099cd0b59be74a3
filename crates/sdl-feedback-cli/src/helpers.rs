// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode};
use sdl_feedback_model::{Entry, PageKey};
use sdl_feedback_store::StoreError;
use serde_json::{json, Value};

pub(crate) fn emit_ok(output_mode: OutputMode, payload: Value) -> Result<(), CliError> {
    let text = if output_mode.json {
        serde_json::to_string(&payload)
    } else {
        serde_json::to_string_pretty(&payload)
    }
    .map_err(|e| CliError::internal(e.to_string()))?;
    println!("{text}");
    Ok(())
}

/// `--page` wins; otherwise the page derives from `--path` (or `index`).
pub(crate) fn resolve_page(page: Option<&str>, path: Option<&str>) -> Result<PageKey, CliError> {
    match page {
        Some(raw) => PageKey::parse(raw).map_err(CliError::validation),
        None => Ok(PageKey::from_document_path(path.unwrap_or_default())),
    }
}

pub(crate) fn entries_payload(entries: &[Entry]) -> Result<Value, CliError> {
    serde_json::to_value(entries).map_err(|e| CliError::internal(e.to_string()))
}

pub(crate) fn warnings_payload(warnings: &[StoreError]) -> Value {
    Value::Array(
        warnings
            .iter()
            .map(|w| json!({"code": w.code.as_str(), "message": w.message}))
            .collect(),
    )
}
