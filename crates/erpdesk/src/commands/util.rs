//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::{Map, Value};

use erpdesk_core::{Backend, QueryState, Record, RecordId, Resource, SearchMode, catalog};

use crate::cli::{FieldArgs, QueryArgs};
use crate::error::CliError;

/// Look up a resource by its catalog key.
pub fn resolve_resource(key: &str) -> Result<&'static Resource, CliError> {
    catalog::find(key).ok_or_else(|| CliError::unknown_resource(key))
}

/// Split `name=value`.
fn split_pair<'a>(flag: &str, raw: &'a str) -> Result<(&'a str, &'a str), CliError> {
    raw.split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .map(|(k, v)| (k.trim(), v))
        .ok_or_else(|| CliError::Validation {
            field: flag.into(),
            reason: format!("expected NAME=VALUE, got '{raw}'"),
        })
}

/// Build the query a list or export starts from.
///
/// Rejects search on lists without a search box and filters the
/// resource does not declare.
pub fn build_query(
    resource: &'static Resource,
    args: &QueryArgs,
    page: u32,
) -> Result<QueryState, CliError> {
    let mut state = resource.initial_query();

    if let Some(ref text) = args.search {
        if resource.search == SearchMode::Disabled {
            return Err(CliError::Validation {
                field: "search".into(),
                reason: format!("{} has no search", resource.key),
            });
        }
        state.search.clone_from(text);
    }

    for raw in &args.filter {
        let (name, value) = split_pair("filter", raw)?;
        if resource.filter(name).is_none() {
            let known: Vec<_> = resource.filter_names().collect();
            return Err(CliError::Validation {
                field: "filter".into(),
                reason: format!(
                    "unknown filter '{name}' for {}; known: {}",
                    resource.key,
                    if known.is_empty() {
                        "(none)".into()
                    } else {
                        known.join(", ")
                    }
                ),
            });
        }
        state
            .filters
            .insert(name.to_owned(), Some(value.to_owned()).filter(|v| !v.is_empty()));
    }

    state.page = page.max(1);
    Ok(state)
}

/// Field values from `--from-file` then `--set`, later entries winning.
pub fn collect_fields(args: &FieldArgs) -> Result<Vec<(String, Value)>, CliError> {
    let mut fields = Vec::new();
    if let Some(ref path) = args.from_file {
        fields.extend(read_json_object(path)?);
    }
    for raw in &args.set {
        let (key, value) = split_pair("set", raw)?;
        fields.push((key.to_owned(), Value::String(value.to_owned())));
    }
    Ok(fields)
}

/// Read a JSON object file for `--from-file`.
pub fn read_json_object(path: &Path) -> Result<Map<String, Value>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object".into(),
        }),
    }
}

/// `{endpoint}{id}/`
pub fn record_path(resource: &Resource, id: &str) -> String {
    format!("{}{}/", resource.endpoint, RecordId::from(id).path_segment())
}

/// Fetch a single record of `resource`.
pub async fn fetch_record<B: Backend>(
    backend: &B,
    resource: &Resource,
    id: &str,
) -> Result<Record, CliError> {
    let body = backend.get(&record_path(resource, id), &[]).await?;
    Record::try_from(body).map_err(|_| CliError::Server {
        message: erpdesk_core::SERVER_ERROR_MESSAGE.into(),
        detail: format!("{} did not return an object", record_path(resource, id)),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
