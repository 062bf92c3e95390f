//! API document loading.
//!
//! The API document is the only source of operation metadata: routes,
//! authentication strategies, privileges, schemas and templates. It is read
//! once at startup and turned into an [`OperationTable`].

use crate::errors::GatewayError;
use rackgate_config::source::file::parse_document;
use rackgate_interceptors::prelude::{ApiDocument, OperationTable};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Overrides `api_spec.path` when set; an explicit CLI path still wins.
pub const API_SPEC_ENV: &str = "RACKGATE_API_SPEC";

fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Reads one API document; `basePath` falls back to `default_base` when absent.
pub async fn load_document(path: &Path, default_base: &str) -> Result<ApiDocument, GatewayError> {
    let resolved = resolve_path(path);
    let content = fs::read_to_string(&resolved)
        .await
        .map_err(|e| GatewayError::io(&resolved, &e))?;
    let value = parse_document(&resolved, &content)?;
    let mut doc = ApiDocument::from_value(value)?;
    if doc.base_path.is_empty() {
        doc.base_path = default_base.to_string();
    }
    tracing::info!(
        path = %resolved.display(),
        base_path = %doc.base_path,
        paths = doc.paths.len(),
        "loaded API document"
    );
    Ok(doc)
}

/// Picks the API document: an explicit path wins, then `RACKGATE_API_SPEC`,
/// then the configured `api_spec.path`. No other location is tried.
pub fn resolve_spec_path(explicit: Option<&Path>, configured: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(API_SPEC_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => configured.to_path_buf(),
    }
}

/// Loads exactly `path`; a missing file is an error.
pub async fn load_operation_table(
    path: &Path,
    default_base: &str,
) -> Result<OperationTable, GatewayError> {
    let doc = load_document(path, default_base).await?;
    Ok(OperationTable::from_document(&doc)?)
}

#[derive(Debug, Serialize)]
pub struct OperationSummary {
    pub operation_id: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_params: Vec<String>,
}

/// What `check-spec` prints.
#[derive(Debug, Serialize)]
pub struct PolicySummary {
    pub base_path: String,
    pub operations: usize,
    pub authenticated: usize,
    pub restricted: usize,
    pub acl_entries: usize,
    pub entries: Vec<OperationSummary>,
}

pub fn summarize(table: &OperationTable) -> PolicySummary {
    let entries: Vec<OperationSummary> = table
        .iter()
        .map(|d| OperationSummary {
            operation_id: d.operation_id.clone(),
            method: d.method.clone(),
            path: d.path.clone(),
            authentication: d.authentication.clone(),
            roles: d.authorized_roles.clone(),
            scope_params: d
                .scoped_params()
                .map(|(p, handler)| format!("{}:{handler}", p.name))
                .collect(),
        })
        .collect();
    PolicySummary {
        base_path: table.base_path().to_string(),
        operations: entries.len(),
        authenticated: entries.iter().filter(|e| e.authentication.is_some()).count(),
        restricted: entries.iter().filter(|e| !e.roles.is_empty()).count(),
        acl_entries: entries.iter().map(|e| e.roles.len()).sum(),
        entries,
    }
}
