use crate::errors::InterceptError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource walk used to derive a template scope from a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeHandler {
    /// The parameter names a node; its own sku becomes the scope.
    DirectResource,
    /// The parameter names a chassis; the sku shared by every enclosed node becomes the scope.
    ChassisAggregate,
}

impl ScopeHandler {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "direct-resource" | "sku" => Some(ScopeHandler::DirectResource),
            "chassis-aggregate" | "chassis" => Some(ScopeHandler::ChassisAggregate),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeHandler::DirectResource => "direct-resource",
            ScopeHandler::ChassisAggregate => "chassis-aggregate",
        }
    }
}

impl fmt::Display for ScopeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    /// `path`, `query`, `header` or `body`.
    pub location: String,
    pub scope_handler: Option<ScopeHandler>,
}

/// Static metadata for one (path, method) endpoint. Immutable once loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub operation_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Full path template including the base path, e.g. `/api/2.0/nodes/{identifier}`.
    pub path: String,
    /// Strategy name; `None` skips authentication.
    pub authentication: Option<String>,
    /// Roles allowed to call the operation; empty means open to any caller.
    pub authorized_roles: Vec<String>,
    pub success_status: Option<u16>,
    pub send_204_on_empty: bool,
    /// Base schema the request payload validates against; may be a discriminator name.
    pub schema: Option<String>,
    /// Output template; `None` passes the handler result through.
    pub template: Option<String>,
    pub params: Vec<ParamDescriptor>,
}

impl OperationDescriptor {
    pub fn new(method: &str, path: &str) -> Self {
        let method = method.to_ascii_uppercase();
        Self {
            operation_id: format!("{method} {path}"),
            method,
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn scoped_params(&self) -> impl Iterator<Item = (&ParamDescriptor, ScopeHandler)> {
        self.params
            .iter()
            .filter_map(|p| p.scope_handler.map(|h| (p, h)))
    }
}

/// OpenAPI-style document carrying the operation annotations.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiDocument {
    #[serde(default, rename = "basePath")]
    pub base_path: String,
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(default, rename = "operationId")]
    operation_id: Option<String>,
    #[serde(default, rename = "requiresAuthentication", alias = "x-authentication-type")]
    authentication: Option<String>,
    #[serde(default, rename = "authorizedRoles", alias = "x-privileges")]
    authorized_roles: Option<Vec<String>>,
    #[serde(default, rename = "responseSchema", alias = "x-schema")]
    schema: Option<String>,
    #[serde(default, rename = "responseTemplate", alias = "x-view")]
    template: Option<String>,
    #[serde(default, rename = "successStatus", alias = "x-success-status")]
    success_status: Option<u16>,
    #[serde(default, rename = "emptyBodyStatus204", alias = "x-send-204")]
    send_204_on_empty: bool,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default, rename = "in")]
    location: String,
    #[serde(default, rename = "paramScopeHandler", alias = "x-param-handler")]
    scope_handler: Option<String>,
}

const METHODS: [&str; 7] = ["get", "put", "post", "patch", "delete", "head", "options"];

impl ApiDocument {
    pub fn from_value(value: serde_json::Value) -> Result<Self, InterceptError> {
        serde_json::from_value(value)
            .map_err(|e| InterceptError::internal(&format!("api spec: {e}")))
    }

    /// Flattens every (path, method) pair into a descriptor.
    ///
    /// Path-level `parameters` apply to each method of that path. Unknown
    /// scope handlers fail the whole load.
    pub fn descriptors(&self) -> Result<Vec<OperationDescriptor>, InterceptError> {
        let base = self.base_path.trim_end_matches('/');
        let mut out = Vec::new();
        for (template, entries) in &self.paths {
            let shared: Vec<RawParameter> = match entries.get("parameters") {
                Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                    InterceptError::internal(&format!("api spec {template} parameters: {e}"))
                })?,
                None => Vec::new(),
            };
            for (method, body) in entries {
                let method = method.to_ascii_lowercase();
                if !METHODS.contains(&method.as_str()) {
                    continue;
                }
                let raw: RawOperation = serde_json::from_value(body.clone()).map_err(|e| {
                    InterceptError::internal(&format!("api spec {method} {template}: {e}"))
                })?;
                let path = format!("{base}{template}");
                out.push(build_descriptor(&method, path, raw, &shared)?);
            }
        }
        Ok(out)
    }
}

fn build_descriptor(
    method: &str,
    path: String,
    raw: RawOperation,
    shared: &[RawParameter],
) -> Result<OperationDescriptor, InterceptError> {
    let mut descriptor = OperationDescriptor::new(method, &path);
    if let Some(id) = raw.operation_id {
        descriptor.operation_id = id;
    }
    let mut params = Vec::new();
    for param in shared.iter().cloned().chain(raw.parameters) {
        let scope_handler = match param.scope_handler.as_deref() {
            None => None,
            Some(name) => Some(ScopeHandler::parse(name).ok_or_else(|| {
                InterceptError::internal(&format!(
                    "{} {}: unknown scope handler '{name}' on parameter '{}'",
                    descriptor.method, descriptor.path, param.name
                ))
            })?),
        };
        params.retain(|p: &ParamDescriptor| p.name != param.name);
        params.push(ParamDescriptor {
            name: param.name,
            location: param.location,
            scope_handler,
        });
    }
    descriptor.authentication = raw.authentication.filter(|s| !s.is_empty());
    descriptor.authorized_roles = raw.authorized_roles.unwrap_or_default();
    descriptor.success_status = raw.success_status;
    descriptor.send_204_on_empty = raw.send_204_on_empty;
    descriptor.schema = raw.schema;
    descriptor.template = raw.template;
    descriptor.params = params;
    Ok(descriptor)
}
