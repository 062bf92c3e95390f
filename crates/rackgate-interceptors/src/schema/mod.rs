//! Payload schemas, scoped output templates and the discriminator-driven selector.

pub mod registry;
pub mod selector;
pub mod templates;

pub use registry::JsonSchemaRegistry;
pub use selector::{DefaultCredentials, DiscriminatorRule, SchemaSelector};
pub use templates::ScopedTemplateStore;

use crate::errors::InterceptError;
use crate::scope::ScopeStack;
use async_trait::async_trait;
use rackgate_errors::prelude::ValidationGroup;
use serde_json::Value;

/// Result of checking one payload against one schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Flat messages; empty iff `valid`.
    pub errors: Vec<String>,
    /// The same messages grouped by instance location.
    pub groups: Vec<ValidationGroup>,
    pub missing_schema: bool,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    pub fn missing(name: &str) -> Self {
        Self {
            valid: false,
            errors: vec![format!("schema '{name}' not found")],
            groups: Vec::new(),
            missing_schema: true,
        }
    }

    pub fn failed(groups: Vec<ValidationGroup>) -> Self {
        let errors = groups
            .iter()
            .flat_map(|g| g.messages.iter().cloned())
            .collect();
        Self {
            valid: false,
            errors,
            groups,
            missing_schema: false,
        }
    }
}

/// Schema/template collaborator used by validation and rendering.
#[async_trait]
pub trait SchemaService: Send + Sync {
    fn contains(&self, name: &str) -> bool;

    async fn validate(&self, name: &str, payload: &Value) -> ValidationOutcome;

    /// Renders `payload` into the narrowest template named `template` along `scope`.
    async fn render(
        &self,
        template: &str,
        scope: &ScopeStack,
        payload: &Value,
    ) -> Result<Value, InterceptError>;
}

/// Schemas and templates loaded once at startup.
#[derive(Default)]
pub struct StaticSchemaService {
    schemas: JsonSchemaRegistry,
    templates: ScopedTemplateStore,
}

impl StaticSchemaService {
    pub fn new(schemas: JsonSchemaRegistry, templates: ScopedTemplateStore) -> Self {
        Self { schemas, templates }
    }

    pub fn schemas(&self) -> &JsonSchemaRegistry {
        &self.schemas
    }

    pub fn templates(&self) -> &ScopedTemplateStore {
        &self.templates
    }
}

#[async_trait]
impl SchemaService for StaticSchemaService {
    fn contains(&self, name: &str) -> bool {
        self.schemas.contains(name)
    }

    async fn validate(&self, name: &str, payload: &Value) -> ValidationOutcome {
        self.schemas.validate(name, payload)
    }

    async fn render(
        &self,
        template: &str,
        scope: &ScopeStack,
        payload: &Value,
    ) -> Result<Value, InterceptError> {
        let (found_in, doc) = self.templates.lookup(template, scope).ok_or_else(|| {
            InterceptError::internal(&format!("template '{template}' not found for scope {scope}"))
        })?;
        tracing::trace!(template, scope = found_in, "rendering template");
        Ok(templates::render_document(doc, payload))
    }
}
