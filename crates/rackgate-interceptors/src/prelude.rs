pub use crate::context::{parse_query, InterceptContext, ProtoRequest, ProtoResponse};
pub use crate::errors::InterceptError;
pub use crate::operation::{
    ApiDocument, OperationDescriptor, OperationTable, ParamDescriptor, RouteMatch, ScopeHandler,
};
pub use crate::render::{is_empty_body, status_for, RenderedResponse, ResponseRenderer, ERROR_TEMPLATE};
pub use crate::schema::{
    DefaultCredentials, DiscriminatorRule, JsonSchemaRegistry, SchemaSelector, SchemaService,
    ScopedTemplateStore, StaticSchemaService, ValidationOutcome,
};
pub use crate::scope::{
    InMemoryDirectory, ResourceDirectory, ScopeResolver, ScopeStack, ENCLOSES, GLOBAL_SCOPE,
};
pub use crate::stages::{
    authn::AuthnStage, authz::AuthzStage, context_init::ContextInitStage,
    error_norm::ErrorNormalizer, resilience::run_with_timeout, schema_guard::SchemaGuardStage,
    scope::ScopeStage, HandlerCall, HandlerOutput, InterceptorChain, Stage, StageOutcome,
    DEFAULT_HANDLER_TIMEOUT,
};
