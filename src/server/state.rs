use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::handlers::HandlerRegistry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rackgate_auth::prelude::*;
use rackgate_interceptors::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared, read-mostly state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<InterceptorChain>,
    pub handlers: HandlerRegistry,
    pub table: Arc<OperationTable>,
    /// Token issuing for login endpoints registered as handlers.
    pub issuer: Arc<TokenIssuer>,
    pub sessions: Arc<SessionRegistry>,
    pub health: Arc<ServeHealth>,
    pub instance_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Assembles the pipeline: policy store, authenticators, scope resolver,
    /// schema/template service and the error normalizer.
    pub fn build(
        config: &GatewayConfig,
        table: OperationTable,
        handlers: HandlerRegistry,
        directory: Arc<dyn ResourceDirectory>,
    ) -> Result<Self, GatewayError> {
        let table = Arc::new(table);

        let hierarchy = RoleHierarchy::with_builtin();
        for (role, parents) in &config.auth.role_parents {
            hierarchy.add_role_parents(role, parents.iter().cloned());
        }
        let assignments: HashMap<String, Vec<String>> = config
            .auth
            .users
            .iter()
            .map(|u| (u.username.clone(), u.roles.clone()))
            .collect();
        let acl = AclService::new(hierarchy).with_assignments(assignments);
        let rules = acl.load(&table.grants());

        let users = Arc::new(
            LocalUserStore::new(config.auth.users.iter().cloned())
                .with_iterations(config.auth.hash_iterations),
        );
        let secret = match config.auth.token_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("auth.token_secret not set; issued tokens will not survive a restart");
                Uuid::new_v4().simple().to_string()
            }
        };
        let issuer = Arc::new(TokenIssuer::new(secret, config.auth.token_ttl_secs));
        let sessions = Arc::new(SessionRegistry::new().with_ttl(config.auth.session_ttl_secs));
        let authenticators = AuthenticatorSet::new()
            .register(Arc::new(BasicAuthenticator::new(users.clone())))
            .register(Arc::new(JwtAuthenticator::new(issuer.clone(), users.clone())))
            .register(Arc::new(RedfishAuthenticator::new(users, sessions.clone())));

        let schemas = match &config.schemas.dir {
            Some(dir) => JsonSchemaRegistry::load_dir(dir)?,
            None => JsonSchemaRegistry::new(),
        };
        let templates = match &config.templates.dir {
            Some(dir) => ScopedTemplateStore::load_dir(dir)?,
            None => ScopedTemplateStore::new(),
        };
        let service: Arc<dyn SchemaService> = Arc::new(StaticSchemaService::new(schemas, templates));
        let selector = SchemaSelector::new(
            config.schemas.discriminators.clone(),
            config.defaults.credentials.clone(),
        );

        let renderer = ResponseRenderer::new(service.clone());
        let normalizer = ErrorNormalizer::for_log_level(renderer.clone(), &config.logging.level);
        let chain = InterceptorChain::new(
            vec![
                Box::new(ContextInitStage::new(table.clone())),
                Box::new(AuthnStage::new(authenticators, config.auth.enabled)),
                Box::new(AuthzStage::new(Arc::new(acl))),
                Box::new(ScopeStage::new(ScopeResolver::new(directory))),
                Box::new(SchemaGuardStage::new(service, selector)),
            ],
            renderer,
            normalizer,
        )
        .with_handler_timeout(config.handler.timeout());

        tracing::info!(
            operations = table.len(),
            acl_rules = rules,
            handlers = handlers.len(),
            auth_enabled = config.auth.enabled,
            "pipeline assembled"
        );

        let health = Arc::new(ServeHealth::new());
        health.mark_ready();
        Ok(Self {
            chain: Arc::new(chain),
            handlers,
            table,
            issuer,
            sessions,
            health,
            instance_id: Uuid::new_v4(),
            started_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub struct ServeHealth {
    live: AtomicBool,
    ready: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl ServeHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_live(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        *self.last_error.lock() = None;
    }

    pub fn mark_unready(&self, error: impl Into<String>) {
        self.ready.store(false, Ordering::SeqCst);
        *self.last_error.lock() = Some(error.into());
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
