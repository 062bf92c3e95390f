use rackgate_auth::errors::AuthError;
use rackgate_config::errors::ConfigError;
use rackgate_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InterceptError(pub ErrorObj);

impl InterceptError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn inner(&self) -> &ErrorObj {
        &self.0
    }

    pub fn unauthenticated(msg: &str) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
                .user_msg("Unauthorized")
                .dev_msg(msg)
                .build(),
        )
    }

    pub fn forbidden(msg: &str) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::AUTH_FORBIDDEN)
                .user_msg("Forbidden")
                .dev_msg(msg)
                .build(),
        )
    }

    /// Payload failed schema checks; one group per offending location.
    pub fn validation(schema: &str, groups: Vec<ValidationGroup>) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION)
                .user_msg("Validation Failed")
                .dev_msg(format!("payload does not match schema '{schema}'"))
                .validation(groups)
                .build(),
        )
    }

    pub fn missing_schema(schema: &str) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::SCHEMA_MISSING)
                .dev_msg(format!("schema '{schema}' is not registered"))
                .build(),
        )
    }

    pub fn not_found(msg: &str) -> Self {
        InterceptError(ErrorBuilder::new(codes::STORAGE_NOT_FOUND).user_msg(msg).build())
    }

    pub fn bad_request(msg: &str) -> Self {
        InterceptError(ErrorBuilder::new(codes::REQUEST_BAD).user_msg(msg).build())
    }

    pub fn conflict(msg: &str) -> Self {
        InterceptError(ErrorBuilder::new(codes::STORAGE_CONFLICT).user_msg(msg).build())
    }

    /// Error without a declared status; answers 400 unless `status` is given.
    pub fn generic(msg: &str, status: Option<u16>) -> Self {
        let mut builder = ErrorBuilder::new(codes::UNKNOWN_GENERIC).user_msg(msg);
        if let Some(status) = status {
            builder = builder.status(status);
        }
        InterceptError(builder.build())
    }

    pub fn internal(msg: &str) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
                .dev_msg(msg)
                .build(),
        )
    }

    pub fn timeout(operation: &str, timeout_ms: u64) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::HANDLER_TIMEOUT)
                .dev_msg(format!(
                    "operation '{operation}' exceeded {timeout_ms}ms"
                ))
                .build(),
        )
    }

    pub fn not_implemented(operation: &str) -> Self {
        InterceptError(
            ErrorBuilder::new(codes::ROUTE_NOT_IMPLEMENTED)
                .dev_msg(format!("no handler registered for '{operation}'"))
                .build(),
        )
    }

    pub fn status(&self) -> u16 {
        self.0.http_status
    }
}

impl From<AuthError> for InterceptError {
    fn from(err: AuthError) -> Self {
        InterceptError(err.into_inner())
    }
}

impl From<ErrorObj> for InterceptError {
    fn from(err: ErrorObj) -> Self {
        InterceptError(err)
    }
}

impl From<ConfigError> for InterceptError {
    fn from(err: ConfigError) -> Self {
        InterceptError(err.into_inner())
    }
}
