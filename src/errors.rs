//! Startup and wiring errors of the gateway binary.
//!
//! Request-time failures never surface here; the pipeline turns them into
//! error envelopes.

use rackgate_auth::errors::AuthError;
use rackgate_config::errors::ConfigError;
use rackgate_errors::prelude::*;
use rackgate_interceptors::errors::InterceptError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{inner}")]
pub struct GatewayError {
    inner: ErrorObj,
}

impl GatewayError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(code).user_msg(message).build(),
        }
    }

    pub fn startup(detail: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
                .user_msg("Gateway failed to start")
                .dev_msg(detail)
                .build(),
        }
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self {
            inner: ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
                .user_msg("File unavailable")
                .dev_msg(format!("{}: {err}", path.display()))
                .build(),
        }
    }

    pub fn inner(&self) -> &ErrorObj {
        &self.inner
    }

    pub fn into_inner(self) -> ErrorObj {
        self.inner
    }

    pub fn http_status(&self) -> u16 {
        self.inner.http_status
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        Self {
            inner: err.into_inner(),
        }
    }
}

impl From<InterceptError> for GatewayError {
    fn from(err: InterceptError) -> Self {
        Self {
            inner: err.into_inner(),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        Self {
            inner: err.into_inner(),
        }
    }
}
