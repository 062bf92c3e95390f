use rackgate_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct AuthError(pub ErrorObj);

impl AuthError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }
}

pub fn unauthenticated(msg: &str) -> AuthError {
    AuthError(
        ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
            .user_msg("Unauthorized")
            .dev_msg(msg)
            .build(),
    )
}

pub fn forbidden(msg: &str) -> AuthError {
    AuthError(
        ErrorBuilder::new(codes::AUTH_FORBIDDEN)
            .user_msg("Forbidden")
            .dev_msg(msg)
            .build(),
    )
}

pub fn internal(msg: &str) -> AuthError {
    AuthError(
        ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
            .dev_msg(msg)
            .build(),
    )
}
