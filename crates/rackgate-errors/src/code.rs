use crate::{kind::ErrorKind, severity::Severity};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match REGISTRY.get_key_value(s.as_str()) {
            Some((key, _)) => Ok(ErrorCode(key)),
            None => Ok(codes::UNKNOWN_INTERNAL),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub http_status: u16,
    pub severity: Severity,
}

pub mod codes {
    use super::ErrorCode;

    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("AUTH.UNAUTHENTICATED");
    pub const AUTH_FORBIDDEN: ErrorCode = ErrorCode("AUTH.FORBIDDEN");
    pub const SCHEMA_VALIDATION: ErrorCode = ErrorCode("SCHEMA.VALIDATION_FAILED");
    pub const SCHEMA_MISSING: ErrorCode = ErrorCode("SCHEMA.MISSING");
    pub const REQUEST_BAD: ErrorCode = ErrorCode("REQUEST.BAD");
    pub const STORAGE_NOT_FOUND: ErrorCode = ErrorCode("STORAGE.NOT_FOUND");
    pub const STORAGE_CONFLICT: ErrorCode = ErrorCode("STORAGE.CONFLICT");
    pub const PROVIDER_UNAVAILABLE: ErrorCode = ErrorCode("PROVIDER.UNAVAILABLE");
    pub const HANDLER_TIMEOUT: ErrorCode = ErrorCode("HANDLER.TIMEOUT");
    pub const ROUTE_NOT_IMPLEMENTED: ErrorCode = ErrorCode("ROUTE.NOT_IMPLEMENTED");
    pub const UNKNOWN_GENERIC: ErrorCode = ErrorCode("UNKNOWN.GENERIC");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN.INTERNAL");
}

const FALLBACK: CodeSpec = CodeSpec {
    code: codes::UNKNOWN_INTERNAL,
    kind: ErrorKind::Unknown,
    http_status: 500,
    severity: Severity::Critical,
};

pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    use codes::*;

    let mut map = HashMap::new();
    let mut add = |code: ErrorCode, kind: ErrorKind, http_status: u16, severity: Severity| {
        let spec = CodeSpec {
            code,
            kind,
            http_status,
            severity,
        };
        if map.insert(code.0, spec).is_some() {
            panic!("duplicate error code: {}", code.0);
        }
    };

    add(AUTH_UNAUTHENTICATED, ErrorKind::Auth, 401, Severity::Warn);
    add(AUTH_FORBIDDEN, ErrorKind::Forbidden, 403, Severity::Warn);
    add(SCHEMA_VALIDATION, ErrorKind::Schema, 400, Severity::Warn);
    add(SCHEMA_MISSING, ErrorKind::Schema, 500, Severity::Error);
    add(REQUEST_BAD, ErrorKind::BadRequest, 400, Severity::Warn);
    add(STORAGE_NOT_FOUND, ErrorKind::NotFound, 404, Severity::Info);
    add(STORAGE_CONFLICT, ErrorKind::Conflict, 409, Severity::Warn);
    add(PROVIDER_UNAVAILABLE, ErrorKind::Provider, 503, Severity::Error);
    add(HANDLER_TIMEOUT, ErrorKind::Timeout, 504, Severity::Error);
    add(ROUTE_NOT_IMPLEMENTED, ErrorKind::NotImplemented, 501, Severity::Warn);
    // Errors that do not declare a status answer 400.
    add(UNKNOWN_GENERIC, ErrorKind::Unknown, 400, Severity::Warn);
    add(UNKNOWN_INTERNAL, ErrorKind::Unknown, 500, Severity::Critical);

    map
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY.get(code.0).unwrap_or(&FALLBACK)
}

/// Standard reason phrase for a status, used when an error carries no message.
pub fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_statuses() {
        assert_eq!(spec_of(codes::AUTH_FORBIDDEN).http_status, 403);
        assert_eq!(spec_of(codes::UNKNOWN_GENERIC).http_status, 400);
        assert_eq!(spec_of(codes::HANDLER_TIMEOUT).http_status, 504);
        assert_eq!(spec_of(ErrorCode("NOPE")).http_status, 500);
    }

    #[test]
    fn reason_phrases() {
        assert_eq!(reason_phrase(403), "Forbidden");
        assert_eq!(reason_phrase(400), "Bad Request");
        assert_eq!(reason_phrase(799), "Unknown Error");
    }
}
