use rackgate_errors::prelude::*;

#[test]
fn envelope_uses_reason_phrase_when_message_missing() {
    let err = ErrorBuilder::new(codes::AUTH_FORBIDDEN)
        .dev_msg("role Operator lacks PUT /obms")
        .correlation("req-123")
        .build();

    let envelope = err.to_envelope(false);
    assert_eq!(envelope.message, "Forbidden");
    assert_eq!(envelope.status, 403);
    assert_eq!(envelope.correlation_id, "req-123");
    assert!(envelope.errors.is_none());
    assert!(envelope.stack.is_none());
}

#[test]
fn status_override_wins_over_registry() {
    let err = ErrorBuilder::new(codes::UNKNOWN_GENERIC)
        .user_msg("teapot")
        .status(418)
        .build();
    assert_eq!(err.http_status, 418);
    assert_eq!(err.to_envelope(false).message, "teapot");

    let plain = ErrorBuilder::new(codes::UNKNOWN_GENERIC).build();
    assert_eq!(plain.http_status, 400);
    assert_eq!(plain.message_user, "Bad Request");
}

#[test]
fn validation_groups_flatten_in_order_without_duplicates() {
    let err = ErrorBuilder::new(codes::SCHEMA_VALIDATION)
        .user_msg("Invalid request")
        .validation(vec![
            ValidationGroup::new("/host", vec!["host is required".into()]),
            ValidationGroup::new(
                "/port",
                vec!["port must be integer".into(), "host is required".into()],
            ),
        ])
        .build();

    let envelope = err.to_envelope(false);
    assert_eq!(
        envelope.errors,
        Some(vec![
            "host is required".to_string(),
            "port must be integer".to_string()
        ])
    );
}

#[test]
fn stack_lists_error_and_causes() {
    let err = ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
        .dev_msg("node store offline")
        .cause(CauseEntry::new("io", "connection refused"))
        .build();

    let envelope = err.to_envelope(true);
    let stack = envelope.stack.expect("stack");
    assert_eq!(stack[0], "PROVIDER.UNAVAILABLE: node store offline");
    assert_eq!(stack[1], "caused by io: connection refused");
}

#[test]
fn envelope_serializes_correlation_id_in_camel_case() {
    let envelope = ErrorBuilder::new(codes::STORAGE_NOT_FOUND)
        .correlation("abc")
        .build()
        .to_envelope(false);
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["correlationId"], "abc");
    assert_eq!(json["status"], 404);
    assert!(json.get("errors").is_none());
    assert!(json.get("stack").is_none());
}
