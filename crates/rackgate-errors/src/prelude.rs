pub use crate::{
    code::{codes, reason_phrase, spec_of, CodeSpec, ErrorCode, REGISTRY},
    kind::ErrorKind,
    model::{CauseEntry, ErrorBuilder, ErrorObj, ValidationGroup},
    render::ErrorEnvelope,
    severity::Severity,
};
