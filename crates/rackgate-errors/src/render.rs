use crate::model::ErrorObj;
use serde::{Deserialize, Serialize};

/// The single wire shape of every failure response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub status: u16,
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl ErrorObj {
    pub fn to_envelope(&self, include_stack: bool) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.message_user.clone(),
            status: self.http_status,
            correlation_id: self.correlation_id.clone().unwrap_or_default(),
            errors: self
                .has_validation()
                .then(|| self.flattened_validation()),
            stack: include_stack.then(|| self.stack_lines()),
        }
    }
}
