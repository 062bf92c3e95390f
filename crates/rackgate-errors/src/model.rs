use crate::{
    code::{reason_phrase, spec_of, ErrorCode},
    kind::ErrorKind,
    severity::Severity,
};
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CauseEntry {
    pub code: String,
    pub summary: String,
}

impl CauseEntry {
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
        }
    }
}

/// Messages reported against one location of a validated document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationGroup {
    /// JSON pointer of the offending value; empty for the document root.
    #[serde(default)]
    pub pointer: String,
    pub messages: Vec<String>,
}

impl ValidationGroup {
    pub fn new(pointer: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            pointer: pointer.into(),
            messages,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub http_status: u16,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause_chain: Option<Vec<CauseEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip)]
    pub backtrace: Option<Arc<Backtrace>>,
}

pub struct ErrorBuilder {
    code: ErrorCode,
    message_user: Option<String>,
    message_dev: Option<String>,
    status: Option<u16>,
    validation: Vec<ValidationGroup>,
    cause_chain: Vec<CauseEntry>,
    correlation_id: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message_user: None,
            message_dev: None,
            status: None,
            validation: Vec::new(),
            cause_chain: Vec::new(),
            correlation_id: None,
        }
    }

    pub fn user_msg(mut self, message: impl Into<String>) -> Self {
        self.message_user = Some(message.into());
        self
    }

    pub fn dev_msg(mut self, message: impl Into<String>) -> Self {
        self.message_dev = Some(message.into());
        self
    }

    /// Overrides the status registered for the code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validation(mut self, groups: Vec<ValidationGroup>) -> Self {
        self.validation.extend(groups);
        self
    }

    pub fn cause(mut self, cause: CauseEntry) -> Self {
        self.cause_chain.push(cause);
        self
    }

    pub fn correlation(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn build(self) -> ErrorObj {
        let spec = spec_of(self.code);
        let http_status = self.status.unwrap_or(spec.http_status);
        let severity = match self.status {
            Some(status) if status != spec.http_status => Severity::for_status(status),
            _ => spec.severity,
        };
        let backtrace = Backtrace::capture();
        ErrorObj {
            code: self.code,
            kind: spec.kind,
            message_user: self
                .message_user
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| reason_phrase(http_status).to_string()),
            message_dev: self.message_dev,
            http_status,
            severity,
            validation: self.validation,
            cause_chain: if self.cause_chain.is_empty() {
                None
            } else {
                Some(self.cause_chain)
            },
            correlation_id: self.correlation_id,
            backtrace: match backtrace.status() {
                BacktraceStatus::Captured => Some(Arc::new(backtrace)),
                _ => None,
            },
        }
    }
}

impl ErrorObj {
    pub fn with_correlation(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn has_validation(&self) -> bool {
        !self.validation.is_empty()
    }

    /// Every validation message across all groups, in order, without repeats.
    pub fn flattened_validation(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for message in self.validation.iter().flat_map(|g| g.messages.iter()) {
            if !out.iter().any(|seen| seen == message) {
                out.push(message.clone());
            }
        }
        out
    }

    /// Textual stack: the error itself, its causes, then captured frames.
    pub fn stack_lines(&self) -> Vec<String> {
        let head = self.message_dev.as_deref().unwrap_or(&self.message_user);
        let mut lines = vec![format!("{}: {}", self.code, head)];
        if let Some(causes) = &self.cause_chain {
            lines.extend(
                causes
                    .iter()
                    .map(|c| format!("caused by {}: {}", c.code, c.summary)),
            );
        }
        if let Some(bt) = &self.backtrace {
            lines.extend(
                bt.to_string()
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        lines
    }
}

impl std::fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.http_status, self.message_user)?;
        if let Some(dev) = &self.message_dev {
            write!(f, " [{dev}]")?;
        }
        Ok(())
    }
}
