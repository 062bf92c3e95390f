#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    /// Severity implied by an HTTP status when a caller overrides the registered one.
    pub const fn for_status(status: u16) -> Self {
        if status >= 500 {
            Severity::Error
        } else if status == 404 {
            Severity::Info
        } else {
            Severity::Warn
        }
    }
}
