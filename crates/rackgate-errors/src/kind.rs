#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Auth,
    Forbidden,
    Schema,
    BadRequest,
    NotFound,
    Conflict,
    Provider,
    Timeout,
    NotImplemented,
    Unknown,
}

