//! Authentication strategies and role-based authorization.
//!
//! `authn` establishes who the caller is; `acl` decides whether that caller
//! may invoke a (path, method) pair. Both are built once at startup and shared
//! read-only across requests.

pub mod acl;
pub mod authn;
pub mod errors;
pub mod model;
pub mod prelude;
