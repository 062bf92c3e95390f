//! rackgate: the request pipeline in front of a rack orchestration backend.
//!
//! Every call is authenticated, authorized against the privileges declared in
//! the API document, scoped, validated, handed to its business handler and
//! rendered; failures become one JSON error envelope.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod policy;
pub mod server;
