//! Ordered request pipeline.
//!
//! Authenticate → Authorize → Scope-Resolve → Validate → handler → Render,
//! with every failure routed to the [`stages::error_norm::ErrorNormalizer`].

#[cfg(feature = "with-axum")]
pub mod adapters;
pub mod context;
pub mod errors;
pub mod operation;
pub mod prelude;
pub mod render;
pub mod schema;
pub mod scope;
pub mod stages;

pub use stages::{InterceptorChain, Stage, StageOutcome};
