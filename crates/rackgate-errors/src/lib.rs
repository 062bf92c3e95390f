//! Unified error domain for the gateway.
//!
//! Every failure raised by a pipeline stage is an [`model::ErrorObj`] built
//! from a registered [`code::ErrorCode`]. The error normalizer turns it into
//! the single wire shape, [`render::ErrorEnvelope`].

pub mod code;
pub mod kind;
pub mod model;
pub mod prelude;
pub mod render;
pub mod severity;

pub use model::{ErrorBuilder, ErrorObj};
