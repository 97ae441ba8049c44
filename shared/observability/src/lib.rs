//! Observability for the identity service.
//!
//! - Tracing subscriber setup with JSON or pretty formatting
//! - Structured identity events on a dedicated target

pub mod events;
pub mod init;

pub use events::*;
pub use init::*;
