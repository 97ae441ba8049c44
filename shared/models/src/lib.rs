//! Types shared between the identity service crates.

pub mod auth;

pub use auth::*;
