// Identity service: account signup, credential login and bearer-token
// verification over a pluggable account store.

pub mod errors;
pub mod handlers;
pub mod services;

pub use errors::{AuthError, ErrorKind};
pub use handlers::configure_routes;
pub use services::{AuthResult, IdentityService, TokenService};
