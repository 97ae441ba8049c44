pub mod identity;
pub mod middleware;
pub mod password;
pub mod tokens;
pub mod validation;

pub use identity::{AuthResult, IdentityService};
pub use middleware::{AuthenticatedAccount, RequireAuth};
pub use password::PasswordHasher;
pub use tokens::{TokenError, TokenService};
