//! Credential handling: bearer tokens, password hashing and the per-request
//! principal.

pub mod clock;
pub mod password;
pub mod principal;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use password::{PasswordError, PasswordHasher};
pub use principal::Principal;
pub use token::{Claims, SigningError, TokenError, TokenService, TOKEN_TTL_SECS};

/// Prefix of the `Authorization` header value carrying a bearer token.
pub const BEARER_PREFIX: &str = "Bearer ";
