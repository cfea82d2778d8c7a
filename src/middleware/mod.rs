pub mod auth;
pub mod policy;
pub mod response;

pub use auth::{authenticate, bearer_token, resolve_principal, GateError, GateOutcome};
pub use policy::{authorize, Access, AccessPolicy, Decision};
pub use response::{ApiResponse, ApiResult};
