// handlers/public/auth/mod.rs - Token acquisition endpoints
//
// Both routes are on the policy's public allow-list. A request that still
// carries a broken bearer token is refused by the gate before reaching them.

pub mod login; // POST /auth/login - authenticate and get JWT
pub mod register; // POST /auth/register - create new account

pub use login::login_post;
pub use register::register_post;
