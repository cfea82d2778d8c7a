// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Security Level: authenticated principal
// Route Prefix: /api/*
// Middleware: authenticate (gate) → authorize (policy)
//
// Handlers take `Principal` as an extractor. By the time one runs the policy
// has already answered 401/403, so the extractor only fails if a route is
// mounted outside the middleware stack.

pub mod account; // /api/accounts/me
pub mod category; // /api/categories[/:id]
pub mod product; // /api/products[/:id]

pub use account::*;
pub use category::*;
pub use product::*;
