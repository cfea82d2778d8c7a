// handlers/mod.rs - Handlers grouped by what the access policy demands
//
// Public (no credentials) → Protected (authenticated principal, some routes
// also need ROLE_ADMIN). The split is documentation only: the gate and the
// policy middleware decide per request, not the module a handler lives in.

pub mod protected; // /api/*
pub mod public; // /, /health, /auth/*

pub use protected::*;
pub use public::*;
