//! web - server half of the resume front-end.
//!
//! - Caller identification from forwarded `authorization` / `cookie` headers
//! - Remote procedures gated by access tier (public, authenticated, server-only)
//! - Resume operations proxied to the backend with the caller's credentials
//! - Browser-mode backend client with silent token refresh

pub mod account;
pub mod auth_client;
pub mod backend;
pub mod config;
pub mod errors;
pub mod models;
pub mod resume;
pub mod routes;
pub mod rpc;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod testutil;
