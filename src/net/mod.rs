//! Networking modules for the game backend's REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` owns the authenticated request pipeline, `api` layers typed calls
//! on top of it, `oauth` parses the provider redirect, and `types` defines
//! the wire schema.

pub mod api;
pub mod error;
pub mod http;
pub mod oauth;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ApiError;
pub use http::{HttpClient, Navigator, SIGN_IN_ROUTE};
