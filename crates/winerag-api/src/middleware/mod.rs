//! Request middleware
//!
//! - `api_key`: shared-secret gate for protected routes
//! - `security_headers`: static security headers on every response
//!
//! Author: hephaex@gmail.com

pub mod api_key;
pub mod security_headers;

pub use api_key::api_key_middleware;
pub use security_headers::security_headers_middleware;
