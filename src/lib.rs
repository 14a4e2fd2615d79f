//! HMAC signing and authenticating gateway.
//!
//! Either signs outgoing requests before proxying them upstream, or verifies
//! the signature on incoming requests before proxying them, serving them
//! from a local file tree, or simply answering 202/401.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use auth::{Authenticator, HmacAuthenticator};
pub use config::{Mode, ProxyConfig, ProxyOptions, ValidationReport};
pub use http::HttpServer;
