//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake, rustls via axum-server)
//!     → Hand off to HTTP layer
//! ```
//!
//! Plain listeners are bound directly with `tokio::net::TcpListener`.

pub mod tls;
