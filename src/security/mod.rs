//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → client
//! ```
//!
//! Request authentication itself lives in `crate::auth`.

pub mod headers;
