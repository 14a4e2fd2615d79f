//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID and trace layers)
//!     → dispatch.rs (mode handler: sign or authenticate)
//!     → forward.rs (upstream proxy or file server)
//!       or response.rs (202 / 401 answered locally)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{build, build_from_config, DispatchError, ForwardSettings, Handler, Target};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
