//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags / TOML file
//!     → schema.rs (ProxyOptions, raw values)
//!     → validation.rs (every check runs, all problems collected)
//!     → mode.rs (derived Mode)
//!     → ProxyConfig (validated, immutable)
//!     → handed to the dispatcher once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated
//! - All fields have defaults to allow minimal configs
//! - An invalid config never starts a server

pub mod loader;
pub mod mode;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_options, ConfigError};
pub use mode::Mode;
pub use schema::{ProxyConfig, ProxyOptions, TlsPaths, Upstream};
pub use validation::{validate, ValidationReport};
