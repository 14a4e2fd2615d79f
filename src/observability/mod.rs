//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and server produce:
//!     → logging.rs (structured log events, request IDs)
//!     → metrics.rs (request counters by mode and outcome)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (optional)
//! ```

pub mod logging;
pub mod metrics;
