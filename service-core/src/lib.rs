//! service-core: Shared HTTP infrastructure for the portal services.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
