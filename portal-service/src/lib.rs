pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::middleware::rate_limit::IpRateLimit;
use std::sync::Arc;

use crate::services::{SessionProvider, SessionTokens, Store};

pub use startup::build_router;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionProvider>,
    pub tokens: SessionTokens,
    pub signin_rate_limit: IpRateLimit,
    pub secure_cookies: bool,
    pub allowed_origins: Vec<String>,
}
