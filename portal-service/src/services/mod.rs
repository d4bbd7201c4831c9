pub mod memory;
pub mod metrics;
pub mod postgres;
pub mod session;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use session::{SessionProvider, SessionTokens, TokenSessionProvider, SESSION_COOKIE};
pub use store::Store;
