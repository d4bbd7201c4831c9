pub mod navigation;
pub mod session;

pub use navigation::navigation_gate;
pub use session::{session_middleware, Session};
