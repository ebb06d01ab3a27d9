pub mod auth;
pub mod session;

pub use auth::{RequireUser, AUTH_PAGE};
pub use session::{refresh_session_middleware, ScopedClient};
