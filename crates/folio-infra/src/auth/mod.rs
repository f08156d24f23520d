//! Authentication implementations.

mod password;
mod sessions;

pub use password::Argon2PasswordService;
pub use sessions::{SessionManager, DEFAULT_SESSION_TTL_DAYS};
