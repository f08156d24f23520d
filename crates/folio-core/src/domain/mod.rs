//! Domain entities - the core business objects.

mod post;
mod session;
mod user;

pub use post::Post;
pub use session::{Session, SessionUser};
pub use user::User;
