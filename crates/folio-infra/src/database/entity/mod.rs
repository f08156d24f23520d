//! SeaORM entity definitions.

pub mod post;
pub mod session;
pub mod user;
