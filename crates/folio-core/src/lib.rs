//! # Folio Core
//!
//! The domain layer of the Folio portfolio backend: the `Post`, `User`
//! and `Session` entities, the port traits the infrastructure
//! implements, and the errors those ports surface. No infrastructure
//! dependencies live here.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::RepoError;
