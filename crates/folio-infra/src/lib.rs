//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`.
//! This crate contains the PostgreSQL persistence adapters, in-memory
//! fallbacks, and the password hashing service.

pub mod auth;
pub mod database;
pub mod memory;

pub use auth::{Argon2PasswordService, SessionManager};
pub use database::DatabaseConnections;
pub use memory::{InMemoryPostRepo, InMemorySessionRepo, InMemoryUserRepo};
