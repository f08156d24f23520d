//! Database connection management.

mod connections;

pub mod entity;
pub mod postgres_repo;

pub use connections::{DatabaseConfig, DatabaseConnections};
pub use postgres_repo::{PostgresPostRepository, PostgresSessionRepository, PostgresUserRepository};
