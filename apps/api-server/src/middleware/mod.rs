//! Request-level plumbing shared by the HTTP handlers.

pub mod error;
