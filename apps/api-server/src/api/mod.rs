//! Procedure definitions exposed through the RPC endpoint.

pub mod post;
