//! # Folio Client
//!
//! Consumer side of the Folio API: an HTTP transport that carries
//! batched procedure calls to the `/api/rpc` endpoint, and a query cache
//! that serves repeated reads without refetching while they are fresh.
//! The cache hydrates from state dehydrated during server-side rendering,
//! so a page's first queries resolve without a network round trip.

pub mod cache;
pub mod transport;

pub use cache::{DEFAULT_STALE_AFTER, QueryClient};
pub use transport::{ClientError, HttpTransport, Transport};
