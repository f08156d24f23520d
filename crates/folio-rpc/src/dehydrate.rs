//! Dehydrated query state.
//!
//! Server-rendered pages serialize the queries they ran (or started) into
//! a [`DehydratedState`] embedded in the HTML; the client merges it into
//! its cache on boot so nothing the server already computed is fetched
//! again. Both sides identify a query the same way: procedure path plus
//! the canonical JSON of its input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::Payload;

/// Cache identity of a query: procedure path + canonical input.
///
/// Canonical means the input's JSON projection rendered with sorted
/// object keys, which `serde_json::Value` produces by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    pub path: String,
    pub input: String,
}

impl QueryKey {
    pub fn new(path: impl Into<String>, input: &Payload) -> Self {
        Self {
            path: path.into(),
            input: input.json.to_string(),
        }
    }
}

/// State of one dehydrated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryState {
    /// The server finished this query; `data` is its encoded result.
    Success { data: Payload },
    /// The server started this query but did not await it. The client
    /// fetches it on first use.
    Pending,
}

/// One query captured for transfer to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DehydratedQuery {
    pub key: QueryKey,
    pub state: QueryState,
    /// Server wall-clock time at capture, used to age the entry against
    /// the staleness window after hydration.
    pub dehydrated_at: DateTime<Utc>,
}

/// Snapshot of server-side query results for one rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    pub queries: Vec<DehydratedQuery>,
}

impl DehydratedState {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
