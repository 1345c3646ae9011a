//! Wire Protocol Types
//!
//! Both services expose `POST /query` with a JSON body. The gate forwards
//! the request body to the router unchanged, and relays the router's
//! response verbatim, so the same types describe both hops.

use serde::{Deserialize, Serialize};

/// Strategy applied when a request names none (or an unknown one).
pub const DEFAULT_STRATEGY: &str = "direct_hit";

/// Body of a `POST /query` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    /// Raw SQL text to execute.
    pub query: String,
    /// Requested routing strategy. Absent fields default to
    /// [`DEFAULT_STRATEGY`]; unrecognized names dispatch the same way but
    /// are echoed back as given.
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_strategy() -> String {
    DEFAULT_STRATEGY.to_string()
}

/// Successful router response.
///
/// `data` is either an array of row objects (reads) or
/// `{"affected_rows": n}` (writes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// Address of the database node that executed the query.
    pub executed_on: String,
    /// Human-readable description of how the node was chosen.
    pub role: String,
    /// The strategy name as the caller sent it.
    pub strategy: String,
    pub data: serde_json::Value,
}

/// Error body returned by either service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    /// Present only on router execution failures: the node that was
    /// attempted, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            node: None,
        }
    }

    pub fn with_node(error: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            node: Some(node.into()),
        }
    }
}

/// Read-routing strategies the router dispatches on.
///
/// Parsing never fails: unknown names fall back to [`Strategy::DirectHit`],
/// matching the behavior for an absent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Always the primary.
    DirectHit,
    /// Uniformly random replica.
    Random,
    /// Replica with the lowest probed latency.
    Customized,
}

impl Strategy {
    pub fn parse(name: &str) -> Self {
        match name {
            "random" => Strategy::Random,
            "customized" => Strategy::Customized,
            _ => Strategy::DirectHit,
        }
    }
}
