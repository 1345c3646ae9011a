//! sqlrelay Gate
//!
//! The only internet-facing component. The gate authenticates callers with
//! a shared API key, rejects empty queries, filters destructive statements
//! through the denylist classifier, and forwards everything else to the
//! router, relaying the router's response verbatim.
//!
//! The gate is stateless across requests: its only shared state is the
//! startup configuration (auth secret and router address).

pub mod http_server;
pub mod upstream;

pub use http_server::HttpServer;
pub use upstream::RouterClient;
