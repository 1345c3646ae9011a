//! sqlrelay Router
//!
//! The internal half of sqlrelay. The router receives `{query, strategy}`
//! requests from the gate, classifies the query, resolves a target node
//! via the requested strategy, executes the query on that node over a
//! fresh connection, and returns rows or an affected-row count.
//!
//! The router performs no authentication of its own: reachability is
//! restricted to the gate's network origin by external network policy.

pub mod cluster;
pub mod executor;
pub mod http_server;
pub mod probe;
pub mod strategy;

pub use cluster::{Cluster, DbConfig};
pub use http_server::HttpServer;
pub use strategy::RoutingDecision;
