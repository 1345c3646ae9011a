//! Latency Prober
//!
//! Measures a single TCP connect round-trip to a node's database port,
//! bounded by a one-second timeout. The result is a latency in
//! milliseconds, or [`UNREACHABLE_MS`] when the node cannot be reached in
//! time. An unreachable node is merely undesirable to the strategy engine,
//! never a hard error, so this function does not return a `Result`.
//!
//! One measurement per call: no caching, no retries. The `customized`
//! strategy invokes this once per replica on the request's critical path.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::debug;

use crate::cluster::host_port;

/// Sentinel latency for a node that could not be reached: worse than any
/// real measurement.
pub const UNREACHABLE_MS: f64 = 9999.0;

/// Per-probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Measures the connect round-trip to `addr` in milliseconds.
pub async fn measure(addr: &str, default_port: u16) -> f64 {
    let (host, port) = host_port(addr, default_port);
    let start = Instant::now();

    let latency = match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await
    {
        Ok(Ok(_stream)) => start.elapsed().as_secs_f64() * 1000.0,
        Ok(Err(_)) | Err(_) => UNREACHABLE_MS,
    };

    debug!("probe {}: {:.3} ms", addr, latency);
    latency
}
