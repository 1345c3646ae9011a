//! Strategy Engine
//!
//! Resolves a classification plus a requested strategy into exactly one
//! target node. This component never fails: every path lands on some node,
//! the primary in the worst case.
//!
//! Rules, in order:
//! - Writes always go to the primary; the strategy is ignored.
//! - `direct_hit` (the default, including unrecognized names) reads from
//!   the primary.
//! - `random` reads from a uniformly random replica.
//! - `customized` probes every replica sequentially and reads from the one
//!   with the lowest latency; exact ties go to the earliest-listed replica.
//! - Any replica-seeking strategy with an empty replica set falls back to
//!   the primary.

use rand::Rng;
use sqlrelay_common::{Classification, Strategy};
use tracing::debug;

use crate::cluster::Cluster;
use crate::probe;

/// Per-request outcome of strategy evaluation. Computed fresh for every
/// request and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    /// Address of the node that will execute the query.
    pub target: String,
    /// Human-readable description of how the target was chosen.
    pub role: String,
}

impl RoutingDecision {
    fn primary(cluster: &Cluster, role: &str) -> Self {
        Self {
            target: cluster.primary().to_string(),
            role: role.to_string(),
        }
    }
}

/// Resolves the target node for a request.
///
/// `db_port` is the port probed on replicas that carry no explicit port.
pub async fn decide(
    cluster: &Cluster,
    db_port: u16,
    classification: Classification,
    strategy: Strategy,
) -> RoutingDecision {
    // Anything that is not a read goes to the primary, whatever the
    // requested strategy.
    if classification != Classification::Read {
        return RoutingDecision::primary(cluster, "Manager (Write)");
    }

    let replicas = cluster.replicas();

    match strategy {
        Strategy::DirectHit => RoutingDecision::primary(cluster, "Manager (Direct Hit)"),
        Strategy::Random => {
            if replicas.is_empty() {
                // the reference keeps the worker label even when falling
                // back to the primary
                return RoutingDecision::primary(cluster, "Worker (Random)");
            }
            let idx = rand::rng().random_range(0..replicas.len());
            RoutingDecision {
                target: replicas[idx].clone(),
                role: "Worker (Random)".to_string(),
            }
        }
        Strategy::Customized => {
            if replicas.is_empty() {
                return RoutingDecision::primary(cluster, "Worker (Ping Optimized)");
            }
            let mut latencies = Vec::with_capacity(replicas.len());
            for replica in replicas {
                latencies.push(probe::measure(replica, db_port).await);
            }
            let idx = lowest_latency(&latencies);
            debug!(
                "ping-optimized selection: {} at {:.3} ms",
                replicas[idx], latencies[idx]
            );
            RoutingDecision {
                target: replicas[idx].clone(),
                role: "Worker (Ping Optimized)".to_string(),
            }
        }
    }
}

/// Index of the smallest latency. Strict comparison keeps the earliest
/// entry on exact ties, and when every probe failed with the sentinel the
/// first replica wins by default.
fn lowest_latency(latencies: &[f64]) -> usize {
    let mut best = 0;
    for (i, latency) in latencies.iter().enumerate().skip(1) {
        if *latency < latencies[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    fn cluster(replicas: &[&str]) -> Cluster {
        Cluster::new(
            "10.0.0.1",
            replicas.iter().map(|r| r.to_string()).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_write_ignores_strategy() {
        let cluster = cluster(&["10.0.0.2", "10.0.0.3"]);
        for strategy in [Strategy::DirectHit, Strategy::Random, Strategy::Customized] {
            let decision = decide(&cluster, 3306, Classification::Write, strategy).await;
            assert_eq!(decision.target, "10.0.0.1");
            assert_eq!(decision.role, "Manager (Write)");
        }
    }

    #[tokio::test]
    async fn test_direct_hit_targets_primary() {
        let cluster = cluster(&["10.0.0.2"]);
        let decision = decide(&cluster, 3306, Classification::Read, Strategy::DirectHit).await;
        assert_eq!(decision.target, "10.0.0.1");
        assert_eq!(decision.role, "Manager (Direct Hit)");
    }

    #[tokio::test]
    async fn test_random_uniform_and_never_picks_primary() {
        let cluster = cluster(&["10.0.0.2", "10.0.0.3", "10.0.0.4"]);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..300 {
            let decision = decide(&cluster, 3306, Classification::Read, Strategy::Random).await;
            assert_ne!(decision.target, "10.0.0.1");
            assert_eq!(decision.role, "Worker (Random)");
            *counts.entry(decision.target).or_default() += 1;
        }
        // 300 uniform draws over 3 replicas: expect ~100 each. The band
        // is ~5 standard deviations wide, so a correct implementation
        // essentially never trips it.
        assert_eq!(counts.len(), 3);
        for (replica, count) in &counts {
            assert!(
                (60..=140).contains(count),
                "replica {} drawn {} times out of 300",
                replica,
                count
            );
        }
    }

    #[tokio::test]
    async fn test_random_empty_replicas_falls_back_to_primary() {
        let cluster = cluster(&[]);
        let decision = decide(&cluster, 3306, Classification::Read, Strategy::Random).await;
        assert_eq!(decision.target, "10.0.0.1");
        assert_eq!(decision.role, "Worker (Random)");
    }

    #[tokio::test]
    async fn test_customized_empty_replicas_falls_back_to_primary() {
        let cluster = cluster(&[]);
        let decision = decide(&cluster, 3306, Classification::Read, Strategy::Customized).await;
        assert_eq!(decision.target, "10.0.0.1");
        assert_eq!(decision.role, "Worker (Ping Optimized)");
    }

    #[tokio::test]
    async fn test_customized_skips_unreachable_replica() {
        // one live listener, one port that is known-closed
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_addr = live.local_addr().unwrap().to_string();
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap().to_string();
        drop(dead);

        let cluster = Cluster::new("10.0.0.1", vec![dead_addr, live_addr.clone()]).unwrap();
        let decision = decide(&cluster, 3306, Classification::Read, Strategy::Customized).await;
        assert_eq!(decision.target, live_addr);
        assert_eq!(decision.role, "Worker (Ping Optimized)");
    }

    #[test]
    fn test_lowest_latency_minimum_wins() {
        assert_eq!(lowest_latency(&[5.0, 2.0, 8.0]), 1);
        assert_eq!(lowest_latency(&[1.0]), 0);
    }

    #[test]
    fn test_lowest_latency_tie_goes_to_earliest() {
        assert_eq!(lowest_latency(&[3.0, 3.0, 3.0]), 0);
        assert_eq!(lowest_latency(&[9.0, 4.0, 4.0]), 1);
    }

    #[test]
    fn test_lowest_latency_all_unreachable_picks_first() {
        use crate::probe::UNREACHABLE_MS;
        assert_eq!(
            lowest_latency(&[UNREACHABLE_MS, UNREACHABLE_MS, UNREACHABLE_MS]),
            0
        );
    }

    #[test]
    fn test_lowest_latency_sentinel_never_beats_healthy() {
        use crate::probe::UNREACHABLE_MS;
        assert_eq!(lowest_latency(&[UNREACHABLE_MS, 120.5]), 1);
    }
}
