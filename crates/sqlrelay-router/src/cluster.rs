//! Node Directory
//!
//! Static description of the database cluster: one writable primary and an
//! ordered list of read replicas. Built once at startup from configuration
//! and shared read-only across request handlers; nothing mutates it after
//! process start.

use sqlrelay_common::{RelayError, Result};

/// The immutable node directory.
///
/// The primary is the single writable node; replicas are read-only and
/// eligible only for read-routing strategies.
///
/// Replica order matters: the `customized` strategy breaks latency ties by
/// earliest position in this list.
#[derive(Debug, Clone)]
pub struct Cluster {
    primary: String,
    replicas: Vec<String>,
}

impl Cluster {
    pub fn new(primary: impl Into<String>, replicas: Vec<String>) -> Result<Self> {
        let primary = primary.into();
        if primary.trim().is_empty() {
            return Err(RelayError::InvalidConfig(
                "primary node address must not be empty".to_string(),
            ));
        }
        Ok(Self { primary, replicas })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn replicas(&self) -> &[String] {
        &self.replicas
    }
}

/// Database connection settings shared by every node.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    /// MySQL port applied to node addresses that carry no explicit port.
    pub port: u16,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            user: "replica_user".to_string(),
            password: String::new(),
            database: "sakila".to_string(),
            port: 3306,
        }
    }
}

/// Splits a node address into host and port, applying `default_port` when
/// the address is a bare host.
pub fn host_port(addr: &str, default_port: u16) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) if !host.is_empty() => (host.to_string(), port),
            _ => (addr.to_string(), default_port),
        },
        None => (addr.to_string(), default_port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_accessors() {
        let cluster = Cluster::new(
            "10.0.0.1",
            vec!["10.0.0.2".to_string(), "10.0.0.3".to_string()],
        )
        .unwrap();
        assert_eq!(cluster.primary(), "10.0.0.1");
        assert_eq!(cluster.replicas().len(), 2);
        assert_eq!(cluster.replicas()[0], "10.0.0.2");
    }

    #[test]
    fn test_cluster_allows_empty_replicas() {
        let cluster = Cluster::new("10.0.0.1", vec![]).unwrap();
        assert!(cluster.replicas().is_empty());
    }

    #[test]
    fn test_cluster_rejects_empty_primary() {
        assert!(Cluster::new("  ", vec![]).is_err());
    }

    #[test]
    fn test_host_port_bare_host() {
        assert_eq!(host_port("10.0.0.1", 3306), ("10.0.0.1".to_string(), 3306));
    }

    #[test]
    fn test_host_port_explicit_port() {
        assert_eq!(
            host_port("10.0.0.1:3307", 3306),
            ("10.0.0.1".to_string(), 3307)
        );
    }

    #[test]
    fn test_host_port_hostname() {
        assert_eq!(
            host_port("db-replica-1:4000", 3306),
            ("db-replica-1".to_string(), 4000)
        );
    }
}
