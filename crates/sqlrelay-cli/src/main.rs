//! # sqlrelay CLI Entry Point
//!
//! Main binary for sqlrelay. Runs one of the two services:
//!
//! ```bash
//! # Start the public gate
//! sqlrelay gate -b 0.0.0.0:5000 --router http://10.0.0.9:5000 --api-key <secret>
//!
//! # Start the internal router
//! sqlrelay router -b 0.0.0.0:5000 --primary 10.0.0.1 -r 10.0.0.2 -r 10.0.0.3 \
//!     --db-user replica_user --db-name sakila
//! ```
//!
//! Secrets may come from the environment instead of flags:
//! `SQLRELAY_API_KEY` for the gate, `SQLRELAY_DB_PASSWORD` for the router.

use std::net::SocketAddr;

use anyhow::Result;
use argh::FromArgs;

use sqlrelay_common::auth::AuthConfig;
use sqlrelay_gate::RouterClient;
use sqlrelay_router::{Cluster, DbConfig};

/// Validates that a URL string starts with http:// or https://.
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// sqlrelay - SQL traffic mediation for a primary/replica MySQL cluster
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Gate(GateArgs),
    Router(RouterArgs),
}

/// Arguments for starting the public gate.
///
/// The gate authenticates callers, filters destructive queries and
/// forwards the rest to the router.
#[derive(FromArgs)]
#[argh(subcommand, name = "gate")]
/// start the public sqlrelay gate
struct GateArgs {
    /// address to bind the gate's HTTP server to
    #[argh(option, short = 'b', default = "\"0.0.0.0:5000\".into()")]
    bind: String,

    /// base URL of the internal router
    ///
    /// Must include the http:// or https:// prefix
    /// (e.g., http://10.0.0.9:5000).
    #[argh(option, long = "router")]
    router: String,

    /// shared API key callers must present in the X-API-Key header
    ///
    /// Falls back to the SQLRELAY_API_KEY environment variable.
    #[argh(option, long = "api-key")]
    api_key: Option<String>,
}

/// Arguments for starting the internal router.
///
/// The router classifies queries, picks a database node per the requested
/// strategy and executes them. It performs no authentication of its own;
/// restrict its network reachability to the gate.
#[derive(FromArgs)]
#[argh(subcommand, name = "router")]
/// start the internal sqlrelay router
struct RouterArgs {
    /// address to bind the router's HTTP server to
    #[argh(option, short = 'b', default = "\"0.0.0.0:5000\".into()")]
    bind: String,

    /// address of the primary (writable) database node
    #[argh(option, long = "primary")]
    primary: String,

    /// address of a read replica; repeat for multiple replicas
    ///
    /// Order matters: the customized strategy breaks latency ties by
    /// earliest position.
    #[argh(option, short = 'r', long = "replica")]
    replicas: Vec<String>,

    /// database user
    #[argh(option, long = "db-user", default = "\"replica_user\".into()")]
    db_user: String,

    /// database password
    ///
    /// Falls back to the SQLRELAY_DB_PASSWORD environment variable.
    #[argh(option, long = "db-password")]
    db_password: Option<String>,

    /// database name
    #[argh(option, long = "db-name", default = "\"sakila\".into()")]
    db_name: String,

    /// port used for MySQL nodes without an explicit port
    #[argh(option, long = "db-port", default = "3306")]
    db_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Default log level INFO, overridable via RUST_LOG
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Gate(args) => {
            tracing::info!("Starting sqlrelay gate");
            validate_http_url(&args.router, "router address")?;

            let api_key = args
                .api_key
                .or_else(|| std::env::var("SQLRELAY_API_KEY").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("API key required: pass --api-key or set SQLRELAY_API_KEY")
                })?;

            tracing::info!("Forwarding to router at {}", args.router);

            let addr: SocketAddr = args
                .bind
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;

            let server = sqlrelay_gate::HttpServer::new(
                AuthConfig::new(api_key),
                RouterClient::new(args.router),
            );
            server.run(addr).await?;
            Ok(())
        }
        Commands::Router(args) => {
            tracing::info!("Starting sqlrelay router");
            tracing::info!("Primary: {}", args.primary);
            tracing::info!("Replicas: {:?}", args.replicas);

            let password = args
                .db_password
                .or_else(|| std::env::var("SQLRELAY_DB_PASSWORD").ok())
                .unwrap_or_default();

            let cluster = Cluster::new(args.primary, args.replicas)?;
            let db = DbConfig {
                user: args.db_user,
                password,
                database: args.db_name,
                port: args.db_port,
            };

            let addr: SocketAddr = args
                .bind
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;

            let server = sqlrelay_router::HttpServer::new(cluster, db);
            server.run(addr).await?;
            Ok(())
        }
    }
}
