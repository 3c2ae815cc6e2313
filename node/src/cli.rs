//! # CLI Interface
//!
//! Command-line arguments of `custos-node`, with environment fallbacks for
//! container deployments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Custodial JSON-RPC signing gateway.
///
/// Sits in front of Ethereum, GoQuorum and Besu nodes, signs transactions
/// with custodial keys and forwards everything else.
#[derive(Parser, Debug)]
#[command(
    name = "custos-node",
    about = "Custodial JSON-RPC signing gateway",
    version,
    propagate_version = true
)]
pub struct CustosCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway.
    Run(RunArgs),
    /// Validate a configuration file and load its keys, then exit.
    CheckConfig(CheckConfigArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short = 'c', env = "CUSTOS_CONFIG")]
    pub config: PathBuf,

    /// Port for the JSON-RPC API.
    #[arg(long, env = "CUSTOS_HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CUSTOS_METRICS_PORT", default_value_t = 9102)]
    pub metrics_port: u16,

    /// Log format: `pretty` or `json`.
    #[arg(long, env = "CUSTOS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Deadline for serving one request, node calls included. 0 disables it.
    #[arg(long, env = "CUSTOS_REQUEST_TIMEOUT_MS", default_value_t = 60_000)]
    pub request_timeout_ms: u64,
}

/// Arguments for the `check-config` subcommand.
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    #[arg(long, short = 'c', env = "CUSTOS_CONFIG")]
    pub config: PathBuf,
}
